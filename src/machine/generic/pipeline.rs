//! Output register chain. Real hardware registers its outputs one or more
//! times before they reach the pins; this models that chain as a fixed-depth
//! shift register so the latency is an explicit, inspectable parameter.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Deepest register chain a [`DelayLine`] can model.
pub const MAX_PIPELINE_DEPTH: usize = 4;

/// Number of pixel clocks between a counter position and its appearance on
/// the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineDelay(u8);

impl PipelineDelay {
    /// Combinational output, no registers.
    pub const NONE: PipelineDelay = PipelineDelay(0);
    /// A single output register.
    pub const SINGLE: PipelineDelay = PipelineDelay(1);
    /// Sync register followed by an output port register.
    pub const REGISTERED: PipelineDelay = PipelineDelay(2);

    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        if depth > MAX_PIPELINE_DEPTH {
            return Err(ConfigError::PipelineTooDeep {
                depth,
                max: MAX_PIPELINE_DEPTH,
            });
        }
        Ok(Self(depth as u8))
    }

    pub fn depth(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PipelineDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tick(s)", self.0)
    }
}

impl FromStr for PipelineDelay {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let depth = s
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidNumber(s.to_owned()))?;
        Self::new(depth)
    }
}

#[derive(Debug, Clone)]
pub struct DelayLine<T> {
    stages: [T; MAX_PIPELINE_DEPTH],
    depth: usize,
    head: usize,
}

impl<T: Copy> DelayLine<T> {
    pub fn new(delay: PipelineDelay, fill: T) -> Self {
        Self {
            stages: [fill; MAX_PIPELINE_DEPTH],
            depth: delay.depth(),
            head: 0,
        }
    }

    pub fn delay(&self) -> PipelineDelay {
        PipelineDelay(self.depth as u8)
    }

    /// Clock `value` in and return whatever was clocked in `depth` pushes ago.
    pub fn push(&mut self, value: T) -> T {
        if self.depth == 0 {
            return value;
        }
        let out = std::mem::replace(&mut self.stages[self.head], value);
        self.head = (self.head + 1) % self.depth;
        out
    }

    /// Overwrite every stage, as a reset does.
    pub fn flush(&mut self, value: T) {
        self.stages = [value; MAX_PIPELINE_DEPTH];
        self.head = 0;
    }
}
