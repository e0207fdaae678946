//! Video timing and the named hardware revisions of the 640x480 design.
//!
//! Two test revisions of the design disagree on where `vsync` sits in the
//! output word (bit 3 or bit 4) and on how many registers sit between the
//! counters and the pins. Neither is picked silently: callers choose a
//! [`Revision`], and [`Revision::discrepancy`] describes what differs.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::machine::generic::pipeline::PipelineDelay;
use crate::machine::generic::vsync::Timing;
use crate::machine::tiny_vga::output::OutputLayout;

/// Nominal pixel clock. Timing is expressed in ticks, so this only matters
/// when converting to wall-clock time.
pub const PIXEL_CLOCK_HZ: u32 = 25_000_000;

pub const TIMING_640X480_60HZ: Timing = Timing {
    h_active: 640,
    h_fp: 16,
    h_sync: 96,
    h_bp: 48, // Htot = 800
    v_active: 480,
    v_fp: 10,
    v_sync: 2,
    v_bp: 33, // Vtot = 525
};

const _: () = assert!(TIMING_640X480_60HZ.htot() == 800);
const _: () = assert!(TIMING_640X480_60HZ.vtot() == 525);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Revision {
    /// Tiny VGA PMOD pinout (vsync on bit 3), two output registers.
    #[default]
    Current,
    /// Earlier pinout with vsync on bit 4, one output register.
    Legacy,
}

impl Revision {
    pub const ALL: [Revision; 2] = [Revision::Current, Revision::Legacy];

    pub fn name(self) -> &'static str {
        match self {
            Revision::Current => "current",
            Revision::Legacy => "legacy",
        }
    }

    pub fn layout(self) -> OutputLayout {
        match self {
            Revision::Current => OutputLayout::TINY_VGA_PMOD,
            Revision::Legacy => OutputLayout::VSYNC_BIT4,
        }
    }

    pub fn delay(self) -> PipelineDelay {
        match self {
            Revision::Current => PipelineDelay::REGISTERED,
            Revision::Legacy => PipelineDelay::SINGLE,
        }
    }

    pub fn discrepancy() -> &'static str {
        "revisions disagree: vsync is bit 3 (current) or bit 4 (legacy); \
         output latency is 2 ticks (current) or 1 tick (legacy)"
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Revision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Revision::ALL
            .into_iter()
            .find(|rev| rev.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "revision",
                name: s.to_owned(),
            })
    }
}

/// Everything needed to build a [`super::System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgaConfig {
    pub timing: Timing,
    pub layout: OutputLayout,
    pub delay: PipelineDelay,
}

impl From<Revision> for VgaConfig {
    fn from(rev: Revision) -> Self {
        Self {
            timing: TIMING_640X480_60HZ,
            layout: rev.layout(),
            delay: rev.delay(),
        }
    }
}

impl Default for VgaConfig {
    fn default() -> Self {
        Revision::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_640x480_totals() {
        assert_eq!(TIMING_640X480_60HZ.htot(), 800);
        assert_eq!(TIMING_640X480_60HZ.vtot(), 525);
        assert_eq!(TIMING_640X480_60HZ.pixel_tot(), 420_000);
        assert_eq!(TIMING_640X480_60HZ.h_sync_start(), 656);
        assert_eq!(TIMING_640X480_60HZ.h_sync_end(), 752);
        assert_eq!(TIMING_640X480_60HZ.v_sync_start(), 490);
        assert_eq!(TIMING_640X480_60HZ.v_sync_end(), 492);
    }

    #[test]
    fn test_refresh_rate() {
        let hz = PIXEL_CLOCK_HZ as f64 / TIMING_640X480_60HZ.pixel_tot() as f64;
        assert!((59.0..61.0).contains(&hz), "{hz}");
    }

    #[test]
    fn test_revisions_differ_only_where_documented() {
        let current = VgaConfig::from(Revision::Current);
        let legacy = VgaConfig::from(Revision::Legacy);
        assert_eq!(current.timing, legacy.timing);
        assert_eq!(current.layout.hsync, 7);
        assert_eq!(legacy.layout.hsync, 7);
        assert_eq!(current.layout.vsync, 3);
        assert_eq!(legacy.layout.vsync, 4);
        assert_eq!(current.delay, PipelineDelay::REGISTERED);
        assert_eq!(legacy.delay, PipelineDelay::SINGLE);
        assert_eq!(VgaConfig::default(), current);
    }

    #[test]
    fn test_parse_revision() {
        assert_eq!("legacy".parse::<Revision>(), Ok(Revision::Legacy));
        assert_eq!("Current".parse::<Revision>(), Ok(Revision::Current));
        assert!("rev3".parse::<Revision>().is_err());
    }
}
