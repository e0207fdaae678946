use thiserror::Error;

/// Rejected configuration. The timing core itself cannot fail; only the
/// knobs that shape it can be set to something meaningless.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pipeline depth {depth} exceeds the maximum of {max}")]
    PipelineTooDeep { depth: usize, max: usize },

    #[error("output bit {bit} for {signal} is out of range (0..=7)")]
    BitOutOfRange { signal: &'static str, bit: u8 },

    #[error("output bit {bit} is assigned to both {first} and {second}")]
    DuplicateBit {
        bit: u8,
        first: &'static str,
        second: &'static str,
    },

    #[error("hsync must be on output bit 7, not bit {0}")]
    HsyncNotMsb(u8),

    #[error("layout has no assignment for {0}")]
    MissingSignal(&'static str),

    #[error("malformed layout entry: {0:?}")]
    MalformedLayout(String),

    #[error("unknown {kind}: {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("not a number: {0:?}")]
    InvalidNumber(String),
}
