use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::machine::generic::vsync::SyncState;

/// Two bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb222 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb222 {
    pub const BLACK: Rgb222 = Rgb222 { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb222 = Rgb222 { r: 3, g: 3, b: 3 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r & 3,
            g: g & 3,
            b: b & 3,
        }
    }

    pub fn invert(self) -> Self {
        Self::new(!self.r, !self.g, !self.b)
    }
}

/// Where each signal lands in the 8-bit output word. Colour arrays are
/// indexed by bit significance: `[0]` is the low bit, `[1]` the high bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputLayout {
    pub hsync: u8,
    pub vsync: u8,
    pub r: [u8; 2],
    pub g: [u8; 2],
    pub b: [u8; 2],
}

const SIGNALS: [&str; 8] = ["hsync", "vsync", "r0", "r1", "g0", "g1", "b0", "b1"];

impl OutputLayout {
    /// `{hsync, B0, G0, R0, vsync, B1, G1, R1}` from bit 7 down to bit 0.
    pub const TINY_VGA_PMOD: OutputLayout = OutputLayout {
        hsync: 7,
        vsync: 3,
        r: [4, 0],
        g: [5, 1],
        b: [6, 2],
    };

    /// As [`Self::TINY_VGA_PMOD`] with bits 3 and 4 exchanged, putting vsync
    /// on bit 4.
    pub const VSYNC_BIT4: OutputLayout = OutputLayout {
        hsync: 7,
        vsync: 4,
        r: [3, 0],
        g: [5, 1],
        b: [6, 2],
    };

    const PRESETS: [(&'static str, OutputLayout); 2] = [
        ("pmod", Self::TINY_VGA_PMOD),
        ("vsync-bit4", Self::VSYNC_BIT4),
    ];

    /// Build a layout, rejecting bits above 7, bits used twice, and hsync
    /// anywhere but the most significant bit.
    pub fn new(
        hsync: u8,
        vsync: u8,
        r: [u8; 2],
        g: [u8; 2],
        b: [u8; 2],
    ) -> Result<Self, ConfigError> {
        let layout = Self { hsync, vsync, r, g, b };
        layout.validate()?;
        Ok(layout)
    }

    /// Bit positions in [`SIGNALS`] order.
    fn bits(&self) -> [u8; 8] {
        [
            self.hsync, self.vsync, self.r[0], self.r[1], self.g[0], self.g[1], self.b[0],
            self.b[1],
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut owner: [Option<&'static str>; 8] = [None; 8];
        for (signal, bit) in SIGNALS.into_iter().zip(self.bits()) {
            let slot = owner
                .get_mut(bit as usize)
                .ok_or(ConfigError::BitOutOfRange { signal, bit })?;
            if let Some(first) = *slot {
                return Err(ConfigError::DuplicateBit {
                    bit,
                    first,
                    second: signal,
                });
            }
            *slot = Some(signal);
        }
        if self.hsync != 7 {
            return Err(ConfigError::HsyncNotMsb(self.hsync));
        }
        Ok(())
    }

    /// Name of the preset this layout matches, if any.
    pub fn preset_name(&self) -> Option<&'static str> {
        Self::PRESETS
            .iter()
            .find(|(_, layout)| layout == self)
            .map(|(name, _)| *name)
    }

    pub fn pack(&self, sync: SyncState, rgb: Rgb222) -> u8 {
        let levels = [
            sync.hsync,
            sync.vsync,
            rgb.r & 1 != 0,
            rgb.r & 2 != 0,
            rgb.g & 1 != 0,
            rgb.g & 2 != 0,
            rgb.b & 1 != 0,
            rgb.b & 2 != 0,
        ];
        self.bits()
            .into_iter()
            .zip(levels)
            .fold(0, |word, (bit, level)| word | ((level as u8) << bit))
    }

    /// Split an output word back into `(hsync, vsync, colour)`.
    pub fn unpack(&self, word: u8) -> (bool, bool, Rgb222) {
        let bit = |n: u8| (word >> n) & 1;
        let channel = |bits: [u8; 2]| bit(bits[0]) | (bit(bits[1]) << 1);
        (
            bit(self.hsync) != 0,
            bit(self.vsync) != 0,
            Rgb222 {
                r: channel(self.r),
                g: channel(self.g),
                b: channel(self.b),
            },
        )
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (signal, bit)) in SIGNALS.into_iter().zip(self.bits()).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{signal}={bit}")?;
        }
        Ok(())
    }
}

/// Accepts a preset name (`pmod`, `vsync-bit4`) or a full assignment such as
/// `hsync=7,vsync=3,r0=4,r1=0,g0=5,g1=1,b0=6,b1=2`.
impl FromStr for OutputLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((_, layout)) = Self::PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Ok(*layout);
        }
        if !s.contains('=') {
            return Err(ConfigError::UnknownName {
                kind: "layout",
                name: s.to_owned(),
            });
        }

        let mut bits: [Option<u8>; 8] = [None; 8];
        for entry in s.split(',') {
            let malformed = || ConfigError::MalformedLayout(entry.to_owned());
            let (key, value) = entry.split_once('=').ok_or_else(malformed)?;
            let index = SIGNALS
                .iter()
                .position(|signal| signal.eq_ignore_ascii_case(key.trim()))
                .ok_or_else(malformed)?;
            let bit = value.trim().parse::<u8>().map_err(|_| malformed())?;
            if bits[index].replace(bit).is_some() {
                return Err(malformed());
            }
        }

        let mut resolved = [0u8; 8];
        for (i, bit) in bits.into_iter().enumerate() {
            resolved[i] = bit.ok_or(ConfigError::MissingSignal(SIGNALS[i]))?;
        }
        let [hsync, vsync, r0, r1, g0, g1, b0, b1] = resolved;
        Self::new(hsync, vsync, [r0, r1], [g0, g1], [b0, b1])
    }
}
