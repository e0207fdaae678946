//! A display on the far end of the output port. It sees nothing but the
//! packed output word, one per pixel clock, and locates pixels the way a
//! monitor does: relative to the trailing edges of the sync pulses.

use tracing::{debug, trace};

use crate::host::frame::Framebuffer;
use crate::machine::generic::vsync::Timing;
use crate::machine::tiny_vga::output::OutputLayout;

/// Sync timing recovered from the output, all in pixel clocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurements {
    /// Width of the last hsync pulse.
    pub hsync_width: Option<u32>,
    /// Distance between the last two hsync falling edges.
    pub line_length: Option<u32>,
    /// Width of the last vsync pulse.
    pub vsync_width: Option<u32>,
    /// Distance between the last two vsync falling edges.
    pub frame_length: Option<u32>,
    /// Pulses and periods over the whole run that differed from the
    /// expected timing.
    pub violations: u32,
}

impl Measurements {
    pub fn conforms(&self, t: &Timing) -> bool {
        let line = t.htot() as u32;
        self.hsync_width == Some(t.h_sync as u32)
            && self.line_length == Some(line)
            && self.vsync_width == Some(t.v_sync as u32 * line)
            && self.frame_length == Some(t.pixel_tot())
            && self.violations == 0
    }

    pub fn vsync_lines(&self) -> Option<u32> {
        Some(self.vsync_width? / self.line_length?)
    }

    pub fn frame_lines(&self) -> Option<u32> {
        Some(self.frame_length? / self.line_length?)
    }
}

pub struct Monitor {
    timing: Timing,
    layout: OutputLayout,
    framebuffer: Framebuffer,
    tick: u64,
    frames: u64,
    prev_hsync: bool,
    prev_vsync: bool,
    hsync_fell_at: Option<u64>,
    vsync_fell_at: Option<u64>,
    since_hsync: Option<u32>,
    lines_since_vsync: Option<u32>,
    measurements: Measurements,
}

impl Monitor {
    pub fn new(timing: Timing, layout: OutputLayout) -> Self {
        Self {
            timing,
            layout,
            framebuffer: Framebuffer::new(timing.h_active as usize, timing.v_active as usize),
            tick: 0,
            frames: 0,
            prev_hsync: true,
            prev_vsync: true,
            hsync_fell_at: None,
            vsync_fell_at: None,
            since_hsync: None,
            lines_since_vsync: None,
            measurements: Measurements::default(),
        }
    }

    /// Consume one output word.
    pub fn feed(&mut self, word: u8) {
        self.tick += 1;
        let (hsync, vsync, rgb) = self.layout.unpack(word);

        if self.prev_vsync && !vsync {
            if let Some(prev) = self.vsync_fell_at {
                let expected = self.timing.pixel_tot();
                self.measurements.frame_length =
                    Some(self.check("frame length", self.tick - prev, expected));
            }
            self.vsync_fell_at = Some(self.tick);
            self.frames += 1;
            debug!(frame = self.frames, tick = self.tick, "vsync");
        } else if !self.prev_vsync && vsync {
            if let Some(fell) = self.vsync_fell_at {
                let expected = self.timing.v_sync as u32 * self.timing.htot() as u32;
                self.measurements.vsync_width =
                    Some(self.check("vsync width", self.tick - fell, expected));
            }
            self.lines_since_vsync = Some(0);
        }

        if let Some(since) = self.since_hsync.as_mut() {
            *since += 1;
        }
        if self.prev_hsync && !hsync {
            if let Some(prev) = self.hsync_fell_at {
                let expected = self.timing.htot() as u32;
                self.measurements.line_length =
                    Some(self.check("line length", self.tick - prev, expected));
            }
            self.hsync_fell_at = Some(self.tick);
        } else if !self.prev_hsync && hsync {
            if let Some(fell) = self.hsync_fell_at {
                let expected = self.timing.h_sync as u32;
                self.measurements.hsync_width =
                    Some(self.check("hsync width", self.tick - fell, expected));
            }
            self.since_hsync = Some(0);
            if let Some(lines) = self.lines_since_vsync.as_mut() {
                *lines += 1;
            }
            trace!(tick = self.tick, line = ?self.lines_since_vsync, "hsync");
        }

        self.prev_hsync = hsync;
        self.prev_vsync = vsync;

        if let Some((x, y)) = self.position() {
            self.framebuffer.set(x, y, rgb.into());
        }
    }

    /// Count a measurement that is off from `expected`.
    fn check(&mut self, what: &'static str, ticks: u64, expected: u32) -> u32 {
        let measured = ticks as u32;
        if measured != expected {
            self.measurements.violations += 1;
            debug!(tick = self.tick, measured, expected, "{what} out of spec");
        }
        measured
    }

    /// Visible-area coordinates of the current word, if any.
    fn position(&self) -> Option<(usize, usize)> {
        let x = self.since_hsync?.checked_sub(self.timing.h_bp as u32)?;
        let y = self.lines_since_vsync?.checked_sub(self.timing.v_bp as u32)?;
        if x < self.timing.h_active as u32 && y < self.timing.v_active as u32 {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    /// True once a whole frame has been seen between vsync pulses.
    pub fn is_locked(&self) -> bool {
        self.lines_since_vsync.is_some() && self.measurements.frame_length.is_some()
    }

    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::host::frame::Rgb888;
    use crate::machine::generic::vsync::{Beam, SyncState};
    use crate::machine::tiny_vga::System;
    use crate::machine::tiny_vga::input::Buttons;
    use crate::machine::tiny_vga::output::Rgb222;
    use crate::machine::tiny_vga::video::{Revision, TIMING_640X480_60HZ, VgaConfig};

    const T: Timing = TIMING_640X480_60HZ;

    fn gradient(beam: &Beam, _: Buttons) -> Rgb222 {
        Rgb222::new((beam.h / 160) as u8, (beam.v / 120) as u8, (beam.h % 4) as u8)
    }

    fn run(config: &VgaConfig, frames: u32) -> Monitor {
        let mut system = System::new(config, gradient);
        let mut monitor = Monitor::new(T, config.layout);
        for _ in 0..10 {
            monitor.feed(system.step(0xff, false));
        }
        for _ in 0..frames * T.pixel_tot() {
            monitor.feed(system.step(0xff, true));
        }
        monitor
    }

    #[rstest]
    #[case(Revision::Current)]
    #[case(Revision::Legacy)]
    fn test_measures_standard_timing(#[case] revision: Revision) {
        let monitor = run(&VgaConfig::from(revision), 3);
        let m = monitor.measurements();
        assert_eq!(m.hsync_width, Some(96));
        assert_eq!(m.line_length, Some(800));
        assert_eq!(m.vsync_width, Some(1600));
        assert_eq!(m.vsync_lines(), Some(2));
        assert_eq!(m.frame_length, Some(420_000));
        assert_eq!(m.frame_lines(), Some(525));
        assert_eq!(m.violations, 0);
        assert!(m.conforms(&T));
        assert!(monitor.is_locked());
        assert_eq!(monitor.frames(), 3);
        assert_eq!(monitor.ticks(), 10 + 3 * 420_000);
    }

    #[rstest]
    #[case(Revision::Current)]
    #[case(Revision::Legacy)]
    fn test_captures_pixels_in_place(#[case] revision: Revision) {
        let monitor = run(&VgaConfig::from(revision), 2);
        let fb = monitor.framebuffer();
        for (x, y) in [(0, 0), (1, 0), (159, 0), (160, 119), (639, 120), (321, 479), (639, 479)] {
            let beam = Beam {
                h: x as u16,
                v: y as u16,
                sync: SyncState::IDLE,
            };
            let expected: Rgb888 = gradient(&beam, Buttons::RELEASED).into();
            assert_eq!(fb.get(x, y), Some(expected), "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_not_locked_before_full_frame() {
        let monitor = run(&VgaConfig::default(), 1);
        assert!(!monitor.is_locked());
        assert_eq!(monitor.frames(), 1);
        assert_eq!(monitor.measurements().frame_length, None);
        assert_eq!(monitor.measurements().hsync_width, Some(96));
    }

    #[test]
    fn test_detects_short_sync_pulse() {
        let skewed = Timing {
            h_sync: 95,
            h_bp: 49,
            ..T
        };
        let config = VgaConfig {
            timing: skewed,
            ..VgaConfig::default()
        };
        let mut system = System::new(&config, gradient);
        let mut monitor = Monitor::new(T, config.layout);
        for _ in 0..2 * T.pixel_tot() {
            monitor.feed(system.step(0xff, true));
        }
        assert_eq!(monitor.measurements().hsync_width, Some(95));
        assert_eq!(monitor.measurements().line_length, Some(800));
        assert!(!monitor.measurements().conforms(&T));
    }

    #[test]
    fn test_one_long_line_fails_the_run() {
        let config = VgaConfig::default();
        let mut system = System::new(&config, gradient);
        let mut monitor = Monitor::new(T, config.layout);
        for _ in 0..10 {
            monitor.feed(system.step(0xff, false));
        }
        // Stretch one visible line in the second frame by three ticks.
        let stretched = T.pixel_tot() + 100 * 800 + 300;
        for tick in 0..3 * T.pixel_tot() {
            let word = system.step(0xff, true);
            let repeat = if tick == stretched { 4 } else { 1 };
            for _ in 0..repeat {
                monitor.feed(word);
            }
        }
        let m = monitor.measurements();
        // The latest line and frame are fine; only the run as a whole is not.
        assert_eq!(m.line_length, Some(800));
        assert_eq!(m.frame_length, Some(420_000));
        assert_eq!(m.violations, 2);
        assert!(!m.conforms(&T));
    }
}
