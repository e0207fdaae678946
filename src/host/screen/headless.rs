use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::host::monitor::{Measurements, Monitor};
use crate::machine::tiny_vga::System;
use crate::machine::tiny_vga::pattern::PixelSource;

/// How a headless run drives the pins.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Ticks to hold `rst_n` low before releasing it.
    pub reset_cycles: u32,
    /// Frames to run before the monitor's picture is worth looking at.
    pub warmup_frames: u32,
    pub frames: u32,
    /// Held on the input port for the whole run.
    pub ui_in: u8,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            reset_cycles: 10,
            warmup_frames: 1,
            frames: 2,
            ui_in: 0xff,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub ticks: u64,
    pub frames_seen: u64,
    pub locked: bool,
    pub measurements: Measurements,
    pub elapsed: Duration,
}

impl RunReport {
    /// Simulated pixel clocks per wall-clock second.
    pub fn ticks_per_second(&self) -> f64 {
        self.ticks as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }
}

pub fn run<P: PixelSource>(
    system: &mut System<P>,
    monitor: &mut Monitor,
    options: &RunOptions,
) -> RunReport {
    let start = Instant::now();
    let frame_ticks = system.sync().timing().pixel_tot();

    for _ in 0..options.reset_cycles {
        monitor.feed(system.step(options.ui_in, false));
    }
    info!("Reset released after {} cycles", options.reset_cycles);

    for frame in 0..options.warmup_frames + options.frames {
        for _ in 0..frame_ticks {
            monitor.feed(system.step(options.ui_in, true));
        }
        if frame + 1 == options.warmup_frames {
            debug!("Warmup complete at tick {}", system.tick_count);
        }
        debug!(
            frame,
            locked = monitor.is_locked(),
            measurements = ?monitor.measurements(),
            "frame done"
        );
    }

    if !monitor.is_locked() {
        warn!("Monitor never locked after {} frames", monitor.frames());
    }

    RunReport {
        ticks: system.tick_count,
        frames_seen: monitor.frames(),
        locked: monitor.is_locked(),
        measurements: monitor.measurements(),
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::tiny_vga::pattern::TestPattern;
    use crate::host::frame::Rgb888;
    use crate::machine::tiny_vga::video::{Revision, TIMING_640X480_60HZ, VgaConfig};

    fn run_revision(revision: Revision, options: &RunOptions) -> (RunReport, Monitor) {
        let config = VgaConfig::from(revision);
        let mut system = System::new(&config, TestPattern::new(config.timing));
        let mut monitor = Monitor::new(config.timing, config.layout);
        let report = run(&mut system, &mut monitor, options);
        (report, monitor)
    }

    #[test]
    fn test_default_run_locks_and_conforms() {
        for revision in Revision::ALL {
            let options = RunOptions::default();
            let (report, _) = run_revision(revision, &options);
            assert_eq!(report.ticks, 10 + 3 * 420_000);
            assert_eq!(report.frames_seen, 3);
            assert!(report.locked, "{revision}");
            assert!(
                report
                    .measurements
                    .conforms(&VgaConfig::from(revision).timing),
                "{revision}: {:?}",
                report.measurements
            );
        }
    }

    #[test]
    fn test_captured_frame_shows_bars() {
        let (_, monitor) = run_revision(Revision::Current, &RunOptions::default());
        let fb = monitor.framebuffer();
        // The last captured frame was drawn after two frame boundaries, so
        // the white bar has scrolled from the left edge to the seventh slot.
        let pattern = TestPattern::new(TIMING_640X480_60HZ);
        let white: Rgb888 = pattern.bar_color(0, 0).into();
        assert_eq!(fb.get(6 * 80, 0), Some(white));
        assert_ne!(fb.get(0, 0), Some(white));
    }

    #[test]
    fn test_zero_frames_never_lock() {
        let options = RunOptions {
            warmup_frames: 0,
            frames: 0,
            ..RunOptions::default()
        };
        let (report, _) = run_revision(Revision::Legacy, &options);
        assert_eq!(report.ticks, 10);
        assert!(!report.locked);
    }
}
