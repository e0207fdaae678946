use tracing::trace;

use crate::machine::generic::pipeline::{DelayLine, PipelineDelay};

/// Raster timing in pixel clocks (horizontal) and lines (vertical). Each
/// direction runs display -> front porch -> sync -> back porch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub h_active: u16,
    pub h_fp: u16,
    pub h_sync: u16,
    pub h_bp: u16, // h_active + h_fp + h_sync + h_bp = Htot

    pub v_active: u16,
    pub v_fp: u16,
    pub v_sync: u16,
    pub v_bp: u16, // v_active + v_fp + v_sync + v_bp = Vtot
}

impl Timing {
    pub const fn htot(&self) -> u16 {
        self.h_active + self.h_fp + self.h_sync + self.h_bp
    }
    pub const fn vtot(&self) -> u16 {
        self.v_active + self.v_fp + self.v_sync + self.v_bp
    }
    /// Pixel clocks in one full frame.
    pub const fn pixel_tot(&self) -> u32 {
        self.htot() as u32 * self.vtot() as u32
    }

    pub const fn h_sync_start(&self) -> u16 {
        self.h_active + self.h_fp
    }
    pub const fn h_sync_end(&self) -> u16 {
        self.h_sync_start() + self.h_sync
    }
    pub const fn v_sync_start(&self) -> u16 {
        self.v_active + self.v_fp
    }
    pub const fn v_sync_end(&self) -> u16 {
        self.v_sync_start() + self.v_sync
    }

    /// Region of the scanline that pixel `h` falls in.
    pub fn h_region(&self, h: u16) -> Region {
        Region::classify(h, self.h_active, self.h_fp, self.h_sync)
    }

    /// Region of the frame that line `v` falls in.
    pub fn v_region(&self, v: u16) -> Region {
        Region::classify(v, self.v_active, self.v_fp, self.v_sync)
    }
}

/// A position within a scanline or frame, tagged with the offset from the
/// start of its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Display(u16),
    FrontPorch(u16),
    Sync(u16),
    BackPorch(u16),
}

impl Region {
    fn classify(pos: u16, active: u16, fp: u16, sync: u16) -> Self {
        if pos < active {
            return Region::Display(pos);
        }
        let pos = pos - active;
        if pos < fp {
            return Region::FrontPorch(pos);
        }
        let pos = pos - fp;
        if pos < sync {
            Region::Sync(pos)
        } else {
            Region::BackPorch(pos - sync)
        }
    }
}

/// Free-running pixel counter for one scanline.
#[derive(Debug, Clone)]
pub struct HorizontalCounter {
    h: u16,
    total: u16,
}

impl HorizontalCounter {
    pub fn new(total: u16) -> Self {
        debug_assert!(total > 0);
        Self { h: 0, total }
    }

    pub fn h(&self) -> u16 {
        self.h
    }

    pub fn reset(&mut self) {
        self.h = 0;
    }

    /// Advance by one pixel clock. Returns the line wrap pulse, which is set
    /// only on the tick that takes `h` from `total - 1` back to zero.
    pub fn tick(&mut self) -> bool {
        let wrap = self.h == self.total - 1;
        self.h = if wrap { 0 } else { self.h + 1 };
        wrap
    }
}

/// Line counter. Has no clock of its own: it only moves on a line wrap.
#[derive(Debug, Clone)]
pub struct VerticalCounter {
    v: u16,
    total: u16,
}

impl VerticalCounter {
    pub fn new(total: u16) -> Self {
        debug_assert!(total > 0);
        Self { v: 0, total }
    }

    pub fn v(&self) -> u16 {
        self.v
    }

    pub fn reset(&mut self) {
        self.v = 0;
    }

    /// Returns true on the tick that completes a frame.
    pub fn tick(&mut self, h_wrap: bool) -> bool {
        if !h_wrap {
            return false;
        }
        let wrap = self.v == self.total - 1;
        self.v = if wrap { 0 } else { self.v + 1 };
        wrap
    }
}

/// The signal bundle derived from one counter position. `hsync` and `vsync`
/// are pin levels: true is idle, false is the (active-low) pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub hsync: bool,
    pub vsync: bool,
    pub active_display: bool,
}

impl SyncState {
    /// Outputs while in reset or before the pipeline has filled.
    pub const IDLE: SyncState = SyncState {
        hsync: true,
        vsync: true,
        active_display: false,
    };

    pub fn derive(t: &Timing, h: u16, v: u16) -> Self {
        let in_h_display = h < t.h_active;
        let in_h_sync = h >= t.h_sync_start() && h < t.h_sync_end();
        let in_v_display = v < t.v_active;
        let in_v_sync = v >= t.v_sync_start() && v < t.v_sync_end();

        Self {
            hsync: !in_h_sync,
            vsync: !in_v_sync,
            active_display: in_h_display && in_v_display,
        }
    }

    pub fn in_hsync(&self) -> bool {
        !self.hsync
    }

    pub fn in_vsync(&self) -> bool {
        !self.vsync
    }
}

/// A counter position together with the signals derived from it. This is
/// what travels down the output pipeline, so consumers always know which
/// position a delayed output belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beam {
    pub h: u16,
    pub v: u16,
    pub sync: SyncState,
}

impl Beam {
    pub const IDLE: Beam = Beam {
        h: 0,
        v: 0,
        sync: SyncState::IDLE,
    };
}

#[derive(Debug)]
pub struct SyncGen {
    t: Timing,
    h: HorizontalCounter,
    v: VerticalCounter,
    pipeline: DelayLine<Beam>,
}

impl SyncGen {
    pub fn new(t: Timing, delay: PipelineDelay) -> Self {
        Self {
            t,
            h: HorizontalCounter::new(t.htot()),
            v: VerticalCounter::new(t.vtot()),
            pipeline: DelayLine::new(delay, Beam::IDLE),
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.t
    }

    pub fn delay(&self) -> PipelineDelay {
        self.pipeline.delay()
    }

    pub fn h(&self) -> u16 {
        self.h.h()
    }

    pub fn v(&self) -> u16 {
        self.v.v()
    }

    /// The undelayed beam at the current counter position.
    pub fn current(&self) -> Beam {
        let (h, v) = (self.h.h(), self.v.v());
        Beam {
            h,
            v,
            sync: SyncState::derive(&self.t, h, v),
        }
    }

    /// Advance by one pixel clock and return the registered output.
    ///
    /// `rst_n` is the synchronous active-low reset. While it is low both
    /// counters are held at zero and the pipeline is flushed, so the output is
    /// [`Beam::IDLE`]. After release, the output of the n-th tick is the beam
    /// at counter position `n - delay`; the first `delay` ticks stay idle.
    pub fn step(&mut self, rst_n: bool) -> Beam {
        if !rst_n {
            self.h.reset();
            self.v.reset();
            self.pipeline.flush(Beam::IDLE);
            return Beam::IDLE;
        }

        // Both counters see the wrap condition from before this edge.
        let h_wrap = self.h.tick();
        if self.v.tick(h_wrap) {
            trace!("frame wrap");
        }

        let beam = self.current();
        self.pipeline.push(beam)
    }
}
