pub mod input;
pub mod output;
pub mod pattern;
pub mod video;

use tracing::{debug, info};

use crate::machine::generic::vsync::{Beam, SyncGen};

use self::input::Buttons;
use self::output::{OutputLayout, Rgb222};
use self::pattern::PixelSource;
use self::video::VgaConfig;

/// The whole design as seen from its pins: an 8-bit input word and an
/// active-low reset in, an 8-bit output word out, one call per pixel clock.
pub struct System<P> {
    sync: SyncGen,
    layout: OutputLayout,
    source: P,
    buttons: Buttons,
    beam: Beam,
    uo_out: u8,
    in_reset: bool,
    pub tick_count: u64,
}

impl<P: PixelSource> System<P> {
    pub fn new(config: &VgaConfig, source: P) -> Self {
        info!(
            "VGA system: {}x{}, layout {} ({}), output delay {}",
            config.timing.h_active,
            config.timing.v_active,
            config.layout,
            config.layout.preset_name().unwrap_or("custom"),
            config.delay,
        );
        Self {
            sync: SyncGen::new(config.timing, config.delay),
            layout: config.layout,
            source,
            buttons: Buttons::RELEASED,
            beam: Beam::IDLE,
            uo_out: config.layout.pack(Beam::IDLE.sync, Rgb222::BLACK),
            in_reset: false,
            tick_count: 0,
        }
    }

    /// Clock the design once and return the new output word.
    pub fn step(&mut self, ui_in: u8, rst_n: bool) -> u8 {
        self.tick_count += 1;
        self.buttons = Buttons::from_ui_in(ui_in);

        if rst_n == self.in_reset {
            self.in_reset = !rst_n;
            debug!(
                tick = self.tick_count,
                "reset {}",
                if rst_n { "released" } else { "asserted" }
            );
        }

        self.beam = self.sync.step(rst_n);
        let rgb = if rst_n {
            self.source.pixel(&self.beam, self.buttons)
        } else {
            self.source.reset();
            Rgb222::BLACK
        };
        let rgb = if self.beam.sync.active_display {
            rgb
        } else {
            Rgb222::BLACK
        };

        self.uo_out = self.layout.pack(self.beam.sync, rgb);
        self.uo_out
    }

    pub fn uo_out(&self) -> u8 {
        self.uo_out
    }

    /// Beam behind the current output word.
    pub fn beam(&self) -> Beam {
        self.beam
    }

    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    pub fn sync(&self) -> &SyncGen {
        &self.sync
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn source(&self) -> &P {
        &self.source
    }
}
