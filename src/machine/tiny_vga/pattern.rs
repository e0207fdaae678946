//! Pixel sources. Game logic sits behind [`PixelSource`]: it sees the beam
//! the output stage is about to show and the button state, and answers with a
//! colour. It never feeds back into the timing.

use tracing::debug;

use crate::machine::generic::vsync::{Beam, Region, Timing};
use crate::machine::tiny_vga::input::Buttons;
use crate::machine::tiny_vga::output::Rgb222;

pub trait PixelSource {
    /// Colour for `beam`. Called once per tick, including blanking, so
    /// sources can keep their own frame-level state. The result is blanked
    /// outside the active display regardless of what is returned.
    fn pixel(&mut self, beam: &Beam, buttons: Buttons) -> Rgb222;

    /// Called on every tick the design is held in reset.
    fn reset(&mut self) {}
}

impl<F> PixelSource for F
where
    F: FnMut(&Beam, Buttons) -> Rgb222,
{
    fn pixel(&mut self, beam: &Beam, buttons: Buttons) -> Rgb222 {
        self(beam, buttons)
    }
}

const BAR_COUNT: u16 = 8;

/// Eight vertical colour bars (white, yellow, cyan, green, magenta, red,
/// blue, black) that shift one bar per frame. Brightness steps down toward
/// the bottom of the screen. Holding halt freezes the scroll; holding jump
/// inverts the colours.
#[derive(Debug)]
pub struct TestPattern {
    timing: Timing,
    frame: u32,
}

impl TestPattern {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            frame: 0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Bar colour at `(x, y)` in the visible area, before button effects.
    pub fn bar_color(&self, x: u16, y: u16) -> Rgb222 {
        let t = &self.timing;
        let bar =
            (x as u32 * BAR_COUNT as u32 / t.h_active as u32 + self.frame) % BAR_COUNT as u32;
        let bits = (BAR_COUNT as u32 - 1 - bar) as u8;
        let level = 3 - (y as u32 * 3 / t.v_active as u32) as u8;
        let on = |mask: u8| if bits & mask != 0 { level } else { 0 };
        // bit 2 green, bit 1 red, bit 0 blue gives the SMPTE bar order
        Rgb222::new(on(2), on(4), on(1))
    }
}

impl PixelSource for TestPattern {
    fn pixel(&mut self, beam: &Beam, buttons: Buttons) -> Rgb222 {
        // Frame boundary: first tick of vertical sync.
        if beam.h == 0 && self.timing.v_region(beam.v) == Region::Sync(0) {
            if !buttons.halt {
                self.frame = self.frame.wrapping_add(1);
            }
            debug!(frame = self.frame, halted = buttons.halt, "pattern frame");
        }

        if !beam.sync.active_display {
            return Rgb222::BLACK;
        }
        let color = self.bar_color(beam.h, beam.v);
        if buttons.jump { color.invert() } else { color }
    }

    fn reset(&mut self) {
        self.frame = 0;
    }
}
