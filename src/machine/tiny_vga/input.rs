/// Bit of `ui_in` wired to the jump button.
pub const JUMP_BIT: u8 = 0;
/// Bit of `ui_in` wired to the halt button.
pub const HALT_BIT: u8 = 1;

/// Momentary buttons on the input port. Both are active-low on the wire; the
/// fields here are true while the button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub jump: bool,
    pub halt: bool,
}

impl Buttons {
    pub const RELEASED: Buttons = Buttons {
        jump: false,
        halt: false,
    };

    pub fn from_ui_in(ui_in: u8) -> Self {
        Self {
            jump: ui_in & (1 << JUMP_BIT) == 0,
            halt: ui_in & (1 << HALT_BIT) == 0,
        }
    }

    /// Input word for these buttons, with every unused bit pulled high.
    pub fn to_ui_in(self) -> u8 {
        let mut ui_in = 0xff;
        if self.jump {
            ui_in &= !(1 << JUMP_BIT);
        }
        if self.halt {
            ui_in &= !(1 << HALT_BIT);
        }
        ui_in
    }
}
