//! Cycle-accurate model of a 640x480@60Hz VGA sync generator, the 8-bit
//! output port it drives, and a display model that watches that port.
//!
//! The model is stepped once per pixel clock with explicit inputs (`ui_in`,
//! `rst_n`); nothing in `machine` knows about threads or wall-clock time.

pub mod error;
pub mod host;
pub mod machine;
