pub mod generic;
pub mod tiny_vga;
