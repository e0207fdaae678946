pub mod frame;
pub mod logging;
pub mod monitor;
pub mod screen;
