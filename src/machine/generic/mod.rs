pub mod pipeline;
pub mod vsync;
