pub mod constants;
pub mod point;
pub mod progress;
