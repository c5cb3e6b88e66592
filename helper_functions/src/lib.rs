pub mod misc;
pub mod signing;
