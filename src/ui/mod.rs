pub mod camera;
pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
