pub mod display;
pub mod frame_source;
pub mod key_input;
