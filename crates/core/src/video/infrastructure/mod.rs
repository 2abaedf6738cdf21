#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_frame_source;
pub mod image_file_display;
pub mod image_sequence_source;
pub mod stdin_key_input;
