pub mod ear_pipeline;
pub mod frame_loop;
pub mod pipeline_logger;
pub mod rendering;
