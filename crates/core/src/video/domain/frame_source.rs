use crate::shared::frame::Frame;

/// Supplies frames one at a time, in capture order.
///
/// `Ok(None)` or an empty frame marks the end of the stream.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
