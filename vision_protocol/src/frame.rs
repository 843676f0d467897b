use std::sync::Arc;

/// A complete inbound frame from the sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame (JSON replies)
    Text(String),
    /// Binary frame (encoded images)
    Binary(Vec<u8>),
}

impl Frame {
    /// Payload size in bytes
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Text(_) => "text",
            Frame::Binary(_) => "binary",
        }
    }
}

/// Callback receiving every inbound frame.
///
/// Runs on the transport's I/O thread, so it must hand the frame off
/// without blocking.
pub type FrameHandler = Arc<dyn Fn(Frame) + Send + Sync>;
