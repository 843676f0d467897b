use crate::frame::FrameHandler;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed before the frame was queued")]
    ConnectionClosed,
}

/// Lifecycle of the single sensor connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Streaming connection to the sensor.
///
/// All methods take `&self`; implementations manage their connection
/// through interior mutability so a client can share them across threads.
pub trait Transport: Send + Sync {
    /// Register the handler that receives inbound frames.
    /// Takes effect for connections opened afterwards.
    fn set_frame_handler(&self, handler: FrameHandler);

    /// Open a connection, blocking until it is usable or has failed.
    /// Returns `true` only when both directions are open; never panics or
    /// propagates the underlying error.
    fn connect(&self, endpoint: &str) -> bool;

    fn is_connected(&self) -> bool;

    fn send_text(&self, payload: &str) -> Result<(), SendError>;

    fn close(&self);
}
