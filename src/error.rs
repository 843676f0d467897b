use thiserror::Error;
use vision_protocol::SendError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures inside the request path.
///
/// These never cross the `VisionClient` boundary: each one is logged and
/// turned into the empty/zero sentinel of the calling operation.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection failure: could not open {endpoint}")]
    ConnectionFailure { endpoint: String },

    #[error("Send failure: {0}")]
    SendFailure(#[from] SendError),

    #[error("No reply to '{command}' within {timeout_ms}ms")]
    TimeoutNoReply { command: String, timeout_ms: u128 },

    #[error("Decode failure: {0}")]
    DecodeFailure(#[from] serde_json::Error),

    #[error("Sensor reported error: {0}")]
    Sensor(String),
}
