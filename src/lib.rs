//! Client for a networked vision sensor coprocessor.
//!
//! A [`VisionClient`] holds one WebSocket connection to the sensor, sends
//! text commands and matches each asynchronous JSON reply to the request
//! waiting for it. Replies are decoded into [`CameraInfo`] and
//! [`ApriltagDetection`] records.
//!
//! ```rust,no_run
//! use vision_link::{ClientConfig, VisionClient};
//!
//! # fn main() -> Result<(), vision_link::config::ConfigError> {
//! let config = ClientConfig::new("ws://10.42.0.118:50000")?.with_timeout_ms(200)?;
//! let client = VisionClient::new(config);
//! client.connect();
//!
//! for tag in client.get_apriltags() {
//!     println!("tag {} at {:.2}m", tag.tag_id, tag.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod correlator;
pub mod decode;
pub mod error;
pub mod pending;
pub mod types;

pub use command::Command;
pub use config::{load_config, ClientConfig};
pub use correlator::VisionClient;
pub use error::{ClientError, Result};
pub use pending::RequestState;
pub use types::{ApriltagDetection, CameraInfo, ColorSample};

// Transport types needed to plug in a custom transport
pub use vision_protocol::{Frame, FrameHandler, SendError, Transport, WsTransport};
