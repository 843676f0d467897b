//! # Vision Protocol
//!
//! WebSocket transport for talking to a vision sensor coprocessor.
//!
//! This crate provides:
//! - The [`Transport`] trait the request/reply layer is written against
//! - [`WsTransport`], a blocking `tungstenite` implementation that delivers
//!   inbound frames to a single handler on its own I/O thread
//! - The [`Frame`] variant handed to that handler
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vision_protocol::{Frame, Transport, WsTransport};
//!
//! let transport = WsTransport::new();
//! transport.set_frame_handler(Arc::new(|frame: Frame| {
//!     if let Frame::Text(text) = frame {
//!         println!("sensor says: {}", text);
//!     }
//! }));
//!
//! if transport.connect("ws://10.42.0.118:50000") {
//!     transport.send_text("info").ok();
//! }
//! ```

pub mod client;
pub mod frame;
pub mod transport;

// Re-export commonly used types
pub use client::WsTransport;
pub use frame::{Frame, FrameHandler};
pub use transport::{ConnectionState, ProtocolError, SendError, Transport};
