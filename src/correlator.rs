use crate::command::{Command, FIND_APRILTAGS, INFO};
use crate::config::ClientConfig;
use crate::decode::{decode_apriltags, decode_camera_info};
use crate::error::{ClientError, Result};
use crate::pending::{PendingReply, RequestState};
use crate::types::{ApriltagDetection, CameraInfo};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use vision_protocol::{Frame, Transport, WsTransport};

/// Command/response client for the vision sensor.
///
/// The wire protocol carries no message ids, so a reply is matched to
/// whichever request is outstanding. Requests are serialized by an internal
/// lock; a client can be shared between threads behind an `Arc`.
///
/// Nothing in the request path returns an error. Every failure is logged
/// and degrades to an empty value:
///
/// | operation          | on failure               |
/// |--------------------|--------------------------|
/// | `request`          | `""`                     |
/// | `get_camera_info`  | `CameraInfo::default()`  |
/// | `get_apriltags`    | empty `Vec`              |
/// | `connect`          | `false`                  |
/// | `send_command`     | `false`                  |
///
/// A reply that arrives after its request timed out and after the next
/// request was sent is taken as the reply to that next request.
pub struct VisionClient<T: Transport = WsTransport> {
    transport: T,
    config: ClientConfig,
    pending: Arc<PendingReply>,
    request_lock: Mutex<()>,
}

impl VisionClient<WsTransport> {
    /// Client over a WebSocket transport. Does not connect; call
    /// [`VisionClient::connect`] or let the first request do it.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(WsTransport::new(), config)
    }
}

impl<T: Transport> VisionClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let pending = Arc::new(PendingReply::new());
        let sink = Arc::clone(&pending);
        transport.set_frame_handler(Arc::new(move |frame| on_frame(&sink, frame)));

        Self {
            transport,
            config,
            pending,
            request_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// State of the most recent request cycle
    pub fn request_state(&self) -> RequestState {
        self.pending.state()
    }

    pub fn connect(&self) -> bool {
        let connected = self.transport.connect(self.config.endpoint.as_str());
        if connected {
            info!("🎥 Vision sensor connected at {}", self.config.endpoint);
        } else {
            warn!("⚠️ Vision sensor unavailable at {}", self.config.endpoint);
        }
        connected
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn close(&self) {
        self.transport.close();
    }

    /// Send a command without waiting for a reply
    pub fn send_command(&self, command: impl AsRef<str>) -> bool {
        let command = command.as_ref();
        let _guard = self.request_lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.send(command, &mut true) {
            Ok(()) => true,
            Err(e) => {
                warn!("❌ Could not send '{}': {}", command, e);
                false
            }
        }
    }

    /// Send `command` and block for its reply, up to the configured timeout.
    /// Returns `""` if the command could not be sent or nothing arrived.
    pub fn request(&self, command: impl AsRef<str>) -> String {
        let command = command.as_ref();
        let _guard = self.request_lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.exchange(command, &mut true).unwrap_or_else(|e| {
            warn!("⚠️ Request '{}' failed: {}", command, e);
            String::new()
        })
    }

    pub fn get_camera_info(&self) -> CameraInfo {
        let reply = self.request(INFO);
        if reply.is_empty() {
            return CameraInfo::default();
        }

        decode_camera_info(&reply).unwrap_or_else(|e| {
            error!("❌ Error decoding camera info: {}", e);
            error!("Raw reply: {}", reply);
            CameraInfo::default()
        })
    }

    /// Current apriltag detections.
    ///
    /// If the connection dropped while waiting for the reply, reconnects and
    /// repeats the request once. A call reconnects at most once, so a cycle
    /// that already reconnected to send is not repeated. Decode failures are
    /// not retried.
    pub fn get_apriltags(&self) -> Vec<ApriltagDetection> {
        let _guard = self.request_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut may_reconnect = true;

        let reply = match self.exchange(FIND_APRILTAGS, &mut may_reconnect) {
            Ok(reply) => reply,
            Err(ClientError::TimeoutNoReply { .. })
                if may_reconnect && !self.transport.is_connected() =>
            {
                warn!("🔌 Connection dropped while waiting for apriltags, retrying once");
                may_reconnect = false;
                if !self.reconnect() {
                    return Vec::new();
                }
                match self.exchange(FIND_APRILTAGS, &mut may_reconnect) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("⚠️ Apriltag retry failed: {}", e);
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                warn!("⚠️ Apriltag request failed: {}", e);
                return Vec::new();
            }
        };

        match decode_apriltags(&reply) {
            Ok(tags) => {
                debug!("🏷️ {} apriltag(s) detected", tags.len());
                tags
            }
            Err(e) => {
                error!("❌ Error decoding apriltags: {}", e);
                error!("Raw reply: {}", reply);
                Vec::new()
            }
        }
    }

    /// Select the active color profile on the sensor
    pub fn switch_color(&self, index: usize) -> bool {
        self.send_command(Command::switch_color(index))
    }

    /// One request cycle. Caller must hold `request_lock`.
    fn exchange(&self, command: &str, may_reconnect: &mut bool) -> Result<String> {
        self.pending.rearm();
        self.send(command, may_reconnect)?;

        match self.pending.wait(self.config.timeout) {
            Some(reply) => {
                debug!("📥 Reply to '{}': {}", command, reply);
                Ok(reply)
            }
            None => Err(ClientError::TimeoutNoReply {
                command: command.to_string(),
                timeout_ms: self.config.timeout.as_millis(),
            }),
        }
    }

    /// Send once; if that fails and the call has not reconnected yet,
    /// reconnect and send again. Clears `may_reconnect` once it is spent.
    fn send(&self, command: &str, may_reconnect: &mut bool) -> Result<()> {
        match self.transport.send_text(command) {
            Ok(()) => Ok(()),
            Err(e) if *may_reconnect => {
                warn!("🔌 Send of '{}' failed ({}), reconnecting", command, e);
                *may_reconnect = false;
                if !self.reconnect() {
                    return Err(ClientError::ConnectionFailure {
                        endpoint: self.config.endpoint.to_string(),
                    });
                }
                // Anything that arrived during the reconnect is not our reply
                self.pending.rearm();
                self.transport.send_text(command).map_err(ClientError::from)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn reconnect(&self) -> bool {
        info!("🔄 Reconnecting to vision sensor at {}", self.config.endpoint);
        self.connect()
    }
}

/// Runs on the transport's I/O thread
fn on_frame(pending: &PendingReply, frame: Frame) {
    match frame {
        Frame::Text(text) => {
            debug!("Received message: {}", text);
            pending.fulfill(text);
        }
        Frame::Binary(data) => {
            debug!("🖼️ Ignoring {} byte binary frame", data.len());
        }
    }
}
