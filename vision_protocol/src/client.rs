use crate::frame::{Frame, FrameHandler};
use crate::transport::{ConnectionState, ProtocolError, SendError, Transport};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, trace, warn};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tungstenite::protocol::CloseFrame;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{HandshakeError, Message, WebSocket};
use url::Url;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// TCP connect + WebSocket handshake budget
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
/// How long a read blocks before the I/O thread checks for outbound frames
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Time allowed for the close handshake before the socket is dropped
const CLOSE_GRACE: Duration = Duration::from_millis(250);

enum Outbound {
    Text(String),
    Close,
}

/// Direction flags shared with the I/O thread
#[derive(Debug)]
struct LinkFlags {
    input_open: AtomicBool,
    output_open: AtomicBool,
}

impl LinkFlags {
    fn open() -> Self {
        Self {
            input_open: AtomicBool::new(true),
            output_open: AtomicBool::new(true),
        }
    }

    fn is_open(&self) -> bool {
        self.input_open.load(Ordering::SeqCst) && self.output_open.load(Ordering::SeqCst)
    }

    fn shut(&self) {
        self.input_open.store(false, Ordering::SeqCst);
        self.output_open.store(false, Ordering::SeqCst);
    }
}

/// One live connection: the outbound queue and the thread that owns the socket
struct Link {
    outbound: Sender<Outbound>,
    flags: Arc<LinkFlags>,
    io_thread: Option<JoinHandle<()>>,
}

impl Link {
    fn shutdown(mut self) {
        // The thread may already be gone; a failed send just means nothing to stop
        let _ = self.outbound.send(Outbound::Close);
        if let Some(handle) = self.io_thread.take() {
            if handle.join().is_err() {
                error!("❌ Sensor I/O thread panicked");
            }
        }
        self.flags.shut();
    }
}

/// Blocking WebSocket transport backed by `tungstenite`.
///
/// `connect` performs the handshake on the calling thread, then hands the
/// socket to a dedicated I/O thread. That thread forwards outbound text
/// frames from a channel and delivers every inbound frame to the registered
/// [`FrameHandler`].
pub struct WsTransport {
    handler: Mutex<Option<FrameHandler>>,
    link: Mutex<Option<Link>>,
    state: Mutex<ConnectionState>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            link: Mutex::new(None),
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Current connection state; an open link whose I/O thread has
    /// observed a close reports `Closed`.
    pub fn state(&self) -> ConnectionState {
        let state = *lock(&self.state);
        if state == ConnectionState::Open && !self.is_connected() {
            ConnectionState::Closed
        } else {
            state
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *lock(&self.state) = state;
    }

    fn open_socket(endpoint: &str) -> Result<Socket, ProtocolError> {
        let url = Url::parse(endpoint).map_err(|e| ProtocolError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ProtocolError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: format!("unsupported scheme '{}'", other),
                })
            }
        }

        let stream = Self::connect_tcp(&url)?;
        stream.set_read_timeout(Some(CONNECT_TIMEOUT))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;

        let (mut socket, response) =
            tungstenite::client_tls(url.as_str(), stream).map_err(|e| match e {
                HandshakeError::Failure(e) => ProtocolError::WebSocket(e),
                HandshakeError::Interrupted(_) => {
                    ProtocolError::Handshake(format!("no response within {:?}", CONNECT_TIMEOUT))
                }
            })?;
        debug!("🤝 Handshake complete, status: {}", response.status());

        // From here on reads only block for one poll interval
        set_read_timeout(socket.get_mut(), POLL_INTERVAL)?;
        Ok(socket)
    }

    fn connect_tcp(url: &Url) -> Result<TcpStream, ProtocolError> {
        let addrs = url.socket_addrs(|| None)?;
        let mut last_error = None;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("TCP connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => ProtocolError::Io(e),
            None => ProtocolError::InvalidEndpoint {
                endpoint: url.to_string(),
                reason: "host did not resolve to any address".to_string(),
            },
        })
    }

    fn take_link(&self) -> Option<Link> {
        lock(&self.link).take()
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WsTransport {
    fn set_frame_handler(&self, handler: FrameHandler) {
        *lock(&self.handler) = Some(handler);
    }

    fn connect(&self, endpoint: &str) -> bool {
        if let Some(old) = self.take_link() {
            debug!("🔄 Dropping previous connection before reconnecting");
            old.shutdown();
        }

        info!("📡 Connecting to vision sensor at {}", endpoint);
        self.set_state(ConnectionState::Connecting);

        let socket = match Self::open_socket(endpoint) {
            Ok(socket) => socket,
            Err(e) => {
                error!("❌ Failed to connect to {}: {}", endpoint, e);
                self.set_state(ConnectionState::Disconnected);
                return false;
            }
        };

        let (outbound_tx, outbound_rx) = crossbeam_channel::unbounded();
        let flags = Arc::new(LinkFlags::open());
        let handler = lock(&self.handler).clone();
        let thread_flags = Arc::clone(&flags);

        let spawned = thread::Builder::new()
            .name("vision-sensor-io".to_string())
            .spawn(move || run_io_loop(socket, outbound_rx, thread_flags, handler));

        let io_thread = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!("❌ Failed to start sensor I/O thread: {}", e);
                self.set_state(ConnectionState::Disconnected);
                return false;
            }
        };

        *lock(&self.link) = Some(Link {
            outbound: outbound_tx,
            flags,
            io_thread: Some(io_thread),
        });
        self.set_state(ConnectionState::Open);
        on_open(endpoint);

        self.is_connected()
    }

    fn is_connected(&self) -> bool {
        lock(&self.link)
            .as_ref()
            .map(|link| link.flags.is_open())
            .unwrap_or(false)
    }

    fn send_text(&self, payload: &str) -> Result<(), SendError> {
        let guard = lock(&self.link);
        let link = guard.as_ref().ok_or(SendError::NotConnected)?;

        if !link.flags.is_open() {
            return Err(SendError::NotConnected);
        }

        link.outbound
            .send(Outbound::Text(payload.to_string()))
            .map_err(|_| SendError::ConnectionClosed)?;
        trace!("📤 Queued text frame: {}", payload);
        Ok(())
    }

    fn close(&self) {
        if let Some(link) = self.take_link() {
            link.shutdown();
            self.set_state(ConnectionState::Closed);
            info!("🔚 Sensor connection closed");
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_read_timeout(stream: &mut MaybeTlsStream<TcpStream>, timeout: Duration) -> std::io::Result<()> {
    match stream {
        MaybeTlsStream::Plain(tcp) => tcp.set_read_timeout(Some(timeout)),
        MaybeTlsStream::NativeTls(tls) => tls.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

fn on_open(endpoint: &str) {
    info!("✅ WebSocket opened to {}", endpoint);
}

fn on_close(frame: Option<&CloseFrame<'_>>) {
    match frame {
        Some(frame) => info!(
            "🔚 WebSocket closed with status {} and reason '{}'",
            u16::from(frame.code),
            frame.reason
        ),
        None => info!("🔚 WebSocket closed without a status"),
    }
}

fn is_poll_timeout(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::Io(e)
            if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut
    )
}

/// Owns the socket for the lifetime of one connection
fn run_io_loop(
    mut socket: Socket,
    outbound: Receiver<Outbound>,
    flags: Arc<LinkFlags>,
    handler: Option<FrameHandler>,
) {
    debug!("🧵 Sensor I/O thread started");

    'io: loop {
        loop {
            match outbound.try_recv() {
                Ok(Outbound::Text(payload)) => {
                    if let Err(e) = socket.send(Message::Text(payload)) {
                        warn!("❌ WebSocket send failed: {}", e);
                        flags.shut();
                        break 'io;
                    }
                }
                Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => {
                    flags.output_open.store(false, Ordering::SeqCst);
                    close_gracefully(&mut socket);
                    flags.shut();
                    break 'io;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => dispatch(&handler, Frame::Text(text)),
            Ok(Message::Binary(data)) => dispatch(&handler, Frame::Binary(data)),
            Ok(Message::Close(frame)) => {
                on_close(frame.as_ref());
                flags.input_open.store(false, Ordering::SeqCst);
                // Flushes the close reply tungstenite queued for us
                let _ = socket.flush();
                flags.shut();
                break;
            }
            Ok(_) => {
                // Ping/pong are answered by tungstenite itself
            }
            Err(ref e) if is_poll_timeout(e) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                info!("🔌 Connection closed by sensor");
                flags.shut();
                break;
            }
            Err(e) => {
                warn!("❌ WebSocket read error: {}", e);
                flags.shut();
                break;
            }
        }
    }

    debug!("🧵 Sensor I/O thread exiting");
}

fn dispatch(handler: &Option<FrameHandler>, frame: Frame) {
    if frame.is_empty() {
        debug!("📨 Received empty {} frame", frame.kind());
    } else {
        debug!("📨 Received {} frame ({} bytes)", frame.kind(), frame.len());
    }
    match handler {
        Some(handler) => handler(frame),
        None => trace!("No frame handler registered, dropping {} frame", frame.kind()),
    }
}

fn close_gracefully(socket: &mut Socket) {
    if let Err(e) = socket.close(None) {
        debug!("Close frame not sent: {}", e);
        return;
    }

    let deadline = Instant::now() + CLOSE_GRACE;
    while Instant::now() < deadline {
        match socket.read() {
            Ok(_) => continue,
            Err(ref e) if is_poll_timeout(e) => continue,
            Err(_) => break,
        }
    }
}
