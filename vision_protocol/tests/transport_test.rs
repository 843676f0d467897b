//! Exercises WsTransport against an in-process WebSocket server

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;
use vision_protocol::{ConnectionState, Frame, SendError, Transport, WsTransport};

/// Accepts one client, echoes text back upper-cased, answers "image" with
/// a binary frame, and hangs up on "bye".
fn spawn_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind echo server");
    let address = listener.local_addr().expect("No local address");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            thread::spawn(move || {
                let mut ws = match tungstenite::accept(stream) {
                    Ok(ws) => ws,
                    Err(e) => {
                        println!("❌ Handshake error: {}", e);
                        return;
                    }
                };
                loop {
                    match ws.read() {
                        Ok(Message::Text(text)) if text == "bye" => {
                            let _ = ws.close(None);
                            let _ = ws.flush();
                        }
                        Ok(Message::Text(text)) if text == "image" => {
                            let _ = ws.send(Message::Binary(vec![1, 2, 3]));
                        }
                        Ok(Message::Text(text)) => {
                            let _ = ws.send(Message::Text(text.to_uppercase()));
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    }
                }
            });
        }
    });

    format!("ws://{}", address)
}

fn collecting_transport() -> (WsTransport, Arc<Mutex<Vec<Frame>>>) {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    let transport = WsTransport::new();
    transport.set_frame_handler(Arc::new(move |frame| {
        sink.lock().unwrap().push(frame);
    }));
    (transport, frames)
}

fn wait_for_frames(frames: &Arc<Mutex<Vec<Frame>>>, count: usize) -> Vec<Frame> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if frames.lock().unwrap().len() >= count {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    frames.lock().unwrap().clone()
}

#[test]
fn test_text_round_trip_reaches_handler() {
    env_logger::try_init().ok();

    let endpoint = spawn_echo_server();
    let (transport, frames) = collecting_transport();

    assert!(transport.connect(&endpoint));
    assert_eq!(transport.state(), ConnectionState::Open);

    transport.send_text("info").expect("send should succeed");
    let received = wait_for_frames(&frames, 1);

    assert_eq!(received, vec![Frame::Text("INFO".to_string())]);
}

#[test]
fn test_binary_frames_are_tagged() {
    env_logger::try_init().ok();

    let endpoint = spawn_echo_server();
    let (transport, frames) = collecting_transport();

    assert!(transport.connect(&endpoint));
    transport.send_text("image").unwrap();

    let received = wait_for_frames(&frames, 1);
    assert_eq!(received, vec![Frame::Binary(vec![1, 2, 3])]);
}

#[test]
fn test_server_close_marks_transport_disconnected() {
    env_logger::try_init().ok();

    let endpoint = spawn_echo_server();
    let (transport, _frames) = collecting_transport();

    assert!(transport.connect(&endpoint));
    transport.send_text("bye").unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while transport.is_connected() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert!(!transport.is_connected());
    assert_eq!(transport.state(), ConnectionState::Closed);
    assert_eq!(transport.send_text("info"), Err(SendError::NotConnected));

    // A fresh connect recovers
    assert!(transport.connect(&endpoint));
    assert!(transport.is_connected());
}

#[test]
fn test_connect_to_closed_port_fails() {
    env_logger::try_init().ok();

    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = WsTransport::new();
    assert!(!transport.connect(&format!("ws://127.0.0.1:{}", port)));
    assert!(!transport.is_connected());
}

#[test]
fn test_explicit_close() {
    env_logger::try_init().ok();

    let endpoint = spawn_echo_server();
    let (transport, _frames) = collecting_transport();

    assert!(transport.connect(&endpoint));
    transport.close();

    assert!(!transport.is_connected());
    assert_eq!(transport.state(), ConnectionState::Closed);
}
