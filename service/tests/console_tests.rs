//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Session tests for ConsoleServer driven through a recording transport

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use telcon_service::{
    AuthOutcome, CallbackHandler, ConnectionId, ConnectionState, ConsoleServer, DEFAULT_BANNER,
    OverlongPolicy, ServerConfig, ServerMode, ServiceError, Transport, TransportError,
};

const LOGIN_PROMPT: &[u8] = b"\r\nlogin: ";
const PASSWORD_PROMPT: &[u8] = b"\r\npassword: ";
const LOGIN_FAILED: &[u8] = b"\r\nLogin failed.\r\n";
const LOGIN_SUCCESSFUL: &[u8] = b"\r\nLogin successful.\r\n";

/// IAC DO SGA, IAC WILL ECHO, IAC WONT LINEMODE
const HANDSHAKE: &[u8] = &[255, 253, 3, 255, 251, 1, 255, 252, 34];

// ============================================================================
// Recording Transport
// ============================================================================

#[derive(Default)]
struct WireState {
    sent: Vec<u8>,
    sends: Vec<(usize, bool)>,
    closed: bool,
    /// Remaining send calls the transport accepts, unlimited when `None`
    window: Option<usize>,
}

#[derive(Clone, Default)]
struct Wire(Arc<Mutex<WireState>>);

impl Wire {
    fn transport(&self, port: u16) -> RecordingTransport {
        RecordingTransport {
            wire: self.clone(),
            peer: SocketAddr::from(([192, 168, 1, 20], port)),
        }
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.0.lock().unwrap().sent)
    }

    fn sends(&self) -> Vec<(usize, bool)> {
        self.0.lock().unwrap().sends.clone()
    }

    fn closed(&self) -> bool {
        self.0.lock().unwrap().closed
    }

    fn set_window(&self, window: Option<usize>) {
        self.0.lock().unwrap().window = window;
    }
}

struct RecordingTransport {
    wire: Wire,
    peer: SocketAddr,
}

impl Transport for RecordingTransport {
    fn send(&mut self, data: &[u8], more: bool) -> Result<(), TransportError> {
        let mut state = self.wire.0.lock().unwrap();
        match state.window {
            Some(0) => return Err(TransportError::WouldBlock),
            Some(remaining) => state.window = Some(remaining - 1),
            None => {}
        }
        state.sent.extend_from_slice(data);
        state.sends.push((data.len(), more));
        Ok(())
    }

    fn close(&mut self) {
        self.wire.0.lock().unwrap().closed = true;
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

fn check_bob(login: &[u8], password: &[u8]) -> AuthOutcome {
    match (login, password) {
        (b"bob", b"secret") => AuthOutcome::Success,
        (b"bob", _) => AuthOutcome::Failure,
        _ => AuthOutcome::Error,
    }
}

fn telnet_auth_config() -> ServerConfig {
    ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_authenticator(check_bob)
}

/// Accepts a Telnet client, answers the handshake and ticks into the login phase
fn at_login(config: ServerConfig) -> (ConsoleServer<RecordingTransport>, ConnectionId, Wire) {
    let mut server = ConsoleServer::new(config).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.receive(id, &[255, 251, 3]).unwrap();
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);
    wire.take();
    (server, id, wire)
}

// ============================================================================
// Raw Mode
// ============================================================================

#[test]
fn test_raw_mode_connects_on_first_tick() {
    let mut server = ConsoleServer::new(ServerConfig::default()).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();

    assert_eq!(server.state(), ConnectionState::Accept);
    assert_eq!(server.state_name(), "accept");
    assert!(wire.take().is_empty());

    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::Connect);
    assert_eq!(wire.take(), DEFAULT_BANNER.as_bytes());

    // Further ticks never repeat the banner
    server.poll(id).unwrap();
    server.poll(id).unwrap();
    assert!(wire.take().is_empty());
}

#[test]
fn test_raw_mode_never_sends_telnet_bytes() {
    let mut server = ConsoleServer::new(ServerConfig::default().without_banner()).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.poll(id).unwrap();

    // Command sequences are plain data in raw mode
    server.receive(id, &[255, 253, 1, b'x']).unwrap();
    assert_eq!(server.inbound().used(), 4);
    assert_eq!(server.write(b"out"), 3);
    assert!(!wire.take().contains(&255));
}

// ============================================================================
// Telnet Login
// ============================================================================

#[test]
fn test_telnet_handshake_and_settle() {
    let mut server = ConsoleServer::new(telnet_auth_config()).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    assert_eq!(wire.take(), HANDSHAKE);

    // No negotiation has been seen yet, so the session waits
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::Accept);

    // WILL SGA was already asked for with DO, so nothing is sent back
    server.receive(id, &[255, 251, 3]).unwrap();
    assert!(wire.take().is_empty());

    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);
    let mut expected = DEFAULT_BANNER.as_bytes().to_vec();
    expected.extend_from_slice(LOGIN_PROMPT);
    assert_eq!(wire.take(), expected);
}

#[test]
fn test_telnet_login_success() {
    let (mut server, id, wire) = at_login(telnet_auth_config());

    server.receive(id, b"bob\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::AuthPassword);
    let mut expected = b"bob\r\n".to_vec();
    expected.extend_from_slice(PASSWORD_PROMPT);
    assert_eq!(wire.take(), expected);

    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Connect);
    assert!(server.is_connected());
    assert_eq!(wire.take(), LOGIN_SUCCESSFUL);
    assert!(server.inbound().is_empty());
    assert_eq!(server.failed_logins(), 0);
}

#[test]
fn test_telnet_login_failure_returns_to_accept() {
    let (mut server, id, wire) = at_login(telnet_auth_config());

    server.receive(id, b"bob\r\n").unwrap();
    server.receive(id, b"wrong\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Accept);
    assert_eq!(server.failed_logins(), 1);
    let sent = wire.take();
    assert!(sent.ends_with(LOGIN_FAILED));
    assert!(!sent.windows(5).any(|window| window == b"wrong"));

    // The next tick offers a fresh login
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);
    assert!(wire.take().ends_with(LOGIN_PROMPT));
}

#[test]
fn test_unknown_user_fails_login() {
    let (mut server, id, wire) = at_login(telnet_auth_config());
    server.receive(id, b"eve\r\nsecret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::AuthPassword);

    // The rest of the event was discarded with the login line
    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Accept);
    assert!(wire.take().ends_with(LOGIN_FAILED));
}

#[test]
fn test_negotiation_answered_during_login() {
    let (mut server, id, wire) = at_login(telnet_auth_config());
    // DO BINARY is supported, WILL NAWS is declined
    server.receive(id, &[255, 253, 0, 255, 251, 31]).unwrap();
    assert_eq!(wire.take(), [255, 251, 0, 255, 254, 31]);
    assert_eq!(server.state(), ConnectionState::AuthLogin);
}

// ============================================================================
// Credential Limits
// ============================================================================

#[test]
fn test_overlong_login_truncated() {
    let config = ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_credential_limits(3, 16)
        .with_authenticator(check_bob);
    let (mut server, id, _wire) = at_login(config);
    server.receive(id, b"bobcat\r\n").unwrap();
    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Connect);
}

#[test]
fn test_overlong_login_rejected() {
    let config = ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_credential_limits(3, 16)
        .with_overlong_policy(OverlongPolicy::Reject)
        .with_authenticator(check_bob);
    let (mut server, id, wire) = at_login(config);
    server.receive(id, b"bobcat\r\n").unwrap();
    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Accept);
    assert!(wire.take().ends_with(LOGIN_FAILED));
}

// ============================================================================
// Login Throttling
// ============================================================================

#[test]
fn test_throttle_holds_login_prompt() {
    let config = telnet_auth_config().with_login_throttle(2, 3);
    let (mut server, id, _wire) = at_login(config);

    // First failure is below the threshold
    server.receive(id, b"bob\r\nx").unwrap();
    server.receive(id, b"x\r\n").unwrap();
    assert_eq!(server.failed_logins(), 1);
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);

    // Second failure reaches it and holds the prompt for three ticks
    server.receive(id, b"bob\r\n").unwrap();
    server.receive(id, b"x\r\n").unwrap();
    assert_eq!(server.failed_logins(), 2);
    for _ in 0..3 {
        server.poll(id).unwrap();
        assert_eq!(server.state(), ConnectionState::Accept);
    }
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);

    // Third failure holds it twice as long
    server.receive(id, b"bob\r\n").unwrap();
    server.receive(id, b"x\r\n").unwrap();
    for _ in 0..6 {
        server.poll(id).unwrap();
        assert_eq!(server.state(), ConnectionState::Accept);
    }
    server.poll(id).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthLogin);
}

// ============================================================================
// Admission
// ============================================================================

#[test]
fn test_second_connection_rejected() {
    let mut server = ConsoleServer::new(ServerConfig::default().without_banner()).unwrap();
    let first = Wire::default();
    let id = server.accept(first.transport(5000)).unwrap();
    server.poll(id).unwrap();
    server.receive(id, b"abc").unwrap();

    let second = Wire::default();
    let result = server.accept(second.transport(5001));
    assert!(matches!(result, Err(ServiceError::AdmissionRejected)));
    assert!(second.closed());

    // The live session is untouched
    assert!(!first.closed());
    assert_eq!(server.connection_id(), Some(id));
    assert_eq!(server.state(), ConnectionState::Connect);
    assert_eq!(server.inbound().used(), 3);
    assert_eq!(
        server.peer_address(),
        Some(SocketAddr::from(([192, 168, 1, 20], 5000)))
    );
}

#[test]
fn test_accept_after_close_resets_session() {
    let mut server = ConsoleServer::new(ServerConfig::default().without_banner()).unwrap();
    let first = Wire::default();
    let id = server.accept(first.transport(5000)).unwrap();
    server.poll(id).unwrap();
    server.receive(id, b"left over").unwrap();
    server.queue_outbound(b"pending", false).unwrap();

    server.closed(id).unwrap();
    assert!(first.closed());
    assert_eq!(server.state(), ConnectionState::None);

    let second = Wire::default();
    let next = server.accept(second.transport(5001)).unwrap();
    assert_ne!(next, id);
    assert!(server.inbound().is_empty());
    assert!(server.outbound().is_empty());

    // Events for the old connection are ignored
    assert!(matches!(
        server.receive(id, b"late"),
        Err(ServiceError::StaleConnection(_))
    ));
    assert!(server.inbound().is_empty());
}

#[test]
fn test_transport_error_ends_session_without_close() {
    let mut server = ConsoleServer::new(ServerConfig::default()).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server
        .error(id, TransportError::Io(std::io::ErrorKind::TimedOut))
        .unwrap();
    assert_eq!(server.state(), ConnectionState::None);
    assert!(!wire.closed());
    assert!(!server.disconnect());
}

#[test]
fn test_login_longer_than_inbound_truncated() {
    let config = ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_buffer_capacities(64, 64)
        .with_authenticator(|login: &[u8], password: &[u8]| {
            if login == [b'a'; 32] && password == b"secret" {
                AuthOutcome::Success
            } else {
                AuthOutcome::Failure
            }
        });
    let (mut server, id, wire) = at_login(config);

    let mut line = vec![b'a'; 100];
    line.extend_from_slice(b"\r\n");
    server.receive(id, &line).unwrap();
    assert_eq!(server.state(), ConnectionState::AuthPassword);
    assert!(wire.take().starts_with(&line));

    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Connect);
    assert!(server.inbound().is_empty());
}

#[test]
fn test_login_longer_than_inbound_rejected() {
    let config = ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_buffer_capacities(64, 64)
        .with_overlong_policy(OverlongPolicy::Reject)
        .with_authenticator(check_bob);
    let (mut server, id, wire) = at_login(config);

    server.receive(id, &[b'a'; 100]).unwrap();
    server.receive(id, b"\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::AuthPassword);
    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(server.state(), ConnectionState::Accept);
    assert!(wire.take().ends_with(LOGIN_FAILED));
}

#[test]
fn test_password_longer_than_inbound_capacity() {
    let config = ServerConfig::default()
        .with_mode(ServerMode::Telnet)
        .with_buffer_capacities(16, 16)
        .with_authenticator(|login: &[u8], password: &[u8]| {
            // One slot of the inbound buffer stays free for the terminator
            if login == b"bob" && password == [b'p'; 15] {
                AuthOutcome::Success
            } else {
                AuthOutcome::Failure
            }
        });
    let (mut server, id, _wire) = at_login(config);

    server.receive(id, b"bob\r\n").unwrap();
    let mut line = vec![b'p'; 40];
    line.extend_from_slice(b"\r\n");
    server.receive(id, &line).unwrap();
    assert_eq!(server.state(), ConnectionState::Connect);
}

// ============================================================================
// Outbound Flushing
// ============================================================================

#[test]
fn test_flush_outbound_only_when_connected() {
    let config = ServerConfig::default()
        .without_banner()
        .with_auto_flush(false)
        .with_buffer_capacities(16, 8);
    let mut server = ConsoleServer::new(config).unwrap();
    assert_eq!(server.flush_outbound(), 0);

    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.queue_outbound(b"abcdef", false).unwrap();
    assert_eq!(server.flush_outbound(), 0);

    server.poll(id).unwrap();
    assert_eq!(server.flush_outbound(), 1);
    assert_eq!(wire.take(), b"abcdef");

    // Wrapped data leaves in two chunks, the first flagged as having more behind it
    server.queue_outbound(b"ghijkl", false).unwrap();
    assert_eq!(server.flush_outbound(), 2);
    assert_eq!(wire.take(), b"ghijkl");
    assert_eq!(wire.sends()[1..], [(2, true), (4, false)]);
}

#[test]
fn test_flush_outbound_leaves_refused_data() {
    let config = ServerConfig::default()
        .without_banner()
        .with_auto_flush(false)
        .with_buffer_capacities(16, 8);
    let mut server = ConsoleServer::new(config).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.poll(id).unwrap();

    server.queue_outbound(b"abcdef", false).unwrap();
    server.flush_outbound();
    wire.take();

    server.queue_outbound(b"ghijkl", false).unwrap();
    wire.set_window(Some(1));
    assert_eq!(server.flush_outbound(), 1);
    assert_eq!(server.outbound().used(), 4);
    assert_eq!(wire.take(), b"gh");

    wire.set_window(None);
    assert_eq!(server.flush_outbound(), 1);
    assert!(server.outbound().is_empty());
    assert_eq!(wire.take(), b"ijkl");
}

#[test]
fn test_auto_flush_on_tick() {
    let mut server = ConsoleServer::new(ServerConfig::default().without_banner()).unwrap();
    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.queue_outbound(b"log line", false).unwrap();

    assert_eq!(server.poll(id).unwrap(), 1);
    assert_eq!(wire.take(), b"log line");
}

#[test]
fn test_queue_outbound_overwrite() {
    let config = ServerConfig::default().with_buffer_capacities(8, 4);
    let mut server: ConsoleServer<RecordingTransport> = ConsoleServer::new(config).unwrap();
    server.queue_outbound(b"ABCD", false).unwrap();
    assert!(server.queue_outbound(b"E", false).is_err());
    server.queue_outbound(b"E", true).unwrap();
    let stored: Vec<u8> = (0..4)
        .map(|offset| server.outbound().peek_byte(offset).unwrap())
        .collect();
    assert_eq!(stored, b"BCDE");
}

// ============================================================================
// Handler Notifications
// ============================================================================

#[test]
fn test_handler_notifications() {
    let connects = Arc::new(AtomicUsize::new(0));
    let available = Arc::new(AtomicUsize::new(0));
    let disconnects = Arc::new(AtomicUsize::new(0));

    let mut server = ConsoleServer::new(telnet_auth_config()).unwrap();
    let handler = CallbackHandler {
        on_connect: Some(Box::new({
            let connects = connects.clone();
            move |_: ConnectionId, peer: Option<SocketAddr>| {
                assert!(peer.is_some());
                connects.fetch_add(1, Ordering::SeqCst);
            }
        })),
        on_data_available: Some(Box::new({
            let available = available.clone();
            move |_: ConnectionId| {
                available.fetch_add(1, Ordering::SeqCst);
            }
        })),
        on_disconnect: Some(Box::new({
            let disconnects = disconnects.clone();
            move |_: ConnectionId| {
                disconnects.fetch_add(1, Ordering::SeqCst);
            }
        })),
    };
    server.set_handler(handler);

    let wire = Wire::default();
    let id = server.accept(wire.transport(5000)).unwrap();
    server.receive(id, &[255, 251, 3]).unwrap();
    server.poll(id).unwrap();

    // Credentials are not application data
    server.receive(id, b"bob\r\n").unwrap();
    server.receive(id, b"secret\r\n").unwrap();
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert_eq!(available.load(Ordering::SeqCst), 0);

    server.receive(id, b"ls\r\n").unwrap();
    assert_eq!(available.load(Ordering::SeqCst), 1);

    assert!(server.disconnect());
    assert!(wire.closed());
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}
