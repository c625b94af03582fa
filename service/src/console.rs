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

//! Single-session console server core
//!
//! [`ConsoleServer`] is the event-driven heart of the crate. Every transport event is a plain
//! method call (`accept`, `receive`, `sent`, `poll`, `error`, `closed`) that runs to completion
//! without blocking. The TCP driver in [`TelnetServer`](crate::TelnetServer) calls them from
//! its tasks; tests call them directly with an in-memory [`Transport`].
//!
//! At most one client is served. The two ring buffers are allocated once, when the server is
//! created, and reused by every connection.

use crate::buffer::RingBuffer;
use crate::connection::Connection;
use crate::{
    ConnectionId, ConnectionState, ConsoleHandler, Result, ServerConfig, ServiceError, Transport,
    TransportError,
};
use metrics::{counter, gauge};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, trace};

/// The console server core.
///
/// # Example
///
/// ```
/// use telcon_service::{ConsoleServer, ConnectionState, ServerConfig, Transport, TransportError};
/// use std::net::SocketAddr;
///
/// struct Discard;
///
/// impl Transport for Discard {
///     fn send(&mut self, _data: &[u8], _more: bool) -> Result<(), TransportError> {
///         Ok(())
///     }
///     fn close(&mut self) {}
///     fn peer_addr(&self) -> Option<SocketAddr> {
///         None
///     }
/// }
///
/// let mut server = ConsoleServer::new(ServerConfig::default()).unwrap();
/// let id = server.accept(Discard).unwrap();
/// server.poll(id).unwrap();
/// assert_eq!(server.state(), ConnectionState::Connect);
///
/// server.receive(id, b"hello").unwrap();
/// let mut buf = [0u8; 16];
/// assert_eq!(server.read(&mut buf), 5);
/// ```
pub struct ConsoleServer<T: Transport> {
    config: ServerConfig,
    inbound: RingBuffer,
    outbound: RingBuffer,
    connection: Option<Connection<T>>,
    last_id: u64,
    handler: Option<Arc<dyn ConsoleHandler>>,
}

impl<T: Transport> ConsoleServer<T> {
    /// Validates `config` and allocates both ring buffers.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let inbound = RingBuffer::with_capacity(config.inbound_capacity)?;
        let outbound = RingBuffer::with_capacity(config.outbound_capacity)?;
        debug!(
            mode = %config.mode,
            inbound = config.inbound_capacity,
            outbound = config.outbound_capacity,
            "Console server initialized"
        );
        Ok(Self {
            config,
            inbound,
            outbound,
            connection: None,
            last_id: 0,
            handler: None,
        })
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Install the event handler, replacing any previous one
    pub fn set_handler(&mut self, handler: impl ConsoleHandler) {
        self.handler = Some(Arc::new(handler));
    }

    /// Remove the event handler
    pub fn clear_handler(&mut self) {
        self.handler = None;
    }

    /// Admits a new client.
    ///
    /// While another client is connected the new transport is closed and
    /// [`ServiceError::AdmissionRejected`] is returned; the live session is not touched.
    /// Otherwise both buffers are cleared, a fresh session starts in
    /// [`ConnectionState::Accept`] and, in Telnet mode, the handshake is sent.
    #[instrument(skip_all)]
    pub fn accept(&mut self, transport: T) -> Result<ConnectionId> {
        let peer = peer_label(transport.peer_addr());
        if let Some(active) = &self.connection {
            error!(
                active = %active.id(),
                "Rejecting connection from {}: a session is already active", peer
            );
            counter!("telcon.connections.rejected").increment(1);
            let mut transport = transport;
            transport.close();
            return Err(ServiceError::AdmissionRejected);
        }

        self.last_id += 1;
        let id = ConnectionId::new(self.last_id);
        self.inbound.wipe();
        self.outbound.reset();

        info!(connection_id = %id, "Client connected: {}", peer);
        counter!("telcon.connections.accepted").increment(1);
        gauge!("telcon.connections.active").set(1.0);

        self.connection = Some(Connection::open(id, transport, &self.config));
        Ok(id)
    }

    /// Handles bytes received from the client.
    ///
    /// Returns [`ServiceError::InboundOverflow`] when part of `data` had to be dropped; the
    /// session itself carries on.
    pub fn receive(&mut self, id: ConnectionId, data: &[u8]) -> Result<()> {
        let connection = live(&mut self.connection, self.last_id, id)?;
        trace!(connection_id = %id, len = data.len(), "Data received");
        let before = connection.state();
        let received = connection.receive(data, &mut self.inbound, &self.config);
        let after = connection.state();
        let peer = connection.peer_addr();

        self.notify_transition(id, before, after, peer);
        if after == ConnectionState::Connect && !self.inbound.is_empty() {
            if let Some(handler) = &self.handler {
                handler.on_data_available(id);
            }
        }

        if received.dropped > 0 {
            return Err(ServiceError::InboundOverflow {
                dropped: received.dropped,
            });
        }
        Ok(())
    }

    /// Notes that the transport delivered `len` bytes.
    pub fn sent(&mut self, id: ConnectionId, len: usize) -> Result<()> {
        live(&mut self.connection, self.last_id, id)?;
        trace!(connection_id = %id, len, "Data sent");
        Ok(())
    }

    /// Periodic tick. Returns the number of outbound chunks flushed.
    pub fn poll(&mut self, id: ConnectionId) -> Result<usize> {
        let connection = live(&mut self.connection, self.last_id, id)?;
        let before = connection.state();
        let chunks = connection.tick(&mut self.outbound, &self.config);
        let after = connection.state();
        let peer = connection.peer_addr();
        self.notify_transition(id, before, after, peer);
        Ok(chunks)
    }

    /// The transport failed. The session ends; the transport is not asked to close because it
    /// is already unusable.
    pub fn error(&mut self, id: ConnectionId, error: TransportError) -> Result<()> {
        live(&mut self.connection, self.last_id, id)?;
        error!(connection_id = %id, %error, "Client connection error");
        self.teardown(false);
        Ok(())
    }

    /// The client closed the connection.
    pub fn closed(&mut self, id: ConnectionId) -> Result<()> {
        let connection = live(&mut self.connection, self.last_id, id)?;
        info!(
            connection_id = %id,
            "Client closed connection: {}",
            peer_label(connection.peer_addr())
        );
        self.teardown(true);
        Ok(())
    }

    /// Ends the current session, if any. Returns whether a session was ended.
    pub fn disconnect(&mut self) -> bool {
        match &self.connection {
            Some(connection) => {
                info!(connection_id = %connection.id(), "Disconnecting client");
                self.teardown(true);
                true
            }
            None => false,
        }
    }

    /// Ends the current session and wipes both buffers.
    pub fn shutdown(&mut self) {
        self.disconnect();
        self.inbound.wipe();
        self.outbound.wipe();
        self.handler = None;
    }

    /// Sends as much queued outbound data as the transport takes.
    ///
    /// Returns the number of chunks handed to the transport, 0 unless a client is in
    /// [`ConnectionState::Connect`]. Refused data stays queued.
    pub fn flush_outbound(&mut self) -> usize {
        match self.connection.as_mut() {
            Some(connection) => connection.flush(&mut self.outbound),
            None => 0,
        }
    }

    /// Appends `data` to the outbound buffer without flushing.
    pub fn queue_outbound(&mut self, data: &[u8], overwrite: bool) -> Result<()> {
        self.outbound.push_bytes(data, overwrite)?;
        Ok(())
    }

    /// Moves received bytes into `buf`. Returns the number of bytes read, 0 when nothing is
    /// available or no client is connected.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.is_connected() {
            return 0;
        }
        let len = buf.len().min(self.inbound.used());
        if len == 0 || self.inbound.pop_bytes(&mut buf[..len]).is_err() {
            return 0;
        }
        len
    }

    /// Queues as much of `data` as fits and flushes immediately. Returns the number of bytes
    /// queued, 0 when the buffer is full or no client is connected.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if !self.is_connected() {
            return 0;
        }
        let len = data.len().min(self.outbound.free());
        if len == 0 || self.outbound.push_bytes(&data[..len], false).is_err() {
            return 0;
        }
        self.flush_outbound();
        len
    }

    /// Current session state
    pub fn state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map_or(ConnectionState::None, Connection::state)
    }

    /// Human readable name of the current state
    pub fn state_name(&self) -> &'static str {
        self.state().name()
    }

    /// Check if a client is in the pass-through state
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// ID of the current connection
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(Connection::id)
    }

    /// Address of the connected client
    pub fn peer_address(&self) -> Option<SocketAddr> {
        self.connection.as_ref().and_then(Connection::peer_addr)
    }

    /// Failed logins on the current connection
    pub fn failed_logins(&self) -> u32 {
        self.connection
            .as_ref()
            .map_or(0, Connection::failed_logins)
    }

    /// The inbound buffer
    pub fn inbound(&self) -> &RingBuffer {
        &self.inbound
    }

    /// The outbound buffer
    pub fn outbound(&self) -> &RingBuffer {
        &self.outbound
    }

    fn notify_transition(
        &self,
        id: ConnectionId,
        before: ConnectionState,
        after: ConnectionState,
        peer: Option<SocketAddr>,
    ) {
        if before == after {
            return;
        }
        debug!(connection_id = %id, from = %before, to = %after, "State changed");
        if after == ConnectionState::Connect {
            if let Some(handler) = &self.handler {
                handler.on_connect(id, peer);
            }
        }
    }

    fn teardown(&mut self, close_transport: bool) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let id = connection.id();
        connection.shutdown(close_transport);
        self.inbound.wipe();
        self.outbound.reset();
        gauge!("telcon.connections.active").set(0.0);
        if let Some(handler) = &self.handler {
            handler.on_disconnect(id);
        }
    }
}

impl<T: Transport> std::fmt::Debug for ConsoleServer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleServer")
            .field("state", &self.state())
            .field("connection", &self.connection)
            .field("inbound", &self.inbound)
            .field("outbound", &self.outbound)
            .finish_non_exhaustive()
    }
}

fn live<T: Transport>(
    connection: &mut Option<Connection<T>>,
    last_id: u64,
    id: ConnectionId,
) -> Result<&mut Connection<T>> {
    match connection {
        Some(connection) if connection.id() == id => Ok(connection),
        _ if id.as_u64() <= last_id => {
            trace!(connection_id = %id, "Ignoring event for stale connection");
            Err(ServiceError::StaleConnection(id))
        }
        _ => Err(ServiceError::NoConnection),
    }
}

fn peer_label(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| "unknown".to_string(), |peer| peer.to_string())
}

pub(crate) fn lock_console<T: Transport>(
    core: &Mutex<ConsoleServer<T>>,
) -> MutexGuard<'_, ConsoleServer<T>> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A clonable handle to a shared [`ConsoleServer`] for console redirection.
///
/// Reads take received bytes from the inbound buffer; writes queue bytes and flush them.
/// Both return [`io::ErrorKind::WouldBlock`] when no data is available or no space is left,
/// which includes the time when no client is connected.
pub struct ConsoleHandle<T: Transport> {
    core: Arc<Mutex<ConsoleServer<T>>>,
}

impl<T: Transport> ConsoleHandle<T> {
    /// Wraps a server in a new shared handle
    pub fn new(server: ConsoleServer<T>) -> Self {
        Self::from_shared(Arc::new(Mutex::new(server)))
    }

    pub(crate) fn from_shared(core: Arc<Mutex<ConsoleServer<T>>>) -> Self {
        Self { core }
    }

    /// Locks the server for direct access
    pub fn lock(&self) -> MutexGuard<'_, ConsoleServer<T>> {
        lock_console(&self.core)
    }

    /// Check if a client is in the pass-through state
    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }
}

impl<T: Transport> Clone for ConsoleHandle<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for ConsoleHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleHandle").finish_non_exhaustive()
    }
}

impl<T: Transport> io::Read for ConsoleHandle<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.lock().read(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            len => Ok(len),
        }
    }
}

impl<T: Transport> io::Write for ConsoleHandle<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.lock().write(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            len => Ok(len),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush_outbound();
        Ok(())
    }
}
