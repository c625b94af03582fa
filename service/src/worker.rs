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

//! Connection worker implementation
//!
//! The ConnectionWorker drives a single TCP client through the shared console core:
//! - socket reads become `receive` events
//! - a fixed interval produces `poll` ticks
//! - end of stream and read errors end the session
//!
//! Writes never happen under the core lock. [`TcpTransport`] only places chunks on a queue,
//! and a writer task drains that queue into the socket. Application data is limited to a
//! window of unwritten bytes; once it is exceeded `send` reports
//! [`TransportError::WouldBlock`], which leaves data in the outbound buffer for a later flush.
//! Session output from the console (echo, prompts, negotiation) is always queued.

use crate::console::lock_console;
use crate::{ConnectionId, ConsoleServer, Result, ServerConfig, Transport, TransportError};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, instrument, trace, warn};

/// Size of a single socket read
const READ_CHUNK: usize = 1024;

/// Transport over an accepted TCP connection
pub struct TcpTransport {
    queue: mpsc::UnboundedSender<Bytes>,
    /// Bytes queued but not yet written to the socket
    queued: Arc<AtomicUsize>,
    window: usize,
    close: Arc<Notify>,
    peer: SocketAddr,
}

impl TcpTransport {
    fn enqueue(&self, data: &[u8]) -> std::result::Result<(), TransportError> {
        self.queued.fetch_add(data.len(), Ordering::AcqRel);
        if self.queue.send(Bytes::copy_from_slice(data)).is_err() {
            self.queued.fetch_sub(data.len(), Ordering::AcqRel);
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8], more: bool) -> std::result::Result<(), TransportError> {
        let queued = self.queued.load(Ordering::Acquire);
        // A single chunk larger than the window still goes out once the queue is empty
        if queued > 0 && queued + data.len() > self.window {
            return Err(TransportError::WouldBlock);
        }
        trace!(peer = %self.peer, len = data.len(), more, queued, "Queueing chunk");
        self.enqueue(data)
    }

    fn send_control(&mut self, data: &[u8]) -> std::result::Result<(), TransportError> {
        trace!(peer = %self.peer, len = data.len(), "Queueing session output");
        self.enqueue(data)
    }

    fn close(&mut self) {
        self.close.notify_one();
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.peer)
            .field("queued", &self.queued.load(Ordering::Relaxed))
            .field("window", &self.window)
            .finish()
    }
}

/// Connection worker that manages a single connection's lifecycle
pub(crate) struct ConnectionWorker {
    id: ConnectionId,
    core: Arc<Mutex<ConsoleServer<TcpTransport>>>,
    stream: TcpStream,
    queue: mpsc::UnboundedReceiver<Bytes>,
    queued: Arc<AtomicUsize>,
    close: Arc<Notify>,
    poll_interval: Duration,
}

impl ConnectionWorker {
    /// Offers `stream` to the console core.
    ///
    /// Fails with [`ServiceError::AdmissionRejected`](crate::ServiceError::AdmissionRejected)
    /// while another client is connected; the stream is dropped by the caller in that case.
    pub(crate) fn admit(
        core: &Arc<Mutex<ConsoleServer<TcpTransport>>>,
        stream: TcpStream,
        peer: SocketAddr,
        config: &ServerConfig,
    ) -> Result<Self> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));
        let close = Arc::new(Notify::new());
        let transport = TcpTransport {
            queue: queue_tx,
            queued: queued.clone(),
            window: config.send_window,
            close: close.clone(),
            peer,
        };
        let id = lock_console(core).accept(transport)?;
        Ok(Self {
            id,
            core: core.clone(),
            stream,
            queue: queue_rx,
            queued,
            close,
            poll_interval: config.poll_interval,
        })
    }

    /// Run the worker until the session ends
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub(crate) async fn run(self) {
        let Self {
            id,
            core,
            stream,
            mut queue,
            queued,
            close,
            poll_interval,
        } = self;
        let (mut reader, mut writer) = stream.into_split();

        // Ends once the transport, and with it the queue sender, is dropped by the core
        let writer_task = tokio::spawn(async move {
            while let Some(chunk) = queue.recv().await {
                if let Err(error) = writer.write_all(&chunk).await {
                    debug!(%error, "Socket write failed");
                    break;
                }
                queued.fetch_sub(chunk.len(), Ordering::AcqRel);
            }
            let _ = writer.shutdown().await;
        });

        let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            select! {
                _ = close.notified() => {
                    debug!("Connection closed by server");
                    break;
                }
                result = reader.read(&mut buf) => match result {
                    Ok(0) => {
                        let _ = lock_console(&core).closed(id);
                        break;
                    }
                    Ok(len) => {
                        let result = lock_console(&core).receive(id, &buf[..len]);
                        match result {
                            Ok(()) => {}
                            Err(error) if error.is_connection_error() => break,
                            Err(error) => warn!(%error, "Receive incomplete"),
                        }
                    }
                    Err(error) => {
                        let _ = lock_console(&core).error(id, TransportError::from(error));
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let result = lock_console(&core).poll(id);
                    if result.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = writer_task.await;
        debug!("Worker finished");
    }
}

impl std::fmt::Debug for ConnectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWorker")
            .field("id", &self.id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
