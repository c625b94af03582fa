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

//! Console server implementation
//!
//! The TelnetServer is the tokio entry point for the console. It owns the TCP listener,
//! hands each accepted socket to a connection worker and exposes the shared
//! [`ConsoleServer`] core through a [`ConsoleHandle`].

use crate::console::lock_console;
use crate::worker::{ConnectionWorker, TcpTransport};
use crate::{
    ConnectionState, ConsoleHandle, ConsoleHandler, ConsoleServer, Result, ServerConfig,
    ServiceError,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Single-session console server over TCP
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
/// use telcon_service::{ServerConfig, ServerMode, TelnetServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::new("127.0.0.1:2323".parse()?).with_mode(ServerMode::Telnet);
///     let server = TelnetServer::new(config)?;
///     server.start().await?;
///
///     let mut console = server.console();
///     let mut buf = [0u8; 64];
///     if let Ok(len) = console.read(&mut buf) {
///         println!("received {} bytes", len);
///     }
///
///     server.stop().await?;
///     Ok(())
/// }
/// ```
pub struct TelnetServer {
    /// Server configuration
    config: ServerConfig,
    /// Shared console core
    core: Arc<Mutex<ConsoleServer<TcpTransport>>>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Shutdown notification
    shutdown_notify: Arc<Notify>,
    /// Actual bind address while running
    local_addr: Mutex<Option<SocketAddr>>,
    /// Accept loop task handle
    accept_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TelnetServer {
    /// Create a new server with the given configuration
    ///
    /// This validates the configuration and allocates both buffers but does not bind.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let core = ConsoleServer::new(config.clone())?;
        Ok(Self {
            config,
            core: Arc::new(Mutex::new(core)),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            local_addr: Mutex::new(None),
            accept_handle: tokio::sync::Mutex::new(None),
        })
    }

    /// Install the handler notified of connects, disconnects and received data
    pub fn set_handler(&self, handler: impl ConsoleHandler) {
        lock_console(&self.core).set_handler(handler);
    }

    /// Bind the listener and start accepting connections
    ///
    /// Returns the address actually bound, which differs from the configured one when port 0
    /// was requested.
    #[instrument(skip(self), fields(bind_address = %self.config.bind_address, mode = %self.config.mode))]
    pub async fn start(&self) -> Result<SocketAddr> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning);
        }

        let bound = match TcpListener::bind(self.config.bind_address).await {
            Ok(listener) => listener
                .local_addr()
                .map(|addr| (listener, addr))
                .map_err(ServiceError::Startup),
            Err(error) => Err(ServiceError::Startup(error)),
        };
        let (listener, addr) = match bound {
            Ok(bound) => bound,
            Err(error) => {
                self.running.store(false, Ordering::SeqCst);
                tracing::error!("Failed to start console server: {}", error);
                return Err(error);
            }
        };

        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = Some(addr);
        tracing::info!("Console server listening on {}", addr);

        let handle = self.spawn_accept_loop(listener);
        *self.accept_handle.lock().await = Some(handle);
        Ok(addr)
    }

    /// Spawn the accept loop task
    fn spawn_accept_loop(&self, listener: TcpListener) -> JoinHandle<()> {
        let core = self.core.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let shutdown_notify = self.shutdown_notify.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let accept_result = tokio::select! {
                    result = listener.accept() => result,
                    _ = shutdown_notify.notified() => break,
                };

                match accept_result {
                    Ok((socket, peer)) => {
                        tracing::debug!("Accepted TCP connection from {}", peer);
                        if let Err(e) = socket.set_nodelay(true) {
                            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                        }
                        match ConnectionWorker::admit(&core, socket, peer, &config) {
                            Ok(worker) => {
                                tokio::spawn(worker.run());
                            }
                            // The socket was dropped with the worker, closing it
                            Err(e) => tracing::warn!("Connection from {} refused: {}", peer, e),
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
            tracing::info!("Accept loop terminated");
        })
    }

    /// Stop accepting connections and end the active session
    pub async fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::NotRunning);
        }

        tracing::info!("Stopping console server");
        self.shutdown_notify.notify_one();

        if let Some(mut handle) = self.accept_handle.lock().await.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Accept loop did not stop in time, aborting");
                handle.abort();
            }
        }

        lock_console(&self.core).disconnect();
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = None;
        tracing::info!("Console server stopped");
        Ok(())
    }

    /// Flush as much outbound data as the connection accepts, returning the chunks written
    pub fn flush_outbound(&self) -> usize {
        lock_console(&self.core).flush_outbound()
    }

    /// Check if a client is in the pass-through state
    pub fn is_connected(&self) -> bool {
        lock_console(&self.core).is_connected()
    }

    /// Address of the connected client, if any
    pub fn peer_address(&self) -> Option<SocketAddr> {
        lock_console(&self.core).peer_address()
    }

    /// Close the active connection; returns `false` when there was none
    pub fn disconnect(&self) -> bool {
        lock_console(&self.core).disconnect()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        lock_console(&self.core).state()
    }

    /// Handle for console redirection over the shared core
    pub fn console(&self) -> ConsoleHandle<TcpTransport> {
        ConsoleHandle::from_shared(self.core.clone())
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for TelnetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetServer")
            .field("bind_address", &self.config.bind_address)
            .field("running", &self.is_running())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl Drop for TelnetServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("TelnetServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_one();
            lock_console(&self.core).disconnect();
        }
    }
}
