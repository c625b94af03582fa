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

//! Single-Session Console Server
//!
//! This crate exposes an embedded application's console over one TCP connection at a time,
//! either as a plain byte stream or speaking a minimal Telnet dialect, with an optional
//! login gate in front of it.
//!
//! # Architecture
//!
//! ```text
//! TelnetServer (tokio listener)
//!     ↓
//! ConnectionWorker (socket reads, poll ticks, writer task)
//!     ↓
//! ConsoleServer (synchronous core: buffers, admission, handler)
//!     ↓
//! Connection (state machine: Accept → AuthLogin → AuthPassword → Connect)
//! ```
//!
//! The [`ConsoleServer`] core never blocks and does no I/O of its own. Everything it emits
//! goes through a [`Transport`], so it can be driven by [`TelnetServer`] or directly from
//! tests and other event loops.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Write;
//! use telcon_service::{AuthOutcome, ServerConfig, ServerMode, TelnetServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("0.0.0.0:2323".parse()?)
//!         .with_mode(ServerMode::Telnet)
//!         .with_authenticator(|login: &[u8], password: &[u8]| match (login, password) {
//!             (b"admin", b"secret") => AuthOutcome::Success,
//!             (b"admin", _) => AuthOutcome::Failure,
//!             _ => AuthOutcome::Error,
//!         });
//!     let server = TelnetServer::new(config)?;
//!     server.start().await?;
//!
//!     let mut console = server.console();
//!     let _ = console.write(b"hello\r\n");
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

mod auth;
mod buffer;
mod config;
mod connection;
mod console;
mod error;
mod handler;
mod server;
mod transport;
mod types;
mod worker;

pub use auth::{
    AuthOutcome, Authenticator, CRYPT_SALT_ALPHABET, PasswordHasher, UserTable, constant_time_eq,
    crypt_settings, generate_salt,
};
pub use buffer::{BufferError, BufferResult, RingBuffer};
pub use config::{DEFAULT_BANNER, DEFAULT_BUFFER_CAPACITY, OverlongPolicy, ServerConfig};
pub use console::{ConsoleHandle, ConsoleServer};
pub use error::{Result, ServiceError};
pub use handler::{CallbackHandler, ConsoleHandler};
pub use server::TelnetServer;
pub use transport::{Transport, TransportError};
pub use types::{ConnectionId, ConnectionState, ServerMode};
pub use worker::TcpTransport;
