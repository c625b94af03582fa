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

//! Transport boundary
//!
//! The console core never touches sockets. It talks to the client through a [`Transport`],
//! which the TCP driver implements on top of a bounded send queue and tests implement with an
//! in-memory recorder.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors a transport reports for a send or for the connection as a whole
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport cannot take more data right now; retry later
    #[error("Transport send window is full")]
    WouldBlock,

    /// The connection is gone
    #[error("Transport connection closed")]
    Closed,

    /// Any other I/O failure
    #[error("Transport I/O error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::WouldBlock => Self::WouldBlock,
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::UnexpectedEof => Self::Closed,
            kind => Self::Io(kind),
        }
    }
}

/// One accepted client connection as seen by the console core
pub trait Transport: Send + 'static {
    /// Queues `data` for sending.
    ///
    /// A send is all or nothing: on error none of `data` was taken. `more` hints that further
    /// data follows immediately.
    fn send(&mut self, data: &[u8], more: bool) -> Result<(), TransportError>;

    /// Sends session output the console produces itself: negotiation replies, echo, prompts,
    /// the banner and login results.
    ///
    /// This output is small and bounded per event, so implementations should accept it even
    /// when [`Transport::send`] would report [`TransportError::WouldBlock`]. The default
    /// forwards to `send`.
    fn send_control(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.send(data, false)
    }

    /// Closes the connection. Data already accepted by [`Transport::send`] is still delivered.
    fn close(&mut self);

    /// Remote address of the client, if known
    fn peer_addr(&self) -> Option<SocketAddr>;
}
