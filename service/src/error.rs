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

//! Error types for the console server

use crate::buffer::BufferError;
use crate::transport::TransportError;
use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Console server error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Ring buffer contract violation or allocation failure
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// A client is already connected
    #[error("Connection rejected, a session is already active")]
    AdmissionRejected,

    /// No client is connected
    #[error("No active connection")]
    NoConnection,

    /// The event belongs to a connection that has already been torn down
    #[error("Connection {0} is no longer active")]
    StaleConnection(ConnectionId),

    /// Inbound data was dropped because the inbound buffer was full
    #[error("Inbound buffer full, {dropped} bytes dropped")]
    InboundOverflow {
        /// Number of received bytes that were discarded
        dropped: usize,
    },

    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The listening socket could not be opened
    #[error("Failed to start server: {0}")]
    Startup(#[source] std::io::Error),

    /// The server is already running
    #[error("Server already running")]
    AlreadyRunning,

    /// The server is not running
    #[error("Server not running")]
    NotRunning,

    /// The configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error outside of a connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors leave the server in a usable state, and the same operation may
    /// succeed later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::AdmissionRejected
                | ServiceError::InboundOverflow { .. }
                | ServiceError::StaleConnection(_)
                | ServiceError::Buffer(BufferError::Full)
                | ServiceError::Transport(TransportError::WouldBlock)
        )
    }

    /// Check if the error concerns a single connection rather than the server
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ServiceError::AdmissionRejected
                | ServiceError::NoConnection
                | ServiceError::StaleConnection(_)
                | ServiceError::Transport(_)
        )
    }
}
