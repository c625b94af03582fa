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

//! Core types for the console server

use std::fmt;

/// Unique identifier for an accepted connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// How the byte stream of a connection is framed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerMode {
    /// Plain TCP, every byte is application data
    #[default]
    Raw,
    /// Telnet framing with option negotiation
    Telnet,
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Telnet => write!(f, "telnet"),
        }
    }
}

/// Life-cycle state of the console session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No client is connected
    #[default]
    None,
    /// A client was accepted and the opening negotiation is settling
    Accept,
    /// Waiting for the login name
    AuthLogin,
    /// Waiting for the password
    AuthPassword,
    /// Authenticated, data passes through
    Connect,
}

impl ConnectionState {
    /// Human readable name of the state
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Accept => "accept",
            Self::AuthLogin => "auth-login",
            Self::AuthPassword => "auth-password",
            Self::Connect => "connect",
        }
    }

    /// Check if credentials are being captured
    pub fn is_authenticating(self) -> bool {
        matches!(self, Self::AuthLogin | Self::AuthPassword)
    }

    /// Check if data passes through to the consumer
    pub fn is_connected(self) -> bool {
        self == Self::Connect
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
