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

//! Server configuration

use crate::{Authenticator, Result, ServerMode, ServiceError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Banner sent when a session leaves the accept phase
pub const DEFAULT_BANNER: &str = "\r\ntelcon\r\n\r\n";

/// Default capacity of the inbound and outbound buffers
pub const DEFAULT_BUFFER_CAPACITY: usize = 2048;

/// What to do with a login or password longer than its limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlongPolicy {
    /// Keep the leading bytes up to the limit and check those
    #[default]
    Truncate,
    /// Fail the attempt without consulting the authenticator
    Reject,
}

/// Server configuration
///
/// This structure contains all configuration options for the console server. Use the builder
/// pattern methods to customize the configuration. The configuration is fixed once the server
/// is created.
///
/// # Example
///
/// ```
/// use telcon_service::{AuthOutcome, ServerConfig, ServerMode};
///
/// let config = ServerConfig::default()
///     .with_port(2323)
///     .with_mode(ServerMode::Telnet)
///     .with_banner("\r\nlab console\r\n\r\n")
///     .with_authenticator(|login: &[u8], password: &[u8]| {
///         if login == b"admin" && password == b"admin" {
///             AuthOutcome::Success
///         } else {
///             AuthOutcome::Failure
///         }
///     });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: SocketAddr,

    /// Raw or Telnet framing
    pub mode: ServerMode,

    /// Text sent once when the session leaves the accept phase, `None` for no banner
    pub banner: Option<String>,

    /// Capacity of the decoded inbound buffer
    pub inbound_capacity: usize,

    /// Capacity of the outbound buffer
    pub outbound_capacity: usize,

    /// Flush outbound data on every tick while connected
    pub auto_flush: bool,

    /// Credential check; without one clients connect without logging in
    pub authenticator: Option<Arc<dyn Authenticator>>,

    /// Maximum login length in bytes
    pub max_login_len: usize,

    /// Maximum password length in bytes
    pub max_password_len: usize,

    /// Handling of credentials longer than their limit
    pub overlong_policy: OverlongPolicy,

    /// Failed logins on one connection before the login prompt is delayed
    pub max_login_attempts: u32,

    /// Ticks the prompt is held for each failure at or beyond `max_login_attempts`
    ///
    /// Zero disables the delay.
    pub attempt_delay_ticks: u32,

    /// Interval of the periodic tick that drives the session
    pub poll_interval: Duration,

    /// Unwritten application bytes the TCP driver accepts for a client before sends would
    /// block. Session output from the console is not limited by it.
    pub send_window: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 23)),
            mode: ServerMode::Raw,
            banner: Some(DEFAULT_BANNER.to_string()),
            inbound_capacity: DEFAULT_BUFFER_CAPACITY,
            outbound_capacity: DEFAULT_BUFFER_CAPACITY,
            auto_flush: true,
            authenticator: None,
            max_login_len: 32,
            max_password_len: 64,
            overlong_policy: OverlongPolicy::Truncate,
            max_login_attempts: 3,
            attempt_delay_ticks: 0,
            poll_interval: Duration::from_millis(500),
            send_window: 8192,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address
    ///
    /// All other settings will use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the listening port, keeping the bind IP
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_address.set_port(port);
        self
    }

    /// Set the stream framing
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the banner text
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Send no banner
    pub fn without_banner(mut self) -> Self {
        self.banner = None;
        self
    }

    /// Set the inbound and outbound buffer capacities
    pub fn with_buffer_capacities(mut self, inbound: usize, outbound: usize) -> Self {
        self.inbound_capacity = inbound;
        self.outbound_capacity = outbound;
        self
    }

    /// Enable or disable flushing on every tick
    pub fn with_auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }

    /// Require a login checked by `authenticator`
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Set the login and password length limits
    pub fn with_credential_limits(mut self, max_login_len: usize, max_password_len: usize) -> Self {
        self.max_login_len = max_login_len;
        self.max_password_len = max_password_len;
        self
    }

    /// Set the overlong credential policy
    pub fn with_overlong_policy(mut self, policy: OverlongPolicy) -> Self {
        self.overlong_policy = policy;
        self
    }

    /// Set the login throttle
    pub fn with_login_throttle(mut self, max_attempts: u32, delay_ticks: u32) -> Self {
        self.max_login_attempts = max_attempts;
        self.attempt_delay_ticks = delay_ticks;
        self
    }

    /// Set the tick interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the send window of the TCP driver in bytes
    pub fn with_send_window(mut self, bytes: usize) -> Self {
        self.send_window = bytes;
        self
    }

    /// Validate the configuration
    ///
    /// Returns [`ServiceError::InvalidConfig`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(ServiceError::InvalidConfig(message.to_string()));

        if self.inbound_capacity == 0 {
            return invalid("inbound_capacity must be greater than 0");
        }

        if self.outbound_capacity == 0 {
            return invalid("outbound_capacity must be greater than 0");
        }

        if self.max_login_len == 0 {
            return invalid("max_login_len must be greater than 0");
        }

        if self.max_password_len == 0 {
            return invalid("max_password_len must be greater than 0");
        }

        if self.max_login_attempts == 0 {
            return invalid("max_login_attempts must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            return invalid("poll_interval must be greater than 0");
        }

        if self.send_window == 0 {
            return invalid("send_window must be greater than 0");
        }

        Ok(())
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("mode", &self.mode)
            .field("banner", &self.banner)
            .field("inbound_capacity", &self.inbound_capacity)
            .field("outbound_capacity", &self.outbound_capacity)
            .field("auto_flush", &self.auto_flush)
            .field("authenticator", &self.authenticator.is_some())
            .field("max_login_len", &self.max_login_len)
            .field("max_password_len", &self.max_password_len)
            .field("overlong_policy", &self.overlong_policy)
            .field("max_login_attempts", &self.max_login_attempts)
            .field("attempt_delay_ticks", &self.attempt_delay_ticks)
            .field("poll_interval", &self.poll_interval)
            .field("send_window", &self.send_window)
            .finish()
    }
}
