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

//! Console session state machine
//!
//! A [`Connection`] drives one accepted client from the opening negotiation through login to
//! pass-through. It owns the transport, the Telnet decoder and the captured credentials. The
//! ring buffers belong to the server and are lent to each call, so they keep their storage
//! across connections.
//!
//! Control output (negotiation replies, echo, banner, prompts and login results) goes
//! straight to the transport. Only consumer data travels through the outbound buffer.

use crate::buffer::RingBuffer;
use crate::config::{OverlongPolicy, ServerConfig};
use crate::transport::Transport;
use crate::{AuthOutcome, ConnectionId, ConnectionState, ServerMode};
use bytes::BytesMut;
use metrics::counter;
use std::net::SocketAddr;
use telcon_telnetcodec::{TelnetCodec, TelnetEvent, TelnetFrame, consts};
use tokio_util::codec::Encoder;
use tracing::{debug, info, trace, warn};
use zeroize::{Zeroize, Zeroizing};

pub(crate) const LOGIN_PROMPT: &[u8] = b"\r\nlogin: ";
pub(crate) const PASSWORD_PROMPT: &[u8] = b"\r\npassword: ";
pub(crate) const LOGIN_FAILED: &[u8] = b"\r\nLogin failed.\r\n";
pub(crate) const LOGIN_SUCCESSFUL: &[u8] = b"\r\nLogin successful.\r\n";

/// What a receive event did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Received {
    /// Raw bytes discarded because the inbound buffer was full
    pub dropped: usize,
}

/// A captured credential field and whether the input exceeded its limit
struct Credential {
    value: Zeroizing<Vec<u8>>,
    limit: usize,
    overlong: bool,
}

impl Credential {
    fn new(limit: usize) -> Self {
        Self {
            value: Zeroizing::new(Vec::with_capacity(limit)),
            limit,
            overlong: false,
        }
    }

    /// Moves the `line_len` bytes before the terminator out of `inbound`, keeping at most
    /// `limit` of them. `truncated` marks input that was already cut while it was typed.
    fn capture<S>(&mut self, inbound: &mut RingBuffer<S>, line_len: usize, truncated: bool)
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        self.value.zeroize();
        self.overlong = truncated || line_len > self.limit;
        let kept = line_len.min(self.limit);
        self.value.resize(kept, 0);
        if kept > 0 && inbound.pop_bytes(&mut self.value[..]).is_err() {
            self.value.zeroize();
        }
    }

    fn wipe(&mut self) {
        self.value.zeroize();
        self.overlong = false;
    }
}

/// The life cycle of one accepted client.
pub(crate) struct Connection<T: Transport> {
    id: ConnectionId,
    transport: T,
    peer: Option<SocketAddr>,
    codec: TelnetCodec,
    state: ConnectionState,
    login: Credential,
    password: Credential,
    failed_logins: u32,
    hold_ticks: u32,
    /// Credential bytes were discarded before the line was complete
    truncated: bool,
    /// Session output of the current event, sent in one piece
    control: BytesMut,
}

impl<T: Transport> Connection<T> {
    /// Starts a session in [`ConnectionState::Accept`], sending the handshake in Telnet mode.
    pub(crate) fn open(id: ConnectionId, transport: T, config: &ServerConfig) -> Self {
        let codec = match config.mode {
            ServerMode::Telnet => TelnetCodec::new(),
            ServerMode::Raw => TelnetCodec::passthrough(),
        };
        let peer = transport.peer_addr();
        let mut connection = Self {
            id,
            transport,
            peer,
            codec,
            state: ConnectionState::Accept,
            login: Credential::new(config.max_login_len),
            password: Credential::new(config.max_password_len),
            failed_logins: 0,
            hold_ticks: 0,
            truncated: false,
            control: BytesMut::new(),
        };
        if config.mode == ServerMode::Telnet {
            connection.queue_frames(&TelnetCodec::handshake());
            connection.flush_control();
        }
        connection
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub(crate) fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    /// Feeds one receive event through the decoder.
    ///
    /// Application bytes land in `inbound` (echoed while the login is typed). Once the whole
    /// event has been consumed a completed credential line, if any, is processed. When
    /// `inbound` fills up the rest of the event is dropped, except while credentials are
    /// typed: then bytes past the field limit are discarded and line terminators are always
    /// stored. All session output the event causes leaves in a single control send.
    pub(crate) fn receive<S>(
        &mut self,
        data: &[u8],
        inbound: &mut RingBuffer<S>,
        config: &ServerConfig,
    ) -> Received
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        let mut received = Received::default();
        for (index, byte) in data.iter().enumerate() {
            match self.codec.feed(*byte) {
                Some(TelnetEvent::Reply(frame)) => self.queue_frames(&[frame]),
                Some(TelnetEvent::Data(byte)) => {
                    if self.state == ConnectionState::AuthLogin {
                        self.queue_control(&[byte]);
                    }
                    if self.state.is_authenticating() {
                        self.store_credential_byte(byte, inbound);
                    } else if inbound.push_byte(byte, false).is_err() {
                        received.dropped = data.len() - index;
                        break;
                    }
                }
                None => {}
            }
        }

        if received.dropped > 0 {
            warn!(
                connection_id = %self.id,
                dropped = received.dropped,
                "Inbound buffer full, dropping received data"
            );
            counter!("telcon.inbound.dropped").increment(received.dropped as u64);
        }

        if self.state.is_authenticating() && !inbound.is_empty() {
            self.process_line(inbound, config);
        }
        self.flush_control();
        received
    }

    /// Periodic tick: leaves the accept phase once the client is ready and flushes when
    /// auto-flush is on. Returns the number of chunks flushed.
    pub(crate) fn tick<S>(&mut self, outbound: &mut RingBuffer<S>, config: &ServerConfig) -> usize
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.state == ConnectionState::Accept {
            if self.hold_ticks > 0 {
                self.hold_ticks -= 1;
                trace!(connection_id = %self.id, remaining = self.hold_ticks, "Login prompt held");
            } else if self.codec.is_passthrough() || self.codec.negotiation_count() > 0 {
                self.leave_accept(config);
                self.flush_control();
            }
        }

        if config.auto_flush && self.state == ConnectionState::Connect {
            self.flush(outbound)
        } else {
            0
        }
    }

    /// Sends as much of `outbound` as the transport takes. Returns the number of chunks sent,
    /// always 0 outside [`ConnectionState::Connect`].
    pub(crate) fn flush<S>(&mut self, outbound: &mut RingBuffer<S>) -> usize
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.state != ConnectionState::Connect {
            return 0;
        }
        let mut chunks = 0;
        loop {
            let waiting = outbound.used();
            let run = outbound.peek_run(waiting);
            let len = run.len();
            if len == 0 {
                break;
            }
            if let Err(error) = self.transport.send(run, len < waiting) {
                trace!(connection_id = %self.id, %error, "Outbound flush stopped");
                break;
            }
            if outbound.skip(len).is_err() {
                break;
            }
            chunks += 1;
        }
        if chunks > 0 {
            counter!("telcon.outbound.chunks").increment(chunks as u64);
        }
        chunks
    }

    /// Ends the session. With `close_transport` the transport is told to close; after a
    /// transport error it is already gone.
    pub(crate) fn shutdown(mut self, close_transport: bool) {
        self.login.wipe();
        self.password.wipe();
        self.state = ConnectionState::None;
        if close_transport {
            self.transport.close();
        }
    }

    fn leave_accept(&mut self, config: &ServerConfig) {
        if let Some(banner) = &config.banner {
            self.queue_control(banner.as_bytes());
        }
        if config.authenticator.is_some() {
            self.state = ConnectionState::AuthLogin;
            self.queue_control(LOGIN_PROMPT);
        } else {
            self.state = ConnectionState::Connect;
        }
        debug!(connection_id = %self.id, state = %self.state, "Accept phase complete");
    }

    fn process_line<S>(&mut self, inbound: &mut RingBuffer<S>, config: &ServerConfig)
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        let Some(line_len) = inbound.position(is_line_end) else {
            return;
        };

        match self.state {
            ConnectionState::AuthLogin => {
                self.login.capture(inbound, line_len, self.truncated);
                self.state = ConnectionState::AuthPassword;
                self.queue_control(PASSWORD_PROMPT);
            }
            ConnectionState::AuthPassword => {
                self.password.capture(inbound, line_len, self.truncated);
                let outcome = self.check_credentials(config);
                self.finish_login(outcome, config);
                self.login.wipe();
                self.password.wipe();
            }
            _ => return,
        }

        // Drops the terminator and anything typed after it
        inbound.wipe();
        self.truncated = false;
    }

    /// Stores one credential byte without ever refusing input.
    fn store_credential_byte<S>(&mut self, byte: u8, inbound: &mut RingBuffer<S>)
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        let complete = inbound.position(is_line_end).is_some();
        if is_line_end(byte) {
            // The last slot is kept free for the first terminator
            if !complete {
                let _ = inbound.push_byte(byte, true);
            }
            return;
        }
        let limit = match self.state {
            ConnectionState::AuthPassword => self.password.limit,
            _ => self.login.limit,
        };
        if inbound.used() < limit && inbound.used() + 1 < inbound.capacity() {
            let _ = inbound.push_byte(byte, false);
        } else if !complete {
            if !self.truncated {
                debug!(connection_id = %self.id, limit, "Credential input truncated");
            }
            self.truncated = true;
        }
    }

    fn check_credentials(&self, config: &ServerConfig) -> AuthOutcome {
        let overlong = self.login.overlong || self.password.overlong;
        if overlong && config.overlong_policy == OverlongPolicy::Reject {
            debug!(connection_id = %self.id, "Overlong credentials rejected");
            return AuthOutcome::Failure;
        }
        match &config.authenticator {
            Some(authenticator) => authenticator.check(&self.login.value, &self.password.value),
            None => AuthOutcome::Error,
        }
    }

    fn finish_login(&mut self, outcome: AuthOutcome, config: &ServerConfig) {
        let login = String::from_utf8_lossy(&self.login.value).into_owned();
        let peer = self.peer_label();
        if outcome.is_success() {
            self.state = ConnectionState::Connect;
            self.failed_logins = 0;
            self.hold_ticks = 0;
            self.queue_control(LOGIN_SUCCESSFUL);
            info!(connection_id = %self.id, "Successful login: {} ({})", login, peer);
            counter!("telcon.logins.succeeded").increment(1);
            return;
        }

        self.state = ConnectionState::Accept;
        self.failed_logins = self.failed_logins.saturating_add(1);
        if self.failed_logins >= config.max_login_attempts {
            let excess = self.failed_logins - config.max_login_attempts + 1;
            self.hold_ticks = config.attempt_delay_ticks.saturating_mul(excess);
        }
        self.queue_control(LOGIN_FAILED);
        if outcome == AuthOutcome::Error {
            debug!(connection_id = %self.id, "Authenticator reported an error");
        }
        warn!(
            connection_id = %self.id,
            failures = self.failed_logins,
            "Login failure: {} ({})", login, peer
        );
        counter!("telcon.logins.failed").increment(1);
    }

    fn queue_frames(&mut self, frames: &[TelnetFrame]) {
        for frame in frames {
            trace!(connection_id = %self.id, %frame, "Sending negotiation");
            if self.codec.encode(*frame, &mut self.control).is_err() {
                return;
            }
        }
    }

    fn queue_control(&mut self, data: &[u8]) {
        self.control.extend_from_slice(data);
    }

    fn flush_control(&mut self) {
        if self.control.is_empty() {
            return;
        }
        let pending = self.control.split();
        if let Err(error) = self.transport.send_control(&pending) {
            debug!(connection_id = %self.id, %error, len = pending.len(), "Dropped control output");
        }
    }

    fn peer_label(&self) -> String {
        self.peer
            .map(|peer| peer.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn is_line_end(byte: u8) -> bool {
    byte == consts::CR || byte == consts::LF
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("state", &self.state)
            .field("failed_logins", &self.failed_logins)
            .finish_non_exhaustive()
    }
}
