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

//! Console Echo Example
//!
//! This example exposes a toy command console:
//! - Listens for Telnet clients on port 2323
//! - Asks for a login before handing over the console
//! - Answers every completed line through the console handle
//!
//! ## Usage
//!
//! Run the server:
//! ```bash
//! RUST_LOG=telcon_service=debug cargo run --example console_server
//! ```
//!
//! Connect with a telnet client and log in as `admin` / `console`:
//! ```bash
//! telnet localhost 2323
//! ```

use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use telcon_service::{
    AuthOutcome, CallbackHandler, ConnectionId, ServerConfig, ServerMode, TelnetServer,
};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::new("127.0.0.1:2323".parse()?)
        .with_mode(ServerMode::Telnet)
        .with_banner("\r\ntelcon demo console\r\n")
        .with_login_throttle(3, 4)
        .with_authenticator(|login: &[u8], password: &[u8]| match login {
            b"admin" if password == b"console" => AuthOutcome::Success,
            b"admin" => AuthOutcome::Failure,
            _ => AuthOutcome::Error,
        });

    let server = TelnetServer::new(config)?;
    let data_ready = Arc::new(Notify::new());
    server.set_handler(CallbackHandler {
        on_connect: Some(Box::new(|id: ConnectionId, peer: Option<SocketAddr>| {
            tracing::info!("Console opened by {} ({:?})", id, peer);
        })),
        on_data_available: Some(Box::new({
            let data_ready = data_ready.clone();
            move |_: ConnectionId| data_ready.notify_one()
        })),
        on_disconnect: Some(Box::new(|id: ConnectionId| {
            tracing::info!("Console closed by {}", id);
        })),
    });

    let addr = server.start().await?;
    println!("Console listening on {}", addr);
    println!("Press Ctrl+C to stop the server\n");

    let mut console = server.console();
    let mut line = Vec::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = data_ready.notified() => {
                let mut buf = [0u8; 256];
                loop {
                    match console.read(&mut buf) {
                        Ok(len) => line.extend_from_slice(&buf[..len]),
                        Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                        Err(e) => return Err(e.into()),
                    }
                }
                while let Some(end) = line.iter().position(|&byte| byte == b'\n') {
                    let command: Vec<u8> = line.drain(..=end).collect();
                    let command = String::from_utf8_lossy(&command);
                    let reply = format!("you said: {}\r\n> ", command.trim_end());
                    if let Err(e) = console.write_all(reply.as_bytes()) {
                        tracing::warn!("Console output dropped: {}", e);
                    }
                }
            }
        }
    }

    println!("\nShutting down server...");
    server.stop().await?;
    println!("Server stopped");
    Ok(())
}
