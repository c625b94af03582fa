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

//! Handler traits for console events

use crate::ConnectionId;
use std::net::SocketAddr;

/// Console event handler trait
///
/// Implement this trait to be told when the console session changes. All methods have
/// default implementations that do nothing.
///
/// Handlers run synchronously inside the server core, while the core is locked when driven
/// by [`TelnetServer`](crate::TelnetServer). They must return quickly and must not call back
/// into the server or a [`ConsoleHandle`](crate::ConsoleHandle); signal another task instead.
///
/// # Example
///
/// ```
/// use telcon_service::{ConnectionId, ConsoleHandler};
/// use std::sync::Arc;
/// use tokio::sync::Notify;
///
/// struct Wakeup(Arc<Notify>);
///
/// impl ConsoleHandler for Wakeup {
///     fn on_data_available(&self, _id: ConnectionId) {
///         self.0.notify_one();
///     }
/// }
/// ```
pub trait ConsoleHandler: Send + Sync + 'static {
    /// Called when a client reaches the pass-through state
    fn on_connect(&self, _id: ConnectionId, _peer: Option<SocketAddr>) {}

    /// Called after a receive event left data in the inbound buffer of a connected client
    fn on_data_available(&self, _id: ConnectionId) {}

    /// Called when the session ends, whatever the reason
    fn on_disconnect(&self, _id: ConnectionId) {}
}

/// Callback-based handler implementation
///
/// This provides a flexible way to implement handlers using closures instead of implementing
/// the `ConsoleHandler` trait.
///
/// # Example
///
/// ```
/// use telcon_service::CallbackHandler;
///
/// let handler = CallbackHandler {
///     on_connect: Some(Box::new(|id, peer| {
///         println!("Connection {} from {:?} logged in", id, peer);
///     })),
///     ..Default::default()
/// };
/// ```
#[derive(Default)]
pub struct CallbackHandler {
    /// Called on reaching pass-through
    pub on_connect: Option<Box<dyn Fn(ConnectionId, Option<SocketAddr>) + Send + Sync + 'static>>,
    /// Called when inbound data is available
    pub on_data_available: Option<Box<dyn Fn(ConnectionId) + Send + Sync + 'static>>,
    /// Called on disconnection
    pub on_disconnect: Option<Box<dyn Fn(ConnectionId) + Send + Sync + 'static>>,
}

impl ConsoleHandler for CallbackHandler {
    fn on_connect(&self, id: ConnectionId, peer: Option<SocketAddr>) {
        if let Some(ref f) = self.on_connect {
            f(id, peer);
        }
    }

    fn on_data_available(&self, id: ConnectionId) {
        if let Some(ref f) = self.on_data_available {
            f(id);
        }
    }

    fn on_disconnect(&self, id: ConnectionId) {
        if let Some(ref f) = self.on_disconnect {
            f(id);
        }
    }
}

impl std::fmt::Debug for CallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_data_available", &self.on_data_available.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .finish()
    }
}
