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

//! # Telcon Telnet Codec
//!
//! A deliberately small, server-side implementation of the Telnet protocol (RFC 854) for
//! console access. The codec strips command sequences from the inbound byte stream, answers
//! option negotiation according to a fixed policy and hands the remaining application bytes
//! to the caller one at a time.
//!
//! ## Core Components
//!
//! ### [`TelnetCodec`]
//!
//! The decoder state machine. It is usable directly through [`TelnetCodec::feed`] or through
//! the [`Decoder`](tokio_util::codec::Decoder) and [`Encoder`](tokio_util::codec::Encoder)
//! traits from `tokio_util::codec`.
//!
//! ### [`TelnetEvent`]
//!
//! What a byte produced: an application data byte, or a negotiation reply that must be sent
//! back to the client.
//!
//! ### [`TelnetFrame`] and [`TelnetOption`]
//!
//! A three byte `IAC <verb> <option>` negotiation frame and the options it can name.
//!
//! ## Negotiation Policy
//!
//! | Received | Option                                   | Reply      |
//! |----------|------------------------------------------|------------|
//! | `DO`     | `ECHO`                                   | no reply   |
//! | `DO`     | `BINARY`, `SGA`                          | `WILL`     |
//! | `DO`     | anything else                            | `WONT`     |
//! | `WILL`   | `SGA`                                    | no reply   |
//! | `WILL`   | `NAWS`, `LINEMODE` and other declined    | `DONT`     |
//! | `WILL`   | anything else                            | `DO`       |
//! | `DONT`   | any                                      | no reply   |
//! | `WONT`   | any                                      | no reply   |
//!
//! Subnegotiation payloads are consumed and discarded. A literal `0xFF` arrives as
//! `IAC IAC`, and the `NUL` of a `CR NUL` pair is dropped.
//!
//! ## Usage Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use telcon_telnetcodec::{TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption};
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = TelnetCodec::new();
//! let mut input = BytesMut::from(&b"hi\xFF\xFD\x01"[..]); // Data + DO Echo
//! let mut events = Vec::new();
//! while let Some(event) = codec.decode(&mut input).unwrap() {
//!     events.push(event);
//! }
//! assert_eq!(
//!     events,
//!     vec![
//!         TelnetEvent::Data(b'h'),
//!         TelnetEvent::Data(b'i'),
//!         TelnetEvent::Reply(TelnetFrame::Wont(TelnetOption::Echo)),
//!     ]
//! );
//! ```
//!
//! ## Thread Safety
//!
//! `TelnetCodec` carries per-connection state and is not meant to be shared. Each
//! connection owns its own instance.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod codec;
pub mod consts;
mod event;
mod frame;
mod options;
mod result;

pub use self::codec::TelnetCodec;
pub use self::event::TelnetEvent;
pub use self::frame::TelnetFrame;
pub use self::options::TelnetOption;
pub use self::result::{CodecError, CodecOperation, CodecResult};
