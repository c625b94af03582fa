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

//! Telnet protocol byte values (RFC 854 and the option RFCs referenced from [`TelnetOption`]).
//!
//! [`TelnetOption`]: crate::TelnetOption

/// Null, the padding byte sent after a bare carriage return.
pub const NUL: u8 = 0;
/// Line Feed
pub const LF: u8 = 10;
/// Carriage Return
pub const CR: u8 = 13;

/// End of subnegotiation parameters.
pub const SE: u8 = 240;
/// No operation.
pub const NOP: u8 = 241;
/// The data stream portion of a Synch.
pub const DM: u8 = 242;
/// NVT character BRK.
pub const BRK: u8 = 243;
/// Interrupt Process.
pub const IP: u8 = 244;
/// Abort Output.
pub const AO: u8 = 245;
/// Are You There.
pub const AYT: u8 = 246;
/// Erase Character.
pub const EC: u8 = 247;
/// Erase Line.
pub const EL: u8 = 248;
/// Go Ahead.
pub const GA: u8 = 249;
/// Start of subnegotiation.
pub const SB: u8 = 250;
/// Sender wants to begin, or confirms, performing an option.
pub const WILL: u8 = 251;
/// Sender refuses to perform, or stops performing, an option.
pub const WONT: u8 = 252;
/// Sender asks the peer to perform, or confirms the peer performing, an option.
pub const DO: u8 = 253;
/// Sender demands the peer stop, or not start, performing an option.
pub const DONT: u8 = 254;
/// Interpret As Command.
pub const IAC: u8 = 255;

/// Option codes
pub mod option {
    /// Binary Transmission [RFC856]
    pub const BINARY: u8 = 0;
    /// Echo [RFC857]
    pub const ECHO: u8 = 1;
    /// Reconnection
    pub const RCP: u8 = 2;
    /// Suppress Go Ahead [RFC858]
    pub const SGA: u8 = 3;
    /// Negotiate Approximate Message Size
    pub const NAMS: u8 = 4;
    /// Status [RFC859]
    pub const STATUS: u8 = 5;
    /// Negotiate About Window Size [RFC1073]
    pub const NAWS: u8 = 31;
    /// Terminal Speed [RFC1079]
    pub const TSPEED: u8 = 32;
    /// Remote Flow Control [RFC1372]
    pub const LFLOW: u8 = 33;
    /// Linemode [RFC1184]
    pub const LINEMODE: u8 = 34;
    /// X Display Location [RFC1096]
    pub const XDISPLOC: u8 = 35;
    /// Environment Option [RFC1408]
    pub const OLD_ENVIRONMENT: u8 = 36;
    /// Authentication Option [RFC2941]
    pub const AUTHENTICATION: u8 = 37;
    /// Encryption Option [RFC2946]
    pub const ENCRYPTION: u8 = 38;
    /// New Environment Option [RFC1572]
    pub const NEW_ENVIRONMENT: u8 = 39;
}
