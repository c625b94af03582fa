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

use crate::{TelnetFrame, consts};

///
/// [Telnet Terminal Options](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
///
/// Only the options the console server takes a position on are named; every other code is
/// carried through as [`TelnetOption::Unknown`].
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetOption {
    /// [`consts::option::BINARY`] Telnet Binary Transmission [RFC856](https://tools.ietf.org/html/rfc856)
    TransmitBinary,
    /// [`consts::option::ECHO`] Telnet Echo Option [RFC857](https://tools.ietf.org/html/rfc857)
    Echo,
    /// [`consts::option::RCP`] Telnet Reconnection Option
    Reconnection,
    /// [`consts::option::SGA`] Suppress Go ahead [RFC858](https://tools.ietf.org/html/rfc858)
    SuppressGoAhead,
    /// [`consts::option::NAMS`] Negotiate Approximate Message Size
    NegotiateApproxMessageSize,
    /// [`consts::option::STATUS`] Telnet Status Option [RFC859](http://www.iana.org/go/rfc859)
    Status,
    /// [`consts::option::NAWS`] Negotiate About Window Size [RFC1073](http://www.iana.org/go/rfc1073)
    NAWS,
    /// [`consts::option::TSPEED`] Terminal Speed [RFC1079](http://www.iana.org/go/rfc1079)
    TSPEED,
    /// [`consts::option::LFLOW`] Remote Flow Control [RFC1372](http://www.iana.org/go/rfc1372)
    LFLOW,
    /// [`consts::option::LINEMODE`] Linemode [RFC1184](http://www.iana.org/go/rfc1184)
    Linemode,
    /// [`consts::option::XDISPLOC`] X Display Location [RFC1096](http://www.iana.org/go/rfc1096)
    XDISPLOC,
    /// [`consts::option::OLD_ENVIRONMENT`] Environment Option [RFC1408](http://www.iana.org/go/rfc1408)
    Environment,
    /// [`consts::option::AUTHENTICATION`] Authentication Option [RFC2941](http://www.iana.org/go/rfc2941)
    Authentication,
    /// [`consts::option::ENCRYPTION`] Encryption Option [RFC2946](http://www.iana.org/go/rfc2946)
    Encryption,
    /// [`consts::option::NEW_ENVIRONMENT`] New Environment Option [RFC1572](http://www.iana.org/go/rfc1572)
    NewEnvironment,
    /// Unknown Option
    Unknown(u8),
}

impl TelnetOption {
    /// Converts a `TelnetOption` into its option code.
    pub fn to_u8(&self) -> u8 {
        match self {
            TelnetOption::TransmitBinary => consts::option::BINARY,
            TelnetOption::Echo => consts::option::ECHO,
            TelnetOption::Reconnection => consts::option::RCP,
            TelnetOption::SuppressGoAhead => consts::option::SGA,
            TelnetOption::NegotiateApproxMessageSize => consts::option::NAMS,
            TelnetOption::Status => consts::option::STATUS,
            TelnetOption::NAWS => consts::option::NAWS,
            TelnetOption::TSPEED => consts::option::TSPEED,
            TelnetOption::LFLOW => consts::option::LFLOW,
            TelnetOption::Linemode => consts::option::LINEMODE,
            TelnetOption::XDISPLOC => consts::option::XDISPLOC,
            TelnetOption::Environment => consts::option::OLD_ENVIRONMENT,
            TelnetOption::Authentication => consts::option::AUTHENTICATION,
            TelnetOption::Encryption => consts::option::ENCRYPTION,
            TelnetOption::NewEnvironment => consts::option::NEW_ENVIRONMENT,
            TelnetOption::Unknown(byte) => *byte,
        }
    }

    /// Converts an option code into the corresponding `TelnetOption`, falling back to
    /// [`TelnetOption::Unknown`] for codes without a named variant.
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            consts::option::BINARY => TelnetOption::TransmitBinary,
            consts::option::ECHO => TelnetOption::Echo,
            consts::option::RCP => TelnetOption::Reconnection,
            consts::option::SGA => TelnetOption::SuppressGoAhead,
            consts::option::NAMS => TelnetOption::NegotiateApproxMessageSize,
            consts::option::STATUS => TelnetOption::Status,
            consts::option::NAWS => TelnetOption::NAWS,
            consts::option::TSPEED => TelnetOption::TSPEED,
            consts::option::LFLOW => TelnetOption::LFLOW,
            consts::option::LINEMODE => TelnetOption::Linemode,
            consts::option::XDISPLOC => TelnetOption::XDISPLOC,
            consts::option::OLD_ENVIRONMENT => TelnetOption::Environment,
            consts::option::AUTHENTICATION => TelnetOption::Authentication,
            consts::option::ENCRYPTION => TelnetOption::Encryption,
            consts::option::NEW_ENVIRONMENT => TelnetOption::NewEnvironment,
            byte => TelnetOption::Unknown(byte),
        }
    }

    /// Whether we agree to perform this option when the client sends `DO`.
    pub fn supported_local(&self) -> bool {
        matches!(
            self,
            TelnetOption::TransmitBinary | TelnetOption::SuppressGoAhead
        )
    }

    /// Whether we turn down this option when the client offers `WILL`.
    ///
    /// These are the options that would make the client send subnegotiations or change how
    /// it frames input, none of which the console stream can use.
    pub fn declined_remote(&self) -> bool {
        matches!(
            self,
            TelnetOption::NAWS
                | TelnetOption::TSPEED
                | TelnetOption::LFLOW
                | TelnetOption::Linemode
                | TelnetOption::XDISPLOC
                | TelnetOption::Environment
                | TelnetOption::Authentication
                | TelnetOption::Encryption
                | TelnetOption::NewEnvironment
        )
    }
}

impl std::fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetOption::TransmitBinary => write!(f, "TransmitBinary"),
            TelnetOption::Echo => write!(f, "Echo"),
            TelnetOption::Reconnection => write!(f, "Reconnection"),
            TelnetOption::SuppressGoAhead => write!(f, "SuppressGoAhead"),
            TelnetOption::NegotiateApproxMessageSize => write!(f, "NegotiateApproxMessageSize"),
            TelnetOption::Status => write!(f, "Status"),
            TelnetOption::NAWS => write!(f, "NAWS"),
            TelnetOption::TSPEED => write!(f, "TSPEED"),
            TelnetOption::LFLOW => write!(f, "LFLOW"),
            TelnetOption::Linemode => write!(f, "Linemode"),
            TelnetOption::XDISPLOC => write!(f, "XDISPLOC"),
            TelnetOption::Environment => write!(f, "Environment"),
            TelnetOption::Authentication => write!(f, "Authentication"),
            TelnetOption::Encryption => write!(f, "Encryption"),
            TelnetOption::NewEnvironment => write!(f, "NewEnvironment"),
            TelnetOption::Unknown(option) => write!(f, "Unknown({option})"),
        }
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

/// Decides the server's answer to a received negotiation command.
///
/// The server opens every session by sending `WILL ECHO` and `DO SUPPRESS-GA`, so a client
/// `DO ECHO` or `WILL SUPPRESS-GA` is an acknowledgement and needs no answer. `DONT` and
/// `WONT` are never answered. Returns `None` when nothing should be sent.
pub(crate) fn reply_to(command: u8, option: TelnetOption) -> Option<TelnetFrame> {
    match (command, option) {
        (consts::DO, TelnetOption::Echo) => None,
        (consts::DO, option) if option.supported_local() => Some(TelnetFrame::Will(option)),
        (consts::DO, option) => Some(TelnetFrame::Wont(option)),
        (consts::WILL, TelnetOption::SuppressGoAhead) => None,
        (consts::WILL, option) if option.declined_remote() => Some(TelnetFrame::Dont(option)),
        (consts::WILL, option) => Some(TelnetFrame::Do(option)),
        _ => None,
    }
}
