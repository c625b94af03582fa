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

use super::{CodecError, CodecResult, TelnetEvent, TelnetFrame, TelnetOption, consts};
use crate::options::reply_to;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

/// Frames the server sends as soon as a Telnet session is accepted.
const HANDSHAKE: [TelnetFrame; 3] = [
    TelnetFrame::Do(TelnetOption::SuppressGoAhead),
    TelnetFrame::Will(TelnetOption::Echo),
    TelnetFrame::Wont(TelnetOption::Linemode),
];

/// A server-side codec for the Telnet protocol subset spoken by the console server.
///
/// `TelnetCodec` consumes the raw byte stream one byte at a time, strips `IAC` command
/// sequences out of it, answers option negotiation according to a fixed policy, and hands
/// every remaining application byte back to the caller. It never buffers data: each byte
/// either produces an event immediately or only advances the internal state.
///
/// A codec built with [`TelnetCodec::passthrough`] performs no interpretation at all and
/// returns every byte as data, which is how raw TCP sessions are served.
///
/// One codec belongs to one connection. Create a fresh one for every accepted client.
#[derive(Debug)]
pub struct TelnetCodec {
    decoder_state: DecoderState,
    last_data: u8,
    negotiations: usize,
    passthrough: bool,
}

impl TelnetCodec {
    /// Creates a codec that interprets Telnet framing.
    ///
    /// # Example
    /// ```
    /// use telcon_telnetcodec::{TelnetCodec, TelnetEvent};
    ///
    /// let mut codec = TelnetCodec::new();
    /// assert_eq!(codec.feed(b'A'), Some(TelnetEvent::Data(b'A')));
    /// ```
    pub fn new() -> TelnetCodec {
        TelnetCodec::default()
    }

    /// Creates a codec that forwards every byte unchanged.
    pub fn passthrough() -> TelnetCodec {
        TelnetCodec {
            passthrough: true,
            ..TelnetCodec::default()
        }
    }

    /// Whether this codec forwards bytes without interpreting them.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Number of commands dispatched since the codec was created.
    ///
    /// Every completed `IAC` command counts, whether or not it required an answer. The
    /// connection uses this to tell that the client has reacted to the opening handshake.
    pub fn negotiation_count(&self) -> usize {
        self.negotiations
    }

    /// The option negotiation the server opens a Telnet session with: `DO SUPPRESS-GA`,
    /// `WILL ECHO` and `WONT LINEMODE`.
    pub fn handshake() -> [TelnetFrame; 3] {
        HANDSHAKE
    }

    /// Drives a single input byte through the state machine.
    ///
    /// Returns `Some(TelnetEvent::Data(_))` for an application byte,
    /// `Some(TelnetEvent::Reply(_))` when the byte completed a negotiation that must be
    /// answered, and `None` when the byte was consumed as framing.
    ///
    /// A byte that ends a subnegotiation is also the first byte of the following command,
    /// so it is run through the machine a second time before the call returns.
    pub fn feed(&mut self, byte: u8) -> Option<TelnetEvent> {
        if self.passthrough {
            return Some(TelnetEvent::Data(byte));
        }
        loop {
            match self.step(byte) {
                Step::Consumed(event) => return event,
                Step::Reprocess => continue,
            }
        }
    }

    fn step(&mut self, byte: u8) -> Step {
        match (self.decoder_state, byte) {
            (DecoderState::NormalData, consts::IAC) => {
                self.decoder_state = DecoderState::InterpretAsCommand;
                Step::Consumed(None)
            }
            (DecoderState::NormalData, _) => Step::Consumed(self.forward(byte)),
            (DecoderState::InterpretAsCommand, consts::IAC) => {
                // Escaped 0xFF
                self.decoder_state = DecoderState::NormalData;
                Step::Consumed(self.forward(consts::IAC))
            }
            (
                DecoderState::InterpretAsCommand,
                consts::WILL | consts::WONT | consts::DO | consts::DONT | consts::SB,
            ) => {
                self.decoder_state = DecoderState::Option(byte);
                Step::Consumed(None)
            }
            (DecoderState::InterpretAsCommand, _) => {
                self.decoder_state = DecoderState::NormalData;
                Step::Consumed(self.dispatch(byte, None))
            }
            (DecoderState::Option(consts::SB), _) => {
                trace!("Subnegotiation for option {} started", TelnetOption::from(byte));
                self.decoder_state = DecoderState::Subnegotiate;
                Step::Consumed(None)
            }
            (DecoderState::Option(command), _) => {
                self.decoder_state = DecoderState::NormalData;
                Step::Consumed(self.dispatch(command, Some(byte)))
            }
            (DecoderState::Subnegotiate, consts::IAC) => {
                self.decoder_state = DecoderState::SubnegotiateIac;
                Step::Consumed(None)
            }
            (DecoderState::Subnegotiate, _) => Step::Consumed(None),
            (DecoderState::SubnegotiateIac, consts::IAC) => {
                self.decoder_state = DecoderState::Subnegotiate;
                Step::Consumed(None)
            }
            (DecoderState::SubnegotiateIac, _) => {
                self.decoder_state = DecoderState::InterpretAsCommand;
                Step::Reprocess
            }
        }
    }

    /// Hands a data byte to the application, dropping the NUL of a CR NUL pair.
    fn forward(&mut self, byte: u8) -> Option<TelnetEvent> {
        let collapse = self.last_data == consts::CR && byte == consts::NUL;
        self.last_data = byte;
        if collapse {
            None
        } else {
            Some(TelnetEvent::Data(byte))
        }
    }

    fn dispatch(&mut self, command: u8, option: Option<u8>) -> Option<TelnetEvent> {
        self.negotiations += 1;
        match option {
            Some(code) => {
                let option = TelnetOption::from_u8(code);
                let reply = reply_to(command, option);
                trace!(
                    "Negotiation {:#X} {} answered with {:?}",
                    command, option, reply
                );
                reply.map(TelnetEvent::Reply)
            }
            None => {
                debug!("Unknown telnet command: {}", command);
                None
            }
        }
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        TelnetCodec {
            decoder_state: DecoderState::NormalData,
            last_data: 0,
            negotiations: 0,
            passthrough: false,
        }
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetEvent;
    type Error = CodecError;

    /// Consumes bytes from `src` until one of them produces a [`TelnetEvent`].
    ///
    /// Bytes that are pure framing are consumed silently. Returns `Ok(None)` once `src` is
    /// exhausted; partial command sequences stay in the codec state for the next call.
    fn decode(&mut self, src: &mut BytesMut) -> CodecResult<Option<TelnetEvent>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(event) = self.feed(byte) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a negotiation frame as `IAC <command> <option>`.
    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> CodecResult<()> {
        let command = match item {
            TelnetFrame::Do(_) => consts::DO,
            TelnetFrame::Dont(_) => consts::DONT,
            TelnetFrame::Will(_) => consts::WILL,
            TelnetFrame::Wont(_) => consts::WONT,
        };
        dst.reserve(3);
        dst.put_u8(consts::IAC);
        dst.put_u8(command);
        dst.put_u8(item.option().to_u8());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DecoderState {
    NormalData,
    InterpretAsCommand,
    /// Waiting for the option byte of the remembered command.
    Option(u8),
    Subnegotiate,
    SubnegotiateIac,
}

enum Step {
    Consumed(Option<TelnetEvent>),
    /// Run the same byte again in the new state.
    Reprocess,
}
