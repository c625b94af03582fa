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

use super::TelnetOption;

///
/// `TelnetFrame` is a negotiation command the server writes to the client.
///
/// Each frame encodes to exactly three bytes: `IAC <command> <option>`.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TelnetFrame {
    /// Ask the client to perform, or confirm it performing, an option.
    Do(TelnetOption),
    /// Demand the client stop, or not start, performing an option.
    Dont(TelnetOption),
    /// Offer, or confirm, that the server performs an option.
    Will(TelnetOption),
    /// Refuse to perform an option.
    Wont(TelnetOption),
}

impl TelnetFrame {
    /// The option this frame negotiates.
    pub fn option(&self) -> TelnetOption {
        match self {
            TelnetFrame::Do(option)
            | TelnetFrame::Dont(option)
            | TelnetFrame::Will(option)
            | TelnetFrame::Wont(option) => *option,
        }
    }
}

impl std::fmt::Display for TelnetFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetFrame::Do(option) => write!(f, "DO {option}"),
            TelnetFrame::Dont(option) => write!(f, "DONT {option}"),
            TelnetFrame::Will(option) => write!(f, "WILL {option}"),
            TelnetFrame::Wont(option) => write!(f, "WONT {option}"),
        }
    }
}
