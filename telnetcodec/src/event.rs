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

use super::TelnetFrame;

///
/// `TelnetEvent` is what the decoder produces for each consumed byte that is not pure framing.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TelnetEvent {
    /// Application data byte, already stripped of Telnet framing.
    Data(u8),
    /// A negotiation answer that must be written to the client right away.
    Reply(TelnetFrame),
}
