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

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// The codec work a stream failure interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOperation {
    /// Reading bytes for the decoder
    Decode,
    /// Writing encoded negotiation frames
    Encode,
    /// Not attributed, as reported by a framed stream through `From<io::Error>`
    Stream,
}

impl std::fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecOperation::Decode => write!(f, "decode"),
            CodecOperation::Encode => write!(f, "encode"),
            CodecOperation::Stream => write!(f, "stream"),
        }
    }
}

/// Represents possible errors that can occur in the codec handling process.
///
/// The state machine itself accepts every byte sequence, so the only failures come from the
/// stream the codec is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The underlying stream failed during `operation`.
    Io {
        /// Codec work that was interrupted
        operation: CodecOperation,
        /// The kind of I/O error that occurred
        kind: std::io::ErrorKind,
        /// Description from the stream
        message: String,
    },
}

impl CodecError {
    /// Wraps a stream failure that happened during `operation`.
    pub fn during(operation: CodecOperation, err: std::io::Error) -> Self {
        CodecError::Io {
            operation,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Attributes the error to `operation`, replacing the previous attribution.
    pub fn with_operation(self, operation: CodecOperation) -> Self {
        match self {
            CodecError::Io { kind, message, .. } => CodecError::Io {
                operation,
                kind,
                message,
            },
        }
    }

    /// The interrupted codec work
    pub fn operation(&self) -> CodecOperation {
        match self {
            CodecError::Io { operation, .. } => *operation,
        }
    }

    /// The I/O error kind reported by the stream
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            CodecError::Io { kind, .. } => *kind,
        }
    }

    /// Check if the failure means the telnet peer is gone
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self.kind(),
            std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::UnexpectedEof
        )
    }
}

impl std::error::Error for CodecError {}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io {
                operation: CodecOperation::Stream,
                message,
                ..
            } => write!(f, "telnet stream failed: {}", message),
            CodecError::Io {
                operation, message, ..
            } => write!(f, "telnet {} failed: {}", operation, message),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::during(CodecOperation::Stream, err)
    }
}
