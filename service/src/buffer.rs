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

//! Fixed-capacity circular byte buffer
//!
//! [`RingBuffer`] is the only queue between the transport and the console consumer. Each
//! connection uses two of them: one for decoded inbound bytes and one for outbound bytes
//! waiting for the transport to accept them. Capacity never changes after construction.
//!
//! Fullness is tracked through the free byte count, so `head == tail` is ambiguous on its own
//! and is never used to decide whether the buffer is empty or full.

use thiserror::Error;
use zeroize::Zeroize;

/// Result type for ring buffer operations
pub type BufferResult<T> = std::result::Result<T, BufferError>;

/// Ring buffer contract violations
///
/// Only [`BufferError::Full`] is expected during normal operation; it signals back pressure.
/// The others indicate that the caller asked for something the buffer cannot hold or give.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BufferError {
    /// A buffer must hold at least one byte
    #[error("Ring buffer capacity must be greater than zero")]
    ZeroCapacity,

    /// Backing storage could not be allocated
    #[error("Unable to allocate {capacity} bytes of ring buffer storage")]
    Allocation {
        /// Requested capacity
        capacity: usize,
    },

    /// Not enough free space and overwriting was not allowed
    #[error("Ring buffer is full")]
    Full,

    /// The write can never fit, regardless of overwrite
    #[error("Write of {requested} bytes exceeds ring buffer capacity {capacity}")]
    TooLarge {
        /// Bytes offered
        requested: usize,
        /// Buffer capacity
        capacity: usize,
    },

    /// Nothing is stored
    #[error("Ring buffer is empty")]
    Empty,

    /// Fewer bytes are stored than were requested
    #[error("Requested {requested} bytes but only {available} are stored")]
    InsufficientData {
        /// Bytes requested
        requested: usize,
        /// Bytes stored
        available: usize,
    },

    /// Peek offset lies beyond the stored bytes
    #[error("Offset {offset} is outside the {used} stored bytes")]
    OutOfRange {
        /// Requested offset
        offset: usize,
        /// Bytes stored
        used: usize,
    },

    /// Zero-length reads are rejected
    #[error("Read length must be greater than zero")]
    ZeroLength,
}

/// A fixed-capacity FIFO of bytes with optional overwrite-on-full insertion.
///
/// The buffer either owns its storage (`Box<[u8]>`, the default) or works on top of any
/// caller-supplied byte slice such as a `&mut [u8]` or an array.
///
/// # Example
///
/// ```
/// use telcon_service::RingBuffer;
///
/// let mut buffer = RingBuffer::with_capacity(4).unwrap();
/// buffer.push_bytes(b"ABCD", false).unwrap();
/// buffer.push_byte(b'E', true).unwrap();
///
/// let mut out = [0u8; 4];
/// buffer.pop_bytes(&mut out).unwrap();
/// assert_eq!(&out, b"BCDE");
/// ```
pub struct RingBuffer<S = Box<[u8]>> {
    storage: S,
    head: usize,
    tail: usize,
    free: usize,
}

impl RingBuffer<Box<[u8]>> {
    /// Allocates a buffer holding `capacity` bytes.
    ///
    /// Fails with [`BufferError::ZeroCapacity`] for a zero capacity and with
    /// [`BufferError::Allocation`] when the allocator cannot provide the storage.
    pub fn with_capacity(capacity: usize) -> BufferResult<Self> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| BufferError::Allocation { capacity })?;
        storage.resize(capacity, 0);
        Self::from_storage(storage.into_boxed_slice())
    }
}

impl<S> RingBuffer<S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Builds an empty buffer over existing storage. The storage length is the capacity.
    pub fn from_storage(storage: S) -> BufferResult<Self> {
        let capacity = storage.as_ref().len();
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            storage,
            head: 0,
            tail: 0,
            free: capacity,
        })
    }

    /// Total number of bytes the buffer can hold
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    /// Number of bytes that can be pushed without overwriting
    pub fn free(&self) -> usize {
        self.free
    }

    /// Number of bytes stored
    pub fn used(&self) -> usize {
        self.capacity() - self.free
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.free == self.capacity()
    }

    /// Check if no free space remains
    pub fn is_full(&self) -> bool {
        self.free == 0
    }

    /// Discards all stored bytes. The storage contents are left untouched.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.free = self.capacity();
    }

    /// Discards all stored bytes and overwrites the storage with zeros.
    pub fn wipe(&mut self) {
        self.storage.as_mut().zeroize();
        self.reset();
    }

    /// Appends a single byte.
    ///
    /// When the buffer is full the oldest byte is evicted if `overwrite` is set, otherwise
    /// [`BufferError::Full`] is returned and nothing changes.
    pub fn push_byte(&mut self, byte: u8, overwrite: bool) -> BufferResult<()> {
        if self.free == 0 {
            if !overwrite {
                return Err(BufferError::Full);
            }
            self.advance_head(1);
        }
        let capacity = self.capacity();
        self.storage.as_mut()[self.tail] = byte;
        self.tail = (self.tail + 1) % capacity;
        self.free -= 1;
        Ok(())
    }

    /// Appends `data` as one unit.
    ///
    /// Writes longer than the capacity always fail with [`BufferError::TooLarge`]. Without
    /// `overwrite` a write that does not fit fails with [`BufferError::Full`] and writes
    /// nothing. With `overwrite` exactly `data.len() - free()` of the oldest bytes are evicted
    /// first. An empty `data` is a no-op.
    pub fn push_bytes(&mut self, data: &[u8], overwrite: bool) -> BufferResult<()> {
        let len = data.len();
        if len == 0 {
            return Ok(());
        }
        let capacity = self.capacity();
        if len > capacity {
            return Err(BufferError::TooLarge {
                requested: len,
                capacity,
            });
        }
        if len > self.free {
            if !overwrite {
                return Err(BufferError::Full);
            }
            self.advance_head(len - self.free);
        }

        let first = len.min(capacity - self.tail);
        let tail = self.tail;
        let storage = self.storage.as_mut();
        storage[tail..tail + first].copy_from_slice(&data[..first]);
        storage[..len - first].copy_from_slice(&data[first..]);

        self.tail = (self.tail + len) % capacity;
        self.free -= len;
        Ok(())
    }

    /// Removes and returns the oldest byte.
    pub fn pop_byte(&mut self) -> BufferResult<u8> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        let byte = self.storage.as_ref()[self.head];
        self.advance_head(1);
        Ok(byte)
    }

    /// Removes exactly `dst.len()` of the oldest bytes into `dst`.
    pub fn pop_bytes(&mut self, dst: &mut [u8]) -> BufferResult<()> {
        let len = dst.len();
        self.check_read(len)?;
        let capacity = self.capacity();
        let first = len.min(capacity - self.head);
        let storage = self.storage.as_ref();
        dst[..first].copy_from_slice(&storage[self.head..self.head + first]);
        dst[first..].copy_from_slice(&storage[..len - first]);
        self.advance_head(len);
        Ok(())
    }

    /// Discards exactly `len` of the oldest bytes.
    pub fn skip(&mut self, len: usize) -> BufferResult<()> {
        self.check_read(len)?;
        self.advance_head(len);
        Ok(())
    }

    /// Returns the byte `offset` positions after the oldest one without removing anything.
    pub fn peek_byte(&self, offset: usize) -> BufferResult<u8> {
        let used = self.used();
        if used == 0 {
            return Err(BufferError::Empty);
        }
        if offset >= used {
            return Err(BufferError::OutOfRange { offset, used });
        }
        Ok(self.storage.as_ref()[(self.head + offset) % self.capacity()])
    }

    /// Borrows the longest contiguous run of stored bytes starting at the oldest one, at most
    /// `max_len` long. The run stops early at the end of the storage; the remainder is only
    /// reachable after the run has been consumed.
    pub fn peek_run(&self, max_len: usize) -> &[u8] {
        let len = max_len.min(self.used());
        if len == 0 {
            return &[];
        }
        let run = len.min(self.capacity() - self.head);
        &self.storage.as_ref()[self.head..self.head + run]
    }

    /// Offset of the first stored byte matching `predicate`, without consuming anything.
    pub fn position<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(u8) -> bool,
    {
        let storage = self.storage.as_ref();
        let capacity = storage.len();
        (0..self.used()).find(|offset| predicate(storage[(self.head + offset) % capacity]))
    }

    fn check_read(&self, len: usize) -> BufferResult<()> {
        if len == 0 {
            return Err(BufferError::ZeroLength);
        }
        let available = self.used();
        if available < len {
            return Err(BufferError::InsufficientData {
                requested: len,
                available,
            });
        }
        Ok(())
    }

    fn advance_head(&mut self, len: usize) {
        self.head = (self.head + len) % self.capacity();
        self.free += len;
    }
}

impl<S: AsRef<[u8]>> std::fmt::Debug for RingBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Contents may hold credentials
        let capacity = self.storage.as_ref().len();
        f.debug_struct("RingBuffer")
            .field("capacity", &capacity)
            .field("used", &(capacity - self.free))
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<S: AsRef<[u8]> + AsMut<[u8]>>(buffer: &mut RingBuffer<S>) -> Vec<u8> {
        let mut out = vec![0u8; buffer.used()];
        if !out.is_empty() {
            buffer.pop_bytes(&mut out).unwrap();
        }
        out
    }

    #[test]
    fn test_push_then_pop_single() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        buffer.push_bytes(b"AB", false).unwrap();
        assert_eq!(buffer.pop_byte().unwrap(), b'A');
        assert_eq!(buffer.used(), 1);
    }

    #[test]
    fn test_overwrite_evicts_oldest() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        buffer.push_bytes(b"ABCD", false).unwrap();
        assert_eq!(buffer.free(), 0);
        buffer.push_byte(b'E', true).unwrap();
        assert_eq!(drain(&mut buffer), b"BCDE");
    }

    #[test]
    fn test_full_without_overwrite() {
        let mut buffer = RingBuffer::with_capacity(3).unwrap();
        buffer.push_bytes(b"xyz", false).unwrap();
        assert_eq!(buffer.push_byte(b'!', false), Err(BufferError::Full));
        assert_eq!(buffer.push_bytes(b"1", false), Err(BufferError::Full));
        assert_eq!(drain(&mut buffer), b"xyz");
    }

    #[test]
    fn test_push_bytes_partial_fit_writes_nothing() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        buffer.push_bytes(b"ab", false).unwrap();
        assert_eq!(buffer.push_bytes(b"cde", false), Err(BufferError::Full));
        assert_eq!(buffer.used(), 2);
    }

    #[test]
    fn test_too_large_even_with_overwrite() {
        let mut buffer = RingBuffer::with_capacity(2).unwrap();
        assert_eq!(
            buffer.push_bytes(b"abc", true),
            Err(BufferError::TooLarge {
                requested: 3,
                capacity: 2
            })
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overwrite_push_bytes_across_boundary() {
        let mut buffer = RingBuffer::with_capacity(5).unwrap();
        buffer.push_bytes(b"12345", false).unwrap();
        buffer.skip(2).unwrap();
        buffer.push_bytes(b"ab", false).unwrap();
        // Holds "345ab" with the tail wrapped to index 2
        buffer.push_bytes(b"XYZ", true).unwrap();
        assert_eq!(drain(&mut buffer), b"abXYZ");
    }

    #[test]
    fn test_empty_push_is_noop() {
        let mut buffer = RingBuffer::with_capacity(1).unwrap();
        buffer.push_byte(1, false).unwrap();
        buffer.push_bytes(&[], false).unwrap();
        assert_eq!(buffer.used(), 1);
    }

    #[test]
    fn test_read_errors() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        assert_eq!(buffer.pop_byte(), Err(BufferError::Empty));
        assert_eq!(buffer.peek_byte(0), Err(BufferError::Empty));
        buffer.push_bytes(b"ab", false).unwrap();
        assert_eq!(buffer.skip(0), Err(BufferError::ZeroLength));
        assert_eq!(
            buffer.pop_bytes(&mut [0u8; 3]),
            Err(BufferError::InsufficientData {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(
            buffer.peek_byte(2),
            Err(BufferError::OutOfRange { offset: 2, used: 2 })
        );
    }

    #[test]
    fn test_peek_run_stops_at_storage_end() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        buffer.push_bytes(b"abc", false).unwrap();
        buffer.skip(2).unwrap();
        buffer.push_bytes(b"de", false).unwrap();
        // Holds "cde" starting at index 2
        assert_eq!(buffer.peek_run(10), b"cd");
        assert_eq!(buffer.peek_run(1), b"c");
        assert_eq!(buffer.used(), 3);
        buffer.skip(2).unwrap();
        assert_eq!(buffer.peek_run(10), b"e");
    }

    #[test]
    fn test_peek_byte_and_position_wrap() {
        let mut buffer = RingBuffer::with_capacity(4).unwrap();
        buffer.push_bytes(b"xxab", false).unwrap();
        buffer.skip(2).unwrap();
        buffer.push_bytes(b"\rz", false).unwrap();
        assert_eq!(buffer.peek_byte(2).unwrap(), b'\r');
        assert_eq!(buffer.position(|b| b == b'\r' || b == b'\n'), Some(2));
        assert_eq!(buffer.position(|b| b == b'q'), None);
        assert_eq!(buffer.used(), 4);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RingBuffer::with_capacity(0).err(),
            Some(BufferError::ZeroCapacity)
        );
        let empty: [u8; 0] = [];
        assert_eq!(
            RingBuffer::from_storage(empty).err(),
            Some(BufferError::ZeroCapacity)
        );
    }

    #[test]
    fn test_borrowed_storage() {
        let mut backing = [0u8; 8];
        {
            let mut buffer = RingBuffer::from_storage(&mut backing[..]).unwrap();
            buffer.push_bytes(b"hello", false).unwrap();
            assert_eq!(buffer.capacity(), 8);
        }
        assert_eq!(&backing[..5], b"hello");
    }

    #[test]
    fn test_wipe_zeroes_storage() {
        let mut backing = [0u8; 4];
        {
            let mut buffer = RingBuffer::from_storage(&mut backing).unwrap();
            buffer.push_bytes(b"pw", false).unwrap();
            buffer.wipe();
            assert!(buffer.is_empty());
        }
        assert_eq!(backing, [0u8; 4]);
    }

    #[test]
    fn test_reset_keeps_storage() {
        let mut buffer = RingBuffer::with_capacity(2).unwrap();
        buffer.push_bytes(b"ok", false).unwrap();
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.free(), 2);
    }

    #[test]
    fn test_debug_hides_contents() {
        let mut buffer = RingBuffer::with_capacity(8).unwrap();
        buffer.push_bytes(b"secret", false).unwrap();
        let debug = format!("{buffer:?}");
        assert!(!debug.contains("115"));
        assert!(debug.contains("used: 6"));
    }
}
