//! Retention of undecoded bytes between deliveries.
//!
//! [`Cumulation`] owns the optional [`CumulationBuffer`] of a decoder. When a
//! chunk arrives while bytes are still retained, [`Cumulation::merge`] picks
//! the cheapest way to append it:
//!
//! 1. no buffer yet: allocate one through the [`BufferProvider`];
//! 2. enough trailing room: append in place;
//! 3. enough room once consumed bytes are discarded: compact, then append;
//! 4. otherwise: allocate a buffer holding the unread bytes plus the chunk.
//!
//! After each decode pass [`Cumulation::shrink_to_fit`] copies whatever is
//! still unread into a right-sized buffer, or drops the buffer entirely when
//! nothing is left, so slack accumulated by policy 4 is never retained.

use log::{debug, trace};

use crate::{
    buffer::{BufferProvider, DEFAULT_MIN_CAPACITY, HeapBufferProvider},
    metrics,
};

/// Branch taken by [`Cumulation::merge`] to append a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendPolicy {
    /// No buffer existed, so a new one was allocated for the chunk.
    Allocate,
    /// The chunk fitted behind the write cursor.
    InPlace,
    /// Consumed bytes were discarded to make room for the chunk.
    Compact,
    /// A larger buffer replaced the existing one.
    Reallocate,
}

impl AppendPolicy {
    /// Returns the policy name as a static string for metrics and logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::InPlace => "in_place",
            Self::Compact => "compact",
            Self::Reallocate => "reallocate",
        }
    }
}

/// Growable byte buffer with a read cursor and a write cursor.
///
/// Bytes in `[0, read_cursor)` have been consumed, bytes in
/// `[read_cursor, write_cursor)` are unread, and
/// `read_cursor <= write_cursor <= capacity` always holds.
#[derive(Debug)]
pub struct CumulationBuffer {
    storage: Vec<u8>,
    read: usize,
}

impl CumulationBuffer {
    fn from_storage(storage: Vec<u8>) -> Self { Self { storage, read: 0 } }

    /// Offset of the first unread byte.
    #[must_use]
    pub fn read_cursor(&self) -> usize { self.read }

    /// Offset one past the last written byte.
    #[must_use]
    pub fn write_cursor(&self) -> usize { self.storage.len() }

    /// Total bytes the buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize { self.storage.capacity() }

    /// Number of unread bytes.
    #[must_use]
    pub fn readable(&self) -> usize { self.storage.len() - self.read }

    /// Room left behind the write cursor.
    #[must_use]
    pub fn writable(&self) -> usize { self.storage.capacity() - self.storage.len() }

    /// The unread bytes.
    #[must_use]
    pub fn unread(&self) -> &[u8] { &self.storage[self.read..] }

    /// Split into the written bytes and a handle on the read cursor.
    ///
    /// The decode loop advances the cursor while reading the bytes.
    pub(crate) fn split_mut(&mut self) -> (&[u8], &mut usize) { (&self.storage, &mut self.read) }

    /// Consume the buffer, returning its storage and read cursor.
    pub(crate) fn into_parts(self) -> (Vec<u8>, usize) { (self.storage, self.read) }

    fn compact(&mut self) {
        self.storage.drain(..self.read);
        self.read = 0;
    }

    fn append(&mut self, chunk: &[u8]) { self.storage.extend_from_slice(chunk); }
}

/// Owner of the optional cumulation buffer.
pub struct Cumulation<P = HeapBufferProvider> {
    buffer: Option<CumulationBuffer>,
    provider: P,
    min_capacity: usize,
}

impl Default for Cumulation {
    fn default() -> Self { Self::new(HeapBufferProvider, DEFAULT_MIN_CAPACITY) }
}

impl<P: BufferProvider> Cumulation<P> {
    /// Create an empty cumulation allocating through `provider`.
    ///
    /// Every allocation requests at least `min_capacity` bytes.
    #[must_use]
    pub fn new(provider: P, min_capacity: usize) -> Self {
        Self {
            buffer: None,
            provider,
            min_capacity,
        }
    }

    /// Returns `true` when a buffer is currently retained.
    #[must_use]
    pub fn is_present(&self) -> bool { self.buffer.is_some() }

    /// Number of unread bytes currently retained.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.as_ref().map_or(0, CumulationBuffer::readable) }

    /// The retained buffer, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&CumulationBuffer> { self.buffer.as_ref() }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut CumulationBuffer> { self.buffer.as_mut() }

    /// Remove and return the retained buffer, leaving the cumulation absent.
    pub fn take(&mut self) -> Option<CumulationBuffer> { self.buffer.take() }

    /// Append `chunk` to the retained bytes, returning the branch taken.
    pub fn merge(&mut self, chunk: &[u8]) -> AppendPolicy {
        let Some(buffer) = self.buffer.as_mut() else {
            self.buffer = self.fresh(&[chunk]);
            return self.record(AppendPolicy::Allocate, chunk.len());
        };

        let policy = if buffer.writable() >= chunk.len() {
            AppendPolicy::InPlace
        } else if buffer.writable() + buffer.read_cursor() >= chunk.len() {
            buffer.compact();
            AppendPolicy::Compact
        } else {
            AppendPolicy::Reallocate
        };

        if policy == AppendPolicy::Reallocate {
            if let Some(current) = self.buffer.take() {
                self.buffer = self.fresh(&[current.unread(), chunk]);
            }
        } else {
            buffer.append(chunk);
        }
        self.record(policy, chunk.len())
    }

    /// Retain `remainder`, replacing anything retained before.
    ///
    /// Used after a chunk was decoded directly without being copied; an
    /// empty remainder leaves the cumulation absent.
    pub fn retain(&mut self, remainder: &[u8]) {
        self.buffer = self.fresh(&[remainder]);
        if self.buffer.is_some() {
            debug!("retaining {} undecoded bytes", remainder.len());
            metrics::inc_cumulation_allocations(AppendPolicy::Allocate);
        }
    }

    /// Copy the unread bytes into a right-sized buffer.
    ///
    /// When nothing is left unread the buffer is discarded, so a retained
    /// buffer always holds at least one unread byte.
    pub fn shrink_to_fit(&mut self) {
        let Some(current) = self.buffer.take() else {
            return;
        };
        self.buffer = self.fresh(&[current.unread()]);
        match &self.buffer {
            Some(buffer) => trace!(
                "right-sized cumulation: {} unread bytes, capacity {} -> {}",
                buffer.readable(),
                current.capacity(),
                buffer.capacity()
            ),
            None => trace!("cumulation fully drained"),
        }
    }

    fn fresh(&self, parts: &[&[u8]]) -> Option<CumulationBuffer> {
        let len: usize = parts.iter().map(|part| part.len()).sum();
        if len == 0 {
            return None;
        }
        let mut storage = self.provider.allocate(len.max(self.min_capacity));
        storage.clear();
        for part in parts {
            storage.extend_from_slice(part);
        }
        Some(CumulationBuffer::from_storage(storage))
    }

    fn record(&self, policy: AppendPolicy, chunk_len: usize) -> AppendPolicy {
        trace!(
            "merged {chunk_len} bytes into cumulation ({}), {} unread",
            policy.as_str(),
            self.buffered()
        );
        if matches!(policy, AppendPolicy::Allocate | AppendPolicy::Reallocate) {
            metrics::inc_cumulation_allocations(policy);
        }
        policy
    }
}
