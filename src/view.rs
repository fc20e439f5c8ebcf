//! Read-only cursor over the bytes a decode strategy may consume.
//!
//! Each strategy invocation receives a fresh [`UnreadView`] starting at the
//! first unread byte. The view implements [`bytes::Buf`], so strategies can
//! use `get_u8`, `get_u32` and `copy_to_bytes` directly. The decoder commits
//! the view's position only when the invocation succeeds.

use bytes::Buf;
use thiserror::Error;

/// Error returned when seeking outside the view.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("seek to {position} is outside a view of {len} bytes")]
pub struct OutOfBounds {
    /// Requested position.
    pub position: usize,
    /// Length of the view.
    pub len: usize,
}

/// Cursor over currently buffered unread bytes.
///
/// Positions are relative to the start of the view, which is where the
/// current invocation began. A strategy can seek back to any earlier
/// position within its own invocation but never before it, so bytes
/// consumed by earlier invocations stay consumed.
///
/// The view may be empty; strategies must not assume at least one byte.
///
/// # Examples
///
/// ```
/// use bytes::Buf;
/// use framestream::UnreadView;
///
/// let data = [0, 0, 0, 2, b'h', b'i'];
/// let mut view = UnreadView::new(&data);
///
/// assert_eq!(view.get_u32(), 2);
/// assert_eq!(view.position(), 4);
/// assert_eq!(view.chunk(), b"hi");
/// view.seek(0).expect("seek within bounds");
/// assert_eq!(view.remaining(), 6);
/// ```
#[derive(Debug)]
pub struct UnreadView<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> UnreadView<'a> {
    /// Create a view positioned at the first of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self { Self { bytes, position: 0 } }

    /// Number of bytes consumed since the view was created.
    #[must_use]
    pub fn position(&self) -> usize { self.position }

    /// Total bytes covered by the view, consumed or not.
    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Returns `true` when the view covers no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Move the cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if `position` is past the end of the view.
    pub fn seek(&mut self, position: usize) -> Result<(), OutOfBounds> {
        if position > self.bytes.len() {
            return Err(OutOfBounds {
                position,
                len: self.bytes.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Look at the next `len` bytes without consuming them.
    ///
    /// Returns `None` when fewer than `len` bytes remain.
    #[must_use]
    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        self.bytes.get(self.position..end)
    }

    /// Consume and return the next `len` bytes.
    ///
    /// Returns `None`, leaving the cursor untouched, when fewer than `len`
    /// bytes remain.
    pub fn take_slice(&mut self, len: usize) -> Option<&'a [u8]> {
        let taken = self.peek(len)?;
        self.position += len;
        Some(taken)
    }

    /// Offset from the cursor to the first occurrence of `needle`.
    #[must_use]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.chunk()
            .windows(needle.len())
            .position(|window| window == needle)
    }
}

impl Buf for UnreadView<'_> {
    fn remaining(&self) -> usize { self.bytes.len() - self.position }

    fn chunk(&self) -> &[u8] { &self.bytes[self.position..] }

    /// # Panics
    ///
    /// Panics if `cnt` exceeds [`remaining`](Buf::remaining), as required by
    /// the [`Buf`] contract.
    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining(),
            "cannot advance past the end of the view: {cnt} > {}",
            self.remaining()
        );
        self.position += cnt;
    }
}
