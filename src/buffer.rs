//! Allocation of cumulation storage.
//!
//! A [`FrameDecoder`](crate::FrameDecoder) never allocates cumulation storage
//! itself. It asks a [`BufferProvider`] for an empty buffer of at least a
//! requested capacity, so applications can pool or instrument allocations per
//! decoder instance.

use std::sync::Arc;

/// Default lower bound, in bytes, for a freshly allocated cumulation buffer.
pub const DEFAULT_MIN_CAPACITY: usize = 256;

/// Source of growable byte buffers for cumulation storage.
///
/// Implementations must return an empty buffer whose capacity is at least
/// `min_capacity`. Providers are shared across decoders, so they must not
/// depend on per-stream state.
///
/// # Examples
///
/// ```
/// use framestream::{BufferProvider, HeapBufferProvider};
///
/// let buf = HeapBufferProvider.allocate(512);
/// assert!(buf.is_empty());
/// assert!(buf.capacity() >= 512);
/// ```
pub trait BufferProvider: Send + Sync {
    /// Allocate an empty buffer able to hold at least `min_capacity` bytes.
    fn allocate(&self, min_capacity: usize) -> Vec<u8>;
}

/// Provider backed by the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapBufferProvider;

impl BufferProvider for HeapBufferProvider {
    fn allocate(&self, min_capacity: usize) -> Vec<u8> { Vec::with_capacity(min_capacity) }
}

impl<P> BufferProvider for Arc<P>
where
    P: BufferProvider + ?Sized,
{
    fn allocate(&self, min_capacity: usize) -> Vec<u8> { (**self).allocate(min_capacity) }
}

impl<P> BufferProvider for Box<P>
where
    P: BufferProvider + ?Sized,
{
    fn allocate(&self, min_capacity: usize) -> Vec<u8> { (**self).allocate(min_capacity) }
}
