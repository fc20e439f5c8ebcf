//! Pluggable decode strategies.
//!
//! A [`DecodeStrategy`] extracts at most one result from the unread bytes it
//! is shown. It reports [`Decoded::NoFrame`] when more bytes are needed and
//! must leave the view's cursor untouched in that case; when it returns a
//! frame it must have consumed at least one byte. The decoder enforces the
//! second rule and reports violations as
//! [`DecoderError::NoProgress`](crate::DecoderError::NoProgress).
//!
//! Strategies may also skip bytes without producing a frame by returning
//! [`Decoded::NoFrame`] after advancing the cursor; the decoder then invokes
//! them again.
//!
//! Two reference strategies are provided: [`LengthPrefixed`] for 4-byte
//! big-endian length-prefixed frames and [`Delimited`] for delimiter
//! terminated frames. Closures become strategies through [`decode_fn`].

use std::net::SocketAddr;

use crate::view::UnreadView;

mod delimiter;
mod error;
mod length_prefixed;

pub use delimiter::Delimited;
pub use error::FrameError;
pub use length_prefixed::{DEFAULT_MAX_FRAME_LENGTH, LENGTH_HEADER_SIZE, LengthPrefixed};

/// Outcome of a single strategy invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded<F> {
    /// Not enough bytes for a frame, or bytes were skipped without one.
    NoFrame,
    /// One decoded frame.
    Frame(F),
    /// An ordered collection of frames decoded together.
    ///
    /// With [`FanOut::Unfold`](crate::FanOut::Unfold) each frame is
    /// dispatched separately; otherwise the collection is dispatched as a
    /// single batch.
    Frames(Vec<F>),
}

impl<F> Decoded<F> {
    /// Returns `true` unless this is [`Decoded::NoFrame`].
    #[must_use]
    pub fn is_frame(&self) -> bool { !matches!(self, Self::NoFrame) }
}

impl<F> From<Option<F>> for Decoded<F> {
    fn from(value: Option<F>) -> Self { value.map_or(Self::NoFrame, Self::Frame) }
}

/// Per-stream information passed to every strategy invocation.
#[derive(Clone, Debug, Default)]
pub struct DecodeContext {
    source: Option<SocketAddr>,
    stream_ending: bool,
    frames_decoded: u64,
}

impl DecodeContext {
    /// Address attached to the delivery being decoded, if the transport
    /// supplied one.
    ///
    /// Always `None` while the stream is ending.
    #[must_use]
    pub fn source(&self) -> Option<SocketAddr> { self.source }

    /// Returns `true` once the stream has terminated and the decoder is
    /// draining the bytes it still holds.
    #[must_use]
    pub fn is_stream_ending(&self) -> bool { self.stream_ending }

    /// Number of decode results dispatched on this stream so far.
    #[must_use]
    pub fn frames_decoded(&self) -> u64 { self.frames_decoded }

    pub(crate) fn set_source(&mut self, source: Option<SocketAddr>) { self.source = source; }

    pub(crate) fn begin_stream_end(&mut self) {
        self.source = None;
        self.stream_ending = true;
    }

    pub(crate) fn record_frame(&mut self) { self.frames_decoded += 1; }
}

/// Logic extracting frames from buffered bytes.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use bytes::Buf;
/// use framestream::{DecodeContext, DecodeStrategy, Decoded, UnreadView};
///
/// /// Every byte is a frame of its own.
/// struct Bytewise;
///
/// impl DecodeStrategy for Bytewise {
///     type Frame = u8;
///     type Error = Infallible;
///
///     fn decode(
///         &mut self,
///         _ctx: &DecodeContext,
///         src: &mut UnreadView<'_>,
///     ) -> Result<Decoded<u8>, Infallible> {
///         if src.has_remaining() {
///             Ok(Decoded::Frame(src.get_u8()))
///         } else {
///             Ok(Decoded::NoFrame)
///         }
///     }
/// }
/// ```
pub trait DecodeStrategy {
    /// Frame type produced by decoding.
    type Frame;
    /// Domain-specific failure reported by the strategy.
    type Error;

    /// Attempt to decode one result from `src`.
    ///
    /// # Errors
    ///
    /// Returns the strategy's own error type when the bytes cannot be
    /// decoded. The decoder propagates it unmodified.
    fn decode(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error>;

    /// Decode whatever remains once the stream has terminated.
    ///
    /// Invoked exactly once per stream, even when `src` is empty, so a
    /// protocol can produce an artifact purely from reaching end-of-stream.
    /// Defaults to [`decode`](Self::decode).
    ///
    /// # Errors
    ///
    /// Returns the strategy's own error type, typically to report input
    /// truncated by the end of the stream.
    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        self.decode(ctx, src)
    }

    /// Use `terminal` instead of [`decode_last`](Self::decode_last) at
    /// end-of-stream.
    fn with_terminal<T>(self, terminal: T) -> WithTerminal<Self, T>
    where
        Self: Sized,
        T: DecodeStrategy<Frame = Self::Frame, Error = Self::Error>,
    {
        WithTerminal {
            decode: self,
            terminal,
        }
    }
}

impl<S> DecodeStrategy for Box<S>
where
    S: DecodeStrategy + ?Sized,
{
    type Frame = S::Frame;
    type Error = S::Error;

    fn decode(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        (**self).decode(ctx, src)
    }

    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        (**self).decode_last(ctx, src)
    }
}

/// Strategy pairing an ordinary strategy with a separate terminal one.
///
/// Created by [`DecodeStrategy::with_terminal`].
#[derive(Clone, Debug)]
pub struct WithTerminal<S, T> {
    decode: S,
    terminal: T,
}

impl<S, T> DecodeStrategy for WithTerminal<S, T>
where
    S: DecodeStrategy,
    T: DecodeStrategy<Frame = S::Frame, Error = S::Error>,
{
    type Frame = S::Frame;
    type Error = S::Error;

    fn decode(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        self.decode.decode(ctx, src)
    }

    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        self.terminal.decode_last(ctx, src)
    }
}

/// Strategy backed by a closure. Created by [`decode_fn`].
#[derive(Clone)]
pub struct DecodeFn<D>(D);

/// Turn a closure into a [`DecodeStrategy`].
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use framestream::{Decoded, FrameDecoder, Output, decode_fn};
///
/// // Emit everything buffered as one frame.
/// let strategy = decode_fn(|_ctx, src| {
///     let len = src.len();
///     Ok::<_, Infallible>(src.take_slice(len).map_or(Decoded::NoFrame, |b| Decoded::Frame(b.to_vec())))
/// });
/// let mut decoder = FrameDecoder::new(strategy);
/// let mut out: Vec<Output<Vec<u8>, ()>> = Vec::new();
/// decoder.on_chunk(b"abc", None, &mut out).expect("decode");
/// assert_eq!(out.len(), 1);
/// ```
pub fn decode_fn<D, F, E>(decode: D) -> DecodeFn<D>
where
    D: FnMut(&DecodeContext, &mut UnreadView<'_>) -> Result<Decoded<F>, E>,
{
    DecodeFn(decode)
}

impl<D, F, E> DecodeStrategy for DecodeFn<D>
where
    D: FnMut(&DecodeContext, &mut UnreadView<'_>) -> Result<Decoded<F>, E>,
{
    type Frame = F;
    type Error = E;

    fn decode(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Self::Frame>, Self::Error> {
        (self.0)(ctx, src)
    }
}
