//! The frame decoder core.
//!
//! [`FrameDecoder`] owns one stream's cumulation, its decode strategy and the
//! per-stream [`DecodeContext`]. Every delivery runs one decode pass: the
//! strategy is invoked until it reports that it needs more bytes or the
//! unread bytes are exhausted, and every result is dispatched downstream
//! before the call returns.
//!
//! A decoder is owned by exactly one stream and is driven sequentially; it
//! performs no locking.

use std::net::SocketAddr;

use log::{trace, warn};

use crate::{
    buffer::{BufferProvider, HeapBufferProvider},
    cumulation::Cumulation,
    dispatch::FanOut,
    error::DecoderError,
    event::{Downstream, Inbound, Output, StreamEnd},
    metrics,
    strategy::{DecodeContext, DecodeStrategy},
};

mod config;
mod driver;
mod lifecycle;

pub use config::{DecoderConfig, FrameDecoderBuilder};

/// Stream decoder accumulating bytes and running a [`DecodeStrategy`].
///
/// # Examples
///
/// ```
/// use framestream::{FanOut, FrameDecoder, Inbound, Output, strategy::Delimited};
///
/// let mut decoder = FrameDecoder::builder(Delimited::lines())
///     .fan_out(FanOut::Unfold)
///     .build();
/// let mut out: Vec<Output<_, ()>> = Vec::new();
///
/// decoder.handle(Inbound::chunk(&b"one\ntw"[..]), &mut out).expect("decode");
/// decoder.handle(Inbound::chunk(&b"o\n"[..]), &mut out).expect("decode");
/// decoder.handle(Inbound::Closed, &mut out).expect("drain");
///
/// assert_eq!(out.len(), 3);
/// assert!(out[2].is_end());
/// ```
pub struct FrameDecoder<S, P = HeapBufferProvider> {
    strategy: S,
    cumulation: Cumulation<P>,
    fan_out: FanOut,
    ctx: DecodeContext,
    ended: bool,
}

impl<S: DecodeStrategy> FrameDecoder<S> {
    /// Create a decoder with the default configuration.
    #[must_use]
    pub fn new(strategy: S) -> Self { Self::builder(strategy).build() }

    /// Start configuring a decoder around `strategy`.
    #[must_use]
    pub fn builder(strategy: S) -> FrameDecoderBuilder<S> { FrameDecoderBuilder::new(strategy) }
}

impl<S, P> FrameDecoder<S, P>
where
    S: DecodeStrategy,
    P: BufferProvider,
{
    pub(crate) fn from_parts(strategy: S, cumulation: Cumulation<P>, fan_out: FanOut) -> Self {
        Self {
            strategy,
            cumulation,
            fan_out,
            ctx: DecodeContext::default(),
            ended: false,
        }
    }

    /// Process one delivery from the transport.
    ///
    /// Chunks are decoded, other messages are passed through as
    /// [`Output::Message`] and termination signals drain the stream.
    ///
    /// # Errors
    ///
    /// Returns a [`DecoderError`] when the strategy fails or breaks the
    /// progress rule. See [`on_chunk`](Self::on_chunk) and
    /// [`on_stream_end`](Self::on_stream_end).
    pub fn handle<M, D>(
        &mut self,
        inbound: Inbound<M>,
        downstream: &mut D,
    ) -> Result<(), DecoderError<S::Error>>
    where
        D: Downstream<S::Frame, M> + ?Sized,
    {
        match inbound {
            Inbound::Chunk { bytes, source } => self.on_chunk(&bytes, source, downstream),
            Inbound::Message(message) => {
                downstream.deliver(Output::Message(message));
                Ok(())
            }
            Inbound::Disconnected => self.on_stream_end(StreamEnd::Disconnected, downstream),
            Inbound::Closed => self.on_stream_end(StreamEnd::Closed, downstream),
        }
    }

    /// Decode a chunk of stream bytes received from `source`.
    ///
    /// With nothing retained the strategy runs directly against `chunk` and
    /// only the unread remainder is copied. Otherwise the chunk is merged
    /// into the cumulation first. Either way the unread bytes are right-sized
    /// after the pass, including when the pass fails. An empty chunk is a
    /// no-op, as is any chunk arriving after the stream has ended.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::Strategy`] when the strategy fails and
    /// [`DecoderError::NoProgress`] when it returns a frame without
    /// consuming input. Results dispatched earlier in the pass stay
    /// dispatched; the bytes of the failing invocation stay unread.
    pub fn on_chunk<M, D>(
        &mut self,
        chunk: &[u8],
        source: Option<SocketAddr>,
        downstream: &mut D,
    ) -> Result<(), DecoderError<S::Error>>
    where
        D: Downstream<S::Frame, M> + ?Sized,
    {
        if chunk.is_empty() {
            trace!("ignoring empty chunk");
            return Ok(());
        }
        if self.ended {
            warn!(
                "discarding {} bytes delivered after stream end (source={source:?})",
                chunk.len()
            );
            return Ok(());
        }
        self.ctx.set_source(source);

        let result = if self.cumulation.is_present() {
            self.cumulation.merge(chunk);
            let result = match self.cumulation.buffer_mut() {
                Some(buffer) => {
                    let (data, cursor) = buffer.split_mut();
                    driver::run_pass(
                        &mut self.strategy,
                        &mut self.ctx,
                        self.fan_out,
                        data,
                        cursor,
                        downstream,
                    )
                }
                None => Ok(0),
            };
            self.cumulation.shrink_to_fit();
            result
        } else {
            let mut cursor = 0;
            let result = driver::run_pass(
                &mut self.strategy,
                &mut self.ctx,
                self.fan_out,
                chunk,
                &mut cursor,
                downstream,
            );
            self.cumulation.retain(&chunk[cursor..]);
            result
        };

        result.map(drop).inspect_err(|err| self.report(err))
    }

    /// Number of unread bytes currently retained.
    #[must_use]
    pub fn buffered(&self) -> usize { self.cumulation.buffered() }

    /// Returns `true` when a cumulation buffer is currently retained.
    #[must_use]
    pub fn has_cumulation(&self) -> bool { self.cumulation.is_present() }

    /// The retained bytes and their buffer.
    #[must_use]
    pub fn cumulation(&self) -> &Cumulation<P> { &self.cumulation }

    /// Per-stream state shown to the strategy.
    #[must_use]
    pub fn context(&self) -> &DecodeContext { &self.ctx }

    /// Fan-out mode fixed at construction.
    #[must_use]
    pub fn fan_out(&self) -> FanOut { self.fan_out }

    /// Returns `true` once a termination signal has been handled.
    #[must_use]
    pub fn is_ended(&self) -> bool { self.ended }

    /// Borrow the strategy.
    #[must_use]
    pub fn strategy(&self) -> &S { &self.strategy }

    fn report(&self, err: &DecoderError<S::Error>) {
        warn!(
            "decode pass failed: type={}, defect={}, source={:?}, buffered={}",
            err.error_type(),
            err.is_defect(),
            self.ctx.source(),
            self.buffered()
        );
        metrics::inc_decode_errors(err.error_type());
    }
}

#[cfg(test)]
mod tests;
