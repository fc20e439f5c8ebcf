//! Async adapters feeding a [`FrameDecoder`] from a transport.
//!
//! [`StreamDriver`] reads chunks from an [`AsyncRead`] or a [`Stream`] of
//! byte chunks and hands each one to the decoder until the transport reaches
//! end-of-file or the driver's shutdown token is cancelled. Downstream sees
//! exactly one termination event from a driven stream, including when
//! decoding or reading fails. A decode failure closes the stream through
//! [`FrameDecoder::abandon`], so the failing strategy is not run again over
//! the bytes it rejected.

use std::{io, net::SocketAddr};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, warn};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    buffer::BufferProvider,
    decoder::FrameDecoder,
    error::DecoderError,
    event::{Downstream, StreamEnd},
    strategy::DecodeStrategy,
};

/// Default number of bytes requested per read.
pub const DEFAULT_READ_SIZE: usize = 8 * 1024;

/// Tunables for [`StreamDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Maximum bytes read from the transport per chunk.
    pub read_size: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
        }
    }
}

/// Drives a decoder from an async transport.
///
/// # Examples
///
/// ```
/// use framestream::{FrameDecoder, Output, StreamDriver, StreamEnd, strategy::LengthPrefixed};
/// use tokio::io::AsyncWriteExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut client, server) = tokio::io::duplex(64);
/// client.write_all(&[0, 0, 0, 2, b'h', b'i']).await.expect("write");
/// drop(client);
///
/// let mut decoder = FrameDecoder::new(LengthPrefixed::default());
/// let mut out: Vec<Output<_, ()>> = Vec::new();
/// let end = StreamDriver::new()
///     .run_reader(&mut decoder, server, &mut out)
///     .await
///     .expect("drive");
///
/// assert_eq!(end, StreamEnd::Disconnected);
/// assert_eq!(out.len(), 2);
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct StreamDriver {
    config: DriveConfig,
    shutdown: CancellationToken,
    source: Option<SocketAddr>,
}

impl StreamDriver {
    /// Create a driver with the default configuration.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Replace the driver's configuration.
    #[must_use]
    pub fn with_config(mut self, config: DriveConfig) -> Self {
        self.config = config;
        self
    }

    /// End the stream as [`StreamEnd::Closed`] once `token` is cancelled.
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Tag every chunk with `source`.
    #[must_use]
    pub fn with_source(mut self, source: SocketAddr) -> Self {
        self.source = Some(source);
        self
    }

    /// Token that closes driven streams when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    /// Decode everything read from `reader`.
    ///
    /// Returns the termination signal the stream ended with:
    /// [`StreamEnd::Disconnected`] on end-of-file and [`StreamEnd::Closed`]
    /// on shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::Transport`] when reading fails and the
    /// decoder's error when decoding fails. The stream has been ended in
    /// both cases.
    pub async fn run_reader<R, S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        mut reader: R,
        downstream: &mut D,
    ) -> Result<StreamEnd, DecoderError<S::Error>>
    where
        R: AsyncRead + Unpin,
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        let span = tracing::debug_span!("framestream.drive", source = ?self.source);
        async move {
            let mut buf = vec![0; self.config.read_size.max(1)];
            loop {
                let read = tokio::select! {
                    biased;

                    () = self.shutdown.cancelled() => None,
                    res = reader.read(&mut buf) => Some(res),
                };
                let chunk = match read {
                    None => return self.finish(decoder, StreamEnd::Closed, downstream),
                    Some(Ok(0)) => return self.finish(decoder, StreamEnd::Disconnected, downstream),
                    Some(Ok(n)) => &buf[..n],
                    Some(Err(e)) => return Err(self.abort_read(decoder, e, downstream)),
                };
                if let Err(e) = decoder.on_chunk(chunk, self.source, downstream) {
                    return Err(self.abort_decode(decoder, e, downstream));
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Decode every chunk yielded by `chunks`.
    ///
    /// Behaves like [`run_reader`](Self::run_reader); the stream finishing
    /// counts as end-of-file.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::Transport`] when the stream yields an error
    /// and the decoder's error when decoding fails. The stream has been
    /// ended in both cases.
    pub async fn run_stream<St, S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        mut chunks: St,
        downstream: &mut D,
    ) -> Result<StreamEnd, DecoderError<S::Error>>
    where
        St: Stream<Item = io::Result<Bytes>> + Unpin,
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        let span = tracing::debug_span!("framestream.drive", source = ?self.source);
        async move {
            loop {
                let next = tokio::select! {
                    biased;

                    () = self.shutdown.cancelled() => None,
                    item = chunks.next() => Some(item),
                };
                let chunk = match next {
                    None => return self.finish(decoder, StreamEnd::Closed, downstream),
                    Some(None) => return self.finish(decoder, StreamEnd::Disconnected, downstream),
                    Some(Some(Ok(chunk))) => chunk,
                    Some(Some(Err(e))) => return Err(self.abort_read(decoder, e, downstream)),
                };
                if let Err(e) = decoder.on_chunk(&chunk, self.source, downstream) {
                    return Err(self.abort_decode(decoder, e, downstream));
                }
            }
        }
        .instrument(span)
        .await
    }

    fn finish<S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        end: StreamEnd,
        downstream: &mut D,
    ) -> Result<StreamEnd, DecoderError<S::Error>>
    where
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        debug!("ending driven stream: {end:?}, source={:?}", self.source);
        decoder.on_stream_end(end, downstream)?;
        Ok(end)
    }

    fn abort_read<S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        err: io::Error,
        downstream: &mut D,
    ) -> DecoderError<S::Error>
    where
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        warn!("transport read failed: source={:?}, error={err}", self.source);
        self.end_after_failure(decoder, StreamEnd::Disconnected, downstream);
        DecoderError::Transport(err)
    }

    fn abort_decode<S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        err: DecoderError<S::Error>,
        downstream: &mut D,
    ) -> DecoderError<S::Error>
    where
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        let discarded = decoder.abandon(StreamEnd::Closed, downstream);
        debug!(
            "closed stream after decode failure: source={:?}, discarded={discarded}",
            self.source
        );
        err
    }

    fn end_after_failure<S, P, M, D>(
        &self,
        decoder: &mut FrameDecoder<S, P>,
        end: StreamEnd,
        downstream: &mut D,
    ) where
        S: DecodeStrategy,
        P: BufferProvider,
        D: Downstream<S::Frame, M> + ?Sized,
    {
        // The first failure is what the caller sees.
        if let Err(drain) = decoder.on_stream_end(end, downstream) {
            warn!(
                "draining after failure also failed: type={}, source={:?}",
                drain.error_type(),
                self.source
            );
        }
    }
}
