//! Strategy for frames carrying a 4-byte big-endian length prefix.

use bytes::{Buf, Bytes};

use super::{DecodeContext, DecodeStrategy, Decoded, FrameError};
use crate::view::UnreadView;

/// Length prefix header size (4 bytes for big-endian u32).
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Maximum payload length accepted by [`LengthPrefixed::default`].
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024;

/// Decodes `[len: u32 BE][payload; len]` frames into their payload.
///
/// The header is consumed along with the payload, so a zero-length frame
/// still makes progress. A header declaring more than the maximum frame
/// length is reported as [`FrameError::OversizedFrame`] without consuming
/// anything.
///
/// # Examples
///
/// ```
/// use framestream::{FrameDecoder, Output, strategy::LengthPrefixed};
///
/// let mut decoder = FrameDecoder::new(LengthPrefixed::new(16));
/// let mut out: Vec<Output<_, ()>> = Vec::new();
///
/// decoder
///     .on_chunk(&[0, 0, 0, 2, b'A', b'B', 0, 0], None, &mut out)
///     .expect("decode");
/// assert_eq!(out.len(), 1);
/// assert_eq!(decoder.buffered(), 2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LengthPrefixed {
    max_frame_length: usize,
}

impl LengthPrefixed {
    /// Construct a strategy accepting payloads up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self { Self { max_frame_length } }

    /// Return the maximum payload length accepted.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    fn declared_length(&self, src: &UnreadView<'_>) -> Result<Option<usize>, FrameError> {
        let Some(mut header) = src.peek(LENGTH_HEADER_SIZE) else {
            return Ok(None);
        };
        let declared = header.get_u32();
        match usize::try_from(declared) {
            Ok(len) if len <= self.max_frame_length => Ok(Some(len)),
            _ => Err(FrameError::OversizedFrame {
                size: usize::try_from(declared).unwrap_or(usize::MAX),
                max: self.max_frame_length,
            }),
        }
    }
}

impl Default for LengthPrefixed {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH) }
}

impl DecodeStrategy for LengthPrefixed {
    type Frame = Bytes;
    type Error = FrameError;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, FrameError> {
        let Some(len) = self.declared_length(src)? else {
            return Ok(Decoded::NoFrame);
        };
        if src.remaining() < LENGTH_HEADER_SIZE + len {
            return Ok(Decoded::NoFrame);
        }
        src.advance(LENGTH_HEADER_SIZE);
        Ok(Decoded::Frame(src.copy_to_bytes(len)))
    }

    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, FrameError> {
        // Clean close: nothing left at a frame boundary.
        if !src.has_remaining() {
            return Ok(Decoded::NoFrame);
        }
        let decoded = self.decode(ctx, src)?;
        if decoded.is_frame() {
            return Ok(decoded);
        }

        let bytes_received = src.remaining();
        match self.declared_length(src)? {
            Some(expected) => Err(FrameError::MidFrame {
                bytes_received: bytes_received - LENGTH_HEADER_SIZE,
                expected,
            }),
            None => Err(FrameError::MidHeader {
                bytes_received,
                header_size: LENGTH_HEADER_SIZE,
            }),
        }
    }
}
