//! Strategy for frames terminated by a delimiter sequence.

use bytes::{Buf, Bytes};
use log::warn;

use super::{DEFAULT_MAX_FRAME_LENGTH, DecodeContext, DecodeStrategy, Decoded, FrameError};
use crate::view::UnreadView;

/// Decodes frames terminated by a fixed delimiter, such as `\n`.
///
/// By default the delimiter is stripped from each frame, a frame longer than
/// the maximum is reported as [`FrameError::OversizedFrame`], and bytes left
/// without a delimiter at end-of-stream are reported as
/// [`FrameError::Unterminated`].
///
/// With [`discard_oversized`](Self::discard_oversized) enabled, oversized
/// frames are skipped instead: the strategy consumes them without producing
/// a frame and resynchronises on the next delimiter.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use framestream::{FrameDecoder, Output, strategy::Delimited};
///
/// let mut decoder = FrameDecoder::new(Delimited::lines());
/// let mut out: Vec<Output<Bytes, ()>> = Vec::new();
///
/// decoder.on_chunk(b"one\ntw", None, &mut out).expect("decode");
/// decoder.on_chunk(b"o\n", None, &mut out).expect("decode");
/// assert_eq!(out.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Delimited {
    delimiter: Bytes,
    max_frame_length: usize,
    strip_delimiter: bool,
    discard_oversized: bool,
    emit_trailing: bool,
    discarding: bool,
}

impl Delimited {
    /// Construct a strategy splitting on `delimiter`.
    ///
    /// An empty delimiter is replaced by `\n`.
    #[must_use]
    pub fn new(delimiter: impl Into<Bytes>) -> Self {
        let delimiter = delimiter.into();
        Self {
            delimiter: if delimiter.is_empty() {
                Bytes::from_static(b"\n")
            } else {
                delimiter
            },
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            strip_delimiter: true,
            discard_oversized: false,
            emit_trailing: false,
            discarding: false,
        }
    }

    /// Construct a strategy splitting on `\n`.
    #[must_use]
    pub fn lines() -> Self { Self::new(Bytes::from_static(b"\n")) }

    /// Set the maximum frame length, excluding the delimiter.
    #[must_use]
    pub fn max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Keep or strip the delimiter from decoded frames.
    #[must_use]
    pub fn strip_delimiter(mut self, strip: bool) -> Self {
        self.strip_delimiter = strip;
        self
    }

    /// Skip oversized frames instead of failing.
    #[must_use]
    pub fn discard_oversized(mut self, discard: bool) -> Self {
        self.discard_oversized = discard;
        self
    }

    /// Emit bytes left without a delimiter at end-of-stream as a final frame.
    #[must_use]
    pub fn emit_trailing(mut self, emit: bool) -> Self {
        self.emit_trailing = emit;
        self
    }

    fn skip_oversized(&mut self, src: &mut UnreadView<'_>, size: usize) -> Decoded<Bytes> {
        warn!(
            "discarding oversized delimited frame: size={size}, max={}",
            self.max_frame_length
        );
        src.advance(size);
        Decoded::NoFrame
    }
}

impl DecodeStrategy for Delimited {
    type Frame = Bytes;
    type Error = FrameError;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, FrameError> {
        let delimiter_len = self.delimiter.len();
        let Some(index) = src.find(&self.delimiter) else {
            if self.discarding {
                // Keep a possible delimiter prefix for the next delivery.
                let skip = src.remaining().saturating_sub(delimiter_len - 1);
                src.advance(skip);
                return Ok(Decoded::NoFrame);
            }
            let size = src.remaining();
            if size <= self.max_frame_length {
                return Ok(Decoded::NoFrame);
            }
            if !self.discard_oversized {
                return Err(FrameError::OversizedFrame {
                    size,
                    max: self.max_frame_length,
                });
            }
            self.discarding = true;
            let skip = size.saturating_sub(delimiter_len - 1);
            return Ok(self.skip_oversized(src, skip));
        };

        if self.discarding {
            self.discarding = false;
            src.advance(index + delimiter_len);
            return Ok(Decoded::NoFrame);
        }
        if index > self.max_frame_length {
            if !self.discard_oversized {
                return Err(FrameError::OversizedFrame {
                    size: index,
                    max: self.max_frame_length,
                });
            }
            return Ok(self.skip_oversized(src, index + delimiter_len));
        }

        let frame = if self.strip_delimiter {
            let frame = src.copy_to_bytes(index);
            src.advance(delimiter_len);
            frame
        } else {
            src.copy_to_bytes(index + delimiter_len)
        };
        Ok(Decoded::Frame(frame))
    }

    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, FrameError> {
        let decoded = self.decode(ctx, src)?;
        if decoded.is_frame() || !src.has_remaining() || self.discarding {
            return Ok(decoded);
        }
        if self.emit_trailing {
            let len = src.remaining();
            return Ok(Decoded::Frame(src.copy_to_bytes(len)));
        }
        Err(FrameError::Unterminated {
            bytes_received: src.remaining(),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::*;

    fn run(strategy: &mut Delimited, bytes: &[u8]) -> (Result<Decoded<Bytes>, FrameError>, usize) {
        let mut view = UnreadView::new(bytes);
        let result = strategy.decode(&DecodeContext::default(), &mut view);
        (result, view.position())
    }

    #[rstest]
    #[case::stripped(true, &b"abc"[..])]
    #[case::kept(false, &b"abc\r\n"[..])]
    fn decodes_up_to_delimiter(#[case] strip: bool, #[case] expected: &[u8]) {
        let mut strategy = Delimited::new(Bytes::from_static(b"\r\n")).strip_delimiter(strip);
        let (result, consumed) = run(&mut strategy, b"abc\r\nrest");

        assert_eq!(
            result.expect("decode should succeed"),
            Decoded::Frame(Bytes::copy_from_slice(expected))
        );
        assert_eq!(consumed, 5);
    }

    #[test]
    fn waits_for_delimiter() {
        let mut strategy = Delimited::lines();
        let (result, consumed) = run(&mut strategy, b"partial");

        assert_eq!(result.expect("decode should succeed"), Decoded::NoFrame);
        assert_eq!(consumed, 0);
    }

    #[test]
    fn empty_line_is_a_frame() {
        let mut strategy = Delimited::lines();
        let (result, consumed) = run(&mut strategy, b"\nnext");

        assert_eq!(result.expect("decode should succeed"), Decoded::Frame(Bytes::new()));
        assert_eq!(consumed, 1);
    }

    #[rstest]
    #[case::terminated(&b"toolong\n"[..], 7)]
    #[case::unterminated(&b"toolong"[..], 7)]
    fn rejects_oversized_frames(#[case] bytes: &[u8], #[case] size: usize) {
        let mut strategy = Delimited::lines().max_frame_length(4);
        let (result, consumed) = run(&mut strategy, bytes);

        assert_eq!(result, Err(FrameError::OversizedFrame { size, max: 4 }));
        assert_eq!(consumed, 0);
    }

    #[test]
    fn discards_oversized_terminated_frame() {
        let mut strategy = Delimited::lines().max_frame_length(4).discard_oversized(true);
        let (result, consumed) = run(&mut strategy, b"toolong\nok\n");

        assert_eq!(result.expect("decode should succeed"), Decoded::NoFrame);
        assert_eq!(consumed, 8);
    }

    #[test]
    fn discarding_resynchronises_on_next_delimiter() {
        let mut strategy = Delimited::lines().max_frame_length(2).discard_oversized(true);

        let (first, consumed) = run(&mut strategy, b"abcdef");
        assert_eq!(first.expect("decode should succeed"), Decoded::NoFrame);
        assert_eq!(consumed, 6);

        let (second, consumed) = run(&mut strategy, b"gh\nok\n");
        assert_eq!(second.expect("decode should succeed"), Decoded::NoFrame);
        assert_eq!(consumed, 3);

        let (third, _) = run(&mut strategy, b"ok\n");
        assert_eq!(
            third.expect("decode should succeed"),
            Decoded::Frame(Bytes::from_static(b"ok"))
        );
    }

    #[rstest]
    #[case::error(false, Err(FrameError::Unterminated { bytes_received: 4 }))]
    #[case::trailing(true, Ok(Decoded::Frame(Bytes::from_static(b"tail"))))]
    fn decode_last_handles_unterminated_tail(
        #[case] emit_trailing: bool,
        #[case] expected: Result<Decoded<Bytes>, FrameError>,
    ) {
        let mut strategy = Delimited::lines().emit_trailing(emit_trailing);
        let mut view = UnreadView::new(b"tail");

        let result = strategy.decode_last(&DecodeContext::default(), &mut view);

        assert_eq!(result, expected);
    }

    #[test]
    fn empty_delimiter_falls_back_to_newline() {
        let mut strategy = Delimited::new(Bytes::new());
        let (result, _) = run(&mut strategy, b"a\n");
        assert_eq!(
            result.expect("decode should succeed"),
            Decoded::Frame(Bytes::from_static(b"a"))
        );
    }
}
