//! Scripted decode strategies for exercising the decoder's contract checks.

use std::{convert::Infallible, fmt};

use bytes::{Buf, Bytes};
use framestream::{DecodeContext, DecodeStrategy, Decoded, UnreadView};

/// Error raised by [`FailingTerminal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedError(pub &'static str);

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.0) }
}

impl std::error::Error for ScriptedError {}

/// Returns a frame without consuming anything, on every invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stuck;

impl DecodeStrategy for Stuck {
    type Frame = Bytes;
    type Error = Infallible;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        _src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, Infallible> {
        Ok(Decoded::Frame(Bytes::new()))
    }
}

/// Never produces a frame and never consumes a byte.
#[derive(Clone, Copy, Debug, Default)]
pub struct Starved;

impl DecodeStrategy for Starved {
    type Frame = Bytes;
    type Error = Infallible;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        _src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, Infallible> {
        Ok(Decoded::NoFrame)
    }
}

/// Emits fixed-size frames and reports whatever is left at end-of-stream
/// as one final frame.
#[derive(Clone, Copy, Debug)]
pub struct FixedWithRemainder(pub usize);

impl DecodeStrategy for FixedWithRemainder {
    type Frame = Bytes;
    type Error = ScriptedError;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, ScriptedError> {
        Ok(if src.remaining() >= self.0 {
            Decoded::Frame(src.copy_to_bytes(self.0))
        } else {
            Decoded::NoFrame
        })
    }

    fn decode_last(
        &mut self,
        ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, ScriptedError> {
        let decoded = self.decode(ctx, src)?;
        if decoded.is_frame() || !src.has_remaining() {
            return Ok(decoded);
        }
        let len = src.remaining();
        Ok(Decoded::Frame(src.copy_to_bytes(len)))
    }
}

/// Terminal strategy that always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingTerminal;

impl DecodeStrategy for FailingTerminal {
    type Frame = Bytes;
    type Error = ScriptedError;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        _src: &mut UnreadView<'_>,
    ) -> Result<Decoded<Bytes>, ScriptedError> {
        Err(ScriptedError("terminal decode failed"))
    }
}

/// Splits everything buffered into one-byte frames returned as a single
/// collection.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exploding;

impl DecodeStrategy for Exploding {
    type Frame = u8;
    type Error = Infallible;

    fn decode(
        &mut self,
        _ctx: &DecodeContext,
        src: &mut UnreadView<'_>,
    ) -> Result<Decoded<u8>, Infallible> {
        let len = src.remaining();
        if len == 0 {
            return Ok(Decoded::NoFrame);
        }
        Ok(Decoded::Frames(src.copy_to_bytes(len).to_vec()))
    }
}
