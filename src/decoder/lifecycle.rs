//! End-of-stream draining.

use std::marker::PhantomData;

use log::debug;

use super::{FrameDecoder, driver};
use crate::{
    buffer::BufferProvider,
    cumulation::CumulationBuffer,
    dispatch,
    error::DecoderError,
    event::{Downstream, Output, StreamEnd},
    strategy::DecodeStrategy,
    view::UnreadView,
};

/// Forwards the termination event when dropped.
///
/// Dropping also happens while unwinding, so a panicking strategy cannot
/// swallow the event.
struct EndGuard<'a, F, M, D>
where
    D: Downstream<F, M> + ?Sized,
{
    downstream: &'a mut D,
    end: StreamEnd,
    _output: PhantomData<fn(F, M)>,
}

impl<F, M, D> Drop for EndGuard<'_, F, M, D>
where
    D: Downstream<F, M> + ?Sized,
{
    fn drop(&mut self) { self.downstream.deliver(Output::End(self.end)); }
}

impl<S, P> FrameDecoder<S, P>
where
    S: DecodeStrategy,
    P: BufferProvider,
{
    /// Drain the stream after a termination signal.
    ///
    /// The retained bytes are taken out of the decoder and decoded until the
    /// strategy needs more. The terminal
    /// [`decode_last`](DecodeStrategy::decode_last) then runs once over
    /// whatever is left, even when nothing is, and its result is dispatched
    /// without a source address. Bytes it leaves unread are discarded.
    ///
    /// `end` is forwarded downstream last, on every exit path. A second
    /// termination signal only forwards `end` again.
    ///
    /// # Errors
    ///
    /// Returns a [`DecoderError`] when draining fails. The termination event
    /// has been forwarded regardless.
    pub fn on_stream_end<M, D>(
        &mut self,
        end: StreamEnd,
        downstream: &mut D,
    ) -> Result<(), DecoderError<S::Error>>
    where
        D: Downstream<S::Frame, M> + ?Sized,
    {
        if self.ended {
            debug!("stream already ended; forwarding {end:?} only");
            downstream.deliver(Output::End(end));
            return Ok(());
        }
        self.ended = true;

        let guard = EndGuard {
            downstream,
            end,
            _output: PhantomData,
        };
        let result = self.drain(&mut *guard.downstream);
        if let Err(err) = &result {
            self.report(err);
        }
        drop(guard);
        result
    }

    /// End the stream without invoking the strategy again.
    ///
    /// Used after decoding has failed: the retained bytes are discarded
    /// rather than flushed, and `end` is forwarded. Returns the number of
    /// bytes discarded. Like [`on_stream_end`](Self::on_stream_end), a
    /// stream that has already ended only forwards `end`.
    pub fn abandon<M, D>(&mut self, end: StreamEnd, downstream: &mut D) -> usize
    where
        D: Downstream<S::Frame, M> + ?Sized,
    {
        let discarded = if self.ended {
            0
        } else {
            self.ended = true;
            self.cumulation
                .take()
                .as_ref()
                .map_or(0, CumulationBuffer::readable)
        };
        debug!("abandoning stream with {discarded} unread bytes; forwarding {end:?}");
        downstream.deliver(Output::End(end));
        discarded
    }

    fn drain<M, D>(&mut self, downstream: &mut D) -> Result<(), DecoderError<S::Error>>
    where
        D: Downstream<S::Frame, M> + ?Sized,
    {
        let (storage, mut cursor) = self
            .cumulation
            .take()
            .map_or_else(|| (Vec::new(), 0), CumulationBuffer::into_parts);
        self.ctx.begin_stream_end();
        debug!("stream ending with {} unread bytes", storage.len() - cursor);

        if cursor < storage.len() {
            driver::run_pass(
                &mut self.strategy,
                &mut self.ctx,
                self.fan_out,
                &storage,
                &mut cursor,
                downstream,
            )?;
        }

        let mut view = UnreadView::new(&storage[cursor..]);
        let decoded = self
            .strategy
            .decode_last(&self.ctx, &mut view)
            .map_err(DecoderError::Strategy)?;
        let discarded = view.len() - view.position();
        if discarded > 0 {
            debug!("discarding {discarded} bytes left after the final decode");
        }
        if decoded.is_frame() {
            self.ctx.record_frame();
            dispatch::emit(decoded, self.fan_out, None, downstream);
        }
        Ok(())
    }
}
