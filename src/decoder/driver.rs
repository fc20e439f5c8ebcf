//! The decode loop run over unread bytes.

use log::{trace, warn};

use crate::{
    dispatch::{self, FanOut},
    error::DecoderError,
    event::Downstream,
    strategy::{DecodeContext, DecodeStrategy, Decoded},
    view::UnreadView,
};

/// Invoke `strategy` over `data[*cursor..]` until it needs more bytes.
///
/// The cursor is committed after every successful invocation, so on return
/// it marks the first byte no invocation has consumed. A failing invocation
/// leaves it where that invocation began. Returns the number of results
/// dispatched.
pub(crate) fn run_pass<S, M, D>(
    strategy: &mut S,
    ctx: &mut DecodeContext,
    fan_out: FanOut,
    data: &[u8],
    cursor: &mut usize,
    downstream: &mut D,
) -> Result<usize, DecoderError<S::Error>>
where
    S: DecodeStrategy + ?Sized,
    D: Downstream<S::Frame, M> + ?Sized,
{
    let mut results = 0;
    while *cursor < data.len() {
        let mut view = UnreadView::new(&data[*cursor..]);
        let decoded = strategy
            .decode(ctx, &mut view)
            .map_err(DecoderError::Strategy)?;
        let consumed = view.position();

        match decoded {
            Decoded::NoFrame if consumed == 0 => break,
            Decoded::NoFrame => {
                trace!("strategy skipped {consumed} bytes without a frame");
                *cursor += consumed;
            }
            _ if consumed == 0 => {
                warn!(
                    "decode strategy returned a frame without consuming input: cursor={}, \
                     unread={}, results={results}",
                    *cursor,
                    data.len() - *cursor
                );
                return Err(DecoderError::NoProgress { frames: results });
            }
            decoded => {
                *cursor += consumed;
                ctx.record_frame();
                dispatch::emit(decoded, fan_out, ctx.source(), downstream);
                results += 1;
            }
        }
    }
    trace!(
        "decode pass finished: results={results}, unread={}",
        data.len() - *cursor
    );
    Ok(results)
}
