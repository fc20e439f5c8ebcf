//! Fan-out of decode results to the downstream collaborator.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::{
    event::{Downstream, Output},
    metrics,
    strategy::Decoded,
};

/// How a [`Decoded::Frames`] collection reaches downstream.
///
/// Fixed when the decoder is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Dispatch every result as one event; collections become
    /// [`Output::Batch`].
    #[default]
    Single,
    /// Dispatch each frame of a collection as its own [`Output::Frame`], in
    /// collection order.
    Unfold,
}

/// Deliver `decoded` downstream according to `fan_out`.
///
/// Returns the number of events delivered. The frames counter grows by the
/// number of frames carried, whether they arrive one by one or as a batch.
pub(crate) fn emit<F, M, D>(
    decoded: Decoded<F>,
    fan_out: FanOut,
    source: Option<SocketAddr>,
    downstream: &mut D,
) -> usize
where
    D: Downstream<F, M> + ?Sized,
{
    let (delivered, frames) = match (decoded, fan_out) {
        (Decoded::NoFrame, _) => (0, 0),
        (Decoded::Frame(frame), _) => {
            downstream.deliver(Output::Frame { frame, source });
            (1, 1)
        }
        (Decoded::Frames(frames), FanOut::Unfold) => {
            let count = frames.len();
            for frame in frames {
                downstream.deliver(Output::Frame { frame, source });
            }
            (count, count)
        }
        (Decoded::Frames(frames), FanOut::Single) => {
            let count = frames.len();
            downstream.deliver(Output::Batch { frames, source });
            (1, count)
        }
    };
    metrics::inc_frames(frames);
    delivered
}
