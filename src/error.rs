//! Error types raised by the decoder.
//!
//! Needing more bytes is not an error: a strategy signals it with
//! [`Decoded::NoFrame`](crate::Decoded::NoFrame) and the decoder waits for
//! the next delivery. What remains falls into three categories:
//!
//! - [`DecoderError::NoProgress`]: the strategy returned a frame without consuming input. This is
//!   always a defect in the strategy.
//! - [`DecoderError::Strategy`]: the strategy reported a domain-specific failure, carried
//!   unmodified.
//! - [`DecoderError::Transport`]: the transport feeding a [`StreamDriver`](crate::StreamDriver)
//!   failed.
//!
//! All of them end the current decode pass. Frames dispatched earlier in the
//! pass stay dispatched; the decoder never retries.

use std::io;

use thiserror::Error;

/// Failure raised while decoding a stream.
///
/// # Examples
///
/// ```
/// use framestream::{DecoderError, strategy::FrameError};
///
/// let err: DecoderError<FrameError> = DecoderError::NoProgress { frames: 0 };
/// assert!(err.is_defect());
/// assert_eq!(err.error_type(), "no_progress");
/// ```
#[derive(Debug, Error)]
pub enum DecoderError<E> {
    /// A strategy returned a frame without advancing the read cursor.
    #[error(
        "decode strategy returned a frame without consuming input (after {frames} results in this \
         pass)"
    )]
    NoProgress {
        /// Results dispatched earlier in the same pass.
        frames: usize,
    },

    /// The strategy reported a domain-specific failure.
    #[error("decode strategy failed: {0}")]
    Strategy(#[source] E),

    /// The transport delivering chunks failed.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),
}

impl<E> DecoderError<E> {
    /// Returns `true` when the error reveals a broken strategy rather than
    /// bad input.
    #[must_use]
    pub fn is_defect(&self) -> bool { matches!(self, Self::NoProgress { .. }) }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of `"no_progress"`, `"strategy"` or `"transport"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NoProgress { .. } => "no_progress",
            Self::Strategy(_) => "strategy",
            Self::Transport(_) => "transport",
        }
    }

    /// Return the strategy's own error, if that is what this is.
    #[must_use]
    pub fn into_strategy(self) -> Option<E> {
        match self {
            Self::Strategy(err) => Some(err),
            _ => None,
        }
    }
}

impl<E> From<DecoderError<E>> for io::Error
where
    E: Into<io::Error>,
{
    fn from(err: DecoderError<E>) -> Self {
        match err {
            DecoderError::Strategy(e) => e.into(),
            DecoderError::Transport(e) => e,
            DecoderError::NoProgress { frames } => io::Error::other(format!(
                "decode strategy returned a frame without consuming input (after {frames} \
                 results in this pass)"
            )),
        }
    }
}
