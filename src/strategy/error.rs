//! Errors reported by the reference strategies.

use std::io;

use thiserror::Error;

/// Framing failures detected by [`LengthPrefixed`](super::LengthPrefixed)
/// and [`Delimited`](super::Delimited).
///
/// # Examples
///
/// ```
/// use framestream::strategy::FrameError;
///
/// let err = FrameError::OversizedFrame { size: 2000, max: 1024 };
/// assert!(!err.is_truncation());
/// assert_eq!(err.to_string(), "frame exceeds max length: 2000 > 1024");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Declared or accumulated frame size exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Size of the offending frame.
        size: usize,
        /// Maximum allowed frame size.
        max: usize,
    },

    /// The stream ended while a length prefix was being read.
    #[error("premature end of stream during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before the end.
        bytes_received: usize,
        /// Expected header size.
        header_size: usize,
    },

    /// The stream ended after a complete header but before the payload.
    #[error("premature end of stream: {bytes_received} bytes of {expected} byte frame received")]
    MidFrame {
        /// Payload bytes received before the end.
        bytes_received: usize,
        /// Payload length declared by the header.
        expected: usize,
    },

    /// The stream ended with bytes that were never terminated by a delimiter.
    #[error("premature end of stream: {bytes_received} bytes without a delimiter")]
    Unterminated {
        /// Bytes buffered after the last delimiter.
        bytes_received: usize,
    },
}

impl FrameError {
    /// Returns `true` for errors caused by the stream ending mid-frame.
    #[must_use]
    pub fn is_truncation(&self) -> bool { !matches!(self, Self::OversizedFrame { .. }) }
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        let kind = if err.is_truncation() {
            io::ErrorKind::UnexpectedEof
        } else {
            io::ErrorKind::InvalidData
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::FrameError;

    #[rstest]
    #[case(FrameError::OversizedFrame { size: 9, max: 8 }, io::ErrorKind::InvalidData)]
    #[case(FrameError::MidHeader { bytes_received: 2, header_size: 4 }, io::ErrorKind::UnexpectedEof)]
    #[case(FrameError::MidFrame { bytes_received: 1, expected: 5 }, io::ErrorKind::UnexpectedEof)]
    #[case(FrameError::Unterminated { bytes_received: 3 }, io::ErrorKind::UnexpectedEof)]
    fn converts_to_io_error_with_matching_kind(
        #[case] err: FrameError,
        #[case] expected: io::ErrorKind,
    ) {
        let message = err.to_string();
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), expected);
        assert_eq!(io_err.to_string(), message);
    }
}
