//! Shared utilities for `framestream` tests.
//!
//! Byte helpers build and fragment encoded streams, scripted strategies
//! break the decoder's contract on purpose, and [`LoggerHandle`] and
//! [`capture_counters`] observe what the decoder logged and recorded.
//!
//! ```
//! use framestream::{FrameDecoder, strategy::LengthPrefixed};
//! use framestream_testing::{encode_length_prefixed, feed, frames, split_at_sizes};
//!
//! let bytes = encode_length_prefixed(&[b"AB".as_slice(), b"CDEFG".as_slice()]);
//! let mut decoder = FrameDecoder::new(LengthPrefixed::default());
//! let (out, err) = feed(&mut decoder, &split_at_sizes(&bytes, &[3, 6, 6]));
//!
//! assert!(err.is_none());
//! assert_eq!(frames(out).len(), 2);
//! ```

pub mod helpers;
pub mod logging;
pub mod metrics;
pub mod stubs;

pub use helpers::{drive_duplex, encode_length_prefixed, feed, frames, split_at_sizes};
pub use logging::{LoggerHandle, logger};
pub use metrics::{CounterSample, capture_counters, counter_total};
pub use stubs::{Exploding, FailingTerminal, FixedWithRemainder, ScriptedError, Starved, Stuck};
