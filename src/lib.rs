#![doc(html_root_url = "https://docs.rs/framestream/latest")]
//! Public API for the `framestream` library.
//!
//! This crate turns an arbitrarily fragmented byte stream into discrete
//! frames. A [`FrameDecoder`] keeps the bytes a transport has delivered but a
//! [`DecodeStrategy`] could not yet consume, runs the strategy until it stops
//! making progress, and fans the decoded results out to a [`Downstream`]
//! collaborator. End-of-stream draining always forwards the termination
//! event, even when the final decode fails.
//!
//! ```
//! use framestream::{FrameDecoder, Output, strategy::LengthPrefixed};
//!
//! let mut decoder = FrameDecoder::new(LengthPrefixed::default());
//! let mut out: Vec<Output<_, ()>> = Vec::new();
//!
//! decoder.on_chunk(&[0, 0, 0, 2, b'h'], None, &mut out).expect("decode");
//! assert!(out.is_empty());
//! decoder.on_chunk(b"i", None, &mut out).expect("decode");
//! assert_eq!(out.len(), 1);
//! ```

pub mod buffer;
pub mod cumulation;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod metrics;
pub mod strategy;
pub mod transport;
pub mod view;

pub use buffer::{BufferProvider, DEFAULT_MIN_CAPACITY, HeapBufferProvider};
pub use cumulation::{AppendPolicy, Cumulation, CumulationBuffer};
pub use decoder::{DecoderConfig, FrameDecoder, FrameDecoderBuilder};
pub use dispatch::FanOut;
pub use error::DecoderError;
pub use event::{Downstream, Inbound, Output, StreamEnd};
pub use strategy::{DecodeContext, DecodeStrategy, Decoded, decode_fn};
pub use transport::{DriveConfig, StreamDriver};
pub use view::UnreadView;
