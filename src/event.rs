//! Inbound deliveries and outbound events exchanged with collaborators.
//!
//! A transport hands the decoder [`Inbound`] deliveries. The decoder reports
//! everything it produces, passes through, or forwards as [`Output`] values
//! delivered to a [`Downstream`] collaborator, in production order.

use std::net::SocketAddr;

use bytes::Bytes;
use log::debug;
use tokio::sync::mpsc;

/// A delivery from the transport.
#[derive(Debug)]
pub enum Inbound<M> {
    /// A chunk of stream bytes, optionally tagged with its source address.
    Chunk {
        /// Bytes delivered.
        bytes: Bytes,
        /// Address the bytes came from, if known.
        source: Option<SocketAddr>,
    },
    /// A delivery that does not carry stream bytes; passed through untouched.
    Message(M),
    /// The peer disconnected.
    Disconnected,
    /// The stream was closed explicitly.
    Closed,
}

impl<M> Inbound<M> {
    /// Wrap `bytes` as an untagged chunk.
    #[must_use]
    pub fn chunk(bytes: impl Into<Bytes>) -> Self {
        Self::Chunk {
            bytes: bytes.into(),
            source: None,
        }
    }

    /// Wrap `bytes` as a chunk received from `source`.
    #[must_use]
    pub fn chunk_from(bytes: impl Into<Bytes>, source: SocketAddr) -> Self {
        Self::Chunk {
            bytes: bytes.into(),
            source: Some(source),
        }
    }
}

/// Termination signal forwarded once the stream has been drained.
///
/// Both signals are handled identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// The peer disconnected.
    Disconnected,
    /// The stream was closed explicitly.
    Closed,
}

/// Event produced for downstream collaborators.
#[derive(Debug, PartialEq, Eq)]
pub enum Output<F, M> {
    /// A single decoded frame.
    Frame {
        /// The frame.
        frame: F,
        /// Address of the delivery it was decoded from; `None` for frames
        /// flushed at end-of-stream.
        source: Option<SocketAddr>,
    },
    /// A collection of frames dispatched as one unit.
    Batch {
        /// The frames, in decode order.
        frames: Vec<F>,
        /// Address of the delivery they were decoded from.
        source: Option<SocketAddr>,
    },
    /// A non-byte delivery passed through unmodified.
    Message(M),
    /// The forwarded termination signal. Always the last event of a stream.
    End(StreamEnd),
}

impl<F, M> Output<F, M> {
    /// Return the frame if this is [`Output::Frame`].
    #[must_use]
    pub fn into_frame(self) -> Option<F> {
        match self {
            Self::Frame { frame, .. } => Some(frame),
            _ => None,
        }
    }

    /// Returns `true` for [`Output::End`].
    #[must_use]
    pub fn is_end(&self) -> bool { matches!(self, Self::End(_)) }
}

/// Receiver of decoder output.
///
/// Delivery must not block: the decoder calls it synchronously from within
/// its decode loop.
pub trait Downstream<F, M> {
    /// Accept one event.
    fn deliver(&mut self, output: Output<F, M>);
}

impl<F, M> Downstream<F, M> for Vec<Output<F, M>> {
    fn deliver(&mut self, output: Output<F, M>) { self.push(output); }
}

impl<F, M> Downstream<F, M> for mpsc::UnboundedSender<Output<F, M>> {
    fn deliver(&mut self, output: Output<F, M>) {
        if self.send(output).is_err() {
            debug!("downstream receiver dropped; discarding decoder output");
        }
    }
}

impl<F, M, D> Downstream<F, M> for &mut D
where
    D: Downstream<F, M> + ?Sized,
{
    fn deliver(&mut self, output: Output<F, M>) { (**self).deliver(output); }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::{Downstream, Inbound, Output, StreamEnd};

    #[test]
    fn chunk_constructors_tag_source() {
        let addr = "10.0.0.1:80".parse().expect("valid address");

        match Inbound::<()>::chunk_from(&b"ab"[..], addr) {
            Inbound::Chunk { bytes, source } => {
                assert_eq!(bytes.as_ref(), b"ab");
                assert_eq!(source, Some(addr));
            }
            other => panic!("expected chunk, got {other:?}"),
        }
        assert!(matches!(
            Inbound::<()>::chunk(vec![1_u8]),
            Inbound::Chunk { source: None, .. }
        ));
    }

    #[test]
    fn channel_downstream_preserves_order() {
        let (mut tx, mut rx) = mpsc::unbounded_channel::<Output<u8, ()>>();

        tx.deliver(Output::Frame {
            frame: 1,
            source: None,
        });
        tx.deliver(Output::End(StreamEnd::Closed));

        assert_eq!(rx.try_recv().ok().and_then(Output::into_frame), Some(1));
        assert!(rx.try_recv().is_ok_and(|o| o.is_end()));
    }

    #[test]
    fn channel_downstream_tolerates_dropped_receiver() {
        let (mut tx, rx) = mpsc::unbounded_channel::<Output<u8, ()>>();
        drop(rx);

        tx.deliver(Output::End(StreamEnd::Disconnected));
    }
}
