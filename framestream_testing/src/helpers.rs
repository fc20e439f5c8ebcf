//! Byte helpers and drivers for feeding decoders in tests.

use bytes::{BufMut, Bytes, BytesMut};
use framestream::{
    BufferProvider,
    DecodeStrategy,
    DecoderError,
    FrameDecoder,
    Output,
    StreamDriver,
    StreamEnd,
};
use tokio::io::{AsyncWriteExt, duplex};

/// Encode `frames` as 4-byte big-endian length-prefixed records.
pub fn encode_length_prefixed<T: AsRef<[u8]>>(frames: &[T]) -> Vec<u8> {
    let mut out = BytesMut::new();
    for frame in frames {
        let payload = frame.as_ref();
        let len = u32::try_from(payload.len()).expect("test frame fits in a u32 length");
        out.put_u32(len);
        out.put_slice(payload);
    }
    out.to_vec()
}

/// Split `bytes` into consecutive chunks of the given sizes.
///
/// Sizes are clamped to what is left; bytes not covered by `sizes` form a
/// final chunk. Empty chunks are never produced.
///
/// ```
/// use framestream_testing::split_at_sizes;
///
/// let chunks = split_at_sizes(b"abcdef", &[2, 3]);
/// assert_eq!(chunks, vec![b"ab".to_vec(), b"cde".to_vec(), b"f".to_vec()]);
/// ```
pub fn split_at_sizes(bytes: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity(sizes.len() + 1);
    let mut rest = bytes;
    for &size in sizes {
        let (head, tail) = rest.split_at(size.min(rest.len()));
        if !head.is_empty() {
            chunks.push(head.to_vec());
        }
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest.to_vec());
    }
    chunks
}

/// Feed `chunks` to `decoder` and collect everything it produces.
///
/// Decoding stops at the first error, which is returned alongside the
/// output produced so far.
pub fn feed<S, P, T>(
    decoder: &mut FrameDecoder<S, P>,
    chunks: &[T],
) -> (Vec<Output<S::Frame, ()>>, Option<DecoderError<S::Error>>)
where
    S: DecodeStrategy,
    P: BufferProvider,
    T: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for chunk in chunks {
        if let Err(err) = decoder.on_chunk(chunk.as_ref(), None, &mut out) {
            return (out, Some(err));
        }
    }
    (out, None)
}

/// Collect the frames of [`Output::Frame`] events, dropping everything else.
pub fn frames<F, M>(out: Vec<Output<F, M>>) -> Vec<F> {
    out.into_iter().filter_map(Output::into_frame).collect()
}

/// Write `chunks` to an in-memory duplex stream and drive `decoder` from
/// the other end until end-of-file.
///
/// # Panics
///
/// Panics if writing to the duplex stream fails.
pub async fn drive_duplex<S, P>(
    decoder: &mut FrameDecoder<S, P>,
    chunks: Vec<Bytes>,
    capacity: usize,
) -> (
    Vec<Output<S::Frame, ()>>,
    Result<StreamEnd, DecoderError<S::Error>>,
)
where
    S: DecodeStrategy,
    P: BufferProvider,
{
    let (mut client, server) = duplex(capacity);
    let writer = async move {
        for chunk in chunks {
            client.write_all(&chunk).await.expect("duplex write failed");
        }
        client.shutdown().await.expect("duplex shutdown failed");
    };
    let mut out = Vec::new();
    let driver = StreamDriver::new();
    let ((), result) = tokio::join!(writer, driver.run_reader(decoder, server, &mut out));
    (out, result)
}
