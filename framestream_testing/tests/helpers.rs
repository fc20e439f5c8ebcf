//! Integration coverage for `framestream_testing` helpers.

use bytes::Bytes;
use framestream::{FrameDecoder, StreamEnd, strategy::LengthPrefixed};
use framestream_testing::{drive_duplex, encode_length_prefixed, frames, split_at_sizes};

#[test]
fn encodes_big_endian_length_headers() {
    let encoded = encode_length_prefixed(&[b"AB".as_slice(), b"CDEFG".as_slice()]);

    assert_eq!(
        encoded,
        vec![0, 0, 0, 2, b'A', b'B', 0, 0, 0, 5, b'C', b'D', b'E', b'F', b'G']
    );
}

#[test]
fn split_skips_empty_and_clamps_oversized_sizes() {
    let chunks = split_at_sizes(b"abc", &[0, 2, 10, 4]);

    assert_eq!(chunks, vec![b"ab".to_vec(), b"c".to_vec()]);
}

#[tokio::test]
async fn drive_duplex_ends_on_eof() {
    let encoded = encode_length_prefixed(&[b"one".as_slice(), b"two".as_slice()]);
    let chunks = split_at_sizes(&encoded, &[5, 1])
        .into_iter()
        .map(Bytes::from)
        .collect();
    let mut decoder = FrameDecoder::new(LengthPrefixed::default());

    let (out, result) = drive_duplex(&mut decoder, chunks, 4).await;

    assert_eq!(result.expect("clean end"), StreamEnd::Disconnected);
    assert_eq!(
        frames(out),
        vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]
    );
}
