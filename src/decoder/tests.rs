//! Unit tests for the frame decoder.

use std::{
    convert::Infallible,
    net::SocketAddr,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::{Buf, Bytes};
use rstest::{fixture, rstest};

use super::*;
use crate::strategy::{Decoded, FrameError, LengthPrefixed, decode_fn};

type Out = Vec<Output<Bytes, &'static str>>;

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
fn decoder() -> FrameDecoder<LengthPrefixed> { FrameDecoder::new(LengthPrefixed::default()) }

fn addr() -> SocketAddr { "192.0.2.7:4000".parse().expect("valid address") }

fn frames(out: &Out) -> Vec<&[u8]> {
    out.iter()
        .filter_map(|o| match o {
            Output::Frame { frame, .. } => Some(frame.as_ref()),
            _ => None,
        })
        .collect()
}

#[rstest]
fn fully_consumed_chunk_allocates_nothing(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder
        .on_chunk(&[0, 0, 0, 1, b'x', 0, 0, 0, 1, b'y'], None, &mut out)
        .expect("decode");

    assert_eq!(frames(&out), vec![&b"x"[..], b"y"]);
    assert!(!decoder.has_cumulation());
}

#[rstest]
fn remainder_is_retained_right_sized(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder
        .on_chunk(&[0, 0, 0, 1, b'x', 0, 0], None, &mut out)
        .expect("decode");

    assert_eq!(decoder.buffered(), 2);
    let buffer = decoder.cumulation().buffer().expect("remainder retained");
    assert_eq!(buffer.read_cursor(), 0);
    assert_eq!(buffer.capacity(), 256);
}

#[rstest]
fn large_remainder_is_shrunk_after_pass(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();
    let mut payload = vec![0, 0, 2, 0];
    payload.extend(std::iter::repeat_n(7_u8, 512));

    decoder.on_chunk(&payload[..300], None, &mut out).expect("decode");
    decoder.on_chunk(&payload[300..], None, &mut out).expect("decode");
    assert_eq!(frames(&out).len(), 1);
    assert!(!decoder.has_cumulation());

    decoder.on_chunk(&payload[..400], None, &mut out).expect("decode");
    let buffer = decoder.cumulation().buffer().expect("partial frame retained");
    assert_eq!(buffer.readable(), 400);
    assert_eq!(buffer.read_cursor(), 0);
}

#[rstest]
fn frames_carry_the_delivery_source(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder
        .handle(Inbound::chunk_from(&[0, 0, 0, 1, b'a'][..], addr()), &mut out)
        .expect("decode");

    assert_eq!(
        out,
        vec![Output::Frame {
            frame: Bytes::from_static(b"a"),
            source: Some(addr())
        }]
    );
    assert_eq!(decoder.context().source(), Some(addr()));
}

#[rstest]
fn messages_pass_through_untouched(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder.handle(Inbound::chunk(&b"\0\0"[..]), &mut out).expect("decode");
    decoder.handle(Inbound::Message("ping"), &mut out).expect("pass through");

    assert_eq!(out, vec![Output::Message("ping")]);
    assert_eq!(decoder.buffered(), 2);
}

#[rstest]
fn empty_chunk_is_a_no_op(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder.on_chunk(&[], Some(addr()), &mut out).expect("no-op");

    assert!(out.is_empty());
    assert!(!decoder.has_cumulation());
    assert_eq!(decoder.context().source(), None);
}

#[test]
fn non_progressing_strategy_is_reported_and_decoder_stays_usable() {
    let mut decoder = FrameDecoder::new(decode_fn(|_ctx, src| {
        Ok::<_, Infallible>(if src.remaining() >= 2 {
            Decoded::Frame(Bytes::new())
        } else {
            Decoded::NoFrame
        })
    }));
    let mut out = Out::new();

    decoder.on_chunk(b"a", None, &mut out).expect("needs more bytes");
    let err = decoder
        .on_chunk(b"b", None, &mut out)
        .expect_err("frame without progress");

    assert!(err.is_defect());
    assert!(out.is_empty());
    assert_eq!(decoder.buffered(), 2);
}

#[test]
fn strategy_error_keeps_earlier_frames_and_remainder() {
    let mut decoder = FrameDecoder::new(LengthPrefixed::new(4));
    let mut out = Out::new();

    let err = decoder
        .on_chunk(&[0, 0, 0, 1, b'a', 0, 0, 0, 9, b'b'], None, &mut out)
        .expect_err("oversized second frame");

    assert_eq!(
        err.into_strategy(),
        Some(FrameError::OversizedFrame { size: 9, max: 4 })
    );
    assert_eq!(frames(&out), vec![&b"a"[..]]);
    assert_eq!(decoder.buffered(), 5);
}

#[rstest]
fn stream_end_flushes_then_forwards_end(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();

    decoder
        .on_chunk(&[0, 0, 0, 1, b'a', 0, 0], Some(addr()), &mut out)
        .expect("decode");
    let err = decoder
        .handle(Inbound::Disconnected, &mut out)
        .expect_err("truncated header");

    assert_eq!(
        err.into_strategy(),
        Some(FrameError::MidHeader {
            bytes_received: 2,
            header_size: 4
        })
    );
    assert_eq!(out.last(), Some(&Output::End(StreamEnd::Disconnected)));
    assert!(!decoder.has_cumulation());
    assert!(decoder.is_ended());
}

#[test]
fn terminal_strategy_runs_without_cumulation() {
    let regular = decode_fn(|_ctx, _src| Ok::<_, Infallible>(Decoded::<Bytes>::NoFrame));
    let strategy = regular.with_terminal(decode_fn(|ctx, _src| {
        assert!(ctx.is_stream_ending());
        Ok::<_, Infallible>(Decoded::Frame(Bytes::from_static(b"eos")))
    }));
    let mut decoder = FrameDecoder::new(strategy);
    let mut out = Out::new();

    decoder.on_stream_end(StreamEnd::Closed, &mut out).expect("drain");

    assert_eq!(
        out,
        vec![
            Output::Frame {
                frame: Bytes::from_static(b"eos"),
                source: None
            },
            Output::End(StreamEnd::Closed),
        ]
    );
}

#[test]
fn second_termination_only_forwards_end() {
    let mut calls = 0;
    let mut decoder = FrameDecoder::new(decode_fn(|ctx, _src| {
        if ctx.is_stream_ending() {
            calls += 1;
        }
        Ok::<_, Infallible>(Decoded::<Bytes>::NoFrame)
    }));
    let mut out = Out::new();

    decoder.handle(Inbound::Closed, &mut out).expect("first end");
    decoder.handle(Inbound::Disconnected, &mut out).expect("second end");
    decoder.on_chunk(b"late", None, &mut out).expect("ignored");

    assert_eq!(
        out,
        vec![
            Output::End(StreamEnd::Closed),
            Output::End(StreamEnd::Disconnected)
        ]
    );
    assert!(!decoder.has_cumulation());
    drop(decoder);
    assert_eq!(calls, 1);
}

#[rstest]
fn abandon_discards_without_decoding(mut decoder: FrameDecoder<LengthPrefixed>) {
    let mut out = Out::new();
    decoder.on_chunk(&[0, 0, 0, 4, b'a'], None, &mut out).expect("decode");

    assert_eq!(decoder.abandon(StreamEnd::Closed, &mut out), 5);
    assert_eq!(decoder.abandon(StreamEnd::Disconnected, &mut out), 0);

    assert_eq!(
        out,
        vec![
            Output::End(StreamEnd::Closed),
            Output::End(StreamEnd::Disconnected)
        ]
    );
    assert!(!decoder.has_cumulation());
    assert!(decoder.is_ended());
}

#[test]
fn end_is_forwarded_when_terminal_strategy_panics() {
    let strategy = LengthPrefixed::default().with_terminal(decode_fn(
        |_ctx, _src| -> Result<Decoded<Bytes>, FrameError> {
            panic!("terminal strategy bug")
        },
    ));
    let mut decoder = FrameDecoder::new(strategy);
    let mut out = Out::new();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        decoder.on_stream_end(StreamEnd::Closed, &mut out)
    }));

    assert!(outcome.is_err());
    assert_eq!(out, vec![Output::End(StreamEnd::Closed)]);
}

#[test]
fn builder_applies_fan_out_and_floor() {
    let decoder = FrameDecoder::builder(LengthPrefixed::default())
        .unfold(true)
        .min_capacity(16)
        .build();

    assert_eq!(decoder.fan_out(), FanOut::Unfold);

    let mut decoder = FrameDecoder::builder(LengthPrefixed::default())
        .config(DecoderConfig {
            min_capacity: 16,
            fan_out: FanOut::Single,
        })
        .build();
    let mut out = Out::new();
    decoder.on_chunk(&[0, 0], None, &mut out).expect("decode");

    assert_eq!(decoder.fan_out(), FanOut::Single);
    assert_eq!(
        decoder.cumulation().buffer().map(crate::CumulationBuffer::capacity),
        Some(16)
    );
}

#[test]
fn unfold_dispatches_each_frame_with_source() {
    let mut decoder = FrameDecoder::builder(decode_fn(|_ctx, src| {
        let len = src.remaining();
        Ok::<_, Infallible>(Decoded::Frames(
            src.copy_to_bytes(len).into_iter().collect::<Vec<u8>>(),
        ))
    }))
    .unfold(true)
    .build();
    let mut out: Vec<Output<u8, ()>> = Vec::new();

    decoder.on_chunk(b"xyz", Some(addr()), &mut out).expect("decode");

    assert_eq!(
        out,
        b"xyz"
            .iter()
            .map(|&frame| Output::Frame {
                frame,
                source: Some(addr())
            })
            .collect::<Vec<_>>()
    );
    assert_eq!(decoder.context().frames_decoded(), 1);
}

#[test]
fn custom_provider_serves_cumulation_allocations() {
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl BufferProvider for Counting {
        fn allocate(&self, min_capacity: usize) -> Vec<u8> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Vec::with_capacity(min_capacity)
        }
    }

    let provider = Arc::new(Counting::default());
    let mut decoder = FrameDecoder::builder(LengthPrefixed::default())
        .buffer_provider(Arc::clone(&provider))
        .build();
    let mut out = Out::new();

    decoder.on_chunk(&[0, 0, 0, 3, b'a'], None, &mut out).expect("decode");
    decoder.on_chunk(b"bc", None, &mut out).expect("decode");

    assert_eq!(frames(&out), vec![&b"abc"[..]]);
    // Only the first remainder needed storage; the drained buffer was dropped.
    assert_eq!(provider.0.load(Ordering::Relaxed), 1);
}
