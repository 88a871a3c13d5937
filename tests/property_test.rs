// tests/property_test.rs

//! Property-based tests for the RESP codec's round-trip guarantee and for
//! the SET/GET round-trip over a real connection.

#[path = "integration/test_helpers.rs"]
mod test_helpers;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use proptest::prelude::*;
use respdb::core::protocol::{RespFrame, RespFrameCodec};
use test_helpers::spawn_primary;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

fn arb_resp_frame() -> impl Strategy<Value = RespFrame> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 ]{0,32}".prop_map(RespFrame::SimpleString),
        "[a-zA-Z0-9 ]{0,32}".prop_map(RespFrame::Error),
        any::<i64>().prop_map(RespFrame::Integer),
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|bytes| RespFrame::BulkString(Bytes::from(bytes))),
        Just(RespFrame::Null),
        Just(RespFrame::NullArray),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(RespFrame::Array)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    /// `decode(encode(v)) == v` for every reply shape, including nested arrays.
    #[test]
    fn resp_frame_roundtrips(frame in arb_resp_frame()) {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(frame.clone(), &mut buf).unwrap();
        let decoded = RespFrameCodec.decode(&mut buf).unwrap().unwrap();
        prop_assert_eq!(frame, decoded);
        prop_assert!(buf.is_empty());
    }

    /// A frame's bytes still decode correctly no matter where the buffer is
    /// split across reads, simulating arbitrary TCP fragmentation.
    #[test]
    fn resp_frame_decodes_across_arbitrary_splits(frame in arb_resp_frame(), split_ratio in 0.0f64..1.0) {
        let mut encoded = BytesMut::new();
        RespFrameCodec.encode(frame.clone(), &mut encoded).unwrap();
        let split_at = ((encoded.len() as f64) * split_ratio) as usize;

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encoded[..split_at]);
        prop_assert!(RespFrameCodec.decode(&mut buf).unwrap().is_none() || split_at == encoded.len());
        buf.extend_from_slice(&encoded[split_at..]);
        let decoded = RespFrameCodec.decode(&mut buf).unwrap().unwrap();
        prop_assert_eq!(frame, decoded);
    }
}

fn set_get_roundtrip(key: String, value: Vec<u8>) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let server = spawn_primary().await;
        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut client = Framed::new(stream, RespFrameCodec);

        let set_cmd = RespFrame::Array(vec![
            RespFrame::BulkString(Bytes::from_static(b"SET")),
            RespFrame::BulkString(Bytes::from(key.clone().into_bytes())),
            RespFrame::BulkString(Bytes::from(value.clone())),
        ]);
        client.send(set_cmd).await.unwrap();
        assert_eq!(
            client.next().await.unwrap().unwrap(),
            RespFrame::SimpleString("OK".into())
        );

        let get_cmd = RespFrame::Array(vec![
            RespFrame::BulkString(Bytes::from_static(b"GET")),
            RespFrame::BulkString(Bytes::from(key.into_bytes())),
        ]);
        client.send(get_cmd).await.unwrap();
        match client.next().await.unwrap().unwrap() {
            RespFrame::BulkString(got) => assert_eq!(got, Bytes::from(value)),
            other => panic!("expected bulk string, got {other:?}"),
        }
    });
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 20,
        ..ProptestConfig::default()
    })]

    /// `SET key value` followed by `GET key` returns exactly `value`,
    /// regardless of the bytes involved.
    #[test]
    fn set_then_get_preserves_arbitrary_values(
        key in "[a-zA-Z0-9_]{1,32}",
        value in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        set_get_roundtrip(key, value);
    }
}
