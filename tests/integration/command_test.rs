// tests/integration/command_test.rs

//! Drives the command surface over a real TCP connection, covering the
//! end-to-end scenarios enumerated in the specification: PING, SET/GET with
//! expiry, idempotent DEL, and the XADD stream id rules.

use super::test_helpers::spawn_primary;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use respdb::core::protocol::{RespFrame, RespFrameCodec};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

fn bulk(s: &str) -> RespFrame {
    RespFrame::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

fn command(args: &[&str]) -> RespFrame {
    RespFrame::Array(args.iter().map(|a| bulk(a)).collect())
}

async fn connect(addr: std::net::SocketAddr) -> Framed<TcpStream, RespFrameCodec> {
    let stream = TcpStream::connect(addr).await.unwrap();
    Framed::new(stream, RespFrameCodec)
}

#[tokio::test]
async fn ping_replies_pong() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client.send(command(&["PING"])).await.unwrap();
    let reply = client.next().await.unwrap().unwrap();
    assert_eq!(reply, RespFrame::SimpleString("PONG".into()));
}

#[tokio::test]
async fn set_and_get_with_expiry() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client
        .send(command(&["SET", "foo", "bar", "PX", "100"]))
        .await
        .unwrap();
    assert_eq!(
        client.next().await.unwrap().unwrap(),
        RespFrame::SimpleString("OK".into())
    );

    client.send(command(&["GET", "foo"])).await.unwrap();
    assert_eq!(
        client.next().await.unwrap().unwrap(),
        RespFrame::BulkString(Bytes::from_static(b"bar"))
    );

    tokio::time::sleep(Duration::from_millis(200)).await;

    client.send(command(&["GET", "foo"])).await.unwrap();
    assert_eq!(client.next().await.unwrap().unwrap(), RespFrame::Null);

    client.send(command(&["KEYS", "*"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Array(items) => assert!(items.is_empty()),
        other => panic!("expected array, got {other:?}"),
    }
}

#[tokio::test]
async fn del_is_idempotent_over_the_wire() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client.send(command(&["SET", "a", "1"])).await.unwrap();
    client.next().await.unwrap().unwrap();
    client.send(command(&["SET", "b", "2"])).await.unwrap();
    client.next().await.unwrap().unwrap();

    client.send(command(&["DEL", "a", "b", "c"])).await.unwrap();
    assert_eq!(client.next().await.unwrap().unwrap(), RespFrame::Integer(2));

    client.send(command(&["DEL", "a", "b", "c"])).await.unwrap();
    assert_eq!(client.next().await.unwrap().unwrap(), RespFrame::Integer(0));
}

#[tokio::test]
async fn xadd_enforces_id_ordering_rules() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client
        .send(command(&["XADD", "s", "0-0", "k", "v"]))
        .await
        .unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Error(msg) => assert!(msg.contains("must be greater than 0-0")),
        other => panic!("expected error, got {other:?}"),
    }

    client
        .send(command(&["XADD", "s", "0-1", "k", "v"]))
        .await
        .unwrap();
    assert_eq!(
        client.next().await.unwrap().unwrap(),
        RespFrame::BulkString(Bytes::from_static(b"0-1"))
    );

    client
        .send(command(&["XADD", "s", "0-1", "k", "v"]))
        .await
        .unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Error(msg) => assert!(msg.contains("equal or smaller")),
        other => panic!("expected error, got {other:?}"),
    }

    client
        .send(command(&["XADD", "s", "0-*", "k", "v"]))
        .await
        .unwrap();
    assert_eq!(
        client.next().await.unwrap().unwrap(),
        RespFrame::BulkString(Bytes::from_static(b"0-2"))
    );
}

#[tokio::test]
async fn xrange_returns_inclusive_bounds() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    for (ms, seq) in [(1, 0), (2, 0), (3, 0)] {
        client
            .send(command(&["XADD", "s", &format!("{ms}-{seq}"), "k", "v"]))
            .await
            .unwrap();
        client.next().await.unwrap().unwrap();
    }

    client
        .send(command(&["XRANGE", "s", "1", "2"]))
        .await
        .unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Array(entries) => assert_eq!(entries.len(), 2),
        other => panic!("expected array, got {other:?}"),
    }
}

#[tokio::test]
async fn pipelined_commands_are_executed_and_replied_in_order() {
    let server = spawn_primary().await;
    let stream = TcpStream::connect(server.addr).await.unwrap();
    let mut framed = Framed::new(stream, RespFrameCodec);

    for i in 0..5 {
        framed
            .send(command(&["SET", &format!("k{i}"), &i.to_string()]))
            .await
            .unwrap();
    }
    for _ in 0..5 {
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            RespFrame::SimpleString("OK".into())
        );
    }

    for i in 0..5 {
        framed.send(command(&["GET", &format!("k{i}")])).await.unwrap();
    }
    for i in 0..5 {
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            RespFrame::BulkString(Bytes::from(i.to_string()))
        );
    }
}

#[tokio::test]
async fn unknown_command_is_reported() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client.send(command(&["FROBNICATE"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Error(msg) => assert!(msg.contains("unknown command")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_keys_pattern_reports_unknown_subcommand() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client.send(command(&["KEYS", "foo*"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Error(msg) => assert_eq!(msg, "ERR unknown subcommand"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn info_replication_reports_master_role() {
    let server = spawn_primary().await;
    let mut client = connect(server.addr).await;

    client.send(command(&["INFO", "replication"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::BulkString(body) => {
            let text = String::from_utf8(body.to_vec()).unwrap();
            assert!(text.contains("role:master"));
            assert!(text.contains("master_replid:"));
        }
        other => panic!("expected bulk string, got {other:?}"),
    }
}
