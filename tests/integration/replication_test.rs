// tests/integration/replication_test.rs

//! Exercises the full replication path against a real primary: a genuine
//! `PSYNC` handshake, command fanout, and the `WAIT` acknowledgment barrier.

use super::test_helpers::{spawn_primary, wait_until};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use respdb::core::protocol::{RespFrame, RespFrameCodec};
use respdb::core::replication::{handshake, run_replay_loop};
use respdb::core::state::{ReplicaRuntimeState, ReplicationRole, ServerState};
use respdb::core::storage::Db;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;

fn bulk(s: &str) -> RespFrame {
    RespFrame::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

fn command(args: &[&str]) -> RespFrame {
    RespFrame::Array(args.iter().map(|a| bulk(a)).collect())
}

/// Connects a replica to `primary`'s address and runs its replay loop in the
/// background, returning the replica's own `ServerState` for assertions.
async fn spawn_replica(primary_addr: std::net::SocketAddr) -> Arc<ServerState> {
    let db = Arc::new(Db::new());
    let hs = handshake(&db, "127.0.0.1", primary_addr.port(), 0)
        .await
        .expect("replica handshake should succeed against a live primary");

    let runtime = Arc::new(ReplicaRuntimeState::new(
        "127.0.0.1".to_string(),
        primary_addr.port(),
        hs.master_replid.clone(),
        0,
    ));
    let config = Arc::new(respdb::config::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        dir: None,
        dbfilename: None,
        replicaof: Some(("127.0.0.1".to_string(), primary_addr.port())),
        log_level: "warn".to_string(),
    });
    let state = ServerState::from_parts(db, config, ReplicationRole::Replica(runtime.clone()));

    let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let replay_state = state.clone();
    tokio::spawn(async move {
        let _ = run_replay_loop(
            hs.read_half,
            hs.write_half,
            hs.leftover,
            replay_state,
            runtime,
            shutdown_rx,
        )
        .await;
    });

    state
}

#[tokio::test]
async fn replica_converges_on_primary_writes() {
    let primary = spawn_primary().await;
    let replica_state = spawn_replica(primary.addr).await;

    let stream = TcpStream::connect(primary.addr).await.unwrap();
    let mut client = Framed::new(stream, RespFrameCodec);
    client.send(command(&["SET", "x", "1"])).await.unwrap();
    client.next().await.unwrap().unwrap();

    let converged = wait_until(Duration::from_secs(2), || {
        replica_state.db.get(b"x").ok().flatten() == Some(Bytes::from_static(b"1"))
    })
    .await;
    assert!(converged, "replica never observed the primary's write");

    assert_eq!(replica_state.replication.role_str(), "slave");
}

#[tokio::test]
async fn wait_counts_acknowledged_replicas() {
    let primary = spawn_primary().await;
    let _replica_state = spawn_replica(primary.addr).await;

    let stream = TcpStream::connect(primary.addr).await.unwrap();
    let mut client = Framed::new(stream, RespFrameCodec);

    client.send(command(&["SET", "x", "1"])).await.unwrap();
    client.next().await.unwrap().unwrap();

    client.send(command(&["WAIT", "1", "500"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Integer(n) => assert_eq!(n, 1),
        other => panic!("expected integer reply, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_with_no_writes_returns_replica_count_immediately() {
    let primary = spawn_primary().await;
    let _replica_state = spawn_replica(primary.addr).await;

    // Give the PSYNC handshake a moment to register before asserting count.
    wait_until(Duration::from_secs(1), || {
        primary
            .state
            .replication
            .as_primary()
            .map(|p| p.replica_count())
            .unwrap_or(0)
            > 0
    })
    .await;

    let stream = TcpStream::connect(primary.addr).await.unwrap();
    let mut client = Framed::new(stream, RespFrameCodec);
    client.send(command(&["WAIT", "0", "100"])).await.unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::Integer(n) => assert!(n >= 0),
        other => panic!("expected integer reply, got {other:?}"),
    }
}
