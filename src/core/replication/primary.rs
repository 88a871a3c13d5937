// src/core/replication/primary.rs

//! Primary-side replication: registers replicas on `PSYNC`, streams fanned-out
//! write commands to each over its own task, polls for acknowledgment offsets,
//! and backs the `WAIT` barrier.

use crate::core::persistence::EMPTY_RDB;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::state::{PrimaryReplicationState, ReplicaHandle};
use bytes::BytesMut;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tokio_util::codec::FramedRead;
use tracing::{info, warn};

/// Handles a `PSYNC ? -1` request: performs the full resync handshake,
/// registers the replica, and runs its ack-reader and stream-writer tasks
/// until the connection closes or the server shuts down.
pub async fn handle_psync(
    primary: Arc<PrimaryReplicationState>,
    addr: SocketAddr,
    stream: TcpStream,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (read_half, mut write_half) = stream.into_split();

    let start_offset = primary.offset();
    let header = format!("+FULLRESYNC {} {}\r\n", primary.replid, start_offset);
    if write_half.write_all(header.as_bytes()).await.is_err() {
        warn!("failed to send FULLRESYNC header to replica {addr}");
        return;
    }
    let rdb_header = format!("${}\r\n", EMPTY_RDB.len());
    if write_half.write_all(rdb_header.as_bytes()).await.is_err()
        || write_half.write_all(EMPTY_RDB).await.is_err()
    {
        warn!("failed to send RDB snapshot to replica {addr}");
        return;
    }
    info!(%addr, offset = start_offset, "replica completed full resync");

    let handle = primary.register_replica(addr, write_half);
    let offset_rx = primary.subscribe();

    let mut reader_shutdown = shutdown_rx.resubscribe();
    let reader_handle = handle.clone();
    let reader_task = tokio::spawn(async move {
        read_replica_acks(read_half, reader_handle, &mut reader_shutdown).await;
    });

    replica_stream_task(primary.clone(), handle, offset_rx, start_offset, &mut shutdown_rx).await;

    reader_task.abort();
    primary.remove_replica(addr);
    info!(%addr, "replica connection closed");
}

/// Reads `REPLCONF ACK <offset>` replies from a replica and updates its
/// acknowledged offset until the connection closes or shutdown fires.
async fn read_replica_acks(
    read_half: tokio::net::tcp::OwnedReadHalf,
    handle: Arc<ReplicaHandle>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    let mut framed = FramedRead::new(read_half, RespFrameCodec);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            next = framed.next() => {
                match next {
                    Some(Ok(RespFrame::Array(items))) => {
                        if let Some(offset) = parse_replconf_ack(&items) {
                            handle.set_acked_offset(offset);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("malformed frame from replica {}: {e}", handle.addr);
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}

fn parse_replconf_ack(items: &[RespFrame]) -> Option<u64> {
    let as_str = |f: &RespFrame| match f {
        RespFrame::BulkString(b) => std::str::from_utf8(b).ok().map(|s| s.to_string()),
        _ => None,
    };
    if items.len() != 3 {
        return None;
    }
    let name = as_str(&items[0])?;
    let sub = as_str(&items[1])?;
    if !name.eq_ignore_ascii_case("REPLCONF") || !sub.eq_ignore_ascii_case("ACK") {
        return None;
    }
    as_str(&items[2])?.parse::<u64>().ok()
}

/// Streams backlogged frames to a single replica as the primary's offset
/// advances, until the replica write fails, the channel closes, or shutdown.
pub async fn replica_stream_task(
    primary: Arc<PrimaryReplicationState>,
    handle: Arc<ReplicaHandle>,
    mut offset_rx: watch::Receiver<u64>,
    mut last_offset: u64,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            changed = offset_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *offset_rx.borrow();
                if last_offset >= current {
                    continue;
                }
                for (frame_offset, bytes) in primary.frames_since(last_offset) {
                    if handle.write_all(&bytes).await.is_err() {
                        warn!("replica {} write failed, dropping from registry", handle.addr);
                        return;
                    }
                    last_offset = frame_offset + bytes.len() as u64;
                }
            }
        }
    }
}

/// Periodically solicits `REPLCONF ACK` replies from every connected replica
/// by enqueueing a `REPLCONF GETACK *` for fanout.
pub async fn run_ack_poll(primary: Arc<PrimaryReplicationState>, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                tracing::debug!("ack-poll task shutting down");
                break;
            }
            _ = ticker.tick() => {
                if primary.replica_count() == 0 {
                    continue;
                }
                let frame = RespFrame::command(&["REPLCONF", "GETACK", "*"]);
                match frame.encode_to_vec() {
                    Ok(bytes) => {
                        let mut buf = BytesMut::new();
                        buf.extend_from_slice(&bytes);
                        primary.enqueue_write(buf.freeze());
                    }
                    Err(e) => warn!("failed to encode GETACK frame: {e}"),
                }
            }
        }
    }
}

/// Implements the `WAIT numreplicas timeout` barrier: blocks until at least
/// `num_replicas` have acknowledged the current replication offset, or the
/// timeout elapses, returning the count observed either way.
pub async fn wait_for_acks(
    primary: &PrimaryReplicationState,
    num_replicas: usize,
    timeout: Duration,
) -> usize {
    let target = primary.offset();
    if target == 0 {
        return primary.replica_count();
    }

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let acked = primary.count_acked(target);
        if acked >= num_replicas {
            return acked;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return acked;
        }
        tokio::time::sleep(Duration::from_millis(5).min(deadline - now)).await;
    }
}
