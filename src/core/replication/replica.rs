// src/core/replication/replica.rs

//! Replica-side replication: connects upstream to a primary, performs the
//! `PING`/`REPLCONF`/`PSYNC` handshake, loads the snapshot it returns, and
//! then replays the primary's replicated command stream against local
//! storage.

use crate::core::commands::{Command, dispatch};
use crate::core::persistence::rdb;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::state::{ReplicaRuntimeState, ServerState};
use crate::core::storage::Db;
use crate::core::RespDbError;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::broadcast;
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 4096;

/// The outcome of a completed handshake: the split connection, any bytes
/// already buffered past the RDB payload, and the primary's replication id.
pub struct Handshake {
    pub read_half: OwnedReadHalf,
    pub write_half: OwnedWriteHalf,
    pub leftover: BytesMut,
    pub master_replid: String,
}

/// Connects to the primary at `host:port`, performs the four-step handshake
/// (`PING`, `REPLCONF listening-port`, `REPLCONF capa psync2`, `PSYNC ? -1`),
/// and loads the RDB snapshot it sends into `db`.
pub async fn handshake(
    db: &Arc<Db>,
    host: &str,
    port: u16,
    listening_port: u16,
) -> Result<Handshake, RespDbError> {
    let mut stream = TcpStream::connect((host, port)).await.map_err(|e| {
        RespDbError::ReplicationError(format!("connect to {host}:{port} failed: {e}"))
    })?;
    info!("connecting to primary at {host}:{port}");

    let mut buf = BytesMut::new();

    send_command(&mut stream, &["PING"]).await?;
    expect_simple_string(&mut stream, &mut buf, "PONG").await?;

    send_command(
        &mut stream,
        &["REPLCONF", "listening-port", &listening_port.to_string()],
    )
    .await?;
    expect_simple_string(&mut stream, &mut buf, "OK").await?;

    send_command(&mut stream, &["REPLCONF", "capa", "psync2"]).await?;
    expect_simple_string(&mut stream, &mut buf, "OK").await?;

    send_command(&mut stream, &["PSYNC", "?", "-1"]).await?;
    let fullresync_line = read_line(&mut stream, &mut buf).await?;
    let fullresync = String::from_utf8_lossy(&fullresync_line).into_owned();
    let master_replid = fullresync
        .strip_prefix('+')
        .filter(|rest| rest.starts_with("FULLRESYNC"))
        .and_then(|rest| rest.split_whitespace().nth(1))
        .ok_or_else(|| {
            RespDbError::ReplicationError(format!("unexpected reply to PSYNC: {fullresync}"))
        })?
        .to_string();
    info!(replid = %master_replid, "full resync with primary starting");

    let rdb_header_line = read_line(&mut stream, &mut buf).await?;
    let rdb_header = String::from_utf8_lossy(&rdb_header_line);
    let rdb_len: usize = rdb_header
        .strip_prefix('$')
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            RespDbError::ReplicationError(format!("malformed RDB length header: {rdb_header}"))
        })?;
    let rdb_bytes = read_exact_n(&mut stream, &mut buf, rdb_len).await?;
    let loaded = rdb::load(&rdb_bytes, db)?;
    info!("loaded {loaded} key(s) from the primary's snapshot");

    let (read_half, write_half) = stream.into_split();
    Ok(Handshake {
        read_half,
        write_half,
        leftover: buf,
        master_replid,
    })
}

/// Replays the primary's replicated command stream until shutdown or the
/// connection closes. Each decoded frame advances `runtime`'s inbound offset
/// by its encoded length; a `REPLCONF GETACK` is answered with the offset as
/// it stood immediately before that GETACK's own bytes were counted.
pub async fn run_replay_loop(
    mut read_half: OwnedReadHalf,
    mut write_half: OwnedWriteHalf,
    mut buf: BytesMut,
    state: Arc<ServerState>,
    runtime: Arc<ReplicaRuntimeState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), RespDbError> {
    let mut codec = RespFrameCodec;
    loop {
        while let Some((frame, consumed)) = decode_one(&mut codec, &mut buf)? {
            apply_replicated_frame(&state, &runtime, &mut write_half, frame, consumed).await?;
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!("replica replay loop shutting down");
                return Ok(());
            }
            res = read_half.read_buf(&mut buf) => {
                match res {
                    Ok(0) => {
                        warn!("primary closed the replication connection");
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

fn decode_one(
    codec: &mut RespFrameCodec,
    buf: &mut BytesMut,
) -> Result<Option<(RespFrame, u64)>, RespDbError> {
    let before = buf.len();
    match codec.decode(buf)? {
        Some(frame) => Ok(Some((frame, (before - buf.len()) as u64))),
        None => Ok(None),
    }
}

async fn apply_replicated_frame(
    state: &Arc<ServerState>,
    runtime: &Arc<ReplicaRuntimeState>,
    write_half: &mut OwnedWriteHalf,
    frame: RespFrame,
    consumed: u64,
) -> Result<(), RespDbError> {
    if is_getack(&frame) {
        let offset_before_getack = runtime.inbound_offset();
        runtime.add_inbound_offset(consumed);
        let ack = RespFrame::command(&["REPLCONF", "ACK", &offset_before_getack.to_string()]);
        write_half.write_all(&ack.encode_to_vec()?).await?;
        return Ok(());
    }

    match Command::parse(&frame) {
        Ok(command) => {
            if let Err(e) = dispatch(&command, &frame, state, true).await {
                warn!("replicated command {} failed: {e}", command.name());
            }
        }
        Err(e) => warn!("failed to parse a replicated frame: {e}"),
    }
    runtime.add_inbound_offset(consumed);
    Ok(())
}

fn is_getack(frame: &RespFrame) -> bool {
    match frame {
        RespFrame::Array(items) if items.len() == 3 => {
            let RespFrame::BulkString(name) = &items[0] else {
                return false;
            };
            let RespFrame::BulkString(sub) = &items[1] else {
                return false;
            };
            name.eq_ignore_ascii_case(b"REPLCONF") && sub.eq_ignore_ascii_case(b"GETACK")
        }
        _ => false,
    }
}

async fn send_command(stream: &mut TcpStream, args: &[&str]) -> Result<(), RespDbError> {
    let encoded = RespFrame::command(args).encode_to_vec()?;
    stream.write_all(&encoded).await?;
    Ok(())
}

async fn expect_simple_string(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    expected: &str,
) -> Result<(), RespDbError> {
    let line = read_line(stream, buf).await?;
    let text = String::from_utf8_lossy(&line);
    if text.trim_start_matches('+') != expected {
        return Err(RespDbError::ReplicationError(format!(
            "expected +{expected} during handshake, got {text}"
        )));
    }
    Ok(())
}

async fn read_line(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<Bytes, RespDbError> {
    loop {
        if let Some(pos) = find_crlf(buf) {
            let line = buf.split_to(pos).freeze();
            let _ = buf.split_to(2);
            return Ok(line);
        }
        fill_buf(stream, buf).await?;
    }
}

async fn read_exact_n(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    n: usize,
) -> Result<Bytes, RespDbError> {
    while buf.len() < n {
        fill_buf(stream, buf).await?;
    }
    Ok(buf.split_to(n).freeze())
}

async fn fill_buf(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<(), RespDbError> {
    let mut chunk = [0u8; READ_CHUNK];
    let n = stream.read(&mut chunk).await?;
    if n == 0 {
        return Err(RespDbError::ReplicationError(
            "primary closed the connection during handshake".into(),
        ));
    }
    buf.extend_from_slice(&chunk[..n]);
    Ok(())
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
