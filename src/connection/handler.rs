// src/connection/handler.rs

//! Drives a single client connection: frames incoming bytes, dispatches each
//! command, and writes back the reply. A `PSYNC` request is the one
//! exception — it hands the raw socket off to the primary replication
//! subsystem and this loop exits.

use crate::core::commands::dispatch;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::replication::handle_psync;
use crate::core::state::ServerState;
use crate::core::{Command, RespDbError};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// Runs a client connection's read/dispatch/write loop until the peer
/// disconnects, a fatal protocol error occurs, or shutdown is signaled.
pub async fn run(
    socket: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut framed = Framed::new(socket, RespFrameCodec);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!("connection {addr} shutting down");
                return;
            }
            next = framed.next() => {
                match next {
                    Some(Ok(frame @ RespFrame::Array(_))) => {
                        match Command::parse(&frame) {
                            Ok(Command::Psync(_)) => {
                                let Some(primary) = state.replication.as_primary().cloned() else {
                                    let _ = framed
                                        .send(RespFrame::Error(
                                            "ERR PSYNC is only valid against a primary".into(),
                                        ))
                                        .await;
                                    continue;
                                };
                                let stream = framed.into_inner();
                                tokio::spawn(handle_psync(
                                    primary,
                                    addr,
                                    stream,
                                    shutdown_rx.resubscribe(),
                                ));
                                return;
                            }
                            Ok(command) => {
                                let reply = match dispatch(&command, &frame, &state, false).await {
                                    Ok(reply) => reply,
                                    Err(e) => RespFrame::Error(format_error(&command, e)),
                                };
                                if framed.send(reply).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                if framed.send(RespFrame::Error(format_parse_error(e))).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        warn!("connection {addr}: non-array top-level frame, closing");
                        return;
                    }
                    Some(Err(e)) => {
                        warn!("connection {addr}: malformed frame: {e}");
                        return;
                    }
                    None => {
                        debug!("connection {addr} closed by peer");
                        return;
                    }
                }
            }
        }
    }
}

fn format_error(command: &Command, e: RespDbError) -> String {
    match e {
        RespDbError::WrongType => {
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string()
        }
        RespDbError::WrongArgumentCount(_) => format!(
            "ERR wrong number of arguments for '{}' command",
            command.name().to_ascii_lowercase()
        ),
        other => format!("ERR {other}"),
    }
}

fn format_parse_error(e: RespDbError) -> String {
    match e {
        RespDbError::UnknownCommand(name) => format!("ERR unknown command '{name}'"),
        RespDbError::WrongArgumentCount(cmd) => format!(
            "ERR wrong number of arguments for '{}' command",
            cmd.to_ascii_lowercase()
        ),
        other => format!("ERR {other}"),
    }
}
