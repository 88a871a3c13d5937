// src/server/connection_loop.rs

//! The main accept loop: spawns one task per incoming connection and, on a
//! shutdown signal or a fatal background-task failure, broadcasts shutdown
//! to every spawned task and waits for them to drain.

use super::context::ServerContext;
use crate::connection;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, shutting down"),
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received, shutting down");
    }
}

/// Runs the accept loop until a shutdown signal arrives or a background task
/// fails, then drains every spawned connection task.
pub async fn run(mut ctx: ServerContext) {
    let mut connections: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = await_shutdown_signal() => break,

            Some(res) = ctx.background_tasks.join_next() => {
                if let Err(e) = res {
                    error!("a background task panicked: {e:?}; shutting down");
                } else {
                    warn!("a background task exited; shutting down");
                }
                break;
            }

            accepted = ctx.listener.accept() => {
                match accepted {
                    Ok((socket, addr)) => {
                        info!("accepted connection from {addr}");
                        ctx.state.stats.increment_total_connections();
                        let state = ctx.state.clone();
                        let shutdown_rx = ctx.shutdown_tx.subscribe();
                        connections.spawn(async move {
                            connection::run(socket, addr, state, shutdown_rx).await;
                        });
                    }
                    Err(e) => error!("failed to accept connection: {e}"),
                }
            }

            Some(res) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = res {
                    if e.is_panic() {
                        error!("a connection task panicked: {e:?}");
                    }
                }
            }
        }
    }

    info!("broadcasting shutdown to all tasks");
    let _ = ctx.shutdown_tx.send(());

    connections.shutdown().await;
    while ctx.background_tasks.join_next().await.is_some() {}
    info!("server shutdown complete");
}
