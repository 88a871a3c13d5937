// src/server/spawner.rs

//! Spawns all of the server's long-running background tasks: the expiry
//! sweep (every role), the ack-poll and per-replica fanout tasks (primary
//! only), and the replayed-command loop (replica only).

use super::context::ServerContext;
use super::initialization::ReplicaBootstrap;
use crate::core::replication::run_ack_poll;
use crate::core::replication::replica::run_replay_loop;
use crate::core::storage::db::{DEFAULT_SWEEP_INTERVAL, run_expiry_sweep};
use tracing::error;

/// Spawns every background task for this process's role into `ctx`'s
/// `JoinSet`. Must run after [`super::initialization::setup`] and before the
/// accept loop starts.
pub fn spawn_all(ctx: &mut ServerContext, replica_bootstrap: Option<ReplicaBootstrap>) {
    let db = ctx.state.db.clone();
    let sweep_shutdown = ctx.shutdown_tx.subscribe();
    ctx.background_tasks
        .spawn(async move { run_expiry_sweep(db, DEFAULT_SWEEP_INTERVAL, sweep_shutdown).await });

    if let Some(primary) = ctx.state.replication.as_primary() {
        let primary = primary.clone();
        let ack_shutdown = ctx.shutdown_tx.subscribe();
        ctx.background_tasks
            .spawn(async move { run_ack_poll(primary, ack_shutdown).await });
    }

    if let Some(ReplicaBootstrap { runtime, handshake }) = replica_bootstrap {
        let state = ctx.state.clone();
        let replay_shutdown = ctx.shutdown_tx.subscribe();
        ctx.background_tasks.spawn(async move {
            if let Err(e) = run_replay_loop(
                handshake.read_half,
                handshake.write_half,
                handshake.leftover,
                state,
                runtime,
                replay_shutdown,
            )
            .await
            {
                error!("replica replay loop ended with an error: {e}");
            }
        });
    }
}
