// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod spawner;

/// Runs the server until shutdown or a fatal startup error: resolves the
/// process's replication role (performing the replica handshake when
/// configured), binds the listener, spawns background tasks, then runs the
/// accept loop until signaled to stop.
pub async fn run(config: Config) -> Result<()> {
    let initialized = initialization::setup(config).await?;
    let mut context = initialized.context;
    spawner::spawn_all(&mut context, initialized.replica_bootstrap);
    connection_loop::run(context).await;
    Ok(())
}
