// src/server/initialization.rs

//! Builds the process's replication role, seeds the keyspace (from an
//! on-disk RDB file when running as a primary, from the primary's snapshot
//! when running as a replica), and binds the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::persistence::rdb;
use crate::core::replication::{handshake, replica as replica_mod};
use crate::core::state::{
    PrimaryReplicationState, ReplicaRuntimeState, ReplicationRole, ServerState, generate_replid,
};
use crate::core::storage::Db;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// A completed replica handshake, carried alongside the `ServerContext` so
/// the spawner can hand its connection halves to the replay-loop task.
pub struct ReplicaBootstrap {
    pub runtime: Arc<ReplicaRuntimeState>,
    pub handshake: replica_mod::Handshake,
}

pub struct Initialized {
    pub context: ServerContext,
    pub replica_bootstrap: Option<ReplicaBootstrap>,
}

/// Runs every step that must complete before the accept loop starts:
/// resolving this process's replication role, seeding storage, and binding
/// the TCP listener. A replica whose handshake fails returns `Err`, which
/// `main` turns into a non-zero exit.
pub async fn setup(config: Config) -> Result<Initialized> {
    let config = Arc::new(config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let (state, replica_bootstrap) = match &config.replicaof {
        Some((host, port)) => {
            let db = Arc::new(Db::new());
            info!("starting as a replica of {host}:{port}");
            let hs = handshake(&db, host, *port, config.port)
                .await
                .context("replica handshake failed")?;
            let runtime = Arc::new(ReplicaRuntimeState::new(
                host.clone(),
                *port,
                hs.master_replid.clone(),
                0,
            ));
            let state = ServerState::from_parts(
                db,
                config.clone(),
                ReplicationRole::Replica(runtime.clone()),
            );
            (state, Some(ReplicaBootstrap { runtime, handshake: hs }))
        }
        None => {
            let db = Arc::new(Db::new());
            load_rdb_file(&config, &db);
            let primary = Arc::new(PrimaryReplicationState::new(generate_replid()));
            let state =
                ServerState::from_parts(db, config.clone(), ReplicationRole::Primary(primary));
            (state, None)
        }
    };

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!("respdb listening on {}:{}", config.host, config.port);

    Ok(Initialized {
        context: ServerContext {
            state,
            listener,
            shutdown_tx,
            background_tasks: JoinSet::new(),
        },
        replica_bootstrap,
    })
}

/// Loads `<dir>/<dbfilename>` into `db` at primary startup if both are set
/// and the file exists; otherwise the keyspace starts empty.
fn load_rdb_file(config: &Config, db: &Arc<Db>) {
    let (Some(dir), Some(dbfilename)) = (&config.dir, &config.dbfilename) else {
        return;
    };
    let path = Path::new(dir).join(dbfilename);
    if !path.exists() {
        return;
    }
    match std::fs::read(&path) {
        Ok(bytes) => match rdb::load(&bytes, db) {
            Ok(loaded) => info!("loaded {loaded} key(s) from {}", path.display()),
            Err(e) => warn!("failed to parse RDB file {}: {e}", path.display()),
        },
        Err(e) => warn!("failed to read RDB file {}: {e}", path.display()),
    }
}
