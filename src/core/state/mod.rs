// src/core/state/mod.rs

//! Defines the central `ServerState` struct and all related state components.

mod replication;
mod stats;

pub use replication::{
    PrimaryReplicationState, ReplicaHandle, ReplicaRuntimeState, ReplicationRole, generate_replid,
};
pub use stats::StatsState;

use crate::config::Config;
use crate::core::storage::Db;
use std::sync::Arc;

/// Bundles the server's shared, process-lifetime state: the keyspace, this
/// process's replication role, its configuration, and runtime statistics.
pub struct ServerState {
    pub db: Arc<Db>,
    pub config: Arc<Config>,
    pub replication: ReplicationRole,
    pub stats: StatsState,
}

impl ServerState {
    pub fn new(config: Arc<Config>, replication: ReplicationRole) -> Arc<Self> {
        Self::from_parts(Arc::new(Db::new()), config, replication)
    }

    /// Builds state around an already-populated `Db`, used when a replica's
    /// handshake has seeded the keyspace before `ServerState` itself exists.
    pub fn from_parts(db: Arc<Db>, config: Arc<Config>, replication: ReplicationRole) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            replication,
            stats: StatsState::new(),
        })
    }
}
