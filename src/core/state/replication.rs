// src/core/state/replication.rs

//! Contains state definitions related to replication.

use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex as AsyncMutex, watch};
use parking_lot::Mutex;

/// A connected replica's write half plus its last-acknowledged offset.
pub struct ReplicaHandle {
    pub addr: SocketAddr,
    writer: AsyncMutex<OwnedWriteHalf>,
    acked_offset: AtomicU64,
}

impl ReplicaHandle {
    pub fn acked_offset(&self) -> u64 {
        self.acked_offset.load(Ordering::SeqCst)
    }

    pub fn set_acked_offset(&self, offset: u64) {
        self.acked_offset.store(offset, Ordering::SeqCst);
    }

    pub async fn write_all(&self, bytes: &[u8]) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;
        let mut guard = self.writer.lock().await;
        guard.write_all(bytes).await?;
        guard.flush().await
    }
}

/// Replication state held by a primary: its id, monotonic offset, the set of
/// connected replicas, and a backlog of fanned-out frames each replica
/// handler streams from independently.
pub struct PrimaryReplicationState {
    pub replid: String,
    offset: AtomicU64,
    backlog: Mutex<VecDeque<(u64, Bytes)>>,
    offset_tx: watch::Sender<u64>,
    replicas: Mutex<Vec<Arc<ReplicaHandle>>>,
}

impl PrimaryReplicationState {
    pub fn new(replid: String) -> Self {
        let (offset_tx, _rx) = watch::channel(0u64);
        Self {
            replid,
            offset: AtomicU64::new(0),
            backlog: Mutex::new(VecDeque::new()),
            offset_tx,
            replicas: Mutex::new(Vec::new()),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Subscribes to offset advancement, used by each replica's streaming task
    /// to wake up when new frames are available.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.offset_tx.subscribe()
    }

    /// Encodes and enqueues a write command's bytes for fanout, advancing the
    /// replication offset by the encoded length. Returns the offset at which
    /// this frame starts.
    pub fn enqueue_write(&self, encoded: Bytes) -> u64 {
        let start_offset = self.offset.fetch_add(encoded.len() as u64, Ordering::SeqCst);
        let new_offset = start_offset + encoded.len() as u64;
        self.backlog.lock().push_back((start_offset, encoded));
        self.offset_tx.send_if_modified(|current| {
            if *current < new_offset {
                *current = new_offset;
                true
            } else {
                false
            }
        });
        start_offset
    }

    /// Returns every backlogged frame starting at or after `since_offset`.
    pub fn frames_since(&self, since_offset: u64) -> Vec<(u64, Bytes)> {
        self.backlog
            .lock()
            .iter()
            .filter(|(offset, _)| *offset >= since_offset)
            .cloned()
            .collect()
    }

    pub fn register_replica(&self, addr: SocketAddr, writer: OwnedWriteHalf) -> Arc<ReplicaHandle> {
        let handle = Arc::new(ReplicaHandle {
            addr,
            writer: AsyncMutex::new(writer),
            acked_offset: AtomicU64::new(0),
        });
        self.replicas.lock().push(handle.clone());
        handle
    }

    pub fn remove_replica(&self, addr: SocketAddr) {
        self.replicas.lock().retain(|r| r.addr != addr);
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.lock().len()
    }

    pub fn replicas_snapshot(&self) -> Vec<Arc<ReplicaHandle>> {
        self.replicas.lock().clone()
    }

    /// Counts replicas whose last-acknowledged offset meets `target_offset`.
    pub fn count_acked(&self, target_offset: u64) -> usize {
        self.replicas
            .lock()
            .iter()
            .filter(|r| r.acked_offset() >= target_offset)
            .count()
    }
}

/// Replication state held by a replica: the primary it follows and the number
/// of replicated bytes it has consumed since the handshake completed.
pub struct ReplicaRuntimeState {
    pub primary_host: String,
    pub primary_port: u16,
    pub master_replid: String,
    inbound_offset: AtomicU64,
}

impl ReplicaRuntimeState {
    pub fn new(primary_host: String, primary_port: u16, master_replid: String, initial_offset: u64) -> Self {
        Self {
            primary_host,
            primary_port,
            master_replid,
            inbound_offset: AtomicU64::new(initial_offset),
        }
    }

    pub fn inbound_offset(&self) -> u64 {
        self.inbound_offset.load(Ordering::SeqCst)
    }

    pub fn add_inbound_offset(&self, len: u64) -> u64 {
        self.inbound_offset.fetch_add(len, Ordering::SeqCst) + len
    }
}

/// The server's replication role: primary (fans writes out) or replica
/// (follows an upstream primary).
pub enum ReplicationRole {
    Primary(Arc<PrimaryReplicationState>),
    Replica(Arc<ReplicaRuntimeState>),
}

impl ReplicationRole {
    pub fn role_str(&self) -> &'static str {
        match self {
            ReplicationRole::Primary(_) => "master",
            ReplicationRole::Replica(_) => "slave",
        }
    }

    pub fn replid(&self) -> String {
        match self {
            ReplicationRole::Primary(p) => p.replid.clone(),
            ReplicationRole::Replica(r) => r.master_replid.clone(),
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            ReplicationRole::Primary(p) => p.offset(),
            ReplicationRole::Replica(r) => r.inbound_offset(),
        }
    }

    pub fn as_primary(&self) -> Option<&Arc<PrimaryReplicationState>> {
        match self {
            ReplicationRole::Primary(p) => Some(p),
            ReplicationRole::Replica(_) => None,
        }
    }
}

/// Generates a 40-character hex replication id, fixed for the process lifetime.
pub fn generate_replid() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 20] = rng.gen();
    hex::encode(bytes)
}
