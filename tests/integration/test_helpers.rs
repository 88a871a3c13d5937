// tests/integration/test_helpers.rs

//! Spins up a real listener on an ephemeral port backed by a `ServerState`,
//! used by the other integration tests to drive the server over a genuine
//! `TcpStream` rather than calling handlers in-process.

use respdb::config::Config;
use respdb::connection;
use respdb::core::replication::run_ack_poll;
use respdb::core::state::{PrimaryReplicationState, ReplicationRole, ServerState, generate_replid};
use respdb::core::storage::db::{DEFAULT_SWEEP_INTERVAL, run_expiry_sweep};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// A running primary instance: its bound address, shared state, and a
/// shutdown handle the test can use to tear it down.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn test_config(port: u16) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port,
        dir: None,
        dbfilename: None,
        replicaof: None,
        log_level: "warn".to_string(),
    }
}

/// Binds a fresh primary on `127.0.0.1:0` and spawns its accept loop.
pub async fn spawn_primary() -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = Arc::new(test_config(addr.port()));
    let primary = Arc::new(PrimaryReplicationState::new(generate_replid()));
    let state = ServerState::new(config, ReplicationRole::Primary(primary));

    let (shutdown_tx, _) = broadcast::channel(1);

    if let Some(primary) = state.replication.as_primary() {
        let primary = primary.clone();
        tokio::spawn(run_ack_poll(primary, shutdown_tx.subscribe()));
    }
    tokio::spawn(run_expiry_sweep(
        state.db.clone(),
        DEFAULT_SWEEP_INTERVAL,
        shutdown_tx.subscribe(),
    ));

    let accept_state = state.clone();
    let accept_shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = accept_shutdown_tx.subscribe();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => {
                    let Ok((socket, peer)) = accepted else { break };
                    let conn_state = accept_state.clone();
                    let conn_shutdown = accept_shutdown_tx.subscribe();
                    tokio::spawn(connection::run(socket, peer, conn_state, conn_shutdown));
                }
            }
        }
    });

    RunningServer {
        addr,
        state,
        shutdown_tx,
    }
}

/// Polls `check` every 10ms up to `timeout`, returning as soon as it's true.
/// Used to wait on replication's inherently asynchronous convergence instead
/// of a fixed sleep.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
