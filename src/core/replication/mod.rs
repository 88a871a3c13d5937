// src/core/replication/mod.rs

//! Orchestrates the replication subsystem: a primary fans write commands out
//! to connected replicas and polls them for acknowledgment offsets; a replica
//! connects upstream, performs the handshake, ingests a snapshot, and then
//! replays the primary's command stream against local storage.

pub mod primary;
pub mod replica;

pub use primary::{handle_psync, run_ack_poll};
pub use replica::{Handshake, handshake, run_replay_loop};
