// src/core/commands/command_trait.rs

//! Defines the core traits implemented by every command struct, plus the
//! execution context threaded through to each handler.

use crate::core::RespDbError;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared context passed to every command's `execute`. `is_replica_replay` is
/// set when the command arrived over the replication link rather than from a
/// regular client; handlers that would otherwise re-enqueue a write for
/// fanout consult it to avoid re-propagating a replayed command.
pub struct CommandContext<'a> {
    pub state: &'a Arc<ServerState>,
    pub is_replica_replay: bool,
}

/// A trait for parsing a command's arguments from a slice of `RespFrame`s.
pub trait ParseCommand: Sized {
    /// Parses the arguments (excluding the command name itself).
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError>;
}

/// A trait for the actual execution logic of a command.
#[async_trait]
pub trait ExecutableCommand {
    /// Runs the command against shared server state and produces a reply frame.
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError>;

    /// Whether this command mutates storage and must be enqueued for
    /// replication fanout when executed on a primary.
    fn is_write(&self) -> bool {
        false
    }
}
