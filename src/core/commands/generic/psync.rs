// src/core/commands/generic/psync.rs

//! `PSYNC` is intercepted by the connection handler before a frame ever
//! reaches generic dispatch — it hands the raw socket off to
//! [`crate::core::replication::primary::handle_psync`], which owns the
//! `+FULLRESYNC` reply and the RDB bulk transfer. `Psync::parse` exists so the
//! connection handler can recognize and validate the command line the same
//! way every other command is parsed; `execute` is a safety net that should
//! never run.

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::{extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct Psync {
    pub replication_id: String,
    pub offset: String,
}

impl ParseCommand for Psync {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        validate_arg_count(args, 2, "PSYNC")?;
        Ok(Psync {
            replication_id: extract_string(&args[0])?,
            offset: extract_string(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Psync {
    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        Err(RespDbError::Internal(
            "PSYNC must be intercepted by the connection handler".into(),
        ))
    }
}
