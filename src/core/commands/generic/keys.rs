// src/core/commands/generic/keys.rs

//! Implements the `KEYS` command. Only the literal `*` pattern is supported;
//! anything else is an unknown-subcommand error rather than a glob engine.

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Keys {
    pub pattern: Bytes,
}

impl ParseCommand for Keys {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        validate_arg_count(args, 1, "KEYS")?;
        Ok(Keys {
            pattern: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Keys {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        if self.pattern.as_ref() != b"*" {
            return Err(RespDbError::UnknownSubcommand);
        }
        let keys = ctx
            .state
            .db
            .keys()
            .into_iter()
            .map(RespFrame::BulkString)
            .collect();
        Ok(RespFrame::Array(keys))
    }
}
