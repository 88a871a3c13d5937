// src/core/commands/generic/del.rs

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use async_trait::async_trait;
use bytes::Bytes;

/// `DEL key...`. Replicated when at least the attempt is made; the actual
/// count removed is whatever the local keyspace reports.
#[derive(Debug, Clone, Default)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for Del {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.is_empty() {
            return Err(RespDbError::WrongArgumentCount("DEL".to_string()));
        }
        let keys = args
            .iter()
            .map(extract_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Del { keys })
    }
}

#[async_trait]
impl ExecutableCommand for Del {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        let removed = ctx.state.db.delete(&self.keys);
        Ok(RespFrame::Integer(removed as i64))
    }

    fn is_write(&self) -> bool {
        true
    }
}
