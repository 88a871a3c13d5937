// src/core/commands/generic/info.rs

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use async_trait::async_trait;

/// `INFO [replication]`. Only the replication section is produced; any other
/// section name is accepted but yields the same body, matching the single
/// section this build reports.
#[derive(Debug, Clone, Default)]
pub struct Info {
    pub section: Option<String>,
}

impl ParseCommand for Info {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        match args.len() {
            0 => Ok(Info { section: None }),
            1 => Ok(Info {
                section: Some(extract_string(&args[0])?.to_ascii_lowercase()),
            }),
            _ => Err(RespDbError::WrongArgumentCount("INFO".to_string())),
        }
    }
}

#[async_trait]
impl ExecutableCommand for Info {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        let role = &ctx.state.replication;
        let body = format!(
            "# Replication\r\nrole:{}\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
            role.role_str(),
            role.replid(),
            role.offset(),
        );
        Ok(RespFrame::BulkString(body.into()))
    }
}
