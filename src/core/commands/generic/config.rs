// src/core/commands/generic/config.rs

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use async_trait::async_trait;
use bytes::Bytes;

/// `CONFIG GET dir|dbfilename`. No other subcommand or parameter is supported.
#[derive(Debug, Clone, Default)]
pub struct ConfigGet {
    pub parameter: String,
}

impl ParseCommand for ConfigGet {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.len() != 2 {
            return Err(RespDbError::WrongArgumentCount("CONFIG".to_string()));
        }
        let sub = extract_string(&args[0])?;
        if !sub.eq_ignore_ascii_case("get") {
            return Err(RespDbError::UnknownSubcommand);
        }
        Ok(ConfigGet {
            parameter: extract_string(&args[1])?.to_ascii_lowercase(),
        })
    }
}

#[async_trait]
impl ExecutableCommand for ConfigGet {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        let value = match self.parameter.as_str() {
            "dir" => ctx.state.config.dir.clone(),
            "dbfilename" => ctx.state.config.dbfilename.clone(),
            _ => None,
        };
        match value {
            Some(v) => Ok(RespFrame::Array(vec![
                RespFrame::BulkString(Bytes::copy_from_slice(self.parameter.as_bytes())),
                RespFrame::BulkString(Bytes::from(v)),
            ])),
            None => Ok(RespFrame::NullArray),
        }
    }
}
