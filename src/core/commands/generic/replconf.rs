// src/core/commands/generic/replconf.rs

//! `REPLCONF` as seen by the generic client dispatcher. `ACK` is only ever
//! read off a primary's replication socket by
//! [`crate::core::replication::primary::read_replica_acks`], and `GETACK` is
//! only ever sent down a replica's inbound stream and answered by its replay
//! loop in [`crate::core::replication::replica`] — neither reaches this path.
//! Everything else (`listening-port`, `capa`, …) is a handshake pleasantry.

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct Replconf {
    pub args: Vec<String>,
}

impl ParseCommand for Replconf {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.is_empty() {
            return Err(RespDbError::WrongArgumentCount("REPLCONF".to_string()));
        }
        let str_args = args
            .iter()
            .map(extract_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Replconf { args: str_args })
    }
}

#[async_trait]
impl ExecutableCommand for Replconf {
    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        Ok(RespFrame::SimpleString("OK".into()))
    }
}
