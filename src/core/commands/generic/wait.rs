// src/core/commands/generic/wait.rs

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_string;
use crate::core::protocol::RespFrame;
use crate::core::replication::primary::wait_for_acks;
use async_trait::async_trait;
use std::time::Duration;

/// `WAIT numreplicas timeout`. On a replica there is no fanout to wait on, so
/// it answers with its own replica count of zero rather than erroring — this
/// build's dispatcher has no concept of a replica's own sub-replicas.
#[derive(Debug, Clone, Default)]
pub struct Wait {
    pub num_replicas: usize,
    pub timeout_ms: u64,
}

impl ParseCommand for Wait {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.len() != 2 {
            return Err(RespDbError::WrongArgumentCount("WAIT".to_string()));
        }
        let num_replicas = extract_string(&args[0])?
            .parse::<usize>()
            .map_err(|_| RespDbError::NotAnInteger)?;
        let timeout_ms = extract_string(&args[1])?
            .parse::<u64>()
            .map_err(|_| RespDbError::NotAnInteger)?;
        Ok(Wait {
            num_replicas,
            timeout_ms,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Wait {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        match ctx.state.replication.as_primary() {
            Some(primary) => {
                let acked = wait_for_acks(
                    primary,
                    self.num_replicas,
                    Duration::from_millis(self.timeout_ms),
                )
                .await;
                Ok(RespFrame::Integer(acked as i64))
            }
            None => Ok(RespFrame::Integer(0)),
        }
    }
}
