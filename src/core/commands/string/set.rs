// src/core/commands/string/set.rs

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::{ArgParser, extract_bytes};
use crate::core::protocol::RespFrame;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// `SET key value [PX ms]`. Unconditional; no NX/XX/GET/KEEPTTL surface.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub expire_ms: Option<u64>,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.len() != 2 && args.len() != 4 {
            return Err(RespDbError::WrongArgumentCount("SET".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let value = extract_bytes(&args[1])?;

        let expire_ms = if args.len() == 4 {
            let mut parser = ArgParser::new(&args[2..]);
            let px = parser.match_option::<u64>("px")?;
            if px.is_none() || !parser.is_exhausted() {
                return Err(RespDbError::SyntaxError);
            }
            px
        } else {
            None
        };

        Ok(Set {
            key,
            value,
            expire_ms,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        ctx.state.db.set(
            self.key.clone(),
            self.value.clone(),
            self.expire_ms.map(Duration::from_millis),
        );
        Ok(RespFrame::SimpleString("OK".into()))
    }

    fn is_write(&self) -> bool {
        true
    }
}
