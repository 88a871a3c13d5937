// src/core/commands/streams/xadd.rs

//! `XADD key <id | ms-* | *> field value [field value ...]`. Id resolution
//! rules (rejects `0-0`, enforces strict monotonicity, auto-assigns seq
//! and/or ms) live in [`crate::core::storage::stream`]; this handler only
//! parses arguments and formats the resolved id.

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::IdSpec;
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct XAdd {
    pub key: Bytes,
    pub id_spec: IdSpecArg,
    pub fields: Vec<(Bytes, Bytes)>,
}

/// Carries the raw id text through to execution, since `IdSpec` itself
/// isn't `Default`/`Clone`-friendly enough to sit behind a struct literal.
#[derive(Debug, Clone)]
pub struct IdSpecArg(pub String);

impl Default for XAdd {
    fn default() -> Self {
        XAdd {
            key: Bytes::new(),
            id_spec: IdSpecArg("*".to_string()),
            fields: Vec::new(),
        }
    }
}

impl ParseCommand for XAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.len() < 4 {
            return Err(RespDbError::WrongArgumentCount("XADD".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let id_str = String::from_utf8(extract_bytes(&args[1])?.to_vec())
            .map_err(|_| RespDbError::SyntaxError)?;

        let rest = &args[2..];
        if rest.len() % 2 != 0 {
            return Err(RespDbError::WrongArgumentCount("XADD".to_string()));
        }
        let fields = rest
            .chunks_exact(2)
            .map(|chunk| Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?)))
            .collect::<Result<Vec<_>, RespDbError>>()?;

        Ok(XAdd {
            key,
            id_spec: IdSpecArg(id_str),
            fields,
        })
    }
}

#[async_trait]
impl ExecutableCommand for XAdd {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        let id_spec = IdSpec::parse(&self.id_spec.0)?;
        let id = ctx
            .state
            .db
            .xadd(self.key.clone(), id_spec, self.fields.clone())?;
        Ok(RespFrame::BulkString(Bytes::from(id.to_string())))
    }

    fn is_write(&self) -> bool {
        true
    }
}
