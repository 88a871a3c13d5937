// src/core/commands/streams/xrange.rs

//! `XRANGE key start end`. A bare `<ms>` boundary is asymmetric: on `start`
//! it means `<ms>-0`, on `end` it means `<ms>-<max seq>` — this is the one
//! place this command's behavior departs from naive symmetric parsing.

use crate::core::RespDbError;
use crate::core::commands::command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::RespFrame;
use crate::core::storage::StreamId;
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct XRange {
    pub key: Bytes,
    pub start: StreamId,
    pub end: StreamId,
}

impl Default for XRange {
    fn default() -> Self {
        XRange {
            key: Bytes::new(),
            start: StreamId::MIN,
            end: StreamId::MAX,
        }
    }
}

fn parse_boundary(s: &str, is_start: bool) -> Result<StreamId, RespDbError> {
    if s == "-" {
        return Ok(StreamId::MIN);
    }
    if s == "+" {
        return Ok(StreamId::MAX);
    }
    if let Some((ms, seq)) = s.split_once('-') {
        let ms = ms.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
        let seq = seq.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
        return Ok(StreamId { ms, seq });
    }
    let ms = s.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
    let seq = if is_start { 0 } else { u64::MAX };
    Ok(StreamId { ms, seq })
}

impl ParseCommand for XRange {
    fn parse(args: &[RespFrame]) -> Result<Self, RespDbError> {
        if args.len() != 3 {
            return Err(RespDbError::WrongArgumentCount("XRANGE".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let start = parse_boundary(&extract_string(&args[1])?, true)?;
        let end = parse_boundary(&extract_string(&args[2])?, false)?;
        Ok(XRange { key, start, end })
    }
}

#[async_trait]
impl ExecutableCommand for XRange {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        let entries = ctx.state.db.xrange(&self.key, self.start, self.end)?;
        let results = entries
            .into_iter()
            .map(|entry| {
                let mut fields_array = Vec::with_capacity(entry.fields.len() * 2);
                for (k, v) in entry.fields {
                    fields_array.push(RespFrame::BulkString(k));
                    fields_array.push(RespFrame::BulkString(v));
                }
                RespFrame::Array(vec![
                    RespFrame::BulkString(Bytes::from(entry.id.to_string())),
                    RespFrame::Array(fields_array),
                ])
            })
            .collect();
        Ok(RespFrame::Array(results))
    }
}
