// src/core/storage/stream.rs

//! The `Stream` value type: an append-only, id-ordered sequence of field/value entries.

use crate::core::RespDbError;
use bytes::Bytes;
use std::fmt;

/// A stream entry id: a `(ms-time, seq)` pair, ordered lexicographically on the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    /// Parses a fully-qualified `<ms>-<seq>` id, used for `XRANGE` bounds and
    /// fully explicit `XADD` ids. Does not accept `*` wildcards.
    pub fn parse(s: &str) -> Result<Self, RespDbError> {
        match s.split_once('-') {
            Some((ms, seq)) => {
                let ms = ms.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
                let seq = seq.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
                Ok(StreamId { ms, seq })
            }
            None => {
                let ms = s.parse::<u64>().map_err(|_| RespDbError::SyntaxError)?;
                Ok(StreamId { ms, seq: 0 })
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// How the caller specified the id argument to `XADD`.
#[derive(Debug, Clone, Copy)]
pub enum IdSpec {
    /// `<ms>-<seq>`, fully explicit.
    Explicit(StreamId),
    /// `<ms>-*`, sequence auto-assigned.
    AutoSeq(u64),
    /// `*`, both ms and sequence auto-assigned from wall-clock time.
    Auto,
}

impl IdSpec {
    pub fn parse(s: &str) -> Result<Self, RespDbError> {
        if s == "*" {
            return Ok(IdSpec::Auto);
        }
        if let Some(ms_part) = s.strip_suffix("-*") {
            let ms = ms_part
                .parse::<u64>()
                .map_err(|_| RespDbError::SyntaxError)?;
            return Ok(IdSpec::AutoSeq(ms));
        }
        Ok(IdSpec::Explicit(StreamId::parse(s)?))
    }
}

/// A single entry in a stream: an id plus its field/value pairs, insertion-ordered.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

/// An ordered, append-only sequence of stream entries.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    pub entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|e| e.id)
    }

    /// Resolves the id to assign for a new entry given the requested spec and
    /// the stream's current last id, then appends the entry.
    pub fn append(
        &mut self,
        spec: IdSpec,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, RespDbError> {
        let last = self.last_id();
        let id = resolve_id(last, spec, now_ms)?;
        self.entries.push(StreamEntry { id, fields });
        Ok(id)
    }

    /// Returns entries with ids in `[start, end]` inclusive.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<StreamEntry> {
        self.entries
            .iter()
            .filter(|e| e.id >= start && e.id <= end)
            .cloned()
            .collect()
    }
}

/// Implements the id-resolution rules from `XADD`: rejects `0-0`, enforces
/// strict monotonicity, and auto-assigns the sequence (and, for `*`, the ms)
/// component when requested.
fn resolve_id(
    last: Option<StreamId>,
    spec: IdSpec,
    now_ms: u64,
) -> Result<StreamId, RespDbError> {
    let id = match spec {
        IdSpec::Explicit(id) => {
            if id == StreamId::ZERO {
                return Err(RespDbError::StreamIdZero);
            }
            id
        }
        IdSpec::AutoSeq(ms) => {
            let seq = match last {
                Some(last) if last.ms == ms => last.seq + 1,
                Some(_) => 0,
                None if ms == 0 => 1,
                None => 0,
            };
            StreamId { ms, seq }
        }
        IdSpec::Auto => {
            let seq = match last {
                Some(last) if last.ms == now_ms => last.seq + 1,
                _ => 0,
            };
            StreamId { ms: now_ms, seq }
        }
    };

    if let Some(last) = last {
        if id <= last {
            return Err(RespDbError::StreamIdTooSmall);
        }
    }
    Ok(id)
}
