// src/core/storage/value.rs

//! The tagged `Value` variant stored against each key, plus its TTL wrapper.

use super::stream::Stream;
use bytes::Bytes;
use tokio::time::Instant;

/// A value stored in the keyspace. Streams carry no TTL; only strings do.
#[derive(Debug, Clone)]
pub enum Value {
    String(Bytes),
    Stream(Stream),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Stream(_) => "stream",
        }
    }
}

/// A keyspace slot: the value plus an optional absolute expiry instant.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Value,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn with_expiry(value: Value, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Instant::now())
    }
}
