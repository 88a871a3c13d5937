// src/core/storage/db.rs

//! The storage engine: a single keyspace mapping byte-string keys to
//! heterogeneous [`Value`]s, with lazy and swept TTL expiry.

use super::stream::{IdSpec, Stream, StreamEntry, StreamId};
use super::value::{Entry, Value};
use crate::core::RespDbError;
use bytes::Bytes;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

/// The default interval between background expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The shared, mutex-guarded keyspace. All mutation is synchronous and holds
/// the lock only across the operation itself, never across an `.await`.
pub struct Db {
    entries: Mutex<IndexMap<Bytes, Entry>>,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// `SET key value [expiry]`. Replaces any prior value unconditionally.
    pub fn set(&self, key: Bytes, value: Bytes, expire_in: Option<Duration>) {
        let expires_at = expire_in.map(|d| Instant::now() + d);
        self.entries
            .lock()
            .insert(key, Entry::with_expiry(Value::String(value), expires_at));
    }

    /// `GET key`. Lazily expires the key if its TTL has elapsed.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, RespDbError> {
        let mut guard = self.entries.lock();
        let Some(entry) = guard.get(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            guard.shift_remove(key);
            return Ok(None);
        }
        match &entry.value {
            Value::String(bytes) => Ok(Some(bytes.clone())),
            Value::Stream(_) => Err(RespDbError::WrongType),
        }
    }

    /// `DEL key…`. Returns the number of keys actually removed.
    pub fn delete(&self, keys: &[Bytes]) -> u64 {
        let mut guard = self.entries.lock();
        let mut removed = 0u64;
        for key in keys {
            if guard.shift_remove(key.as_ref()).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// `KEYS *`. Sweeps expired strings out of the result as it collects.
    pub fn keys(&self) -> Vec<Bytes> {
        let mut guard = self.entries.lock();
        let expired: Vec<Bytes> = guard
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            guard.shift_remove(key.as_ref());
        }
        guard.keys().cloned().collect()
    }

    /// `TYPE key`.
    pub fn type_of(&self, key: &[u8]) -> &'static str {
        let mut guard = self.entries.lock();
        match guard.get(key) {
            Some(entry) if entry.is_expired() => {
                guard.shift_remove(key);
                "none"
            }
            Some(entry) => entry.value.type_name(),
            None => "none",
        }
    }

    /// `XADD key id field value…`. Creates the stream if it does not exist.
    pub fn xadd(
        &self,
        key: Bytes,
        id_spec: IdSpec,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<StreamId, RespDbError> {
        let now_ms = now_epoch_ms();
        let mut guard = self.entries.lock();
        match guard.get_mut(key.as_ref()) {
            Some(entry) => match &mut entry.value {
                Value::Stream(stream) => stream.append(id_spec, fields, now_ms),
                Value::String(_) => Err(RespDbError::WrongType),
            },
            None => {
                let mut stream = Stream::new();
                let id = stream.append(id_spec, fields, now_ms)?;
                guard.insert(key, Entry::new(Value::Stream(stream)));
                Ok(id)
            }
        }
    }

    /// `XRANGE key start end`, inclusive on both ends.
    pub fn xrange(
        &self,
        key: &[u8],
        start: StreamId,
        end: StreamId,
    ) -> Result<Vec<StreamEntry>, RespDbError> {
        let guard = self.entries.lock();
        match guard.get(key) {
            Some(entry) => match &entry.value {
                Value::Stream(stream) => Ok(stream.range(start, end)),
                Value::String(_) => Err(RespDbError::WrongType),
            },
            None => Ok(Vec::new()),
        }
    }

    /// Inserts a value loaded from an RDB snapshot, with an absolute expiry
    /// given as Unix epoch milliseconds (already elapsed entries are dropped).
    pub fn load_entry(&self, key: Bytes, value: Value, expire_at_epoch_ms: Option<u64>) {
        let expires_at = match expire_at_epoch_ms {
            Some(epoch_ms) => {
                let now_epoch = now_epoch_ms();
                if epoch_ms <= now_epoch {
                    return;
                }
                Some(Instant::now() + Duration::from_millis(epoch_ms - now_epoch))
            }
            None => None,
        };
        self.entries
            .lock()
            .insert(key, Entry::with_expiry(value, expires_at));
    }

    /// Removes every String entry whose TTL has elapsed. Called by the
    /// background sweep task; lazy expiry on `get`/`keys` is authoritative.
    fn sweep_expired(&self) -> usize {
        let mut guard = self.entries.lock();
        let expired: Vec<Bytes> = guard
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            guard.shift_remove(key.as_ref());
        }
        expired.len()
    }

    /// Number of keys currently stored, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Runs the background expiry sweep until shutdown is signaled.
pub async fn run_expiry_sweep(
    db: std::sync::Arc<Db>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!("Expiry sweep task shutting down.");
                break;
            }
            _ = ticker.tick() => {
                let removed = db.sweep_expired();
                if removed > 0 {
                    debug!("Expiry sweep removed {} expired key(s).", removed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let db = Db::new();
        db.set(Bytes::from_static(b"foo"), Bytes::from_static(b"bar"), None);
        assert_eq!(db.get(b"foo").unwrap(), Some(Bytes::from_static(b"bar")));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_key_is_invisible_to_get_and_keys() {
        let db = Db::new();
        db.set(
            Bytes::from_static(b"foo"),
            Bytes::from_static(b"bar"),
            Some(Duration::from_millis(100)),
        );
        assert_eq!(db.get(b"foo").unwrap(), Some(Bytes::from_static(b"bar")));
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(db.get(b"foo").unwrap(), None);
        assert!(!db.keys().contains(&Bytes::from_static(b"foo")));
    }

    #[test]
    fn del_is_idempotent() {
        let db = Db::new();
        db.set(Bytes::from_static(b"a"), Bytes::from_static(b"1"), None);
        db.set(Bytes::from_static(b"b"), Bytes::from_static(b"2"), None);
        let keys = vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"b"),
            Bytes::from_static(b"c"),
        ];
        assert_eq!(db.delete(&keys), 2);
        assert_eq!(db.delete(&keys), 0);
    }

    #[test]
    fn get_on_stream_key_is_wrongtype() {
        let db = Db::new();
        db.xadd(
            Bytes::from_static(b"s"),
            IdSpec::Explicit(StreamId { ms: 1, seq: 0 }),
            vec![(Bytes::from_static(b"f"), Bytes::from_static(b"v"))],
        )
        .unwrap();
        assert_eq!(db.get(b"s"), Err(RespDbError::WrongType));
        assert_eq!(db.type_of(b"s"), "stream");
    }

    #[test]
    fn type_of_missing_key_is_none() {
        let db = Db::new();
        assert_eq!(db.type_of(b"missing"), "none");
    }
}
