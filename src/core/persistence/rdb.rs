// src/core/persistence/rdb.rs

//! A minimal RDB snapshot loader: enough of the wire format to bootstrap the
//! storage engine at startup and from a primary's `PSYNC` snapshot. Unsupported
//! opcodes or value types are rejected fatally rather than skipped, per the
//! external contract this loader implements.

use crate::core::RespDbError;
use crate::core::storage::{Db, Value};
use bytes::Bytes;

const OP_AUX: u8 = 0xFA;
const OP_SELECTDB: u8 = 0xFE;
const OP_RESIZEDB: u8 = 0xFB;
const OP_EXPIRETIME_MS: u8 = 0xFC;
const OP_EXPIRETIME: u8 = 0xFD;
const OP_EOF: u8 = 0xFF;
const TYPE_STRING: u8 = 0x00;

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, RespDbError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| RespDbError::PersistenceError("truncated RDB data".into()))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], RespDbError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| RespDbError::PersistenceError("truncated RDB data".into()))?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| RespDbError::PersistenceError("truncated RDB data".into()))?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a length-encoded value, per the two-top-bits scheme: `00`/`01`/`10`
    /// yield a plain length, `11` signals a special (integer) string encoding.
    fn read_length(&mut self) -> Result<LengthOrSpecial, RespDbError> {
        let b = self.read_u8()?;
        match b >> 6 {
            0b00 => Ok(LengthOrSpecial::Len((b & 0x3F) as u64)),
            0b01 => {
                let b2 = self.read_u8()?;
                Ok(LengthOrSpecial::Len((((b & 0x3F) as u64) << 8) | b2 as u64))
            }
            0b10 => {
                if b != 0x80 {
                    return Err(RespDbError::PersistenceError(
                        "unsupported RDB 32-bit length prefix".into(),
                    ));
                }
                let raw = self.read_bytes(4)?;
                Ok(LengthOrSpecial::Len(u32::from_be_bytes(
                    raw.try_into().unwrap(),
                ) as u64))
            }
            0b11 => Ok(LengthOrSpecial::Special(b & 0x3F)),
            _ => unreachable!(),
        }
    }

    /// Reads a string, either a normal length-prefixed byte run or a special
    /// integer encoding printed back out as its decimal string form.
    fn read_string(&mut self) -> Result<Bytes, RespDbError> {
        match self.read_length()? {
            LengthOrSpecial::Len(n) => {
                Ok(Bytes::copy_from_slice(self.read_bytes(n as usize)?))
            }
            LengthOrSpecial::Special(0) => {
                let raw = self.read_bytes(1)?;
                Ok(Bytes::from((raw[0] as i8).to_string().into_bytes()))
            }
            LengthOrSpecial::Special(1) => {
                let raw = self.read_bytes(2)?;
                let v = i16::from_le_bytes(raw.try_into().unwrap());
                Ok(Bytes::from(v.to_string().into_bytes()))
            }
            LengthOrSpecial::Special(2) => {
                let raw = self.read_bytes(4)?;
                let v = i32::from_le_bytes(raw.try_into().unwrap());
                Ok(Bytes::from(v.to_string().into_bytes()))
            }
            LengthOrSpecial::Special(other) => Err(RespDbError::PersistenceError(format!(
                "unsupported RDB string encoding 0x{other:02x} (LZF compression is not supported)"
            ))),
        }
    }
}

enum LengthOrSpecial {
    Len(u64),
    Special(u8),
}

/// Parses RDB bytes and seeds `db` with their contents. Returns the number of
/// keys loaded. Any unsupported opcode or value type is a fatal error — the
/// whole snapshot is rejected.
pub fn load(data: &[u8], db: &Db) -> Result<usize, RespDbError> {
    let mut cur = Cursor::new(data);
    let header = cur.read_bytes(9)?;
    if &header[0..5] != b"REDIS" {
        return Err(RespDbError::PersistenceError(
            "missing REDIS magic header".into(),
        ));
    }

    let mut pending_expiry_ms: Option<u64> = None;
    let mut loaded = 0usize;

    loop {
        let opcode = cur.read_u8()?;
        match opcode {
            OP_EOF => break,
            OP_SELECTDB => {
                cur.read_length()?;
            }
            OP_RESIZEDB => {
                cur.read_length()?;
                cur.read_length()?;
            }
            OP_AUX => {
                cur.read_string()?;
                cur.read_string()?;
            }
            OP_EXPIRETIME_MS => {
                let raw = cur.read_bytes(8)?;
                pending_expiry_ms = Some(u64::from_le_bytes(raw.try_into().unwrap()));
            }
            OP_EXPIRETIME => {
                let raw = cur.read_bytes(4)?;
                let secs = u32::from_le_bytes(raw.try_into().unwrap());
                pending_expiry_ms = Some(secs as u64 * 1000);
            }
            TYPE_STRING => {
                let key = cur.read_string()?;
                let value = cur.read_string()?;
                db.load_entry(key, Value::String(value), pending_expiry_ms.take());
                loaded += 1;
            }
            other => {
                return Err(RespDbError::PersistenceError(format!(
                    "unsupported RDB opcode or value type: 0x{other:02x}"
                )));
            }
        }
    }

    Ok(loaded)
}
