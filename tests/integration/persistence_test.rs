// tests/integration/persistence_test.rs

//! Covers the RDB loader's external contract and the `CONFIG GET` surface
//! that exposes the configured snapshot location.

use super::test_helpers::spawn_primary;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use respdb::core::persistence::rdb;
use respdb::core::protocol::{RespFrame, RespFrameCodec};
use respdb::core::storage::Db;
use std::io::Write;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

fn bulk(s: &str) -> RespFrame {
    RespFrame::BulkString(Bytes::copy_from_slice(s.as_bytes()))
}

fn command(args: &[&str]) -> RespFrame {
    RespFrame::Array(args.iter().map(|a| bulk(a)).collect())
}

/// Same bytes the primary's startup path would read off disk: a string key
/// with a far-future millisecond expiry.
fn string_key_snapshot() -> Vec<u8> {
    let mut bytes = b"REDIS0011".to_vec();
    bytes.push(0xFC); // EXPIRETIME_MS
    bytes.extend_from_slice(&9_999_999_999_999u64.to_le_bytes()); // far future
    bytes.push(0x00); // TYPE_STRING
    bytes.push(3);
    bytes.extend_from_slice(b"foo");
    bytes.push(3);
    bytes.extend_from_slice(b"bar");
    bytes.push(0xFF); // EOF
    bytes.extend_from_slice(&[0u8; 8]);
    bytes
}

#[test]
fn rdb_loader_seeds_a_string_key_with_expiry() {
    let bytes = string_key_snapshot();

    let db = Db::new();
    let loaded = rdb::load(&bytes, &db).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(db.get(b"foo").unwrap(), Some(Bytes::from_static(b"bar")));
}

/// Round-trips the same snapshot through an actual file on disk, matching
/// how a primary reads `<dir>/<dbfilename>` at startup rather than handing
/// the loader an in-memory buffer.
#[test]
fn rdb_loader_reads_a_snapshot_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.rdb");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&string_key_snapshot())
        .unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let db = Db::new();
    let loaded = rdb::load(&bytes, &db).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(db.get(b"foo").unwrap(), Some(Bytes::from_static(b"bar")));
}

#[test]
fn rdb_loader_drops_already_expired_entries() {
    let mut bytes = b"REDIS0011".to_vec();
    bytes.push(0xFC);
    bytes.extend_from_slice(&1u64.to_le_bytes()); // 1970, long expired
    bytes.push(0x00);
    bytes.push(3);
    bytes.extend_from_slice(b"foo");
    bytes.push(3);
    bytes.extend_from_slice(b"bar");
    bytes.push(0xFF);
    bytes.extend_from_slice(&[0u8; 8]);

    let db = Db::new();
    rdb::load(&bytes, &db).unwrap();
    assert_eq!(db.get(b"foo").unwrap(), None);
}

#[tokio::test]
async fn config_get_reports_dir_and_dbfilename() {
    let server = spawn_primary().await;

    let stream = TcpStream::connect(server.addr).await.unwrap();
    let mut client = Framed::new(stream, RespFrameCodec);

    // This test's primary has no --dir/--dbfilename set, so both report null.
    client.send(command(&["CONFIG", "GET", "dir"])).await.unwrap();
    assert_eq!(client.next().await.unwrap().unwrap(), RespFrame::NullArray);

    client
        .send(command(&["CONFIG", "GET", "maxmemory"]))
        .await
        .unwrap();
    match client.next().await.unwrap().unwrap() {
        RespFrame::NullArray => {}
        other => panic!("unsupported parameter should report null, got {other:?}"),
    }
}
