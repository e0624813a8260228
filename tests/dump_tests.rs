//! Tests for the sharded dump export and reload
//!
//! These tests verify:
//! - Positional partitioning: floor(n/s) per shard, remainder on the last
//! - Concatenating shards reproduces the original iteration order
//! - Ids, vectors, and metadata line up per shard
//! - Refusal of invalid dump arguments
//! - Reloading a store from one shard

use std::path::Path;

use flatkv::dump::{import_ids_vectors, import_metas};
use flatkv::{Config, DocRecord, FlatError, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn doc(i: usize) -> DocRecord {
    DocRecord::new(
        (0..7).map(|d| (i * 10 + d) as f32).collect(),
        format!("metadata for doc {}", i).into_bytes(),
    )
}

/// Store seeded with `count` encoded DocRecords, write handle released
fn seeded_store(dir: &TempDir, count: usize) -> (Store, Vec<String>, Vec<DocRecord>) {
    let ids: Vec<String> = (0..count).map(|i| format!("doc{:05}", i)).collect();
    let docs: Vec<DocRecord> = (0..count).map(doc).collect();
    let payloads: Vec<Vec<u8>> = docs.iter().map(|d| d.encode().unwrap()).collect();

    let mut store = Store::open_path(dir.path()).unwrap();
    store.add(&ids, &payloads).unwrap();
    store.release().unwrap();
    (store, ids, docs)
}

fn assert_shard(
    dump_path: &Path,
    shard: usize,
    expected_ids: &[String],
    expected_docs: &[DocRecord],
) {
    let (ids, vectors) = import_ids_vectors(dump_path, shard).unwrap();
    let (meta_ids, metas) = import_metas(dump_path, shard).unwrap();

    assert_eq!(ids, expected_ids);
    assert_eq!(meta_ids, expected_ids);
    for ((vector, meta), doc) in vectors.iter().zip(&metas).zip(expected_docs) {
        assert_eq!(vector, &doc.embedding_bytes());
        assert_eq!(
            DocRecord::embedding_from_bytes(vector).unwrap(),
            doc.embedding
        );
        assert_eq!(meta, &doc.metadata);
    }
}

// =============================================================================
// Partitioning Tests
// =============================================================================

#[test]
fn test_even_split_across_two_shards() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let (mut store, ids, docs) = seeded_store(&dir, 10);

    store.dump(dump_dir.path(), 2).unwrap();

    assert_shard(dump_dir.path(), 0, &ids[..5], &docs[..5]);
    assert_shard(dump_dir.path(), 1, &ids[5..], &docs[5..]);
}

#[test]
fn test_last_shard_absorbs_remainder() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let (mut store, ids, docs) = seeded_store(&dir, 10);

    store.dump(dump_dir.path(), 3).unwrap();

    assert_shard(dump_dir.path(), 0, &ids[..3], &docs[..3]);
    assert_shard(dump_dir.path(), 1, &ids[3..6], &docs[3..6]);
    assert_shard(dump_dir.path(), 2, &ids[6..], &docs[6..]);
}

#[test]
fn test_concatenated_shards_reproduce_iteration_order() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let (mut store, ids, _docs) = seeded_store(&dir, 11);

    store.dump(dump_dir.path(), 4).unwrap();

    let mut concatenated = Vec::new();
    let mut total = 0;
    for shard in 0..4 {
        let (shard_ids, _) = import_ids_vectors(dump_dir.path(), shard).unwrap();
        total += shard_ids.len();
        concatenated.extend(shard_ids);
    }
    assert_eq!(total, 11);
    assert_eq!(concatenated, ids);
}

#[test]
fn test_dump_skips_tombstoned_keys() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let (mut store, ids, docs) = seeded_store(&dir, 6);

    store.delete(&ids[..2]).unwrap();
    store.dump(dump_dir.path(), 1).unwrap();

    assert_shard(dump_dir.path(), 0, &ids[2..], &docs[2..]);
}

#[test]
fn test_dump_of_empty_store_writes_empty_shard() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let mut store = Store::open_path(dir.path()).unwrap();

    store.dump(dump_dir.path(), 1).unwrap();

    let (ids, vectors) = import_ids_vectors(dump_dir.path(), 0).unwrap();
    assert!(ids.is_empty());
    assert!(vectors.is_empty());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_dump_refuses_zero_shards() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let (mut store, _ids, _docs) = seeded_store(&dir, 3);

    let err = store.dump(dump_dir.path(), 0).unwrap_err();
    assert!(matches!(err, FlatError::Validation(_)));
}

#[test]
fn test_dump_refuses_empty_destination() {
    let dir = TempDir::new().unwrap();
    let (mut store, _ids, _docs) = seeded_store(&dir, 3);

    let err = store.dump(Path::new(""), 1).unwrap_err();
    assert!(matches!(err, FlatError::Validation(_)));
}

#[test]
fn test_dump_rejects_undecodable_payloads() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let mut store = Store::open_path(dir.path()).unwrap();

    store.add(&["raw"], &[b"not a doc record".as_slice()]).unwrap();
    store.release().unwrap();

    let err = store.dump(dump_dir.path(), 1).unwrap_err();
    assert!(matches!(err, FlatError::Serialization(_)));
}

// =============================================================================
// Reload Tests
// =============================================================================

#[test]
fn test_load_dump_rebuilds_queryable_store() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let reload_dir = TempDir::new().unwrap();
    let (mut store, ids, docs) = seeded_store(&dir, 10);

    store.dump(dump_dir.path(), 2).unwrap();

    // A downstream worker reloads shard 1 only, storing the metadata blobs
    let config = Config::builder().workspace(reload_dir.path()).build();
    let mut reloaded = Store::load_dump(config, dump_dir.path(), 1).unwrap();

    assert_eq!(reloaded.live_len(), 5);
    let results = reloaded.get(&ids[5..]).unwrap();
    for (result, doc) in results.iter().zip(&docs[5..]) {
        assert_eq!(result.as_deref(), Some(doc.metadata.as_slice()));
    }
}

#[test]
fn test_dump_on_close() {
    let dir = TempDir::new().unwrap();
    let dump_dir = TempDir::new().unwrap();
    let dump_dest = dump_dir.path().join("final_dump");

    let ids: Vec<String> = (0..4).map(|i| format!("doc{:05}", i)).collect();
    let docs: Vec<DocRecord> = (0..4).map(doc).collect();
    let payloads: Vec<Vec<u8>> = docs.iter().map(|d| d.encode().unwrap()).collect();

    let config = Config::builder()
        .workspace(dir.path())
        .dump_on_close(true)
        .dump_path(&dump_dest)
        .dump_shards(2)
        .build();
    let mut store = Store::open(config).unwrap();
    store.add(&ids, &payloads).unwrap();
    store.close().unwrap();

    assert_shard(&dump_dest, 0, &ids[..2], &docs[..2]);
    assert_shard(&dump_dest, 1, &ids[2..], &docs[2..]);
}
