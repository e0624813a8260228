//! Store Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate the header index, blob log, and handles
//! - Enforce write/read handle mutual exclusion
//! - Run compaction at close
//! - Stream sharded dumps of the live state
//!
//! ## Concurrency Model: Single Writer, Single Process
//!
//! The engine is single-threaded by contract: no internal locking, no
//! second process may open the same workspace (a hard precondition, not
//! enforced by file locks). At most one of {write handle, read handle} is
//! materialized at a time; asking for the other while one is open fails
//! fast with [`FlatError::HandleState`] — call [`Store::release`] first.

mod compact;
mod read;
mod write;

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::dump;
use crate::error::{FlatError, Result};
use crate::header::{self, HeaderIndex, PositionRecord};
use crate::record::DocRecord;

use read::ReadHandle;
use write::WriteHandle;

/// Which handle is currently materialized.
///
/// Mirrors the store lifecycle: `Closed` after open/release/compaction,
/// `WriteOpen` while appending, `ReadOpen` while querying. Compaction and
/// close force the state back to `Closed`, which is what invalidates any
/// previously-materialized handle.
#[derive(Debug)]
enum HandleState {
    Closed,
    WriteOpen(WriteHandle),
    ReadOpen(ReadHandle),
}

/// The flat-file key/blob store.
///
/// An append-only blob log plus a persisted header index, living under a
/// workspace directory as `{name}` and `{name}.head`.
#[derive(Debug)]
pub struct Store {
    /// Store configuration
    config: Config,

    /// In-memory header index, loaded eagerly on open
    index: HeaderIndex,

    /// Key field width of the persisted header records
    key_capacity: usize,

    /// End-of-log cursor: total bytes in the blob log
    start: u64,

    /// Handle state machine
    state: HandleState,
}

impl Store {
    /// Open or create a store with the given config.
    ///
    /// On startup:
    /// 1. Create the workspace directory if it doesn't exist
    /// 2. Load the header side file (absent/unreadable ⇒ fresh empty index)
    /// 3. Position the end-of-log cursor at the blob log's current length
    pub fn open(config: Config) -> Result<Self> {
        if config.key_length == 0 {
            return Err(FlatError::Config(
                "key_length must be at least 1".to_string(),
            ));
        }
        if config.key_length > u16::MAX as usize {
            return Err(FlatError::Config(format!(
                "key_length {} exceeds the header format maximum of {}",
                config.key_length,
                u16::MAX
            )));
        }

        fs::create_dir_all(&config.workspace)?;

        let body_path = config.index_path();
        let (index, key_capacity) = header::load(&head_path(&body_path), config.key_length)?;

        let start = if body_path.exists() {
            fs::metadata(&body_path)?.len()
        } else {
            0
        };

        if !index.is_empty() {
            tracing::info!(
                "opened store at {}: {} keys ({} live), {} log bytes",
                body_path.display(),
                index.len(),
                index.live_len(),
                start
            );
        }

        Ok(Self {
            config,
            index,
            key_capacity,
            start,
            state: HandleState::Closed,
        })
    }

    /// Open with a workspace path (convenience method)
    ///
    /// Uses default config with the specified workspace directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().workspace(path).build();
        Self::open(config)
    }

    /// Create a store and populate it from one shard of a dump, routing the
    /// shard's `(id, metadata)` stream through the normal write path.
    pub fn load_dump(config: Config, dump_path: &Path, shard: usize) -> Result<Self> {
        let (ids, metas) = dump::import_metas(dump_path, shard)?;
        let mut store = Self::open(config)?;
        store.add(&ids, &metas)?;
        store.release()?;
        Ok(store)
    }

    // =========================================================================
    // Boundary Operations
    // =========================================================================

    /// Batch insert: append each payload to the blob log and point the
    /// header index at it.
    ///
    /// Re-adding an existing key succeeds and orphans the older bytes until
    /// compaction, so updates grow the physical file monotonically. Key
    /// validation is all-or-nothing per batch: nothing is written if any
    /// key fails.
    pub fn add<K, P>(&mut self, ids: &[K], payloads: &[P]) -> Result<()>
    where
        K: AsRef<str>,
        P: AsRef<[u8]>,
    {
        if ids.len() != payloads.len() {
            return Err(FlatError::Validation(format!(
                "got {} ids but {} payloads",
                ids.len(),
                payloads.len()
            )));
        }
        if ids.is_empty() {
            return Ok(());
        }

        self.check_key_batch(ids)?;
        self.ensure_capacity(ids)?;
        self.ensure_write_open()?;

        let HandleState::WriteOpen(writer) = &mut self.state else {
            unreachable!("ensure_write_open leaves the store write-open");
        };
        for (id, payload) in ids.iter().zip(payloads) {
            let payload = payload.as_ref();
            let position = writer.append(id.as_ref(), payload, self.start)?;
            self.index.put(id.as_ref(), position);
            self.start += payload.len() as u64;
        }
        Ok(())
    }

    /// Batch update, implemented as delete-then-add.
    ///
    /// Ids never seen by this store are filtered out first — update does
    /// not insert brand-new keys, but it does resurrect tombstoned ones.
    pub fn update<K, P>(&mut self, ids: &[K], payloads: &[P]) -> Result<()>
    where
        K: AsRef<str>,
        P: AsRef<[u8]>,
    {
        if ids.len() != payloads.len() {
            return Err(FlatError::Validation(format!(
                "got {} ids but {} payloads",
                ids.len(),
                payloads.len()
            )));
        }

        let mut kept_ids: Vec<&str> = Vec::new();
        let mut kept_payloads: Vec<&[u8]> = Vec::new();
        for (id, payload) in ids.iter().zip(payloads) {
            if self.index.get(id.as_ref()).is_some() {
                kept_ids.push(id.as_ref());
                kept_payloads.push(payload.as_ref());
            }
        }
        if kept_ids.is_empty() {
            return Ok(());
        }

        self.delete(&kept_ids)?;
        self.add(&kept_ids, &kept_payloads)
    }

    /// Batch delete: replace each present key's record with the tombstone.
    ///
    /// Missing or already-deleted keys are silent no-ops — delete is
    /// idempotent and never fails on absent keys.
    pub fn delete<K: AsRef<str>>(&mut self, ids: &[K]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.ensure_write_open()?;
        let HandleState::WriteOpen(writer) = &mut self.state else {
            unreachable!("ensure_write_open leaves the store write-open");
        };
        for id in ids {
            if self.index.remove(id.as_ref()) {
                writer.write_tombstone(id.as_ref())?;
            }
        }
        Ok(())
    }

    /// Batch query: resolve each key to a copy of its payload bytes.
    ///
    /// Never-inserted and tombstoned keys yield `None`.
    pub fn get<K: AsRef<str>>(&mut self, ids: &[K]) -> Result<Vec<Option<Vec<u8>>>> {
        if self.index.live_len() == 0 {
            tracing::warn!(
                "store at {} has no live entries; every query resolves to None",
                self.config.index_path().display()
            );
            return Ok(vec![None; ids.len()]);
        }

        self.ensure_read_open()?;
        let HandleState::ReadOpen(reader) = &self.state else {
            unreachable!("ensure_read_open leaves the store read-open");
        };

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let payload = match self.index.get(id.as_ref()).and_then(|e| e.position()) {
                Some(position) => Some(reader.read(&position)?),
                None => None,
            };
            results.push(payload);
        }
        Ok(results)
    }

    /// Stream every live `(id, vector, metadata)` triple into `shard_count`
    /// shard files under `destination`, split positionally over insertion
    /// order. Payloads must decode as [`DocRecord`]s.
    ///
    /// Releases whichever handle is open first, reads through a fresh read
    /// handle, and leaves the store released afterwards.
    pub fn dump(&mut self, destination: &Path, shard_count: usize) -> Result<()> {
        if destination.as_os_str().is_empty() {
            return Err(FlatError::Validation(
                "dump requires a destination path".to_string(),
            ));
        }
        if shard_count == 0 {
            return Err(FlatError::Validation(
                "dump requires a shard count of at least 1".to_string(),
            ));
        }

        self.release()?;

        let live: Vec<(String, PositionRecord)> = self
            .index
            .iter()
            .filter_map(|(key, entry)| entry.position().map(|p| (key.to_string(), p)))
            .collect();

        if !live.is_empty() {
            self.ensure_read_open()?;
        }
        let reader = match &self.state {
            HandleState::ReadOpen(reader) => Some(reader),
            _ => None,
        };

        let entries = live.iter().map(|(id, position)| -> Result<(String, Vec<u8>, Vec<u8>)> {
            let reader = reader.expect("read handle is open while live entries exist");
            let payload = reader.read(position)?;
            let doc = DocRecord::decode(&payload)?;
            Ok((id.clone(), doc.embedding_bytes(), doc.metadata))
        });
        dump::export(destination, shard_count, live.len(), entries)?;

        self.release()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Flush and drop the currently-materialized handle, returning the
    /// state machine to `Closed`.
    pub fn release(&mut self) -> Result<()> {
        if let HandleState::WriteOpen(writer) = &mut self.state {
            writer.flush()?;
        }
        self.state = HandleState::Closed;
        Ok(())
    }

    /// Rebuild the blob log and header side file from only the live
    /// entries, reclaiming tombstoned and overwritten bytes.
    ///
    /// Stop-the-world for this store: all handles are released before the
    /// rewrite and must be re-acquired afterwards. A store with zero live
    /// keys is left untouched.
    pub fn compact(&mut self) -> Result<()> {
        self.release()?;
        let body_path = self.config.index_path();
        if let Some((rebuilt, cursor)) = compact::run(&body_path, &self.index, self.key_capacity)? {
            self.index = rebuilt;
            self.start = cursor;
        }
        Ok(())
    }

    /// Close the store: compact, optionally dump the final state, and
    /// release every resource.
    pub fn close(mut self) -> Result<()> {
        tracing::info!(
            "closing store: {} keys ({} live), physical size {} bytes",
            self.len(),
            self.live_len(),
            self.physical_size()?
        );

        self.compact()?;

        if self.config.dump_on_close {
            let destination = self.config.effective_dump_path();
            let shards = self.config.dump_shards;
            self.dump(&destination, shards)?;
        }

        self.release()
    }

    // =========================================================================
    // Observability
    // =========================================================================

    /// Number of keys ever inserted, tombstoned keys included
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Number of live (non-tombstoned) keys
    pub fn live_len(&self) -> usize {
        self.index.live_len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All keys ever inserted, in first-insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys()
    }

    /// Current key field width of the persisted header records
    pub fn key_capacity(&self) -> usize {
        self.key_capacity
    }

    /// Total on-disk byte size of the workspace directory
    pub fn physical_size(&self) -> Result<u64> {
        dir_size(&self.config.workspace)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Validate a batch of keys before anything is written.
    ///
    /// The batch maximum is checked against the configured `key_length`;
    /// empty keys and keys with embedded NULs are rejected because the
    /// persisted record pads the key field with NULs.
    fn check_key_batch<K: AsRef<str>>(&self, ids: &[K]) -> Result<()> {
        let mut max_len = 0;
        for id in ids {
            let id = id.as_ref();
            if id.is_empty() {
                return Err(FlatError::Validation("keys must be non-empty".to_string()));
            }
            if id.as_bytes().contains(&0) {
                return Err(FlatError::Validation(format!(
                    "key {:?} contains an embedded NUL",
                    id
                )));
            }
            max_len = max_len.max(id.len());
        }
        if max_len > self.config.key_length {
            return Err(FlatError::Validation(format!(
                "store allows only keys of length {}, but this batch has one of length {}",
                self.config.key_length, max_len
            )));
        }
        Ok(())
    }

    /// Widen the persisted header capacity if this batch carries a key
    /// wider than it (possible when a store persisted with a smaller
    /// `key_length` is reopened with a larger one). One-time rewrite of
    /// the side file; the blob log is untouched.
    fn ensure_capacity<K: AsRef<str>>(&mut self, ids: &[K]) -> Result<()> {
        let batch_max = ids.iter().map(|id| id.as_ref().len()).max().unwrap_or(0);
        if batch_max <= self.key_capacity {
            return Ok(());
        }

        if matches!(self.state, HandleState::ReadOpen(_)) {
            return Err(FlatError::HandleState(
                "cannot open a write handle while a read handle is open; release() it first"
                    .to_string(),
            ));
        }

        let widened = self.config.key_length;
        tracing::info!(
            "widening header key capacity from {} to {}",
            self.key_capacity,
            widened
        );

        self.release()?;
        let head = head_path(&self.config.index_path());
        if head.exists() {
            header::rewrite(&head, &self.index, widened)?;
        }
        self.key_capacity = widened;
        Ok(())
    }

    fn ensure_write_open(&mut self) -> Result<()> {
        if matches!(self.state, HandleState::WriteOpen(_)) {
            return Ok(());
        }
        if matches!(self.state, HandleState::ReadOpen(_)) {
            return Err(FlatError::HandleState(
                "cannot open a write handle while a read handle is open; release() it first"
                    .to_string(),
            ));
        }

        let body_path = self.config.index_path();
        let head = head_path(&body_path);
        let writer = if body_path.exists() {
            WriteHandle::append_mode(&body_path, &head, self.key_capacity)?
        } else {
            WriteHandle::create(&body_path, &head, self.key_capacity)?
        };
        self.state = HandleState::WriteOpen(writer);
        Ok(())
    }

    fn ensure_read_open(&mut self) -> Result<()> {
        if matches!(self.state, HandleState::ReadOpen(_)) {
            return Ok(());
        }
        if matches!(self.state, HandleState::WriteOpen(_)) {
            return Err(FlatError::HandleState(
                "cannot open a read handle while a write handle is open; release() it first"
                    .to_string(),
            ));
        }

        let reader = ReadHandle::open(&self.config.index_path())?;
        tracing::debug!("read handle open over {} log bytes", reader.len());
        self.state = HandleState::ReadOpen(reader);
        Ok(())
    }
}

/// Side file path for a blob log: `{name}.head`
pub(crate) fn head_path(body_path: &Path) -> PathBuf {
    let mut name = body_path.as_os_str().to_os_string();
    name.push(".head");
    PathBuf::from(name)
}

/// Recursive on-disk size of a directory
fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += meta.len();
        }
    }
    Ok(total)
}
