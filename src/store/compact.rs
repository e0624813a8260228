//! Compactor
//!
//! Rebuilds the blob log and header side file from only the live entries,
//! reclaiming the space held by tombstones and overwritten payloads. Runs
//! once, synchronously, stop-the-world for this store: the caller releases
//! every handle first and re-acquires after the swap.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::header::HeaderIndex;

use super::read::ReadHandle;
use super::write::WriteHandle;
use super::head_path;

/// Rewrite the store at `body_path` keeping only live entries.
///
/// Returns the rebuilt index and new end-of-log cursor, or `None` when
/// there is nothing to rewrite (no blob log yet, or zero live keys — the
/// original files are left untouched).
///
/// Failure policy: the temporary files are fully written and fsynced before
/// the originals are removed, so an I/O failure at any step leaves at least
/// one complete copy of the store on disk.
pub(crate) fn run(
    body_path: &Path,
    index: &HeaderIndex,
    key_capacity: usize,
) -> Result<Option<(HeaderIndex, u64)>> {
    if !body_path.exists() || index.live_len() == 0 {
        return Ok(None);
    }

    // Collect live payloads in original insertion order
    let reader = ReadHandle::open(body_path)?;
    let mut live: Vec<(String, Vec<u8>)> = Vec::with_capacity(index.live_len());
    for (key, entry) in index.iter() {
        if let Some(position) = entry.position() {
            live.push((key.to_string(), reader.read(&position)?));
        }
    }
    drop(reader);

    // Re-append everything through the normal write path into temp files;
    // this drops tombstones and orphaned bytes and re-densifies offsets.
    let tmp_body = tmp_path(body_path);
    let tmp_head = head_path(&tmp_body);

    let mut rebuilt = HeaderIndex::new();
    let mut cursor = 0u64;
    {
        let mut writer = WriteHandle::create(&tmp_body, &tmp_head, key_capacity)?;
        for (key, payload) in &live {
            let position = writer.append(key, payload, cursor)?;
            rebuilt.put(key, position);
            cursor += payload.len() as u64;
        }
        writer.sync()?;
    }

    // Swap the rewritten files into place
    let head = head_path(body_path);
    fs::remove_file(body_path)?;
    if head.exists() {
        fs::remove_file(&head)?;
    }
    fs::rename(&tmp_body, body_path)?;
    fs::rename(&tmp_head, &head)?;

    tracing::info!(
        "compaction kept {} live entries ({} bytes), dropped {} tombstoned keys",
        rebuilt.len(),
        cursor,
        index.len() - rebuilt.len()
    );

    Ok(Some((rebuilt, cursor)))
}

/// Temporary blob log path used while compacting
fn tmp_path(body_path: &Path) -> PathBuf {
    let mut name = body_path.as_os_str().to_os_string();
    name.push("-tmp");
    PathBuf::from(name)
}
