//! Header Index Module
//!
//! In-memory map from key to its location in the blob log, persisted as a
//! side file next to the log. The side file is a cache: the blob log plus
//! original insertion order is the source of truth for compaction.
//!
//! ## Side File Format (`{name}.head`)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Superblock (16 bytes)                                   │
//! │   Magic: "FKVH" (4) | Version: u16 (2)                  │
//! │   KeyCapacity: u16 (2) | Reserved (8)                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record Stream (variable, append-only)                   │
//! │   [Key: NUL-padded to KeyCapacity]                      │
//! │   [Page: i64][Offset: i64][Length: i64][CRC32: u32]     │
//! │   ... repeated, replayed last-write-wins on load ...    │
//! │   (Page = Offset = Length = -1 means tombstone)         │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod index;
mod record;

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;

pub use index::HeaderIndex;
pub use record::{Entry, PositionRecord};

pub(crate) use record::encode as encode_record;

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a FlatKV header side file
pub(crate) const MAGIC: &[u8; 4] = b"FKVH";

/// Current header format version
pub(crate) const VERSION: u16 = 1;

/// Superblock size: Magic (4) + Version (2) + KeyCapacity (2) + Reserved (8)
pub(crate) const SUPERBLOCK_SIZE: usize = 16;

/// Sentinel field value marking a tombstone record
pub(crate) const TOMBSTONE: i64 = -1;

/// Fixed page size used to split absolute log offsets into
/// `(page, offset_within_page)`. A multiple of the memory-map allocation
/// granularity on every supported platform, so `page * PAGE_SIZE` is always
/// a legal map offset.
pub const PAGE_SIZE: u64 = 64 * 1024;

/// On-disk size of one header record at the given key capacity
pub(crate) fn record_size(key_capacity: usize) -> usize {
    // key + page (8) + offset (8) + length (8) + crc (4)
    key_capacity + 28
}

// =============================================================================
// Side File I/O
// =============================================================================

/// Write a fresh superblock at the given key capacity
pub(crate) fn write_superblock(writer: &mut impl Write, key_capacity: usize) -> Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(key_capacity as u16).to_le_bytes())?;
    writer.write_all(&[0u8; 8])?;
    Ok(())
}

/// Load a header side file into memory.
///
/// Returns the replayed index and the key capacity recorded in the
/// superblock. An absent or unreadable file yields an empty index at
/// `default_capacity` — a fresh store, never an error. A corrupt or
/// truncated record stream keeps the valid prefix.
pub(crate) fn load(path: &Path, default_capacity: usize) -> Result<(HeaderIndex, usize)> {
    if !path.exists() {
        return Ok((HeaderIndex::new(), default_capacity));
    }

    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    if data.len() < SUPERBLOCK_SIZE || &data[0..4] != MAGIC {
        tracing::warn!(
            "header side file {} has no valid superblock, starting empty",
            path.display()
        );
        return Ok((HeaderIndex::new(), default_capacity));
    }

    let version = u16::from_le_bytes(data[4..6].try_into().unwrap());
    if version != VERSION {
        tracing::warn!(
            "header side file {} has unsupported version {}, starting empty",
            path.display(),
            version
        );
        return Ok((HeaderIndex::new(), default_capacity));
    }

    let capacity = u16::from_le_bytes(data[6..8].try_into().unwrap()) as usize;
    if capacity == 0 {
        tracing::warn!(
            "header side file {} declares a zero key capacity, starting empty",
            path.display()
        );
        return Ok((HeaderIndex::new(), default_capacity));
    }
    let rec_size = record_size(capacity);

    let mut index = HeaderIndex::new();
    let mut pos = SUPERBLOCK_SIZE;
    while pos + rec_size <= data.len() {
        match record::decode(&data[pos..pos + rec_size], capacity) {
            Some((key, entry)) => index.replay(key, entry),
            None => {
                tracing::warn!(
                    "corrupt header record at byte {} in {}, keeping {} replayed keys",
                    pos,
                    path.display(),
                    index.len()
                );
                break;
            }
        }
        pos += rec_size;
    }
    if pos < data.len() && pos + rec_size > data.len() {
        tracing::warn!(
            "truncated header record at tail of {} ({} trailing bytes ignored)",
            path.display(),
            data.len() - pos
        );
    }

    Ok((index, capacity))
}

/// Rewrite the side file with a wider key capacity.
///
/// Collapses the record stream to one record per key (insertion order,
/// tombstones included) and swaps the new file into place atomically.
pub(crate) fn rewrite(path: &Path, index: &HeaderIndex, key_capacity: usize) -> Result<()> {
    let tmp_path = path.with_extension("head-tmp");
    {
        let mut writer = std::io::BufWriter::new(File::create(&tmp_path)?);
        write_superblock(&mut writer, key_capacity)?;
        for (key, entry) in index.iter() {
            writer.write_all(&record::encode(key, entry, key_capacity))?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
