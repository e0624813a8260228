//! Position records and their on-disk encoding.

use super::{record_size, PAGE_SIZE, TOMBSTONE};

/// Location of one payload inside the blob log.
///
/// `page * PAGE_SIZE + offset` is the absolute byte offset of the payload;
/// a payload may span page boundaries, so readers map a window of
/// `offset + length` bytes starting at the page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRecord {
    /// Page index into the blob log
    pub page: i64,
    /// Byte offset within the page
    pub offset: i64,
    /// Payload length in bytes
    pub length: i64,
}

impl PositionRecord {
    /// Split an absolute log offset into a position record
    pub fn at(start: u64, length: u64) -> Self {
        Self {
            page: (start / PAGE_SIZE) as i64,
            offset: (start % PAGE_SIZE) as i64,
            length: length as i64,
        }
    }

    /// Absolute byte offset of the payload in the blob log
    pub fn absolute(&self) -> u64 {
        self.page as u64 * PAGE_SIZE + self.offset as u64
    }

    /// Absolute byte offset one past the payload's last byte
    pub fn end(&self) -> u64 {
        self.absolute() + self.length as u64
    }
}

/// A header index entry: live position or tombstone.
///
/// Deleted keys keep their map entry forever — deletes are logical and are
/// reclaimed only by compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Live(PositionRecord),
    Deleted,
}

impl Entry {
    /// The live position, or `None` for a tombstone
    pub fn position(&self) -> Option<PositionRecord> {
        match self {
            Entry::Live(pos) => Some(*pos),
            Entry::Deleted => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Entry::Live(_))
    }
}

// =============================================================================
// On-disk Record Codec
// =============================================================================

/// Encode one header record at the given key capacity.
///
/// Caller guarantees `key.len() <= key_capacity` (enforced by batch
/// validation before any write).
pub(crate) fn encode(key: &str, entry: &Entry, key_capacity: usize) -> Vec<u8> {
    let (page, offset, length) = match entry {
        Entry::Live(pos) => (pos.page, pos.offset, pos.length),
        Entry::Deleted => (TOMBSTONE, TOMBSTONE, TOMBSTONE),
    };

    let mut buf = Vec::with_capacity(record_size(key_capacity));
    buf.extend_from_slice(key.as_bytes());
    buf.resize(key_capacity, 0u8);
    buf.extend_from_slice(&page.to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(&length.to_le_bytes());

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());
    buf
}

/// Decode one header record; `None` on CRC mismatch or malformed key bytes.
pub(crate) fn decode(buf: &[u8], key_capacity: usize) -> Option<(String, Entry)> {
    debug_assert_eq!(buf.len(), record_size(key_capacity));

    let body = &buf[..key_capacity + 24];
    let stored_crc = u32::from_le_bytes(buf[key_capacity + 24..].try_into().unwrap());

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(body);
    if hasher.finalize() != stored_crc {
        return None;
    }

    let key_bytes = &body[..key_capacity];
    let key_end = key_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(key_capacity);
    let key = std::str::from_utf8(&key_bytes[..key_end]).ok()?.to_string();

    let page = i64::from_le_bytes(body[key_capacity..key_capacity + 8].try_into().unwrap());
    let offset = i64::from_le_bytes(body[key_capacity + 8..key_capacity + 16].try_into().unwrap());
    let length = i64::from_le_bytes(body[key_capacity + 16..key_capacity + 24].try_into().unwrap());

    let entry = if page == TOMBSTONE && offset == TOMBSTONE && length == TOMBSTONE {
        Entry::Deleted
    } else {
        Entry::Live(PositionRecord {
            page,
            offset,
            length,
        })
    };

    Some((key, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_record_round_trip() {
        let position = PositionRecord::at(3 * PAGE_SIZE + 17, 42);
        let encoded = encode("doc-1", &Entry::Live(position), 36);
        assert_eq!(encoded.len(), record_size(36));

        let (key, entry) = decode(&encoded, 36).unwrap();
        assert_eq!(key, "doc-1");
        assert_eq!(entry, Entry::Live(position));
        assert_eq!(position.absolute(), 3 * PAGE_SIZE + 17);
        assert_eq!(position.end(), 3 * PAGE_SIZE + 17 + 42);
    }

    #[test]
    fn test_tombstone_round_trip() {
        let encoded = encode("gone", &Entry::Deleted, 36);
        let (key, entry) = decode(&encoded, 36).unwrap();
        assert_eq!(key, "gone");
        assert_eq!(entry, Entry::Deleted);
    }

    #[test]
    fn test_key_at_full_capacity() {
        let key = "k".repeat(8);
        let encoded = encode(&key, &Entry::Deleted, 8);
        let (decoded, _) = decode(&encoded, 8).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_bit_flip_fails_crc() {
        let mut encoded = encode("doc-1", &Entry::Live(PositionRecord::at(0, 5)), 36);
        encoded[3] ^= 0xFF;
        assert!(decode(&encoded, 36).is_none());
    }
}
