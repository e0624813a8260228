//! Read Handle
//!
//! Resolves position records to payload bytes through short-lived, read-only
//! memory-map windows over the blob log. Each access maps the smallest
//! page-aligned window covering the payload, copies the bytes out, and
//! drops the map before returning — no mapping outlives a call, so a
//! compaction swapping files underneath can never leave a dangling view.

use std::fs::File;
use std::path::Path;

use memmap2::MmapOptions;

use crate::error::{FlatError, Result};
use crate::header::{PositionRecord, PAGE_SIZE};

/// Resolves keys to payload bytes via windowed memory mapping
#[derive(Debug)]
pub struct ReadHandle {
    /// Blob log file
    body: File,
    /// Blob log length at open time; reads past it are rejected
    body_len: u64,
}

impl ReadHandle {
    /// Open the blob log for reading
    pub(crate) fn open(body_path: &Path) -> Result<Self> {
        let body = File::open(body_path)?;
        let body_len = body.metadata()?.len();
        Ok(Self { body, body_len })
    }

    /// Copy one payload out of the blob log.
    ///
    /// Maps the window `[page * PAGE_SIZE, page * PAGE_SIZE + offset + length)`
    /// read-only and returns the `[offset, offset + length)` slice of it.
    pub(crate) fn read(&self, position: &PositionRecord) -> Result<Vec<u8>> {
        if position.length == 0 {
            return Ok(Vec::new());
        }

        if position.end() > self.body_len {
            return Err(FlatError::Storage(format!(
                "position {}..{} is past the blob log length {}",
                position.absolute(),
                position.end(),
                self.body_len
            )));
        }

        let map_offset = position.page as u64 * PAGE_SIZE;
        let window_len = (position.offset + position.length) as usize;

        // SAFETY: the blob log is owned exclusively by this process and only
        // ever appended to, and the window was bounds-checked against the
        // length recorded at open time. The map is read-only and dropped
        // before this function returns.
        let window = unsafe {
            MmapOptions::new()
                .offset(map_offset)
                .len(window_len)
                .map(&self.body)?
        };

        let lo = position.offset as usize;
        let hi = lo + position.length as usize;
        Ok(window[lo..hi].to_vec())
    }

    /// Blob log length observed when this handle was opened
    pub(crate) fn len(&self) -> u64 {
        self.body_len
    }
}
