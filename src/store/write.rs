//! Write Handle
//!
//! Scoped, exclusively-held resource that appends payloads to the blob log
//! and header records to the side file. Acquired through the store's handle
//! state machine; never open at the same time as a read handle.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::header::{self, Entry, PositionRecord};

/// Appends payloads to the blob log and records to the header side file
#[derive(Debug)]
pub struct WriteHandle {
    /// Blob log, append-only
    body: BufWriter<File>,
    /// Header side file, append-only record stream
    head: BufWriter<File>,
    /// Fixed key field width for header records
    key_capacity: usize,
}

impl WriteHandle {
    /// Create a brand-new store: truncates both files and writes a fresh
    /// superblock.
    pub(crate) fn create(body_path: &Path, head_path: &Path, key_capacity: usize) -> Result<Self> {
        let body = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(body_path)?;
        let head = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(head_path)?;

        let mut head = BufWriter::new(head);
        header::write_superblock(&mut head, key_capacity)?;

        Ok(Self {
            body: BufWriter::new(body),
            head,
            key_capacity,
        })
    }

    /// Open an existing store in append mode, preserving prior offsets and
    /// index state. Writes a superblock if the side file is brand new.
    pub(crate) fn append_mode(
        body_path: &Path,
        head_path: &Path,
        key_capacity: usize,
    ) -> Result<Self> {
        let body = OpenOptions::new()
            .create(true)
            .append(true)
            .open(body_path)?;
        let head = OpenOptions::new()
            .create(true)
            .append(true)
            .open(head_path)?;

        let head_is_new = head.metadata()?.len() == 0;
        let mut head = BufWriter::new(head);
        if head_is_new {
            header::write_superblock(&mut head, key_capacity)?;
        }

        Ok(Self {
            body: BufWriter::new(body),
            head,
            key_capacity,
        })
    }

    /// Append one payload at the given end-of-log offset.
    ///
    /// Writes the payload bytes to the blob log and a matching live record
    /// to the side file, and returns the payload's position. The caller
    /// advances the end-of-log cursor and updates the in-memory index.
    pub(crate) fn append(&mut self, key: &str, payload: &[u8], start: u64) -> Result<PositionRecord> {
        let position = PositionRecord::at(start, payload.len() as u64);
        self.body.write_all(payload)?;
        self.head.write_all(&header::encode_record(
            key,
            &Entry::Live(position),
            self.key_capacity,
        ))?;
        Ok(position)
    }

    /// Append a tombstone record for the key
    pub(crate) fn write_tombstone(&mut self, key: &str) -> Result<()> {
        self.head
            .write_all(&header::encode_record(key, &Entry::Deleted, self.key_capacity))?;
        Ok(())
    }

    /// Flush buffered writes to the OS
    pub(crate) fn flush(&mut self) -> Result<()> {
        self.body.flush()?;
        self.head.flush()?;
        Ok(())
    }

    /// Flush and fsync both files — the durability point before compaction
    /// swaps files into place.
    pub(crate) fn sync(&mut self) -> Result<()> {
        self.flush()?;
        self.body.get_ref().sync_all()?;
        self.head.get_ref().sync_all()?;
        Ok(())
    }
}
