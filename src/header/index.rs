//! In-memory header index with stable first-insertion order.

use std::collections::HashMap;

use super::{Entry, PositionRecord};

/// Mapping from key to its entry in the blob log.
///
/// Keys are never removed once seen: deletes flip the entry to
/// [`Entry::Deleted`] and compaction rebuilds the whole index. Iteration
/// follows first-insertion order, tombstoned keys included — callers that
/// want only live entries filter on the entry themselves.
#[derive(Debug, Default)]
pub struct HeaderIndex {
    entries: HashMap<String, Entry>,
    /// First-insertion order of every key ever seen
    order: Vec<String>,
}

impl HeaderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key.
    ///
    /// `None` means the key was never inserted; `Some(Entry::Deleted)` means
    /// it was inserted and later tombstoned.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Idempotent upsert: overwrites any prior record for the key
    pub fn put(&mut self, key: &str, position: PositionRecord) {
        self.insert(key, Entry::Live(position));
    }

    /// Replace the key's record with the tombstone.
    ///
    /// Returns `true` if a live entry was tombstoned, `false` if the key is
    /// absent or already deleted (a silent no-op for callers).
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry @ Entry::Live(_)) => {
                *entry = Entry::Deleted;
                true
            }
            _ => false,
        }
    }

    /// Replay a persisted record during load (last-write-wins)
    pub(crate) fn replay(&mut self, key: String, entry: Entry) {
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key, entry);
    }

    /// All keys ever inserted, in first-insertion order, tombstones included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|k| k.as_str())
    }

    /// Keys with their entries, in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.order.iter().map(|k| (k.as_str(), &self.entries[k]))
    }

    /// Number of keys ever inserted (tombstones included)
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Number of live (non-tombstoned) keys
    pub fn live_len(&self) -> usize {
        self.entries.values().filter(|e| e.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Longest key ever inserted, in bytes
    pub fn max_key_len(&self) -> usize {
        self.order.iter().map(|k| k.len()).max().unwrap_or(0)
    }

    fn insert(&mut self, key: &str, entry: Entry) {
        if !self.entries.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.entries.insert(key.to_string(), entry);
    }
}
