//! Dump Module
//!
//! Streaming, shard-partitioned export of the live key set, and the reader
//! that loads one shard back for distributed reload.
//!
//! ## Dump Layout
//! ```text
//! {destination}/
//!   ├── 0/
//!   │   ├── ids       (newline-delimited UTF-8 ids)
//!   │   ├── vectors   ([Len: u32 BE][raw f32 LE bytes] per entry)
//!   │   └── metas     ([Len: u32 BE][metadata bytes] per entry)
//!   ├── 1/
//!   │   └── ...
//!   └── {shard_count - 1}/
//! ```
//!
//! Partitioning is purely positional over iteration order: shard `i` gets
//! entries `[i * floor(n/s), (i+1) * floor(n/s))` and the last shard also
//! absorbs the remainder. There is no hashing and no stable assignment —
//! re-exporting after new inserts moves entries between shards.

mod export;
mod import;

pub use export::export;
pub use import::{import_ids_vectors, import_metas};

/// Entry counts per shard: `floor(n/s)` each, remainder on the last shard
pub(crate) fn shard_sizes(total: usize, shard_count: usize) -> Vec<usize> {
    let base = total / shard_count;
    let mut sizes = vec![base; shard_count];
    sizes[shard_count - 1] += total % shard_count;
    sizes
}

#[cfg(test)]
mod tests {
    use super::shard_sizes;

    #[test]
    fn test_even_split() {
        assert_eq!(shard_sizes(10, 2), vec![5, 5]);
    }

    #[test]
    fn test_remainder_goes_to_last_shard() {
        assert_eq!(shard_sizes(10, 3), vec![3, 3, 4]);
        assert_eq!(shard_sizes(2, 3), vec![0, 0, 2]);
    }

    #[test]
    fn test_single_shard_takes_everything() {
        assert_eq!(shard_sizes(7, 1), vec![7]);
    }

    #[test]
    fn test_empty_store() {
        assert_eq!(shard_sizes(0, 4), vec![0, 0, 0, 0]);
    }
}
