//! # FlatKV
//!
//! An embedded, single-process flat-file key/blob store for vector and
//! document records, with:
//! - Append-only blob log, framing held entirely in a persisted header index
//! - Windowed memory-mapped reads (short-lived, read-only views)
//! - Tombstone deletes and update-by-rewrite
//! - Compaction on close, reclaiming tombstoned and overwritten bytes
//! - Streaming shard-partitioned dump for distributed reload
//!
//! ## Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │            Store              │
//!                 │  (handle state machine:       │
//!                 │   Closed / WriteOpen /        │
//!                 │   ReadOpen — mutually         │
//!                 │   exclusive by construction)  │
//!                 └──────────────┬────────────────┘
//!                                │
//!                 ┌──────────────┴────────────────┐
//!                 │                               │
//!                 ▼                               ▼
//!          ┌─────────────┐                ┌─────────────┐
//!          │ WriteHandle │                │ ReadHandle  │
//!          │  (append)   │                │ (mmap view) │
//!          └──────┬──────┘                └──────┬──────┘
//!                 │                               │
//!          ┌──────▼───────────────────────────────▼──────┐
//!          │   Blob Log  ({name})  +  Header Index       │
//!          │             ({name}.head)                   │
//!          └──────────────────┬──────────────────────────┘
//!                             │ close()
//!                             ▼
//!                  ┌────────────────────┐     ┌───────────────┐
//!                  │     Compactor      │ ──► │ Shard Exporter│
//!                  └────────────────────┘     └───────────────┘
//! ```
//!
//! ## Ownership Precondition
//!
//! The engine performs no cross-process file locking: exactly one process
//! may have a workspace open at a time. Opening the same workspace from a
//! second process is undefined behavior.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod header;
pub mod record;
pub mod store;
pub mod dump;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatError, Result};
pub use config::Config;
pub use header::{Entry, HeaderIndex, PositionRecord, PAGE_SIZE};
pub use record::DocRecord;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
