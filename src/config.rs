//! Configuration for FlatKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default maximum key length in bytes
pub const DEFAULT_KEY_LENGTH: usize = 36;

/// Main configuration for a FlatKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Workspace directory for all data files.
    /// Internal structure:
    ///   {workspace}/
    ///     ├── {index_filename}        (blob log, append-only)
    ///     └── {index_filename}.head   (header index side file)
    pub workspace: PathBuf,

    /// Name of the blob log file inside the workspace
    pub index_filename: String,

    // -------------------------------------------------------------------------
    // Key Configuration
    // -------------------------------------------------------------------------
    /// Maximum key length in bytes. Keys longer than this fail validation;
    /// the persisted header capacity starts here and may only widen.
    pub key_length: usize,

    // -------------------------------------------------------------------------
    // Dump Configuration
    // -------------------------------------------------------------------------
    /// Dump the final state to `dump_path` when the store is closed
    pub dump_on_close: bool,

    /// Destination for dump-on-close; defaults to `{workspace}/default_dump`
    pub dump_path: Option<PathBuf>,

    /// Number of shards for dump-on-close
    pub dump_shards: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("./flatkv_data"),
            index_filename: "index".to_string(),
            key_length: DEFAULT_KEY_LENGTH,
            dump_on_close: false,
            dump_path: None,
            dump_shards: 1,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Absolute path of the blob log
    pub fn index_path(&self) -> PathBuf {
        self.workspace.join(&self.index_filename)
    }

    /// Dump destination, falling back to `{workspace}/default_dump`
    pub fn effective_dump_path(&self) -> PathBuf {
        self.dump_path
            .clone()
            .unwrap_or_else(|| self.workspace.join("default_dump"))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the workspace directory (root for all storage)
    pub fn workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.workspace = path.into();
        self
    }

    /// Set the blob log filename
    pub fn index_filename(mut self, name: impl Into<String>) -> Self {
        self.config.index_filename = name.into();
        self
    }

    /// Set the maximum key length (in bytes)
    pub fn key_length(mut self, len: usize) -> Self {
        self.config.key_length = len;
        self
    }

    /// Enable or disable dump-on-close
    pub fn dump_on_close(mut self, enabled: bool) -> Self {
        self.config.dump_on_close = enabled;
        self
    }

    /// Set the dump destination path
    pub fn dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dump_path = Some(path.into());
        self
    }

    /// Set the number of shards for dump-on-close
    pub fn dump_shards(mut self, shards: usize) -> Self {
        self.config.dump_shards = shards;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
