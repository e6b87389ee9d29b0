//! Configuration for spanlist
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

/// Configuration for opening a named collection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the backing files.
    /// A collection named `orders` lives at `{data_dir}/orders.bin`.
    pub data_dir: PathBuf,

    /// Extension appended to the collection name
    pub file_extension: String,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When root metadata and the size-class table are written back
    pub flush_policy: FlushPolicy,

    // -------------------------------------------------------------------------
    // Skip List Configuration
    // -------------------------------------------------------------------------
    /// Seed for tower heights. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// Metadata flush policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Write headers back once, at close (minimum guarantee)
    OnClose,

    /// Write headers back after every insert/erase/clear (smaller crash window)
    EveryWrite,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_extension: "bin".to_string(),
            flush_policy: FlushPolicy::OnClose,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the backing file for the collection `name`
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", name, self.file_extension))
    }

    /// Directory part of the configuration
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the backing file extension (without the dot)
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.file_extension = ext.into();
        self
    }

    /// Set the metadata flush policy
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.config.flush_policy = policy;
        self
    }

    /// Fix the tower height seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
