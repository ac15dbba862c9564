//! Path management for entity-lists
//!
//! ## Path Resolution Order
//!
//! 1. `ENTITY_LISTS_DIR` environment variable (if set)
//! 2. The platform configuration directory for `entity-lists`, as reported
//!    by the `directories` crate

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{ListError, ListResult};

/// Environment variable overriding the base directory
pub const DIR_ENV_VAR: &str = "ENTITY_LISTS_DIR";

/// Locations of the files the crate persists
#[derive(Debug, Clone)]
pub struct StorePaths {
    base_dir: PathBuf,
}

impl StorePaths {
    /// Resolve the base directory from the environment or the platform
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> ListResult<Self> {
        let base_dir = match std::env::var_os(DIR_ENV_VAR) {
            Some(custom) => PathBuf::from(custom),
            None => ProjectDirs::from("", "", "entity-lists")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    ListError::Config("Could not determine a configuration directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Use a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.jsonl")
    }

    /// Create the base directory if needed
    pub fn ensure_directories(&self) -> ListResult<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ListError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Whether settings have been saved here before
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
