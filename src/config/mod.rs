//! Configuration module for entity-lists
//!
//! This module provides configuration management including:
//! - Platform path resolution
//! - Settings persistence with atomic writes
//! - Control key registration and unlocking

pub mod file_io;
pub mod paths;
pub mod settings;

pub use paths::StorePaths;
pub use settings::{ControlRecord, Settings};
