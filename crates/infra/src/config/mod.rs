//! Configuration loading and management
//!
//! This module provides utilities for loading sessionward configuration
//! from environment variables and files.

pub mod loader;

// Re-export commonly used items
pub use loader::{discover_config_path, load, load_from_env, load_from_file, parse_config};
