//! # Sessionward Domain
//!
//! Domain types shared by every sessionward crate.
//!
//! This crate contains:
//! - Identity and principal types used to key the token store
//! - Session state and its transition records
//! - Configuration structures
//! - Error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other sessionward crates
//! - No async, no I/O
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
