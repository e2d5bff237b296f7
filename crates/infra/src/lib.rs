//! # Sessionward Infrastructure
//!
//! The impure side of the token lifecycle.
//!
//! This crate contains:
//! - The reqwest-based authenticated dispatcher
//! - Configuration loading (environment, TOML/JSON files)
//! - Tracing subscriber setup
//! - `SessionwardContext`, which wires one token store per process
//!
//! ## Architecture
//! - Builds on `sessionward-core` and `sessionward-common`
//! - Contains all I/O: outbound HTTP, files, environment

pub mod config;
pub mod context;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use context::{AuthenticationStatus, SessionwardContext};
pub use errors::DispatchError;
pub use http::{AuthenticatedDispatcher, HttpClient, HttpClientBuilder, PreparedBearer};
pub use observability::init_tracing;
