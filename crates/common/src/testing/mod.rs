//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of the platform seams
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! sessionward-common = { workspace = true, features = ["test-utils"] }
//! ```

pub mod mocks;

pub use mocks::MockOAuthClient;
