//! Outbound HTTP

pub mod client;
pub mod dispatcher;

pub use client::{HttpClient, HttpClientBuilder};
pub use dispatcher::{AuthenticatedDispatcher, PreparedBearer};
