//! Lacework API v2 adapter.
//!
//! `client` implements the [`LaceworkApi`](crate::domain::ports::LaceworkApi)
//! port over HTTPS; `models` holds the wire payloads it exchanges.

pub mod client;
pub mod mock;
pub mod models;

pub use client::{LaceworkClient, LaceworkClientConfig};
pub use mock::MockLaceworkApi;
