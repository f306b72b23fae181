//! Infrastructure layer module
//!
//! Configuration loading and logging setup. The Lacework HTTP client and
//! cursor stores live in `adapters`.

pub mod config;
pub mod logging;
