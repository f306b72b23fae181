//! Domain layer for the Lacework adapter
//!
//! Models, errors and the port traits the services are written against.
//! Nothing in here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AdapterError, AdapterResult};
