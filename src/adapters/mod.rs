//! Infrastructure adapters for external systems.

pub mod lacework;
pub mod state;
