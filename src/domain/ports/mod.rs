//! Port trait definitions (Hexagonal Architecture)
//!
//! - LaceworkApi: vendor REST operations
//! - CursorStore: persisted poll cursor
//!
//! Services depend only on these traits; the HTTP client and the state
//! file live in `adapters`.

pub mod cursor_store;
pub mod errors;
pub mod lacework_api;

pub use cursor_store::CursorStore;
pub use errors::{ApiError, ApiResult};
pub use lacework_api::{LaceworkApi, Page};
