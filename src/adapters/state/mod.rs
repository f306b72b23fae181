//! Cursor store implementations.

pub mod file_cursor_store;
pub mod memory_cursor_store;

pub use file_cursor_store::{FileCursorStore, LastRun};
pub use memory_cursor_store::MemoryCursorStore;
