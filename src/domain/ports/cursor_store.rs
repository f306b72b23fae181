use async_trait::async_trait;

use crate::domain::errors::AdapterResult;

/// Persistence for the incident poller's high-water mark.
///
/// The host owns the storage between invocations; the adapter only reads
/// the value at the start of a poll and writes it back once the poll has
/// fully succeeded.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Current cursor, or 0 if nothing was stored yet.
    async fn load(&self) -> AdapterResult<u64>;

    /// Replace the stored cursor.
    async fn save(&self, cursor: u64) -> AdapterResult<()>;
}
