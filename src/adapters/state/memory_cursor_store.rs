//! In-memory poll cursor, for tests and dry runs.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::errors::AdapterResult;
use crate::domain::ports::CursorStore;

/// Keeps the cursor in an atomic and counts writes.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: AtomicU64,
    saves: AtomicUsize,
}

impl MemoryCursorStore {
    pub fn new(initial: u64) -> Self {
        Self {
            cursor: AtomicU64::new(initial),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Number of times [`CursorStore::save`] was called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> AdapterResult<u64> {
        Ok(self.current())
    }

    async fn save(&self, cursor: u64) -> AdapterResult<()> {
        self.cursor.store(cursor, Ordering::SeqCst);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
