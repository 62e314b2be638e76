//! # Database State
//!
//! Wraps the local [`Database`] and the persistence step every mutating
//! handler ends with.
//!
//! ## Write Ordering
//! ```text
//! request A ── lock_writes ─► snapshot ─► persist ─► unlock
//! request B ──────────────── waits ───────────────► snapshot ─► persist
//! ```
//!
//! A snapshot is only taken while the write lock is held, so slices reach
//! disk in the same order the store changed. `Database` itself holds a
//! `SqlitePool`, which is thread-safe.

use hopline_core::store::{AppStore, Slice};
use hopline_db::{Database, DbResult};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
    writes: Arc<Mutex<()>>,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState {
            db,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Serializes snapshot-and-persist across requests. Hold the guard from
    /// before the store is changed until `persist` returns.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    /// Writes the changed slices of `snapshot` in full.
    pub async fn persist(&self, snapshot: &AppStore, slices: &[Slice]) -> DbResult<()> {
        debug!(slices = ?slices, "Persisting store");
        self.db.state().save_slices(snapshot, slices).await
    }
}
