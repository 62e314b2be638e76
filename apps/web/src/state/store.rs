//! # Store State
//!
//! The in-memory [`AppStore`] behind one mutex.
//!
//! ## Lock Discipline
//! ```text
//! handler
//!   │  with_store_mut(|s| s.approve_user(id))   lock ─► mutate ─► clone ─► unlock
//!   │
//!   │  db.state().save_slices(&snapshot, ..)    no lock held across .await
//!   ▼
//! ```
//!
//! A `std::sync::Mutex` guard is never held across an `.await`. A poisoned
//! lock is recovered: the store is plain data and every command leaves it
//! consistent before returning.

use hopline_core::store::AppStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe store wrapper.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    store: Arc<Mutex<AppStore>>,
}

impl StoreState {
    pub fn new(store: AppStore) -> Self {
        StoreState {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the store.
    pub fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppStore) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the store.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let user = store_state.with_store_mut(|s| s.approve_user(&id))?;
    /// ```
    pub fn with_store_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AppStore) -> R,
    {
        f(&mut self.lock())
    }

    /// Runs `f` and returns its result with a copy of the store taken
    /// under the same lock, ready to be persisted.
    pub fn mutate<F, R>(&self, f: F) -> (R, AppStore)
    where
        F: FnOnce(&mut AppStore) -> R,
    {
        let mut store = self.lock();
        let result = f(&mut store);
        (result, store.clone())
    }
}
