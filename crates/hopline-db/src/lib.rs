//! # hopline-db: Local Durable Store for Hopline
//!
//! The application state lives in memory as an [`AppStore`]; this crate is
//! where it goes between restarts. Every slice is one JSON blob in the
//! `local_store` table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hopline Data Flow                                │
//! │                                                                         │
//! │  axum handler (approve merchant)                                       │
//! │       │  store.approve_user(id)   (under the AppStore mutex)          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   hopline-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ BlobRepo       │    │ 001_local_   │  │   │
//! │  │   │ SqlitePool    │◄───│ StateRepo      │    │  store.sql   │  │   │
//! │  │   │ + namespace   │    │ TrustedDevices │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  local_store:  hopline:users = [...]   hopline:trusted:a@b.c = true    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hopline_core::store::Slice;
//! use hopline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("hopline.db")).await?;
//! let mut store = db.state().load_store().await?;
//!
//! store.approve_user("u1")?;
//! db.state().save_slice(&store, Slice::Users).await?;
//! ```
//!
//! [`AppStore`]: hopline_core::store::AppStore

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::blob::BlobRepository;
pub use repository::state::StateRepository;
pub use repository::trusted::TrustedDeviceRepository;

/// Key prefix used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "hopline";

/// Builds `<namespace>:<name>`.
pub fn namespaced_key(namespace: &str, name: &str) -> String {
    format!("{namespace}:{name}")
}
