//! # hopline-sync: Remote Sync Client for Hopline
//!
//! Talks to the two optional remote services:
//!
//! - a hosted table service (PostgREST style) that mirrors users, products,
//!   orders and counter sales so several installs see the same merchants;
//! - a transactional email API that delivers login codes.
//!
//! Local state is always authoritative. Remote writes are fire-and-forget
//! and a failure never undoes a local change.
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Remote error types
//! - [`fields`] - camelCase ↔ snake_case key translation
//! - [`table`] - Hosted table HTTP client
//! - [`email`] - Code mailer trait and HTTP sender
//! - [`mirror`] - Background mirroring of local changes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hopline_sync::{RemoteConfig, RemoteServices};
//!
//! let config = RemoteConfig::load_or_default(None);
//! let remote = RemoteServices::connect(&config)?;
//!
//! remote.mirror.upsert_user(&user);
//! let sent = remote.mailer.send_code("shop@example.com", "4821").await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod email;
pub mod error;
pub mod fields;
pub mod mirror;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::RemoteConfig;
pub use email::{CodeMailer, DisabledMailer, TransactionalMailer};
pub use error::{SyncError, SyncResult};
pub use mirror::RemoteMirror;
pub use table::{HostedTableClient, Table};

use std::sync::Arc;
use tracing::info;

/// The remote clients the web app holds.
#[derive(Clone)]
pub struct RemoteServices {
    pub mirror: RemoteMirror,
    pub mailer: Arc<dyn CodeMailer>,
}

impl RemoteServices {
    /// Builds clients for whatever `config` enables. No request is made.
    pub fn connect(config: &RemoteConfig) -> SyncResult<Self> {
        let mirror = match &config.tables {
            Some(settings) => {
                info!(base = %settings.base_url, "Hosted tables enabled");
                RemoteMirror::new(Some(HostedTableClient::new(settings, config.timeout)?))
            }
            None => {
                info!("Hosted tables not configured, running local only");
                RemoteMirror::disabled()
            }
        };

        let mailer: Arc<dyn CodeMailer> = match &config.mail {
            Some(settings) => {
                info!(url = %settings.api_url, "Email delivery enabled");
                Arc::new(TransactionalMailer::new(settings, config.timeout)?)
            }
            None => {
                info!("Email delivery not configured");
                Arc::new(DisabledMailer)
            }
        };

        Ok(RemoteServices { mirror, mailer })
    }

    /// Everything disabled. The web app falls back to this when `connect`
    /// rejects the settings.
    pub fn local_only() -> Self {
        RemoteServices {
            mirror: RemoteMirror::disabled(),
            mailer: Arc::new(DisabledMailer),
        }
    }
}

impl std::fmt::Debug for RemoteServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteServices")
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}
