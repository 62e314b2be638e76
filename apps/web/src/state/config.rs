//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`HOPLINE_*`)
//! 2. Defaults (this file)
//!
//! Remote credentials are loaded separately by
//! [`hopline_sync::RemoteConfig`], which also reads `hopline.toml`.
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use directories::ProjectDirs;
use hopline_core::identity::AdminAllowList;
use hopline_core::invoice::IssuerProfile;
use hopline_db::DEFAULT_NAMESPACE;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

/// Listen address when `HOPLINE_BIND` is unset.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct ConfigState {
    /// Address the server listens on.
    pub bind: SocketAddr,

    /// SQLite file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Key prefix for persisted blobs.
    pub namespace: String,

    /// Emails that sign in as administrators.
    pub admins: AdminAllowList,

    /// Printed on every invoice.
    pub issuer: IssuerProfile,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            admins: AdminAllowList::defaults(),
            issuer: IssuerProfile::default(),
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `HOPLINE_BIND`: listen address (default `127.0.0.1:8080`)
    /// - `HOPLINE_DB_PATH`: SQLite file path
    /// - `HOPLINE_NAMESPACE`: storage key prefix
    /// - `HOPLINE_ADMIN_EMAILS`: comma separated allow-list
    /// - `HOPLINE_ISSUER_NAME` / `_ADDRESS` / `_PHONE`: invoice header
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigState::from_env`] with an injected lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = ConfigState::default();

        if let Some(bind) = get("HOPLINE_BIND") {
            match bind.trim().parse() {
                Ok(addr) => config.bind = addr,
                Err(_) => warn!(value = %bind, default = DEFAULT_BIND, "Ignoring invalid HOPLINE_BIND"),
            }
        }

        if let Some(path) = get("HOPLINE_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(namespace) = get("HOPLINE_NAMESPACE") {
            config.namespace = namespace.trim().to_string();
        }

        if let Some(emails) = get("HOPLINE_ADMIN_EMAILS") {
            let admins = AdminAllowList::new(emails.split(',').filter(|e| !e.trim().is_empty()));
            if admins.emails().is_empty() {
                warn!("HOPLINE_ADMIN_EMAILS has no addresses, keeping the default roster");
            } else {
                config.admins = admins;
            }
        }

        if let Some(name) = get("HOPLINE_ISSUER_NAME") {
            config.issuer.name = name;
        }
        if let Some(address) = get("HOPLINE_ISSUER_ADDRESS") {
            config.issuer.address = address;
        }
        if let Some(phone) = get("HOPLINE_ISSUER_PHONE") {
            config.issuer.phone = phone;
        }

        config
    }

    /// The configured database file, or `hopline.db` in the platform data
    /// directory (created if missing).
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/np.hopline.hopline/hopline.db`
    /// - **Windows**: `%APPDATA%\hopline\hopline\data\hopline.db`
    /// - **Linux**: `~/.local/share/hopline/hopline.db`
    pub fn resolve_database_path(&self) -> std::io::Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("np", "hopline", "hopline").ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine app data directory",
            )
        })?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("hopline.db"))
    }

    /// Returns true if `email` signs in as an administrator.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admins.contains(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> ConfigState {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigState::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.namespace, "hopline");
        assert!(config.database_path.is_none());
        assert_eq!(config.admins, AdminAllowList::defaults());
        assert_eq!(config.issuer, IssuerProfile::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOPLINE_BIND", "0.0.0.0:9000"),
            ("HOPLINE_DB_PATH", "/tmp/hopline-test.db"),
            ("HOPLINE_NAMESPACE", " branch2 "),
            ("HOPLINE_ADMIN_EMAILS", " Boss@Example.com ,,ops@example.com"),
            ("HOPLINE_ISSUER_NAME", "Pokhara Beverages"),
        ]);

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/hopline-test.db")));
        assert_eq!(config.namespace, "branch2");
        assert!(config.is_admin_email("boss@example.com"));
        assert!(config.is_admin_email("ops@example.com"));
        assert!(!config.is_admin_email("admin@hopline.com.np"));
        assert_eq!(config.issuer.name, "Pokhara Beverages");
        assert_eq!(config.issuer.address, IssuerProfile::default().address);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = load(&[("HOPLINE_BIND", "not an address"), ("HOPLINE_ADMIN_EMAILS", " , ")]);
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.admins, AdminAllowList::defaults());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = load(&[("HOPLINE_DB_PATH", "/tmp/x.db")]);
        assert_eq!(config.resolve_database_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }
}
