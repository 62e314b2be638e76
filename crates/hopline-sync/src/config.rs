//! # Remote Configuration
//!
//! Where the hosted tables and the email API live, and the keys for them.
//! Both services are optional; an install with neither runs fully local.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HOPLINE_TABLE_URL / HOPLINE_TABLE_KEY                              │
//! │     HOPLINE_MAIL_URL / HOPLINE_MAIL_KEY / HOPLINE_MAIL_FROM            │
//! │     HOPLINE_REMOTE_TIMEOUT_SECS                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hopline/hopline.toml (Linux)                             │
//! │     ~/Library/Application Support/np.hopline.hopline/hopline.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     nothing configured, 10 s timeout                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! timeout_secs = 10
//!
//! [tables]
//! url = "https://project.example.co"
//! key = "service-role-key"
//!
//! [mail]
//! url = "https://api.mailer.example/emails"
//! key = "mail-api-key"
//! from = "Hopline <no-reply@hopline.com.np>"
//! ```
//!
//! A section is only active when every field in it is present. Setting a
//! URL without its key is a configuration error rather than a silent
//! fallback to local mode.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Remote HTTP timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// File Shape
// =============================================================================

/// Raw, unvalidated settings as they appear in the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub timeout_secs: Option<u64>,
    pub tables: RawTables,
    pub mail: RawMail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawTables {
    pub url: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawMail {
    pub url: Option<String>,
    pub key: Option<String>,
    pub from: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FileConfig {
    /// Applies `HOPLINE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("HOPLINE_TABLE_URL") {
            debug!(url = %url, "Overriding hosted table URL from environment");
            self.tables.url = Some(url);
        }
        if let Some(key) = lookup("HOPLINE_TABLE_KEY") {
            self.tables.key = Some(key);
        }
        if let Some(url) = lookup("HOPLINE_MAIL_URL") {
            debug!(url = %url, "Overriding mail API URL from environment");
            self.mail.url = Some(url);
        }
        if let Some(key) = lookup("HOPLINE_MAIL_KEY") {
            self.mail.key = Some(key);
        }
        if let Some(from) = lookup("HOPLINE_MAIL_FROM") {
            self.mail.from = Some(from);
        }
        if let Some(timeout) = lookup("HOPLINE_REMOTE_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => warn!(value = %timeout, "Ignoring unparsable HOPLINE_REMOTE_TIMEOUT_SECS"),
            }
        }
    }

    /// Checks the raw settings and builds the typed configuration.
    pub fn resolve(self) -> SyncResult<RemoteConfig> {
        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        let tables = match (non_blank(self.tables.url), non_blank(self.tables.key)) {
            (None, None) => None,
            (Some(url), Some(key)) => Some(TableSettings {
                base_url: parse_http_url(&url, true)?,
                api_key: SecretString::from(key),
            }),
            _ => {
                return Err(SyncError::InvalidConfig(
                    "hosted tables need both url and key".into(),
                ))
            }
        };

        let mail = match (
            non_blank(self.mail.url),
            non_blank(self.mail.key),
            non_blank(self.mail.from),
        ) {
            (None, None, None) => None,
            (Some(url), Some(key), Some(from)) => Some(MailSettings {
                api_url: parse_http_url(&url, false)?,
                api_key: SecretString::from(key),
                from,
            }),
            _ => {
                return Err(SyncError::InvalidConfig(
                    "mail needs url, key and from".into(),
                ))
            }
        };

        Ok(RemoteConfig {
            tables,
            mail,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parses an http(s) URL. With `as_base`, a trailing slash is added so
/// relative joins keep the full path.
fn parse_http_url(raw: &str, as_base: bool) -> SyncResult<Url> {
    let raw = if as_base && !raw.ends_with('/') {
        format!("{raw}/")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::InvalidUrl(format!(
            "URL must start with http:// or https://, got scheme {other}"
        ))),
    }
}

// =============================================================================
// Typed Configuration
// =============================================================================

/// Hosted table service endpoint.
#[derive(Debug, Clone)]
pub struct TableSettings {
    /// Project base URL, always ending in `/`.
    pub base_url: Url,
    pub api_key: SecretString,
}

/// Transactional email endpoint.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_url: Url,
    pub api_key: SecretString,
    /// Sender, e.g. `Hopline <no-reply@hopline.com.np>`.
    pub from: String,
}

/// Validated remote configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub tables: Option<TableSettings>,
    pub mail: Option<MailSettings>,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            tables: None,
            mail: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RemoteConfig {
    /// Loads defaults, then the TOML file, then environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut file = FileConfig::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading remote config from file");
                file = Self::read_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        file.apply_overrides(|name| std::env::var(name).ok());

        let config = file.resolve()?;
        info!(
            tables = config.tables.is_some(),
            mail = config.mail.is_some(),
            timeout_secs = config.timeout.as_secs(),
            "Remote configuration loaded"
        );
        Ok(config)
    }

    /// Loads config or falls back to fully local mode.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load remote config, running local only");
            Self::default()
        })
    }

    fn read_file(path: &Path) -> SyncResult<FileConfig> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("np", "hopline", "hopline")
            .map(|dirs| dirs.config_dir().join("hopline.toml"))
    }

    pub fn has_tables(&self) -> bool {
        self.tables.is_some()
    }

    pub fn has_mail(&self) -> bool {
        self.mail.is_some()
    }
}
