//! Configuration from `.vouch/config.toml`.
//!
//! ```toml
//! [user]
//! name = "Jane Doe"
//! email = "jane@example.com"
//!
//! [review]
//! scope = "0.0.2"
//! primary = "Signed-off-by"
//!
//! [remote.alice]
//! allow = ["refs/vouch", "alice@example.com"]
//! ```
//!
//! `VOUCH_USER_NAME` and `VOUCH_USER_EMAIL` override the `[user]` table.
//! The loaded value is handed to [`Session::open`](crate::Session::open);
//! nothing reads configuration after that.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use vouch_repo::Repository;
use vouch_types::{Identity, KeyPath, Operation};

use crate::error::ConfigError;

pub const ENV_USER_NAME: &str = "VOUCH_USER_NAME";
pub const ENV_USER_EMAIL: &str = "VOUCH_USER_EMAIL";

pub const DEFAULT_SCOPE: &str = "0.0.2";

/// Written by `vouch init`.
pub const TEMPLATE: &str = r#"# vouch configuration

[user]
# name = "Jane Doe"
# email = "jane@example.com"

[review]
scope = "0.0.2"
primary = "Signed-off-by"

# [remote.alice]
# allow = ["refs/vouch"]
"#;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user: UserConfig,
    pub review: ReviewConfig,
    /// Raw `[remote.<name>]` tables; validated by
    /// [`load_auth_rules`](crate::peers::load_auth_rules).
    pub remote: BTreeMap<String, toml::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Path prefix every local and peer key lives under.
    pub scope: String,
    /// Operation `log` reports on.
    pub primary: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            primary: Operation::SignedOff.as_str().to_string(),
        }
    }
}

impl Config {
    /// Parse TOML text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the config of `repo`, or the defaults for an in-memory one.
    pub fn for_repository(repo: &Repository) -> Result<Self, ConfigError> {
        match repo.config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Apply identity overrides from a variable lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup(ENV_USER_NAME) {
            self.user.name = Some(name);
        }
        if let Some(email) = lookup(ENV_USER_EMAIL) {
            self.user.email = Some(email);
        }
        self
    }

    /// Apply identity overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }

    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.user.name = Some(name.into());
        self.user.email = Some(email.into());
        self
    }

    /// The acting identity. Missing or blank parts are fatal.
    pub fn identity(&self) -> Result<Identity, ConfigError> {
        let present = |part: &Option<String>| {
            part.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (present(&self.user.name), present(&self.user.email)) {
            (Some(name), Some(email)) => {
                Identity::new(name, email).map_err(ConfigError::InvalidIdentity)
            }
            _ => Err(ConfigError::MissingIdentity),
        }
    }

    pub fn scope(&self) -> Result<KeyPath, ConfigError> {
        KeyPath::parse(&self.review.scope).map_err(|source| ConfigError::InvalidScope {
            scope: self.review.scope.clone(),
            source,
        })
    }

    pub fn primary(&self) -> Operation {
        Operation::parse(&self.review.primary)
    }
}
