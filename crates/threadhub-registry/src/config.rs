//! Registry configuration loaded from environment variables.
//!
//! All settings have defaults so the registry can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use threadhub_shared::constants::{
    DEFAULT_MAX_IDLE_CONNS, ENV_DB_PATH, ENV_DEFAULT_SCOPE, ENV_MAX_IDLE_CONNS, ENV_OP_TIMEOUT_MS,
};
use threadhub_store::{Database, ScopePolicy};

use crate::error::{RegistryError, Result};

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// SQLite database file.
    /// Env: `THREADHUB_DB_PATH`
    /// Default: platform data directory (see [`Database::default_path`]).
    pub db_path: Option<PathBuf>,

    /// Naming scope for records created without an API key.  Fixed for the
    /// lifetime of a database file.
    /// Env: `THREADHUB_DEFAULT_SCOPE` (`shared` / `per-owner`)
    /// Default: `shared`
    pub scope_policy: ScopePolicy,

    /// Deadline applied to calls whose context carries none.
    /// Env: `THREADHUB_OP_TIMEOUT_MS`
    /// Default: none.
    pub op_timeout: Option<Duration>,

    /// Idle store connections kept open between calls.
    /// Env: `THREADHUB_MAX_IDLE_CONNS`
    /// Default: `4`
    pub max_idle_connections: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            scope_policy: ScopePolicy::default(),
            op_timeout: None,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNS,
        }
    }
}

impl RegistryConfig {
    /// Configuration for a database at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(val) = lookup(ENV_DEFAULT_SCOPE) {
            match val.parse::<ScopePolicy>() {
                Ok(policy) => config.scope_policy = policy,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid {}, using default", ENV_DEFAULT_SCOPE);
                }
            }
        }

        if let Some(val) = lookup(ENV_OP_TIMEOUT_MS) {
            match val.parse::<u64>() {
                Ok(0) => config.op_timeout = None,
                Ok(ms) => config.op_timeout = Some(Duration::from_millis(ms)),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid {}, using default", ENV_OP_TIMEOUT_MS);
                }
            }
        }

        if let Some(val) = lookup(ENV_MAX_IDLE_CONNS) {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_idle_connections = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid {}, using default", ENV_MAX_IDLE_CONNS);
                }
            }
        }

        config
    }

    /// The database path to open, resolving the platform default.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Database::default_path()
                .map_err(|e| RegistryError::StoreUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> RegistryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RegistryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert!(config.db_path.is_none());
        assert_eq!(config.scope_policy, ScopePolicy::Shared);
        assert!(config.op_timeout.is_none());
        assert_eq!(config.max_idle_connections, DEFAULT_MAX_IDLE_CONNS);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            (ENV_DB_PATH, "/tmp/registry.db"),
            (ENV_DEFAULT_SCOPE, "per-owner"),
            (ENV_OP_TIMEOUT_MS, "250"),
            (ENV_MAX_IDLE_CONNS, "8"),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/registry.db")));
        assert_eq!(config.scope_policy, ScopePolicy::PerOwner);
        assert_eq!(config.op_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.max_idle_connections, 8);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            (ENV_DEFAULT_SCOPE, "galactic"),
            (ENV_OP_TIMEOUT_MS, "soon"),
            (ENV_MAX_IDLE_CONNS, "0"),
        ]);
        assert_eq!(config.scope_policy, ScopePolicy::Shared);
        assert!(config.op_timeout.is_none());
        assert_eq!(config.max_idle_connections, DEFAULT_MAX_IDLE_CONNS);
    }

    #[test]
    fn test_explicit_path() {
        let config = RegistryConfig::at("/var/lib/threadhub.db");
        assert_eq!(
            config.resolve_db_path().unwrap(),
            PathBuf::from("/var/lib/threadhub.db")
        );
    }
}
