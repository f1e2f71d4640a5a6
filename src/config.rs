// ⚙️ Configuration - where the store lives and where the server listens
//
// Precedence: CLI flag > environment > default

use std::env;
use std::path::PathBuf;

pub const DEFAULT_REGISTRY_DIR: &str = "registry/badge-registry";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const REGISTRY_DIR_ENV: &str = "OAC_REGISTRY_DIR";
pub const BIND_ADDR_ENV: &str = "OAC_BIND_ADDR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Root of the one-file-per-badge record store
    pub registry_dir: PathBuf,

    /// Listen address for the query server
    pub bind_addr: String,
}

impl RegistryConfig {
    /// Defaults overridden by `OAC_REGISTRY_DIR` / `OAC_BIND_ADDR`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(REGISTRY_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.registry_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup(BIND_ADDR_ENV).filter(|v| !v.trim().is_empty()) {
            config.bind_addr = addr;
        }

        config
    }

    /// Builder: explicit registry directory (e.g. from a CLI flag)
    pub fn with_registry_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.registry_dir = dir.into();
        self
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            registry_dir: PathBuf::from(DEFAULT_REGISTRY_DIR),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::from_lookup(|_| None);

        assert_eq!(config.registry_dir, PathBuf::from("registry/badge-registry"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(REGISTRY_DIR_ENV, "/srv/badges"), (BIND_ADDR_ENV, "127.0.0.1:8080")]);

        let config = RegistryConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.registry_dir, PathBuf::from("/srv/badges"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_blank_environment_ignored_and_builder_wins() {
        let config = RegistryConfig::from_lookup(|_| Some("  ".to_string()))
            .with_registry_dir("custom");

        assert_eq!(config.registry_dir, PathBuf::from("custom"));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }
}
