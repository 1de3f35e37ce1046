//! Engine configuration.
//!
//! Covers how sessions are created and where they are stored. The IRT step
//! size and the CPT and posterior defaults are constants, not settings.
//! Files are read and layered by the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::selector::SelectionStrategy;

/// Top-level configuration for adaptest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptestConfig {
    /// Strategy for sessions created without an explicit one.
    pub default_strategy: SelectionStrategy,
    /// JSON catalog of tasks, task models, questions and evidence models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Session store settings.
    pub store: StoreConfig,
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            default_strategy: SelectionStrategy::Fixed,
            catalog_path: None,
            store: StoreConfig::default(),
        }
    }
}

/// Where the JSON session store keeps its documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: adaptest_paths::sessions_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdaptestConfig::default();
        assert_eq!(config.default_strategy, SelectionStrategy::Fixed);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.store.data_dir, adaptest_paths::sessions_dir());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = toml::from_str::<AdaptestConfig>(r#"default_strategy = "IRT""#).unwrap();
        assert_eq!(config.default_strategy, SelectionStrategy::Irt);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let config = toml::from_str::<AdaptestConfig>(
            r#"
            default_strategy = "BayesianNetwork"
            catalog_path = "/srv/catalog.json"

            [store]
            data_dir = "/srv/sessions"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_strategy, SelectionStrategy::BayesianNetwork);
        assert_eq!(config.catalog_path, Some(PathBuf::from("/srv/catalog.json")));
        assert_eq!(config.store.data_dir, PathBuf::from("/srv/sessions"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AdaptestConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: AdaptestConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        assert!(toml::from_str::<AdaptestConfig>(r#"default_strategy = "random""#).is_err());
    }
}
