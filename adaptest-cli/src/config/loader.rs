use adaptest_core::{AdaptestConfig, SelectionStrategy, StoreConfig};
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration as stored in TOML files (optional fields for merging)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAdaptestConfig {
    pub default_strategy: Option<SelectionStrategy>,
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub store: RawStoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStoreConfig {
    pub data_dir: Option<PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<AdaptestConfig> {
        let mut raw = RawAdaptestConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Load a single file with defaults applied
    pub fn load_from_path(path: &Path) -> Result<AdaptestConfig> {
        Ok(Self::finalize(Self::read_raw(path)?))
    }

    pub fn user_config_path() -> PathBuf {
        adaptest_paths::config_file()
    }

    /// Get project config path
    /// Can be overridden with ADAPTEST_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("ADAPTEST_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".adaptest/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawAdaptestConfig> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overlay values override base only if explicitly set
    fn merge_raw(base: RawAdaptestConfig, overlay: RawAdaptestConfig) -> RawAdaptestConfig {
        RawAdaptestConfig {
            default_strategy: overlay.default_strategy.or(base.default_strategy),
            catalog_path: overlay.catalog_path.or(base.catalog_path),
            store: RawStoreConfig {
                data_dir: overlay.store.data_dir.or(base.store.data_dir),
            },
        }
    }

    fn finalize(raw: RawAdaptestConfig) -> AdaptestConfig {
        AdaptestConfig {
            default_strategy: raw.default_strategy.unwrap_or_default(),
            catalog_path: raw.catalog_path,
            store: StoreConfig {
                data_dir: raw
                    .store
                    .data_dir
                    .unwrap_or_else(adaptest_paths::sessions_dir),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn raw(toml: &str) -> RawAdaptestConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_overlay_wins_when_set() {
        let base = raw(
            r#"
            default_strategy = "IRT"
            catalog_path = "/user/catalog.json"
            [store]
            data_dir = "/user/sessions"
            "#,
        );
        let overlay = raw(r#"catalog_path = "project.json""#);

        let merged = ConfigLoader::merge_raw(base, overlay);
        assert_eq!(merged.default_strategy, Some(SelectionStrategy::Irt));
        assert_eq!(merged.catalog_path, Some(PathBuf::from("project.json")));
        assert_eq!(merged.store.data_dir, Some(PathBuf::from("/user/sessions")));
    }

    #[test]
    fn test_finalize_applies_defaults() {
        let config = ConfigLoader::finalize(RawAdaptestConfig::default());
        assert_eq!(config.default_strategy, SelectionStrategy::Fixed);
        assert!(config.catalog_path.is_none());
        assert!(config.store.data_dir.ends_with("adaptest/sessions"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_strategy = \"BayesianNetwork\"\n").unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.default_strategy, SelectionStrategy::BayesianNetwork);
    }

    #[test]
    fn test_load_from_path_rejects_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_strategy = [").unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_project_config_dir_override() {
        unsafe {
            std::env::set_var("ADAPTEST_PROJECT_CONFIG_DIR", "/tmp/adaptest-project");
        }
        let path = ConfigLoader::project_config_path();
        unsafe {
            std::env::remove_var("ADAPTEST_PROJECT_CONFIG_DIR");
        }
        assert_eq!(path, PathBuf::from("/tmp/adaptest-project/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_layers_project_over_user() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::create_dir_all(user.path().join("adaptest")).unwrap();
        std::fs::write(
            user.path().join("adaptest/config.toml"),
            "default_strategy = \"IRT\"\ncatalog_path = \"user.json\"\n",
        )
        .unwrap();
        std::fs::write(
            project.path().join("config.toml"),
            "catalog_path = \"project.json\"\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", user.path());
            std::env::set_var("ADAPTEST_PROJECT_CONFIG_DIR", project.path());
        }
        let config = ConfigLoader::load();
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
            std::env::remove_var("ADAPTEST_PROJECT_CONFIG_DIR");
        }

        let config = config.unwrap();
        assert_eq!(config.default_strategy, SelectionStrategy::Irt);
        assert_eq!(config.catalog_path, Some(PathBuf::from("project.json")));
    }
}
