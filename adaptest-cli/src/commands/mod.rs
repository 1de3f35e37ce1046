//! Command implementations.

pub mod respond;
pub mod select;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use adaptest_core::{
    AdaptestConfig, AssessmentService, InMemoryCatalog, JsonFileSessionStore, SessionId,
};
use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::ConfigLoader;

/// Command-line values that take precedence over config files.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub catalog: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

/// Effective configuration with overrides applied.
pub fn effective_config(overrides: &Overrides) -> Result<AdaptestConfig> {
    let mut config = ConfigLoader::load()?;
    if let Some(catalog) = &overrides.catalog {
        config.catalog_path = Some(catalog.clone());
    }
    if let Some(store) = &overrides.store {
        config.store.data_dir = store.clone();
    }
    Ok(config)
}

/// Build the service over the JSON session store and the configured catalog.
pub async fn open_service(overrides: &Overrides) -> Result<AssessmentService> {
    let config = effective_config(overrides)?;

    let catalog = match &config.catalog_path {
        Some(path) => InMemoryCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            warn!("No catalog configured; only fixed-order selection will find tasks");
            InMemoryCatalog::new()
        }
    };

    let store = JsonFileSessionStore::open(&config.store.data_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to open session store {}",
                config.store.data_dir.display()
            )
        })?;
    debug!(store = %store.dir().display(), "Using session store");

    Ok(
        AssessmentService::new(Arc::new(store), Arc::new(catalog))
            .with_default_strategy(config.default_strategy),
    )
}

pub fn parse_session_id(s: &str) -> Result<SessionId> {
    SessionId::parse(s).with_context(|| format!("Invalid session ID: {s}"))
}

/// Print effective configuration as TOML.
pub fn show_config(overrides: Overrides) -> Result<()> {
    let config = effective_config(&overrides)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
