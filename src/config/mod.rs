mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

pub const CONFIG_PATH_VAR: &str = "VOXEL_RELAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "voxel-relay.yaml";

/// Loads the configuration named by `VOXEL_RELAY_CONFIG`, falling back to
/// `voxel-relay.yaml`. Only the implicit default file may be absent.
pub async fn load() -> Result<Config> {
    match env::var(CONFIG_PATH_VAR) {
        Ok(path) => load_from(&path).await,
        Err(_) => {
            if Path::new(DEFAULT_CONFIG_PATH).exists() {
                load_from(DEFAULT_CONFIG_PATH).await
            } else {
                debug!("No configuration file found, using defaults");
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}

pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = parse(&config_str)?;

    Ok(config)
}

pub fn parse(config_str: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.discovery.url.trim().is_empty() {
            return Err(Error::config("discovery.url must not be empty"));
        }
        if self.transport.chunk_size == 0 {
            return Err(Error::config("transport.chunk_size must be greater than zero"));
        }
        Ok(())
    }
}
