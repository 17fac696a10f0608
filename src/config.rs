use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

pub const ENV_PROVIDER_URL: &str = "OCCUPANCY_PROVIDER_URL";
pub const ENV_PROVIDER_TOKEN: &str = "OCCUPANCY_PROVIDER_TOKEN";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "OCCUPANCY_FETCH_TIMEOUT_SECS";
pub const ENV_LOG: &str = "OCCUPANCY_LOG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            log_filter: String::from("occupancy_outlier=info"),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://beta-api.mortardata.org"),
            auth_token: None,
            timeout_secs: 60,
        }
    }
}

impl ProviderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_PROVIDER_URL) {
            self.provider.base_url = url;
        }

        if let Some(token) = lookup(ENV_PROVIDER_TOKEN) {
            self.provider.auth_token = Some(token);
        }

        if let Some(secs) = lookup(ENV_FETCH_TIMEOUT_SECS) {
            self.provider.timeout_secs =
                secs.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: ENV_FETCH_TIMEOUT_SECS.to_string(),
                        value: secs.clone(),
                        message: e.to_string(),
                    })?;
        }

        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "provider.timeout_secs".to_string(),
                value: "0".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}

/// Load a JSON configuration file. Missing keys fall back to defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let config: Config =
        serde_json::from_reader(reader).map_err(|e| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    config.validate()?;
    Ok(config)
}
