use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Connection settings for the HTTP transport.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Engine base URL, e.g. `http://localhost:9200`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Basic-auth username, if the engine requires authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            username: None,
            password: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: ClientConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse config file: {e}")))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &ClientConfig) -> Result<()> {
    if config.base_url.trim().is_empty() {
        return Err(Error::Config("base_url must not be empty".to_string()));
    }
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(Error::Config(format!(
            "base_url must be an http(s) URL, got '{}'",
            config.base_url
        )));
    }
    if config.timeout_secs == 0 {
        return Err(Error::Config("timeout_secs must be > 0".to_string()));
    }
    if config.password.is_some() && config.username.is_none() {
        return Err(Error::Config("password set without username".to_string()));
    }
    Ok(())
}
