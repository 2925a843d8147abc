use std::time::Duration;

use crate::api::api_root;
use crate::core::Policy;
use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Per-request timeout; `None` keeps the transport default.
    pub timeout: Option<Duration>,
    pub policy: Policy,
    /// Adds read-back checks after the update and delete steps.
    pub extended: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: None,
            policy: Policy::Continue,
            extended: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("API_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
        }
        if let Some(ms) = lookup("TIMEOUT") {
            let millis: u64 = ms
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout { value: ms.clone() })?;
            // 0 disables the timeout, as with mocha's `this.timeout(0)`.
            config.timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Some(value) = lookup("API_FAIL_FAST") {
            if parse_flag("API_FAIL_FAST", &value)? {
                config.policy = Policy::FailFast;
            }
        }
        if let Some(value) = lookup("API_EXTENDED") {
            config.extended = parse_flag("API_EXTENDED", &value)?;
        }

        Ok(config)
    }

    pub fn base_url(&self) -> String {
        api_root(&self.host, self.port)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
