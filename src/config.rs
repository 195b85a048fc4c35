//! Runtime configuration loaded from `alphasub.toml`.
//!
//! Every field has a sensible default, so the file is optional. The
//! `ALPHASUB_CREDENTIALS` environment variable takes precedence over the
//! configured credentials path.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::submission::ProtocolConfig;

const DEFAULT_CONFIG_FILE: &str = "alphasub.toml";
const CREDENTIALS_ENV: &str = "ALPHASUB_CREDENTIALS";

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct AlphasubConfig {
    /// Base URL of the Brain API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path to the credentials artifact (`["username", "password"]`).
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,

    /// Simulation-results artifact consumed by the filter.
    #[serde(default = "default_input_file")]
    pub input_file: String,

    /// Pending-queue artifact shared by filter and driver.
    #[serde(default = "default_queue_file")]
    pub queue_file: String,

    /// Submit attempts allowed per identifier.
    #[serde(default = "default_max_submit_attempts")]
    pub max_submit_attempts: u32,

    /// Delay between submit retries, in milliseconds.
    #[serde(default = "default_submit_retry_delay_ms")]
    pub submit_retry_delay_ms: u64,

    /// Pause between consecutive submissions, in milliseconds.
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Ceiling on cumulative server-directed polling waits, in
    /// milliseconds. Zero disables the ceiling.
    #[serde(default = "default_max_poll_wait_ms")]
    pub max_poll_wait_ms: u64,
}

fn default_base_url() -> String {
    "https://api.worldquantbrain.com".to_string()
}

fn default_credentials_file() -> String {
    "brain_credentials.json".to_string()
}

fn default_input_file() -> String {
    "simulated_alphas.csv".to_string()
}

fn default_queue_file() -> String {
    "alpha_ids.txt".to_string()
}

fn default_max_submit_attempts() -> u32 {
    5
}

fn default_submit_retry_delay_ms() -> u64 {
    3_000
}

fn default_pacing_delay_ms() -> u64 {
    10_000
}

fn default_max_poll_wait_ms() -> u64 {
    600_000
}

impl Default for AlphasubConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credentials_file: default_credentials_file(),
            input_file: default_input_file(),
            queue_file: default_queue_file(),
            max_submit_attempts: default_max_submit_attempts(),
            submit_retry_delay_ms: default_submit_retry_delay_ms(),
            pacing_delay_ms: default_pacing_delay_ms(),
            max_poll_wait_ms: default_max_poll_wait_ms(),
        }
    }
}

impl AlphasubConfig {
    /// Load the configuration. An explicit override path must exist; the
    /// default `alphasub.toml` is optional and falls back to defaults.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = match override_path {
            Some(path) => Self::read(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(std::env::var(CREDENTIALS_ENV).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    // Environment variable takes precedence over the file for credentials.
    fn apply_env(&mut self, credentials: Option<String>) {
        if let Some(path) = credentials {
            if !path.is_empty() {
                self.credentials_file = path;
            }
        }
    }

    pub fn protocol(&self) -> ProtocolConfig {
        ProtocolConfig {
            max_submit_attempts: self.max_submit_attempts,
            submit_retry_delay: Duration::from_millis(self.submit_retry_delay_ms),
            max_poll_wait: match self.max_poll_wait_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}
