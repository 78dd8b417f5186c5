use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::notifier::{Endpoint, DEFAULT_API_URL};
use crate::transport::DEFAULT_TIMEOUT;

const DEFAULT_CONFIG_NAME: &str = "hookpost.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Destination plus routing defaults applied to every message sent with it.
#[derive(Debug, Deserialize)]
pub struct Profile {
    pub target: Target,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub icon_emoji: Option<String>,
    /// Request timeout override in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Target {
    Webhook {
        url: String,
    },
    Api {
        token: String,
        url: Option<String>,
    },
}

impl Profile {
    pub fn endpoint(&self) -> Endpoint {
        match &self.target {
            Target::Webhook { url } => Endpoint::webhook(url.clone()),
            Target::Api { token, url } => Endpoint::Api {
                url: url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                token: token.clone(),
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn kind(&self) -> &'static str {
        match self.target {
            Target::Webhook { .. } => "webhook",
            Target::Api { .. } => "api",
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or search upward from the
    /// current dir and then the user config dir.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => find_upwards(DEFAULT_CONFIG_NAME)
                .or_else(user_config_path)
                .context("Failed to locate hookpost.toml in parent or user config directories")?,
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        tracing::debug!(path = %path.display(), profiles = cfg.profiles.len(), "loaded config");
        Ok(cfg)
    }

    /// Like [`Config::load`] but an absent file yields an empty config.
    /// An explicit path must still exist.
    pub fn load_or_default(path_override: Option<PathBuf>) -> Result<Self> {
        if path_override.is_none()
            && find_upwards(DEFAULT_CONFIG_NAME).is_none()
            && user_config_path().is_none()
        {
            return Ok(Config::default());
        }
        Self::load(path_override)
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .with_context(|| format!("Profile '{}' not found in config", name))
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn user_config_path() -> Option<PathBuf> {
    let candidate = dirs::config_dir()?.join("hookpost").join(DEFAULT_CONFIG_NAME);
    candidate.exists().then_some(candidate)
}
