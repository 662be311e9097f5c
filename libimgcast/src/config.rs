//! Configuration management for Imgcast
//!
//! Configuration is optional: every field has a default, and a missing
//! config file yields [`Config::default`]. Secrets never live here; see
//! [`crate::credentials`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::packer::PackOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub credentials: CredentialsConfig,
    pub bluesky: BlueskyConfig,
    pub instagram: InstagramConfig,
    pub x: XConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    pub directory: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            directory: "media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    pub env_file: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_file: ".env".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlueskyConfig {
    pub pds_url: String,
    pub max_images: usize,
    pub max_chars: usize,
    pub packing: PackOptions,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            pds_url: "https://bsky.social".to_string(),
            max_images: 4,
            max_chars: 300,
            packing: PackOptions::new(1_000_000, 2000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstagramConfig {
    pub graph_url: String,
    pub max_chars: usize,
    pub packing: PackOptions,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            graph_url: "https://graph.facebook.com/v16.0".to_string(),
            max_chars: 2200,
            packing: PackOptions::new(8_000_000, 1440),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct XConfig {
    pub upload_url: String,
    pub api_url: String,
    pub max_chars: usize,
    pub packing: PackOptions,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            upload_url: "https://upload.twitter.com/1.1".to_string(),
            api_url: "https://api.twitter.com/1.1".to_string(),
            max_chars: 280,
            packing: PackOptions::new(5_000_000, 4096),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error; defaults are used instead. So is a
    /// system with no config directory at all.
    pub fn load() -> Result<Self> {
        Self::load_if_present(resolve_config_path().as_deref())
    }

    fn load_if_present(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) if path.exists() => Self::load_from_path(path),
            Some(path) => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                tracing::debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from an explicit path when given, otherwise the default location
    pub fn load_or_default_location(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Media directory with `~` and environment variables expanded
    pub fn media_dir(&self) -> PathBuf {
        expand_path(&self.media.directory)
    }

    /// Credentials file with `~` and environment variables expanded
    pub fn env_file(&self) -> PathBuf {
        expand_path(&self.credentials.env_file)
    }
}

fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Resolve the configuration file path (`IMGCAST_CONFIG`, then the XDG config dir)
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("IMGCAST_CONFIG") {
        return Some(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    dirs::config_dir().map(|dir| dir.join("imgcast").join("config.toml"))
}
