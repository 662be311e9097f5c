//! Platform credentials loaded from a `.env` file
//!
//! The file is parsed without touching the process environment. Lookups fall
//! back to environment variables for keys the file does not define, which
//! keeps CI setups working without a file on disk. Secret values are held as
//! [`SecretString`] so they are zeroed on drop and redacted from `Debug`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};

pub const BLUESKY_USERNAME: &str = "BLUESKY_USERNAME";
pub const BLUESKY_PASSWORD: &str = "BLUESKY_PASSWORD";
pub const INSTAGRAM_ACCESS_TOKEN: &str = "INSTAGRAM_ACCESS_TOKEN";
pub const INSTAGRAM_USER_ID: &str = "INSTAGRAM_USER_ID";
pub const X_CONSUMER_KEY: &str = "X_CONSUMER_KEY";
pub const X_CONSUMER_SECRET: &str = "X_CONSUMER_SECRET";
pub const X_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const X_ACCESS_SECRET: &str = "X_ACCESS_SECRET";

/// Key-value credentials read from a `.env` file
#[derive(Default)]
pub struct CredentialStore {
    values: HashMap<String, SecretString>,
    source: Option<PathBuf>,
}

impl CredentialStore {
    /// Load credentials from `path`.
    ///
    /// A missing file produces an empty store; required keys then resolve
    /// from the environment or fail with [`ConfigError::MissingField`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "Credentials file {} not found, using environment only",
                path.display()
            );
            return Ok(Self::default());
        }

        let env_error = |source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(env_error)? {
            let (key, value) = item.map_err(env_error)?;
            values.insert(key, SecretString::from(value));
        }

        tracing::debug!(
            "Loaded {} credential entries from {}",
            values.len(),
            path.display()
        );

        Ok(Self {
            values,
            source: Some(path.to_path_buf()),
        })
    }

    /// Build a store from in-memory pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), SecretString::from(v.into())))
            .collect();
        Self {
            values,
            source: None,
        }
    }

    /// Look up a key, preferring the file over the environment.
    /// Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<SecretString> {
        if let Some(value) = self.values.get(key) {
            let value = value.expose_secret();
            if !value.is_empty() {
                return Some(SecretString::from(value.to_string()));
            }
        }

        std::env::var(key)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    }

    pub fn require(&self, key: &str) -> Result<SecretString> {
        self.get(key).ok_or_else(|| self.missing(key).into())
    }

    /// Non-secret values such as usernames and ids
    pub fn require_plain(&self, key: &str) -> Result<String> {
        Ok(self.require(key)?.expose_secret().to_string())
    }

    fn missing(&self, key: &str) -> ConfigError {
        match &self.source {
            Some(path) => ConfigError::MissingField(format!("{} (in {})", key, path.display())),
            None => ConfigError::MissingField(key.to_string()),
        }
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("CredentialStore")
            .field("keys", &keys)
            .field("source", &self.source)
            .finish()
    }
}

/// Bluesky handle and app password
#[derive(Debug)]
pub struct BlueskyCredentials {
    pub identifier: String,
    pub password: SecretString,
}

impl BlueskyCredentials {
    pub fn from_store(store: &CredentialStore) -> Result<Self> {
        Ok(Self {
            identifier: store.require_plain(BLUESKY_USERNAME)?,
            password: store.require(BLUESKY_PASSWORD)?,
        })
    }
}

/// Instagram Graph API user and long-lived token
#[derive(Debug)]
pub struct InstagramCredentials {
    pub user_id: String,
    pub access_token: SecretString,
}

impl InstagramCredentials {
    pub fn from_store(store: &CredentialStore) -> Result<Self> {
        Ok(Self {
            user_id: store.require_plain(INSTAGRAM_USER_ID)?,
            access_token: store.require(INSTAGRAM_ACCESS_TOKEN)?,
        })
    }
}

/// OAuth 1.0a consumer and access token pairs for X
#[derive(Debug)]
pub struct XCredentials {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub access_token: String,
    pub access_secret: SecretString,
}

impl XCredentials {
    pub fn from_store(store: &CredentialStore) -> Result<Self> {
        Ok(Self {
            consumer_key: store.require_plain(X_CONSUMER_KEY)?,
            consumer_secret: store.require(X_CONSUMER_SECRET)?,
            access_token: store.require_plain(X_ACCESS_TOKEN)?,
            access_secret: store.require(X_ACCESS_SECRET)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_env(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn test_load_bluesky_credentials_from_file() {
        let (_dir, path) = write_env(
            "BLUESKY_USERNAME=alice.bsky.social\nBLUESKY_PASSWORD=\"abcd-efgh-ijkl-mnop\"\n",
        );

        let store = CredentialStore::load(&path).unwrap();
        let creds = BlueskyCredentials::from_store(&store).unwrap();

        assert_eq!(creds.identifier, "alice.bsky.social");
        assert_eq!(creds.password.expose_secret(), "abcd-efgh-ijkl-mnop");
    }

    #[test]
    #[serial]
    fn test_load_does_not_modify_process_environment() {
        let (_dir, path) = write_env("IMGCAST_TEST_ONLY_KEY=value\n");

        let store = CredentialStore::load(&path).unwrap();

        assert!(store.get("IMGCAST_TEST_ONLY_KEY").is_some());
        assert!(std::env::var("IMGCAST_TEST_ONLY_KEY").is_err());
    }

    #[test]
    #[serial]
    fn test_missing_key_names_key_and_file() {
        let (_dir, path) = write_env("INSTAGRAM_USER_ID=1789\n");

        let store = CredentialStore::load(&path).unwrap();
        let err = InstagramCredentials::from_store(&store).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("INSTAGRAM_ACCESS_TOKEN"));
        assert!(message.contains(".env"));
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::load(&dir.path().join(".env")).unwrap();
        assert!(store.get(X_CONSUMER_KEY).is_none());
    }

    #[test]
    #[serial]
    fn test_environment_fallback() {
        let store = CredentialStore::from_pairs([(X_CONSUMER_KEY, "ck")]);
        std::env::set_var(X_CONSUMER_SECRET, "from-env");
        let secret = store.get(X_CONSUMER_SECRET);
        std::env::remove_var(X_CONSUMER_SECRET);

        assert_eq!(secret.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn test_empty_value_counts_as_missing() {
        let store = CredentialStore::from_pairs([(BLUESKY_PASSWORD, "")]);
        assert!(store.require(BLUESKY_PASSWORD).is_err());
    }

    #[test]
    #[serial]
    fn test_x_credentials_complete() {
        let store = CredentialStore::from_pairs([
            (X_CONSUMER_KEY, "ck"),
            (X_CONSUMER_SECRET, "cs"),
            (X_ACCESS_TOKEN, "at"),
            (X_ACCESS_SECRET, "as"),
        ]);

        let creds = XCredentials::from_store(&store).unwrap();
        assert_eq!(creds.consumer_key, "ck");
        assert_eq!(creds.access_token, "at");
        assert_eq!(creds.consumer_secret.expose_secret(), "cs");
        assert_eq!(creds.access_secret.expose_secret(), "as");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let store = CredentialStore::from_pairs([
            (INSTAGRAM_USER_ID, "1789"),
            (INSTAGRAM_ACCESS_TOKEN, "EAAG-super-secret-token"),
        ]);
        assert!(!format!("{:?}", store).contains("EAAG-super-secret-token"));

        let creds = InstagramCredentials::from_store(&store).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("EAAG-super-secret-token"));
        assert!(debug.contains("1789"));
    }
}
