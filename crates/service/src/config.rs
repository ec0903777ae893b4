//! Configuration loading and validation for the service.
//!
//! All values are read from environment variables at startup. The process
//! will exit with a clear error message if any required variable is missing
//! or invalid.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::crypto::{KeyMap, KeyVersion, KEY_LEN};

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Key version new ciphertexts are sealed under. **Required.**
    pub current_key_version: KeyVersion,

    /// Key catalog as comma-separated `version:base64(key)` entries.
    /// Every key must decode to exactly 32 bytes. **Required.**
    pub keys: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent, cannot be parsed,
    /// or if the key catalog fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        // Surface key-catalog problems at startup rather than first use.
        c.key_map()?;
        Ok(c)
    }

    /// Parse the `keys` entry list into a [`KeyMap`].
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed entry, an unparseable version, invalid
    /// base64, a key that is not 32 bytes, a duplicate version, or an empty
    /// catalog.
    pub fn key_map(&self) -> Result<KeyMap> {
        let mut map = KeyMap::new();

        for entry in self.keys.split(',') {
            let entry = entry.trim();
            let (version, encoded) = entry.split_once(':').with_context(|| {
                format!("malformed key entry {entry:?}: expected <version>:<base64>")
            })?;

            let version: KeyVersion = version
                .parse()
                .with_context(|| format!("invalid key version {version:?}"))?;

            let key = STANDARD
                .decode(encoded)
                .with_context(|| format!("key for version {version} is not valid base64"))?;
            if key.len() != KEY_LEN {
                anyhow::bail!(
                    "key for version {version} must be {KEY_LEN} bytes, got {}",
                    key.len()
                );
            }

            if map.insert(version, key).is_some() {
                anyhow::bail!("duplicate key entry for version {version}");
            }
        }

        if map.is_empty() {
            anyhow::bail!("KEYS must contain at least one <version>:<base64> entry");
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of the 32-byte key "itWouldBeBadIfSomebodyFoundThis!".
    const KEY_B64: &str = "aXRXb3VsZEJlQmFkSWZTb21lYm9keUZvdW5kVGhpcyE=";

    fn config_with_keys(keys: &str) -> Config {
        Config {
            current_key_version: 1,
            keys: keys.into(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_port(), 8080);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn key_map_parses_single_entry() {
        let cfg = config_with_keys(&format!("1:{KEY_B64}"));
        let map = cfg.key_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], b"itWouldBeBadIfSomebodyFoundThis!");
    }

    #[test]
    fn key_map_parses_multiple_entries_with_whitespace() {
        let cfg = config_with_keys(&format!("1:{KEY_B64}, 2:{KEY_B64}"));
        let map = cfg.key_map().unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&1));
        assert!(map.contains_key(&2));
    }

    #[test]
    fn key_map_rejects_entry_without_separator() {
        let cfg = config_with_keys(KEY_B64);
        assert!(cfg.key_map().is_err());
    }

    #[test]
    fn key_map_rejects_non_numeric_version() {
        let cfg = config_with_keys(&format!("one:{KEY_B64}"));
        assert!(cfg.key_map().is_err());
    }

    #[test]
    fn key_map_rejects_invalid_base64() {
        let cfg = config_with_keys("1:!!!not-base64!!!");
        assert!(cfg.key_map().is_err());
    }

    #[test]
    fn key_map_rejects_short_key() {
        let cfg = config_with_keys(&format!("1:{}", STANDARD.encode([0u8; 16])));
        assert!(cfg.key_map().is_err());
    }

    #[test]
    fn key_map_rejects_duplicate_version() {
        let cfg = config_with_keys(&format!("1:{KEY_B64},1:{KEY_B64}"));
        assert!(cfg.key_map().is_err());
    }

    #[test]
    fn key_map_rejects_empty_value() {
        let cfg = config_with_keys("");
        assert!(cfg.key_map().is_err());
    }
}
