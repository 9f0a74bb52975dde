// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration for a link session.
//!
//! The periods only affect observed throughput and drop rates, never the
//! correctness of the channel primitives.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_fast_period_ms() -> u64 {
    20
}

fn default_slow_period_ms() -> u64 {
    100
}

fn default_ring_capacity() -> usize {
    16
}

/// Tick periods and ring sizing for one fast/slow session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Fast (control) thread tick period in milliseconds.
    #[serde(default = "default_fast_period_ms")]
    pub fast_period_ms: u64,
    /// Slow (supervisor) thread tick period in milliseconds.
    #[serde(default = "default_slow_period_ms")]
    pub slow_period_ms: u64,
    /// Capacity of the fast → slow result ring (rounded up to a power of
    /// two at construction).
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            fast_period_ms: default_fast_period_ms(),
            slow_period_ms: default_slow_period_ms(),
            ring_capacity: default_ring_capacity(),
        }
    }
}

impl LinkConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        debug!("Loaded link config from {}", path.display());
        Ok(config)
    }

    /// Reject configurations the drivers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period_ms == 0 {
            return Err(ConfigError::Invalid("fast_period_ms must be > 0".into()));
        }
        if self.slow_period_ms == 0 {
            return Err(ConfigError::Invalid("slow_period_ms must be > 0".into()));
        }
        if self.ring_capacity == 0 {
            return Err(ConfigError::Invalid("ring_capacity must be > 0".into()));
        }
        Ok(())
    }

    pub fn fast_period(&self) -> Duration {
        Duration::from_millis(self.fast_period_ms)
    }

    pub fn slow_period(&self) -> Duration {
        Duration::from_millis(self.slow_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.fast_period_ms, 20);
        assert_eq!(config.slow_period_ms, 100);
        assert_eq!(config.ring_capacity, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = LinkConfig::from_toml("fast_period_ms = 5\n").unwrap();
        assert_eq!(config.fast_period_ms, 5);
        assert_eq!(config.slow_period_ms, 100);
        assert_eq!(config.ring_capacity, 16);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LinkConfig {
            fast_period_ms: 10,
            slow_period_ms: 50,
            ring_capacity: 8,
        };
        let s = config.to_toml().unwrap();
        let parsed = LinkConfig::from_toml(&s).unwrap();
        assert_eq!(parsed.fast_period_ms, 10);
        assert_eq!(parsed.slow_period_ms, 50);
        assert_eq!(parsed.ring_capacity, 8);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = LinkConfig {
            fast_period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fast_period_ms = 2\nslow_period_ms = 10").unwrap();

        let config = LinkConfig::load(file.path()).unwrap();
        assert_eq!(config.fast_period_ms, 2);
        assert_eq!(config.slow_period_ms, 10);
        assert_eq!(config.ring_capacity, 16);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ring_capacity = 0").unwrap();

        assert!(LinkConfig::load(file.path()).is_err());
    }
}
