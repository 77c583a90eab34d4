use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use vcs::RemoteConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Bounds for the randomized pause between commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_ms: 500,
            max_ms: 1000,
        }
    }
}

/// Everything the painter and doctor need to know, fixed at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Number of tracked files reused across all commits.
    pub pool_size: usize,
    /// Blank weeks between consecutive glyphs.
    pub gap_weeks: u32,
    pub log_file: PathBuf,
    pub pacing: PacingConfig,
    pub remote: RemoteConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            gap_weeks: 1,
            log_file: PathBuf::from("painter.log"),
            pacing: PacingConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl CanvasConfig {
    /// Load and validate a TOML configuration file. Missing keys fall back
    /// to the compiled-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.remote.validate()?;

        if self.pool_size == 0 {
            return Err("pool size must be greater than 0".to_string());
        }

        if self.pacing.min_ms > self.pacing.max_ms {
            return Err("pacing minimum exceeds maximum".to_string());
        }

        Ok(())
    }

    /// The fixed set of tracked file names.
    pub fn pool_files(&self) -> Vec<String> {
        (0..self.pool_size).map(|i| format!("canvas_{i}.txt")).collect()
    }

    /// The pool file a given commit index writes to.
    pub fn pool_file(&self, index: usize) -> String {
        format!("canvas_{}.txt", index % self.pool_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.pool_files().len(), 10);
    }

    #[test]
    fn test_pool_file_wraps() {
        let config = CanvasConfig {
            pool_size: 3,
            ..CanvasConfig::default()
        };
        assert_eq!(config.pool_file(0), "canvas_0.txt");
        assert_eq!(config.pool_file(4), "canvas_1.txt");
    }

    #[test]
    fn test_validation() {
        let mut config = CanvasConfig::default();

        config.pool_size = 0;
        assert!(config.validate().is_err());

        config.pool_size = 5;
        config.pacing = PacingConfig {
            min_ms: 900,
            max_ms: 100,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CanvasConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: CanvasConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: CanvasConfig = toml::from_str(
            "pool_size = 4\n\n[remote]\nusername = \"muralist\"\nrepository = \"wall\"\n",
        )
        .unwrap();
        assert_eq!(parsed.pool_size, 4);
        assert_eq!(parsed.remote.username, "muralist");
        assert_eq!(parsed.remote.host, "github.com");
        assert_eq!(parsed.gap_weeks, 1);
    }
}
