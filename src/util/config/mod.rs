//! mixfix configuration system
//!
//! Project-level configuration with layered overrides.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments
//! 2. Environment variables (MIXFIX_LOG, MIXFIX_JUXTAPOSITION, MIXFIX_PARALLEL)
//! 3. Project-level (mixfix.ron)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use mixfix::util::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert!(!config.parser.juxtaposition);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::logger::LogLevel;

/// Project config file name
pub const CONFIG_FILE_NAME: &str = "mixfix.ron";

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    /// Parser settings
    #[serde(default)]
    pub parser: ParserConfig,
    /// Output settings for the CLI
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ParserConfig {
    /// Adjacent primaries form an application (`f x y`)
    #[serde(default)]
    pub juxtaposition: bool,
    /// Parse the expressions of a unit on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

/// Tree output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `(op a b)` s-expressions
    #[default]
    Sexp,
    /// Re-printed through each operator's display form
    Pretty,
    /// serde_json encoding of the tree
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Tree output format
    #[serde(default)]
    pub format: OutputFormat,
    /// Colored diagnostics
    #[serde(default = "default_colors")]
    pub colors: bool,
    /// Expand chains into pairwise combinator applications before printing
    #[serde(default)]
    pub desugar_chains: bool,
}

fn default_colors() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Sexp,
            colors: true,
            desugar_chains: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LogConfig {
    /// Minimum level
    #[serde(default)]
    pub level: LogLevel,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

impl EngineConfig {
    /// Load `mixfix.ron` from `dir`, falling back to defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    /// Load a config file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn with_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        if let Some(level) = lookup("MIXFIX_LOG").and_then(|v| v.parse().ok()) {
            self.log.level = level;
        }
        if let Some(flag) = lookup("MIXFIX_JUXTAPOSITION").and_then(|v| parse_flag(&v)) {
            self.parser.juxtaposition = flag;
        }
        if let Some(flag) = lookup("MIXFIX_PARALLEL").and_then(|v| parse_flag(&v)) {
            self.parser.parallel = flag;
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.output.colors);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "(parser: (juxtaposition: true), output: (format: json))",
        )
        .unwrap();

        let config = EngineConfig::load_from_dir(dir.path()).unwrap();
        assert!(config.parser.juxtaposition);
        assert!(!config.parser.parallel);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.colors);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "(parser: ").unwrap();
        let err = EngineConfig::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::default().with_vars(|key| match key {
            "MIXFIX_LOG" => Some("debug".to_string()),
            "MIXFIX_JUXTAPOSITION" => Some("on".to_string()),
            "MIXFIX_PARALLEL" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.log.level, LogLevel::Debug);
        assert!(config.parser.juxtaposition);
        assert!(!config.parser.parallel);
    }
}
