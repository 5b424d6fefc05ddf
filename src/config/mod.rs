//! Configuration System for fuzzy-dpi
//!
//! Provides a flexible configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./dpi.toml` - Project-local configuration
//! 2. `~/.config/dpi/config.toml` - User configuration (XDG)
//! 3. `~/.dpi/config.toml` - User configuration (legacy)
//! 4. `/etc/dpi/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `DPI_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `DPI_RESOLUTION` - Defuzzification sample intervals
//! - `DPI_DEFUZZ` - Defuzzification method (centroid, bisector, mom, som, lom)
//! - `DPI_IMPLICATION` - Implication operator (minimum, product)
//! - `DPI_MODEL` - Model definition file
//! - `DPI_SERVER_HOST` - HTTP bind address
//! - `DPI_SERVER_PORT` - HTTP port
//!
//! # Example Configuration
//!
//! ```toml
//! # dpi.toml
//!
//! [general]
//! log_level = "normal"
//!
//! [engine]
//! resolution = 200
//! defuzzification = "centroid"
//! implication = "minimum"
//!
//! [model]
//! path = "models/team.toml"
//!
//! [server]
//! port = 8000
//! host = "0.0.0.0"
//! cors_enabled = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DpiError, ErrorCode};
use crate::fuzzy::{DefuzzificationMethod, Implication, DEFAULT_RESOLUTION, MIN_RESOLUTION};
use crate::simulation::EngineSettings;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DpiConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Inference engine settings
    pub engine: EngineConfig,
    /// Model source
    pub model: ModelConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
}

/// Inference engine options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample intervals over each output universe
    pub resolution: usize,
    /// Defuzzification method
    pub defuzzification: DefuzzificationMethod,
    /// Implication operator
    pub implication: Implication,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            defuzzification: DefuzzificationMethod::Centroid,
            implication: Implication::Minimum,
        }
    }
}

/// Model source; the built-in model is used when no path is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            cors_enabled: true,
            max_body_size: 64 * 1024, // 64 KB
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "info",
            LogLevel::Verbose => "debug",
            LogLevel::Debug => "trace",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl DpiConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise the search paths are tried in
    /// order and defaults are used when none exists. Environment overrides
    /// are applied last, then the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::config_paths()
                .into_iter()
                .find(|p| p.exists())
                .map(|p| Self::load_from_file(&p))
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project-local
        paths.push(PathBuf::from("./dpi.toml"));

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dpi").join("config.toml"));
        }

        // Legacy home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".dpi").join("config.toml"));
        }

        // System-wide (Unix only)
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/dpi/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // DPI_LOG_LEVEL
        if let Some(val) = lookup("DPI_LOG_LEVEL") {
            self.general.log_level = LogLevel::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("DPI_LOG_LEVEL", &val))?;
        }

        // DPI_RESOLUTION
        if let Some(val) = lookup("DPI_RESOLUTION") {
            self.engine.resolution = val
                .parse::<usize>()
                .map_err(|_| ConfigError::invalid("DPI_RESOLUTION", &val))?;
        }

        // DPI_DEFUZZ
        if let Some(val) = lookup("DPI_DEFUZZ") {
            self.engine.defuzzification = val
                .parse()
                .map_err(|_: DpiError| ConfigError::invalid("DPI_DEFUZZ", &val))?;
        }

        // DPI_IMPLICATION
        if let Some(val) = lookup("DPI_IMPLICATION") {
            self.engine.implication = val
                .parse()
                .map_err(|_: DpiError| ConfigError::invalid("DPI_IMPLICATION", &val))?;
        }

        // DPI_MODEL
        if let Some(val) = lookup("DPI_MODEL") {
            self.model.path = Some(PathBuf::from(val));
        }

        // DPI_SERVER_HOST
        if let Some(val) = lookup("DPI_SERVER_HOST") {
            self.server.host = val;
        }

        // DPI_SERVER_PORT
        if let Some(val) = lookup("DPI_SERVER_PORT") {
            self.server.port = val
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid("DPI_SERVER_PORT", &val))?;
        }

        Ok(())
    }

    /// Reject values the engine or server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.resolution < MIN_RESOLUTION {
            return Err(ConfigError::InvalidValue {
                key: "engine.resolution".to_string(),
                message: format!(
                    "must be at least {} (got {})",
                    MIN_RESOLUTION, self.engine.resolution
                ),
            });
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.max_body_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Engine tunables for the simulator
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            defuzzification: self.engine.defuzzification,
            resolution: self.engine.resolution,
            implication: self.engine.implication,
        }
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# Fuzzy DPI Configuration File

[general]
# Logging level: quiet, normal, verbose, debug
# RUST_LOG takes precedence when set
log_level = "normal"

[engine]
# Sample intervals over each output universe (minimum 10)
resolution = 200
# Defuzzification: centroid, bisector, mom, som, lom
defuzzification = "centroid"
# Implication: minimum (clip), product (scale)
implication = "minimum"

[model]
# Model definition file (.toml or .json); the built-in model is used if unset
# path = "models/custom.toml"

[server]
# HTTP port
port = 8000
# Server host
host = "0.0.0.0"
# Enable CORS for browser access
cors_enabled = true
# Maximum request body size (bytes)
max_body_size = 65536
# Request timeout (seconds)
timeout_secs = 30
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error reading config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Serialization error
    SerializeError(String),
    /// Setting has an unusable value
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unrecognised value '{}'", value),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "Invalid value for {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for DpiError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::SerializeError(_) => ErrorCode::ConfigError,
            ConfigError::InvalidValue { .. } => ErrorCode::InvalidConfigValue,
        };
        let dpi = DpiError::new(code, err.to_string());
        match err {
            ConfigError::IoError(path, _) | ConfigError::ParseError(path, _) => {
                dpi.with_context("path", path.display().to_string())
            }
            ConfigError::InvalidValue { key, .. } => dpi.with_context("key", key),
            ConfigError::SerializeError(_) => dpi,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
