//! Configuration file handling for camsnap.
//!
//! Loads configuration from `~/.config/camsnap/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::Resolution;
use crate::session::CaptureSettings;

/// Configuration file structure for camsnap.
/// Loaded from ~/.config/camsnap/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub mirror: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            mirror: true,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct StreamConfig {
    #[serde(default = "default_warmup_ms")]
    pub warmup_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            warmup_timeout_ms: default_warmup_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    Resolution::CAPTURE.width
}

fn default_height() -> u32 {
    Resolution::CAPTURE.height
}

fn default_output() -> PathBuf {
    PathBuf::from("capture.png")
}

fn default_warmup_ms() -> u64 {
    5000
}

/// Starter file written by `camsnap config init`.
pub const DEFAULT_CONFIG: &str = r#"# camsnap configuration

[capture]
# Capture buffer size in pixels
width = 320
height = 240
# Mirror horizontally (selfie mode)
mirror = true

[output]
# Where stills are written (overwritten on every capture)
path = "capture.png"

[stream]
# How long to wait for a camera to deliver its first frame
warmup_timeout_ms = 5000
"#;

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config
                .capture_size()
                .validate_capture_size()
                .map_err(|message| ConfigError::InvalidValue {
                    path: path.clone(),
                    message,
                })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Capture buffer size from the `[capture]` section.
    pub fn capture_size(&self) -> Resolution {
        Resolution::new(self.capture.width, self.capture.height)
    }

    /// Capture settings described by this config.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            resolution: self.capture_size(),
            mirror: self.capture.mirror,
            warmup_timeout: Duration::from_millis(self.stream.warmup_timeout_ms),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, message } => {
                write!(f, "Invalid config file '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("camsnap").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/camsnap/config.toml")
        })
}
