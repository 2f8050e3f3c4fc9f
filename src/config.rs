//! Configuration file support for the annotation widget.
//!
//! Tunables that are not part of the per-call parameters live here and are
//! persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color_utils::Colormap;
use crate::constants::{
    DEFAULT_LINE_WIDTH, FRAME_WIDTH_RATIO, HANDLE_HIT_RADIUS, MAX_DISPLAY_SCALE, MIN_BOX_SIZE,
};
use crate::controller::ControllerSettings;
use crate::error::ConfigError;

/// Log level setting for the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Widget configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Boxes narrower or shorter than this (image px) are not created
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f32,

    /// Pointer distance (display px) at which a handle is grabbed
    #[serde(default = "default_handle_radius")]
    pub handle_radius: f32,

    /// Outline width used when the caller passes none
    #[serde(default = "default_line_width")]
    pub default_line_width: f32,

    /// Share of the host window width the canvas may occupy
    #[serde(default = "default_frame_width_ratio")]
    pub frame_width_ratio: f32,

    /// Upper bound on display scale
    #[serde(default = "default_max_scale")]
    pub max_scale: f32,

    /// Colormap used to derive label colors
    #[serde(default)]
    pub colormap: Colormap,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_min_box_size() -> f32 {
    MIN_BOX_SIZE
}

fn default_handle_radius() -> f32 {
    HANDLE_HIT_RADIUS
}

fn default_line_width() -> f32 {
    DEFAULT_LINE_WIDTH
}

fn default_frame_width_ratio() -> f32 {
    FRAME_WIDTH_RATIO
}

fn default_max_scale() -> f32 {
    MAX_DISPLAY_SCALE
}

impl WidgetConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            min_box_size: default_min_box_size(),
            handle_radius: default_handle_radius(),
            default_line_width: default_line_width(),
            frame_width_ratio: default_frame_width_ratio(),
            max_scale: default_max_scale(),
            colormap: Colormap::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Raise or lower the global log filter to the configured level.
    pub fn apply_log_level(&self) {
        log::set_max_level(self.log_level.to_level_filter());
    }

    /// Controller tunables derived from this config.
    pub fn controller_settings(&self, use_space: bool) -> ControllerSettings {
        ControllerSettings {
            handle_radius: self.handle_radius,
            min_box_size: self.min_box_size,
            use_space,
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "bbox-annotator.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("bbox_annotator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("bbox_annotator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::new()
    }
}
