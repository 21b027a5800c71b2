//! File configuration for the demo device and capture output.
//!
//! The camera section describes the simulated hardware the binary drives:
//! how many sensors exist, how they are mounted and which preview sizes
//! they report.

use crate::capture::MediaDirectory;
use crate::hardware::{FixedDisplay, MockBackend, MockSensor};
use crate::orientation::{Facing, Rotation};
use crate::preview::Dimension;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Simulated camera hardware and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Facing to open first.
    pub facing: Facing,
    /// Number of physical cameras (1 = back only, 2 = back and front).
    pub camera_count: u8,
    /// Mount orientation of the back sensor.
    pub mount_orientation: Rotation,
    /// Mount orientation of the front sensor.
    pub front_mount_orientation: Rotation,
    /// Preview sizes every sensor reports.
    pub supported_sizes: Vec<Dimension>,
    /// Display rotation at startup.
    pub display_rotation: Rotation,
    /// Screen width in the display's natural orientation.
    pub screen_width: u32,
    /// Screen height in the display's natural orientation.
    pub screen_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            camera_count: 2,
            mount_orientation: Rotation::Deg90,
            front_mount_orientation: Rotation::Deg270,
            supported_sizes: vec![
                Dimension::new(1920, 1080),
                Dimension::new(1280, 720),
                Dimension::new(640, 480),
            ],
            display_rotation: Rotation::Deg0,
            screen_width: 1080,
            screen_height: 1920,
        }
    }
}

impl CameraConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(1..=2).contains(&self.camera_count) {
            return Err(ConfigError::InvalidCameraCount(self.camera_count));
        }
        if self.facing == Facing::Front && self.camera_count < 2 {
            return Err(ConfigError::FacingUnavailable(self.facing));
        }
        if let Some(size) = self.supported_sizes.iter().find(|s| !s.is_valid()) {
            return Err(ConfigError::InvalidPreviewSize(*size));
        }
        Ok(())
    }

    /// Builds the simulated camera service.
    pub fn backend(&self) -> MockBackend {
        let back = MockSensor {
            facing: Facing::Back,
            mount: self.mount_orientation,
            preview_sizes: self.supported_sizes.clone(),
        };
        let mut sensors = vec![back];
        if self.camera_count > 1 {
            sensors.push(MockSensor {
                facing: Facing::Front,
                mount: self.front_mount_orientation,
                preview_sizes: self.supported_sizes.clone(),
            });
        }
        MockBackend::with_sensors(sensors)
    }

    /// Builds the simulated display.
    pub fn display(&self) -> FixedDisplay {
        FixedDisplay::rotated(
            Dimension::new(self.screen_width, self.screen_height),
            self.display_rotation,
        )
    }
}

/// Where captures are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root media directory.
    pub root: PathBuf,
    /// Album subdirectory created under the root.
    pub album: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("captures"),
            album: "QuickCamera".into(),
        }
    }
}

impl StorageConfig {
    /// Validates the album name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let album = self.album.trim();
        if album.is_empty() || album.contains(['/', '\\']) || album == ".." {
            return Err(ConfigError::InvalidAlbum(self.album.clone()));
        }
        Ok(())
    }

    /// Builds the media directory.
    pub fn media_directory(&self) -> MediaDirectory {
        MediaDirectory::new(&self.root, self.album.trim())
    }
}

/// Demo run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Captures to take when not continuous.
    pub capture_count: u32,
    /// Pause between captures in milliseconds.
    pub interval_ms: u64,
    /// Keep capturing until interrupted.
    pub continuous: bool,
    /// Print Prometheus metrics on exit.
    pub print_metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            capture_count: 3,
            interval_ms: 500,
            continuous: false,
            print_metrics: true,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Screen width or height is zero.
    #[error("invalid screen dimensions")]
    InvalidDimensions,
    /// Only one or two cameras are supported.
    #[error("camera count must be 1 or 2 (got {0})")]
    InvalidCameraCount(u8),
    /// The starting facing has no configured camera.
    #[error("no {0} camera is configured")]
    FacingUnavailable(Facing),
    /// A preview size has a zero dimension.
    #[error("invalid preview size {0}")]
    InvalidPreviewSize(Dimension),
    /// Album name is empty or contains a path separator.
    #[error("invalid album name {0:?}")]
    InvalidAlbum(String),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Simulated hardware.
    #[serde(default)]
    pub camera: CameraConfig,
    /// Capture destination.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Demo run settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.storage.validate()
    }
}
