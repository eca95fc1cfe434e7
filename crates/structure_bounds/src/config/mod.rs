//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;
use crate::debug::OutlineColors;
use crate::foundation::math::{Transform, Vec3};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Format is picked by extension
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Tuning values for fitting bounds to a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FittingConfig {
    /// Target diameter of a fine sphere, in model units
    pub fine_width: f32,
    /// How many fine widths one coarse sphere spans
    pub coarse_multiple: f32,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            fine_width: 0.5,
            coarse_multiple: 4.0,
        }
    }
}

impl FittingConfig {
    /// Check the values are usable for fitting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fine_width.is_finite() && self.fine_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "fine_width",
                reason: format!("must be a positive number, got {}", self.fine_width),
            });
        }
        if !(self.coarse_multiple.is_finite() && self.coarse_multiple > 1.0) {
            return Err(ConfigError::Invalid {
                field: "coarse_multiple",
                reason: format!("must be greater than 1, got {}", self.coarse_multiple),
            });
        }
        Ok(())
    }
}

/// Where the model sits in the world when its bounds are built
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// World position of the model origin
    pub position: [f32; 3],
    /// Import rotation about x, y and z, in degrees
    pub rotation_degrees: [f32; 3],
}

impl PlacementConfig {
    /// Check every component is a real number
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "position",
                reason: format!("must be finite, got {:?}", self.position),
            });
        }
        if !self.rotation_degrees.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "rotation_degrees",
                reason: format!("must be finite, got {:?}", self.rotation_degrees),
            });
        }
        Ok(())
    }

    /// The placement as a transform
    pub fn to_transform(&self) -> Transform {
        let [x, y, z] = self.rotation_degrees.map(f32::to_radians);
        Transform::from_euler(Vec3::from(self.position), x, y, z)
    }
}

/// Everything the bounds tool reads from its configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Kind of asset being edited
    pub asset_kind: AssetKind,
    /// Fitting parameters
    pub fitting: FittingConfig,
    /// Outline colors
    pub outline: OutlineColors,
    /// Model placement
    pub placement: PlacementConfig,
}

impl Config for BoundsConfig {}

impl BoundsConfig {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fitting.validate()?;
        self.placement.validate()?;
        self.outline.validate()
    }
}
