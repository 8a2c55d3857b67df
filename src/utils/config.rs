use crate::algorithms::Boundary;
use crate::core::{Coordinate, FixStatus, StreamKind, MAX_UPDATE_INTERVAL};
use crate::processing::clamp_interval;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Geodetic point as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in meters
    #[serde(default)]
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
        }
    }

    fn to_coordinate(self) -> Result<Coordinate, ConfigError> {
        Coordinate::new(0, self.latitude, self.longitude, self.altitude, FixStatus::Fix2D).ok_or_else(|| {
            ConfigError::InvalidBoundary {
                reason: format!(
                    "point ({}, {}) is out of range",
                    self.latitude, self.longitude
                ),
            }
        })
    }
}

/// Boundary as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryConfig {
    Rect {
        left_top: GeoPoint,
        right_bottom: GeoPoint,
    },
    Circle {
        center: GeoPoint,
        /// meters
        radius: f64,
    },
    Polygon {
        vertices: Vec<GeoPoint>,
    },
}

impl BoundaryConfig {
    pub fn to_boundary(&self) -> Result<Boundary, ConfigError> {
        let boundary = match self {
            BoundaryConfig::Rect {
                left_top,
                right_bottom,
            } => Boundary::rect(left_top.to_coordinate()?, right_bottom.to_coordinate()?),
            BoundaryConfig::Circle { center, radius } => Boundary::circle(center.to_coordinate()?, *radius),
            BoundaryConfig::Polygon { vertices } => {
                let vertices = vertices
                    .iter()
                    .map(|v| v.to_coordinate())
                    .collect::<Result<Vec<_>, _>>()?;
                Boundary::polygon(vertices)
            }
        };
        boundary.ok_or_else(|| ConfigError::InvalidBoundary {
            reason: format!("{:?} does not describe a valid region", self),
        })
    }
}

/// Configuration validation and file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file I/O error: {message}")]
    Io { message: String },
    #[error("configuration serialization error: {message}")]
    Serialization { message: String },
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("invalid boundary: {reason}")]
    InvalidBoundary { reason: String },
}

fn default_interval() -> u32 {
    1
}

/// Provider configuration: update intervals and initial boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Position update interval (seconds)
    #[serde(default = "default_interval")]
    pub position_interval: u32,
    /// Velocity update interval (seconds)
    #[serde(default = "default_interval")]
    pub velocity_interval: u32,
    /// Satellite update interval (seconds)
    #[serde(default = "default_interval")]
    pub satellite_interval: u32,
    /// Boundaries registered when the configuration is applied
    #[serde(default)]
    pub boundaries: Vec<BoundaryConfig>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            position_interval: default_interval(),
            velocity_interval: default_interval(),
            satellite_interval: default_interval(),
            boundaries: Vec::new(),
        }
    }
}

impl LocationConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::Serialization {
                message: format!("Failed to parse config file '{}': {}", path_str, message),
            },
            other => other,
        })?;

        tracing::info!(
            path = %path_str,
            boundaries = config.boundaries.len(),
            "Loaded location configuration"
        );
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: LocationConfig = serde_json::from_str(content).map_err(|e| ConfigError::Serialization {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;
        Ok(())
    }

    pub fn interval(&self, kind: StreamKind) -> u32 {
        match kind {
            StreamKind::Position => self.position_interval,
            StreamKind::Velocity => self.velocity_interval,
            StreamKind::Satellite => self.satellite_interval,
        }
    }

    /// Interval as it will be applied (0 becomes the minimum)
    pub fn effective_interval(&self, kind: StreamKind) -> u32 {
        clamp_interval(self.interval(kind))
    }

    /// All boundaries, built and checked
    pub fn build_boundaries(&self) -> Result<Vec<Boundary>, ConfigError> {
        self.boundaries.iter().map(BoundaryConfig::to_boundary).collect()
    }

    /// Reject intervals above the maximum, invalid boundaries and
    /// structurally duplicate boundaries
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (parameter, kind) in [
            ("position_interval", StreamKind::Position),
            ("velocity_interval", StreamKind::Velocity),
            ("satellite_interval", StreamKind::Satellite),
        ] {
            let value = self.interval(kind);
            if value > MAX_UPDATE_INTERVAL {
                return Err(ConfigError::InvalidParameter {
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                    reason: format!("Interval must not exceed {} seconds", MAX_UPDATE_INTERVAL),
                });
            }
        }

        let boundaries = self.build_boundaries()?;
        for (index, boundary) in boundaries.iter().enumerate() {
            if boundaries[..index].contains(boundary) {
                return Err(ConfigError::InvalidParameter {
                    parameter: "boundaries".to_string(),
                    value: index.to_string(),
                    reason: "Boundary duplicates an earlier entry".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn square() -> BoundaryConfig {
        BoundaryConfig::Rect {
            left_top: GeoPoint::new(10.0, 0.0),
            right_bottom: GeoPoint::new(0.0, 10.0),
        }
    }

    #[test]
    fn test_default_config() {
        let config = LocationConfig::default();
        assert_eq!(config.position_interval, 1);
        assert!(config.boundaries.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "position_interval": 5,
            "boundaries": [
                {"type": "circle", "center": {"latitude": 37.0, "longitude": 127.0}, "radius": 500.0},
                {"type": "polygon", "vertices": [
                    {"latitude": 0.0, "longitude": 0.0},
                    {"latitude": 0.0, "longitude": 1.0},
                    {"latitude": 1.0, "longitude": 1.0}
                ]}
            ]
        }"#;
        let config = LocationConfig::from_json(json).unwrap();
        assert_eq!(config.position_interval, 5);
        assert_eq!(config.velocity_interval, 1);
        assert_eq!(config.build_boundaries().unwrap().len(), 2);
    }

    #[test]
    fn test_interval_limits() {
        let mut config = LocationConfig::default();
        config.satellite_interval = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_interval(StreamKind::Satellite), 1);

        config.velocity_interval = 121;
        match config.validate() {
            Err(ConfigError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "velocity_interval"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_boundaries_rejected() {
        let degenerate = BoundaryConfig::Circle {
            center: GeoPoint::new(0.0, 0.0),
            radius: 0.0,
        };
        assert!(matches!(degenerate.to_boundary(), Err(ConfigError::InvalidBoundary { .. })));

        let out_of_range = BoundaryConfig::Polygon {
            vertices: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(95.0, 0.0), GeoPoint::new(0.0, 1.0)],
        };
        assert!(matches!(out_of_range.to_boundary(), Err(ConfigError::InvalidBoundary { .. })));
    }

    #[test]
    fn test_duplicate_boundaries_rejected() {
        let config = LocationConfig {
            boundaries: vec![square(), square()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter { .. })));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("location.json");

        let config = LocationConfig {
            position_interval: 10,
            boundaries: vec![square()],
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = LocationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = LocationConfig::load_from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
