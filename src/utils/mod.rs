//! Configuration files and the settings store interface

pub mod config;
pub mod settings;

pub use config::{BoundaryConfig, ConfigError, GeoPoint, LocationConfig};
pub use settings::{keys, MemorySettings, NotifyCallback, NotifyHandle, SettingsStore, SharedSettings};
