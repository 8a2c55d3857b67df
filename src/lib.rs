//! Location Fusion
//!
//! Client-side location middleware: geofence geometry, ellipsoidal distance,
//! throttled update dispatching with zone detection, and GPS/WPS fusion into
//! a single hybrid stream.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod backend;
pub mod api;
pub mod utils;
pub mod logging;

// Re-export commonly used types
pub use crate::core::{
    Accuracy, AccuracyLevel, Coordinate, FixStatus, LocationError, LocationResult, Satellite, SatelliteView,
    StreamKind, Timestamped, Velocity,
};
pub use crate::algorithms::{distance, Boundary, BoundaryKind};
pub use crate::processing::UpdateDispatcher;
pub use crate::backend::{BackendReport, MockBackend, MockHandle, ProviderBackend, ProviderMethod, ProviderRegistry};
pub use crate::api::{
    event_channel, ActiveMethod, EventBus, HybridProvider, Location, LocationEvent, LocationProvider,
    LocationService, LocationUpdate, SubscriptionHandle,
};
pub use crate::utils::{BoundaryConfig, ConfigError, LocationConfig, MemorySettings, SettingsStore, SharedSettings};
