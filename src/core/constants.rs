//! Physical constants and system parameters

/// WGS84 semi-major axis (meters)
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// WGS84 semi-minor axis (meters)
pub const WGS84_SEMI_MINOR_AXIS: f64 = 6356752.314245;

/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// Iteration cap for the Vincenty inverse solution
pub const VINCENTY_MAX_ITERATIONS: u32 = 100;

/// Lambda convergence threshold for the Vincenty inverse solution (radians)
pub const VINCENTY_CONVERGENCE: f64 = 1e-12;

/// Shortest update interval a stream accepts (seconds)
pub const MIN_UPDATE_INTERVAL: u32 = 1;

/// Longest update interval a stream accepts (seconds)
pub const MAX_UPDATE_INTERVAL: u32 = 120;

/// Age after which the fused position yields to a lower-priority source (seconds)
pub const FUSION_EXPIRATION_SECS: i64 = 9;
