//! Error classification shared by providers, backends and the fusion engine

use thiserror::Error;

/// Error kinds surfaced by location operations.
///
/// Success is represented by `Ok(_)`; geometry and throttling never produce
/// these at runtime, only provider-facing operations do.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationError {
    /// Invalid or missing argument
    #[error("invalid parameter")]
    Parameter,
    /// Provider or module absent, or not running
    #[error("location service not available")]
    NotAvailable,
    /// Operation not implemented by this provider type
    #[error("operation not supported")]
    NotSupported,
    /// Relevant device toggle is disabled
    #[error("location setting is off")]
    SettingOff,
    /// Access policy denied the request
    #[error("security denied")]
    SecurityDenied,
    /// Network positioning needs a connection that is not there
    #[error("network not connected")]
    NetworkNotConnected,
    /// Unclassified failure, including numeric non-convergence
    #[error("unknown location error")]
    Unknown,
}

/// Result type for location operations
pub type LocationResult<T> = Result<T, LocationError>;

impl LocationError {
    /// Collapse the failures of several providers into one error.
    ///
    /// `SecurityDenied` wins if any provider reported it, `SettingOff` only if
    /// every provider reported it, everything else is `NotAvailable`.
    pub fn aggregate(errors: &[LocationError]) -> LocationError {
        if errors.contains(&LocationError::SecurityDenied) {
            LocationError::SecurityDenied
        } else if !errors.is_empty() && errors.iter().all(|e| *e == LocationError::SettingOff) {
            LocationError::SettingOff
        } else {
            LocationError::NotAvailable
        }
    }
}
