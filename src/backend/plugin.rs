//! Provider backend trait and the reports it delivers

use crate::core::{Accuracy, Coordinate, FixStatus, LocationError, LocationResult, SatelliteView, Velocity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positioning method a provider implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMethod {
    /// GPS and WPS fused into one stream
    Hybrid,
    /// Satellite positioning
    Gps,
    /// Wi-Fi positioning
    Wps,
    /// Cell positioning
    Cps,
}

impl ProviderMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderMethod::Hybrid => "hybrid",
            ProviderMethod::Gps => "gps",
            ProviderMethod::Wps => "wps",
            ProviderMethod::Cps => "cps",
        }
    }

    /// Only satellite positioning produces satellite views
    pub fn reports_satellites(&self) -> bool {
        matches!(self, ProviderMethod::Gps)
    }
}

impl fmt::Display for ProviderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One asynchronous delivery from a backend. Every report carries the
/// backend's current enabled flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum BackendReport {
    Status {
        enabled: bool,
        status: FixStatus,
    },
    Position {
        enabled: bool,
        position: Coordinate,
        velocity: Velocity,
        accuracy: Accuracy,
    },
    Satellite {
        enabled: bool,
        satellite: SatelliteView,
    },
}

impl BackendReport {
    pub fn enabled(&self) -> bool {
        match self {
            BackendReport::Status { enabled, .. }
            | BackendReport::Position { enabled, .. }
            | BackendReport::Satellite { enabled, .. } => *enabled,
        }
    }
}

/// Interface every positioning backend implements.
///
/// Reports are pulled with [`ProviderBackend::poll_report`]; a backend may
/// still hand out reports that were queued before `stop` returned.
pub trait ProviderBackend {
    /// Method this backend implements
    fn method(&self) -> ProviderMethod;

    /// Begin producing reports
    fn start(&mut self) -> LocationResult<()>;

    /// Stop producing reports
    fn stop(&mut self) -> LocationResult<()>;

    /// Next pending report, if any (non-blocking)
    fn poll_report(&mut self) -> Option<BackendReport>;

    fn get_position(&mut self) -> LocationResult<(Coordinate, Accuracy)>;

    fn get_velocity(&mut self) -> LocationResult<(Velocity, Accuracy)>;

    fn get_satellite(&mut self) -> LocationResult<SatelliteView> {
        Err(LocationError::NotSupported)
    }

    /// Last known position, available even while stopped
    fn get_last_position(&mut self) -> LocationResult<(Coordinate, Accuracy)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(ProviderMethod::Gps.to_string(), "gps");
        assert_eq!(ProviderMethod::Hybrid.name(), "hybrid");
        assert!(ProviderMethod::Gps.reports_satellites());
        assert!(!ProviderMethod::Wps.reports_satellites());
    }

    #[test]
    fn test_report_json_shape() {
        let report: BackendReport =
            serde_json::from_str(r#"{"report": "status", "enabled": true, "status": "Fix3D"}"#).unwrap();
        assert_eq!(
            report,
            BackendReport::Status {
                enabled: true,
                status: FixStatus::Fix3D
            }
        );
        assert!(report.enabled());
    }
}
