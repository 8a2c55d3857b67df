//! Core data types for the location middleware

use serde::{Deserialize, Serialize};

/// Validity of a positioning fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FixStatus {
    #[default]
    NoFix,
    Fix2D,
    Fix3D,
}

/// Independently throttled update streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Position,
    Velocity,
    Satellite,
}

/// Anything carrying a fix timestamp (seconds). Zero means "no fix yet".
pub trait Timestamped {
    fn timestamp(&self) -> i64;
}

/// Geodetic position of a fix.
///
/// Latitude and longitude are range-checked at construction; the value is
/// immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateRecord")]
pub struct Coordinate {
    timestamp: i64,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    status: FixStatus,
}

impl Coordinate {
    /// Returns `None` when latitude or longitude is out of range.
    pub fn new(
        timestamp: i64,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        status: FixStatus,
    ) -> Option<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            timestamp,
            latitude,
            longitude,
            altitude,
            status,
        })
    }

    /// Untimed 2D point, used for boundary vertices and centroids
    pub fn point(latitude: f64, longitude: f64) -> Option<Self> {
        Self::new(0, latitude, longitude, 0.0, FixStatus::Fix2D)
    }

    /// Placeholder emitted before any real fix exists
    pub fn zero() -> Self {
        Self {
            timestamp: 0,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            status: FixStatus::NoFix,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn status(&self) -> FixStatus {
        self.status
    }

    /// Same place on the ellipsoid: latitude, longitude and altitude match.
    /// Timestamp and fix status are ignored.
    pub fn same_location(&self, other: &Coordinate) -> bool {
        self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.altitude == other.altitude
    }
}

impl Timestamped for Coordinate {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[derive(Deserialize)]
struct CoordinateRecord {
    #[serde(default)]
    timestamp: i64,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: f64,
    #[serde(default)]
    status: FixStatus,
}

impl TryFrom<CoordinateRecord> for Coordinate {
    type Error = String;

    fn try_from(record: CoordinateRecord) -> Result<Self, Self::Error> {
        Coordinate::new(
            record.timestamp,
            record.latitude,
            record.longitude,
            record.altitude,
            record.status,
        )
        .ok_or_else(|| {
            format!(
                "coordinate out of range: latitude {}, longitude {}",
                record.latitude, record.longitude
            )
        })
    }
}

/// Ground speed, heading and vertical rate of a fix
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub timestamp: i64,
    /// km/h
    pub speed: f64,
    /// degrees from true north
    pub direction: f64,
    /// km/h, positive upwards
    pub climb: f64,
}

impl Velocity {
    pub fn new(timestamp: i64, speed: f64, direction: f64, climb: f64) -> Self {
        Self {
            timestamp,
            speed,
            direction,
            climb,
        }
    }
}

// Two velocities are equal when everything but the timestamp matches
impl PartialEq for Velocity {
    fn eq(&self, other: &Self) -> bool {
        self.speed == other.speed && self.direction == other.direction && self.climb == other.climb
    }
}

impl Timestamped for Velocity {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Coarse accuracy classification reported by providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccuracyLevel {
    #[default]
    None,
    Country,
    Region,
    Locality,
    PostalCode,
    Street,
    Detailed,
}

/// Accuracy estimate attached to position and velocity updates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accuracy {
    pub level: AccuracyLevel,
    /// meters
    pub horizontal: f64,
    /// meters
    pub vertical: f64,
}

impl Accuracy {
    pub fn new(level: AccuracyLevel, horizontal: f64, vertical: f64) -> Self {
        Self {
            level,
            horizontal,
            vertical,
        }
    }
}

/// One tracked satellite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    pub prn: u32,
    pub used: bool,
    /// degrees
    pub elevation: u32,
    /// degrees
    pub azimuth: u32,
    /// dB-Hz
    pub snr: i32,
}

/// Satellites in view at one instant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SatelliteView {
    pub timestamp: i64,
    pub in_view: u32,
    pub in_use: u32,
    pub satellites: Vec<Satellite>,
}

impl SatelliteView {
    /// Build a view whose counts are derived from the satellite list
    pub fn from_satellites(timestamp: i64, satellites: Vec<Satellite>) -> Self {
        let in_use = satellites.iter().filter(|s| s.used).count() as u32;
        Self {
            timestamp,
            in_view: satellites.len() as u32,
            in_use,
            satellites,
        }
    }
}

impl Timestamped for SatelliteView {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_range_checks() {
        assert!(Coordinate::new(1, 90.0, 180.0, 0.0, FixStatus::Fix3D).is_some());
        assert!(Coordinate::new(1, -90.0, -180.0, 0.0, FixStatus::Fix3D).is_some());
        assert!(Coordinate::new(1, 90.5, 0.0, 0.0, FixStatus::Fix3D).is_none());
        assert!(Coordinate::new(1, 0.0, -180.1, 0.0, FixStatus::Fix3D).is_none());
        assert!(Coordinate::new(1, f64::NAN, 0.0, 0.0, FixStatus::Fix3D).is_none());
    }

    #[test]
    fn test_same_location_ignores_time_and_status() {
        let a = Coordinate::new(10, 37.5, 127.0, 30.0, FixStatus::Fix3D).unwrap();
        let b = Coordinate::new(99, 37.5, 127.0, 30.0, FixStatus::Fix2D).unwrap();
        let c = Coordinate::new(10, 37.5, 127.0, 31.0, FixStatus::Fix3D).unwrap();
        assert!(a.same_location(&b));
        assert!(!a.same_location(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_velocity_equality_ignores_timestamp() {
        let a = Velocity::new(1, 10.0, 90.0, 0.5);
        let b = Velocity::new(2, 10.0, 90.0, 0.5);
        let c = Velocity::new(1, 11.0, 90.0, 0.5);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_coordinate_deserialization_validates() {
        let ok: Result<Coordinate, _> =
            serde_json::from_str(r#"{"timestamp": 5, "latitude": 10.0, "longitude": 20.0}"#);
        let ok = ok.unwrap();
        assert_eq!(ok.timestamp(), 5);
        assert_eq!(ok.status(), FixStatus::NoFix);

        let bad: Result<Coordinate, _> =
            serde_json::from_str(r#"{"latitude": 100.0, "longitude": 20.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_satellite_view_counts() {
        let view = SatelliteView::from_satellites(
            7,
            vec![
                Satellite { prn: 1, used: true, elevation: 45, azimuth: 120, snr: 40 },
                Satellite { prn: 2, used: false, elevation: 10, azimuth: 300, snr: 18 },
            ],
        );
        assert_eq!(view.in_view, 2);
        assert_eq!(view.in_use, 1);
    }
}
