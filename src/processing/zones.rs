//! Boundary registrations and zone transition detection

use crate::algorithms::Boundary;
use crate::api::events::LocationEvent;
use crate::core::{Accuracy, Coordinate, LocationError, LocationResult};

/// Last known relation between the tracked position and a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStatus {
    Unknown,
    Inside,
    Outside,
}

/// A boundary together with its zone status for one provider
#[derive(Debug, Clone)]
pub struct BoundaryRegistration {
    boundary: Boundary,
    status: ZoneStatus,
}

impl BoundaryRegistration {
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }
}

/// Boundaries registered with one provider
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    registrations: Vec<BoundaryRegistration>,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boundary with unknown status. Structural duplicates are refused.
    pub fn register(&mut self, boundary: Boundary) -> LocationResult<()> {
        if self.registrations.iter().any(|r| r.boundary == boundary) {
            return Err(LocationError::Parameter);
        }
        self.registrations.push(BoundaryRegistration {
            boundary,
            status: ZoneStatus::Unknown,
        });
        Ok(())
    }

    /// Remove the first registration structurally equal to `boundary`
    pub fn unregister(&mut self, boundary: &Boundary) -> LocationResult<Boundary> {
        let index = self
            .registrations
            .iter()
            .position(|r| r.boundary == *boundary)
            .ok_or(LocationError::Parameter)?;
        Ok(self.registrations.remove(index).boundary)
    }

    pub fn registrations(&self) -> &[BoundaryRegistration] {
        &self.registrations
    }

    pub fn boundaries(&self) -> Vec<Boundary> {
        self.registrations.iter().map(|r| r.boundary.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Test `position` against every boundary and report status changes
    pub fn evaluate(&mut self, position: &Coordinate, accuracy: &Accuracy) -> Vec<LocationEvent> {
        let mut events = Vec::new();
        for registration in self.registrations.iter_mut() {
            let status = if registration.boundary.contains(position) {
                ZoneStatus::Inside
            } else {
                ZoneStatus::Outside
            };
            if status == registration.status {
                continue;
            }
            registration.status = status;

            tracing::debug!(
                boundary = ?registration.boundary.kind(),
                ?status,
                latitude = position.latitude(),
                longitude = position.longitude(),
                "Zone status changed"
            );
            let boundary = registration.boundary.clone();
            events.push(match status {
                ZoneStatus::Inside => LocationEvent::ZoneIn {
                    boundary,
                    position: *position,
                    accuracy: *accuracy,
                },
                _ => LocationEvent::ZoneOut {
                    boundary,
                    position: *position,
                    accuracy: *accuracy,
                },
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixStatus;

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(1, lat, lon, 0.0, FixStatus::Fix3D).unwrap()
    }

    fn square() -> Boundary {
        Boundary::rect(pt(10.0, 0.0), pt(0.0, 10.0)).unwrap()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut zones = ZoneSet::new();
        zones.register(square()).unwrap();
        assert_eq!(zones.register(square()), Err(LocationError::Parameter));
        assert_eq!(zones.len(), 1);
    }

    #[test]
    fn test_unregister_last_leaves_empty_set() {
        let mut zones = ZoneSet::new();
        zones.register(square()).unwrap();
        let removed = zones.unregister(&square()).unwrap();
        assert_eq!(removed, square());
        assert!(zones.is_empty());
        assert!(zones.boundaries().is_empty());
        assert_eq!(zones.unregister(&square()), Err(LocationError::Parameter));
    }

    #[test]
    fn test_unregister_polygon_by_rotation() {
        let ring = vec![pt(0.0, 0.0), pt(0.0, 5.0), pt(5.0, 5.0), pt(5.0, 0.0)];
        let mut rotated = ring.clone();
        rotated.rotate_left(2);

        let mut zones = ZoneSet::new();
        zones.register(Boundary::polygon(ring).unwrap()).unwrap();
        zones.unregister(&Boundary::polygon(rotated).unwrap()).unwrap();
        assert!(zones.is_empty());
    }

    #[test]
    fn test_zone_events_alternate() {
        let mut zones = ZoneSet::new();
        zones.register(square()).unwrap();
        let acc = Accuracy::default();

        let track = [
            pt(5.0, 5.0),
            pt(6.0, 6.0),
            pt(20.0, 5.0),
            pt(21.0, 5.0),
            pt(5.0, 5.0),
            pt(-5.0, 5.0),
        ];
        let kinds: Vec<&str> = track
            .iter()
            .flat_map(|p| zones.evaluate(p, &acc))
            .map(|e| match e {
                LocationEvent::ZoneIn { .. } => "in",
                LocationEvent::ZoneOut { .. } => "out",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["in", "out", "in", "out"]);
        assert_eq!(zones.registrations()[0].status(), ZoneStatus::Outside);
    }

    #[test]
    fn test_first_evaluation_reports_outside() {
        let mut zones = ZoneSet::new();
        zones.register(square()).unwrap();
        let events = zones.evaluate(&pt(50.0, 50.0), &Accuracy::default());
        assert!(matches!(events.as_slice(), [LocationEvent::ZoneOut { .. }]));
    }
}
