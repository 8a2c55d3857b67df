//! Update dispatcher: turns raw provider data into throttled events
//!
//! One dispatcher belongs to exactly one provider (the fusing provider has its
//! own). It tracks the enabled flag, throttles the three update streams and
//! runs zone detection on every raw position. It never publishes anything
//! itself; callers hand the returned events to their bus.

use crate::algorithms::Boundary;
use crate::api::events::{LocationEvent, LocationUpdate};
use crate::core::{
    Accuracy, Coordinate, FixStatus, LocationResult, SatelliteView, StreamKind, Timestamped, Velocity,
};
use crate::processing::throttle::StreamThrottle;
use crate::processing::zones::ZoneSet;

#[derive(Debug, Clone, Default)]
pub struct UpdateDispatcher {
    enabled: bool,
    position: StreamThrottle<(Coordinate, Accuracy)>,
    velocity: StreamThrottle<(Velocity, Accuracy)>,
    satellite: StreamThrottle<SatelliteView>,
    zones: ZoneSet,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emits `ServiceEnabled`/`ServiceDisabled` only on an actual transition
    pub fn on_enabled_changed(&mut self, enabled: bool, status: FixStatus) -> Option<LocationEvent> {
        if self.enabled == enabled {
            return None;
        }
        self.enabled = enabled;
        if enabled {
            Some(LocationEvent::ServiceEnabled(status))
        } else {
            Some(LocationEvent::ServiceDisabled)
        }
    }

    /// Throttled position update plus unthrottled zone detection.
    /// A zero timestamp means "no fix yet" and is ignored entirely.
    pub fn on_position(&mut self, position: Coordinate, accuracy: Accuracy) -> Vec<LocationEvent> {
        let timestamp = position.timestamp();
        if timestamp == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.position.offer(timestamp, (position, accuracy)) {
            events.push(LocationEvent::Updated(LocationUpdate::Position { position, accuracy }));
        }
        events.extend(self.zones.evaluate(&position, &accuracy));
        events
    }

    pub fn on_velocity(&mut self, velocity: Velocity, accuracy: Accuracy) -> Option<LocationEvent> {
        let timestamp = velocity.timestamp();
        if timestamp == 0 {
            return None;
        }
        self.velocity
            .offer(timestamp, (velocity, accuracy))
            .then(|| LocationEvent::Updated(LocationUpdate::Velocity { velocity, accuracy }))
    }

    /// `emit_enabled` is false for providers that cannot report satellites;
    /// the view is still remembered.
    pub fn on_satellite(&mut self, satellite: SatelliteView, emit_enabled: bool) -> Option<LocationEvent> {
        let timestamp = satellite.timestamp();
        if timestamp == 0 {
            return None;
        }
        if !emit_enabled {
            self.satellite.record(satellite);
            return None;
        }
        if self.satellite.offer(timestamp, satellite.clone()) {
            Some(LocationEvent::Updated(LocationUpdate::Satellite(satellite)))
        } else {
            None
        }
    }

    /// Re-emit the last value of `kind` (or a zero placeholder) when the
    /// provider is enabled and the stream has been quiet for a full interval.
    pub fn keepalive(&self, kind: StreamKind, now: i64) -> Option<LocationEvent> {
        if !self.enabled {
            return None;
        }
        let update = match kind {
            StreamKind::Position if self.position.is_quiet(now) => {
                let (position, accuracy) = self
                    .position
                    .last_value()
                    .copied()
                    .unwrap_or((Coordinate::zero(), Accuracy::default()));
                LocationUpdate::Position { position, accuracy }
            }
            StreamKind::Velocity if self.velocity.is_quiet(now) => {
                let (velocity, accuracy) = self.velocity.last_value().copied().unwrap_or_default();
                LocationUpdate::Velocity { velocity, accuracy }
            }
            StreamKind::Satellite if self.satellite.is_quiet(now) => {
                LocationUpdate::Satellite(self.satellite.last_value().cloned().unwrap_or_default())
            }
            _ => return None,
        };
        Some(LocationEvent::Updated(update))
    }

    pub fn register_boundary(&mut self, boundary: Boundary) -> LocationResult<()> {
        self.zones.register(boundary)
    }

    pub fn unregister_boundary(&mut self, boundary: &Boundary) -> LocationResult<Boundary> {
        self.zones.unregister(boundary)
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn set_interval(&mut self, kind: StreamKind, seconds: u32) -> u32 {
        match kind {
            StreamKind::Position => self.position.set_interval(seconds),
            StreamKind::Velocity => self.velocity.set_interval(seconds),
            StreamKind::Satellite => self.satellite.set_interval(seconds),
        }
    }

    pub fn interval(&self, kind: StreamKind) -> u32 {
        match kind {
            StreamKind::Position => self.position.interval(),
            StreamKind::Velocity => self.velocity.interval(),
            StreamKind::Satellite => self.satellite.interval(),
        }
    }

    pub fn last_position(&self) -> Option<(Coordinate, Accuracy)> {
        self.position.last_value().copied()
    }

    pub fn last_velocity(&self) -> Option<(Velocity, Accuracy)> {
        self.velocity.last_value().copied()
    }

    pub fn last_satellite(&self) -> Option<&SatelliteView> {
        self.satellite.last_value()
    }
}
