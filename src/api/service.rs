//! Common provider interface and the `Location` facade

use crate::algorithms::Boundary;
use crate::api::events::{EventCallback, SubscriptionHandle};
use crate::api::hybrid::HybridProvider;
use crate::api::provider::LocationProvider;
use crate::backend::{ProviderMethod, ProviderRegistry};
use crate::core::{Accuracy, Coordinate, LocationError, LocationResult, SatelliteView, StreamKind, Velocity};
use crate::utils::config::{ConfigError, LocationConfig};
use crate::utils::settings::SharedSettings;
use std::ops::{Deref, DerefMut};

/// Operations shared by single-backend and hybrid providers.
///
/// Everything runs on the caller's thread: `process` pulls pending backend
/// reports, applies setting changes and fires due keepalive timers.
pub trait LocationService {
    fn method(&self) -> ProviderMethod;

    fn start(&mut self) -> LocationResult<()>;

    fn stop(&mut self) -> LocationResult<()>;

    fn is_running(&self) -> bool;

    /// Whether the service currently reports itself enabled
    fn is_enabled(&self) -> bool;

    /// Drive the provider; `now` is the current time in seconds
    fn process(&mut self, now: i64);

    /// Returns the interval actually applied
    fn set_interval(&mut self, kind: StreamKind, seconds: u32) -> u32;

    fn interval(&self, kind: StreamKind) -> u32;

    fn add_boundary(&mut self, boundary: Boundary) -> LocationResult<()>;

    fn remove_boundary(&mut self, boundary: &Boundary) -> LocationResult<Boundary>;

    fn boundaries(&self) -> Vec<Boundary>;

    fn subscribe(&mut self, callback: EventCallback) -> SubscriptionHandle;

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> LocationResult<()>;

    fn get_position(&mut self) -> LocationResult<(Coordinate, Accuracy)>;

    fn get_velocity(&mut self) -> LocationResult<(Velocity, Accuracy)>;

    fn get_satellite(&mut self) -> LocationResult<SatelliteView>;

    fn get_last_position(&mut self) -> LocationResult<(Coordinate, Accuracy)>;

    /// Apply intervals and register every configured boundary. Nothing is
    /// changed when any boundary is already registered.
    fn apply_config(&mut self, config: &LocationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let boundaries = config.build_boundaries()?;
        let registered = self.boundaries();
        if let Some(index) = boundaries.iter().position(|b| registered.contains(b)) {
            return Err(ConfigError::InvalidParameter {
                parameter: "boundaries".to_string(),
                value: index.to_string(),
                reason: "Boundary already registered".to_string(),
            });
        }

        for kind in [StreamKind::Position, StreamKind::Velocity, StreamKind::Satellite] {
            self.set_interval(kind, config.interval(kind));
        }
        for (index, boundary) in boundaries.into_iter().enumerate() {
            self.add_boundary(boundary).map_err(|err| ConfigError::InvalidParameter {
                parameter: "boundaries".to_string(),
                value: index.to_string(),
                reason: format!("Boundary rejected by provider: {}", err),
            })?;
        }
        tracing::debug!(
            method = %self.method(),
            boundaries = config.boundaries.len(),
            "Configuration applied"
        );
        Ok(())
    }
}

/// Entry point for applications: a provider of the requested method
pub struct Location {
    inner: Box<dyn LocationService>,
}

impl Location {
    pub fn new(method: ProviderMethod, registry: &ProviderRegistry, settings: SharedSettings) -> LocationResult<Self> {
        if !registry.supports(method) {
            return Err(LocationError::NotSupported);
        }
        let inner: Box<dyn LocationService> = match method {
            ProviderMethod::Hybrid => Box::new(HybridProvider::new(registry, settings)),
            _ => Box::new(LocationProvider::new(registry.create(method)?, settings)),
        };
        tracing::info!(method = %method, "Location service created");
        Ok(Self { inner })
    }
}

impl Deref for Location {
    type Target = dyn LocationService;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for Location {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::{event_channel, LocationEvent, LocationUpdate};
    use crate::backend::{MockBackend, MockHandle};
    use crate::core::FixStatus;
    use crate::utils::config::{BoundaryConfig, GeoPoint};
    use crate::utils::settings::MemorySettings;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (ProviderRegistry, MockHandle, SharedSettings) {
        let (_, gps) = MockBackend::new(ProviderMethod::Gps);
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderMethod::Gps, gps.factory()).unwrap();
        let settings: SharedSettings = Rc::new(RefCell::new(MemorySettings::all_enabled()));
        (registry, gps, settings)
    }

    fn config() -> LocationConfig {
        LocationConfig {
            position_interval: 10,
            velocity_interval: 0,
            satellite_interval: 30,
            boundaries: vec![BoundaryConfig::Circle {
                center: GeoPoint::new(37.5, 127.0),
                radius: 200.0,
            }],
        }
    }

    #[test]
    fn test_unsupported_method() {
        let (registry, _, settings) = setup();
        assert_eq!(
            Location::new(ProviderMethod::Cps, &registry, settings).err(),
            Some(LocationError::NotSupported)
        );
    }

    #[test]
    fn test_facade_chooses_provider() {
        let (registry, _, settings) = setup();
        let single = Location::new(ProviderMethod::Gps, &registry, settings.clone()).unwrap();
        assert_eq!(single.method(), ProviderMethod::Gps);

        let hybrid = Location::new(ProviderMethod::Hybrid, &registry, settings).unwrap();
        assert_eq!(hybrid.method(), ProviderMethod::Hybrid);
    }

    #[test]
    fn test_apply_config() {
        let (registry, _, settings) = setup();
        let mut location = Location::new(ProviderMethod::Gps, &registry, settings).unwrap();
        location.apply_config(&config()).unwrap();

        assert_eq!(location.interval(StreamKind::Position), 10);
        assert_eq!(location.interval(StreamKind::Velocity), 1);
        assert_eq!(location.interval(StreamKind::Satellite), 30);
        assert_eq!(location.boundaries().len(), 1);

        // Same boundary again is a duplicate
        assert!(matches!(
            location.apply_config(&config()),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejected_config_changes_nothing() {
        let (registry, _, settings) = setup();
        let mut location = Location::new(ProviderMethod::Gps, &registry, settings).unwrap();
        location.apply_config(&config()).unwrap();

        let mut update = config();
        update.position_interval = 60;
        update.boundaries.insert(
            0,
            BoundaryConfig::Circle {
                center: GeoPoint::new(35.0, 129.0),
                radius: 500.0,
            },
        );
        match location.apply_config(&update) {
            Err(ConfigError::InvalidParameter { value, .. }) => assert_eq!(value, "1"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(location.interval(StreamKind::Position), 10);
        assert_eq!(location.boundaries().len(), 1);
    }

    #[test]
    fn test_end_to_end_through_facade() {
        let (registry, gps, settings) = setup();
        let mut location = Location::new(ProviderMethod::Hybrid, &registry, settings).unwrap();
        location.apply_config(&config()).unwrap();
        let (callback, events) = event_channel();
        location.subscribe(callback);
        location.start().unwrap();

        let inside = Coordinate::new(5, 37.5, 127.0, 0.0, FixStatus::Fix3D).unwrap();
        gps.push_fix(inside, Velocity::new(5, 1.0, 0.0, 0.0), Accuracy::default());
        location.process(5);

        let received: Vec<LocationEvent> = events.try_iter().collect();
        assert_eq!(received[0], LocationEvent::ServiceEnabled(FixStatus::Fix3D));
        assert!(received
            .iter()
            .any(|e| matches!(e, LocationEvent::Updated(LocationUpdate::Position { .. }))));
        assert!(received.iter().any(|e| matches!(e, LocationEvent::ZoneIn { .. })));
        assert_eq!(location.get_position().unwrap().0, inside);

        location.stop().unwrap();
        assert!(!location.is_running());
    }
}
