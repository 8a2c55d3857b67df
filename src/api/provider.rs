//! Provider driving a single positioning backend

use crate::algorithms::Boundary;
use crate::api::events::{EventBus, EventCallback, LocationEvent, SubscriptionHandle};
use crate::api::service::LocationService;
use crate::backend::{BackendReport, ProviderBackend, ProviderMethod};
use crate::core::{
    Accuracy, Coordinate, FixStatus, LocationError, LocationResult, SatelliteView, StreamKind, Velocity,
};
use crate::processing::{KeepaliveTimers, UpdateDispatcher};
use crate::utils::settings::{keys, NotifyHandle, SharedSettings};
use std::sync::mpsc::{self, Receiver, Sender};

/// Toggles that must be on for `method` to start
fn required_toggles(method: ProviderMethod) -> &'static [&'static str] {
    match method {
        ProviderMethod::Gps | ProviderMethod::Hybrid => &[keys::LOCATION_ENABLED],
        ProviderMethod::Wps | ProviderMethod::Cps => &[keys::LOCATION_ENABLED, keys::NETWORK_ENABLED],
    }
}

/// A location provider backed by one [`ProviderBackend`].
///
/// Raw backend reports are pulled in [`LocationProvider::process`], run
/// through the provider's own [`UpdateDispatcher`] and published on its bus.
pub struct LocationProvider {
    method: ProviderMethod,
    backend: Box<dyn ProviderBackend>,
    settings: SharedSettings,
    dispatcher: UpdateDispatcher,
    bus: EventBus,
    keepalive: KeepaliveTimers,
    running: bool,
    watches: Vec<(&'static str, NotifyHandle)>,
    changes_tx: Sender<(String, i32)>,
    changes_rx: Receiver<(String, i32)>,
}

impl LocationProvider {
    pub fn new(backend: Box<dyn ProviderBackend>, settings: SharedSettings) -> Self {
        let (changes_tx, changes_rx) = mpsc::channel();
        Self {
            method: backend.method(),
            backend,
            settings,
            dispatcher: UpdateDispatcher::new(),
            bus: EventBus::new(),
            keepalive: KeepaliveTimers::new(),
            running: false,
            watches: Vec::new(),
            changes_tx,
            changes_rx,
        }
    }

    /// Feed one backend report through the dispatcher.
    /// Reports arriving while stopped are dropped.
    pub fn handle_report(&mut self, report: BackendReport) {
        if !self.running {
            tracing::debug!(method = %self.method, "Report ignored, provider not running");
            return;
        }

        match report {
            BackendReport::Status { enabled, status } => self.set_enabled(enabled, status),
            BackendReport::Position {
                enabled,
                position,
                velocity,
                accuracy,
            } => {
                self.set_enabled(enabled, position.status());
                let events = self.dispatcher.on_position(position, accuracy);
                self.publish_all(events);
                if let Some(event) = self.dispatcher.on_velocity(velocity, accuracy) {
                    self.publish(event);
                }
            }
            BackendReport::Satellite { enabled, satellite } => {
                let status = self
                    .dispatcher
                    .last_position()
                    .map_or(FixStatus::NoFix, |(position, _)| position.status());
                self.set_enabled(enabled, status);
                let emit = self.method.reports_satellites();
                if let Some(event) = self.dispatcher.on_satellite(satellite, emit) {
                    self.publish(event);
                }
            }
        }
    }

    fn set_enabled(&mut self, enabled: bool, status: FixStatus) {
        let Some(event) = self.dispatcher.on_enabled_changed(enabled, status) else {
            return;
        };
        tracing::info!(method = %self.method, enabled, ?status, "Provider service state changed");
        if enabled {
            self.arm_keepalive();
        } else {
            self.keepalive.cancel_all();
        }
        self.publish(event);
    }

    fn arm_keepalive(&mut self) {
        for kind in [StreamKind::Position, StreamKind::Velocity] {
            self.keepalive.arm(kind, self.dispatcher.interval(kind));
        }
        if self.method.reports_satellites() {
            self.keepalive
                .arm(StreamKind::Satellite, self.dispatcher.interval(StreamKind::Satellite));
        }
    }

    fn publish(&mut self, event: LocationEvent) {
        self.bus.publish(&event);
    }

    fn publish_all(&mut self, events: Vec<LocationEvent>) {
        for event in events {
            self.bus.publish(&event);
        }
    }

    fn check_toggles(&self) -> LocationResult<()> {
        let settings = self.settings.borrow();
        for &key in required_toggles(self.method) {
            // A missing key reads as off
            if settings.get_int(key).unwrap_or(0) == 0 {
                tracing::info!(method = %self.method, key, "Location setting is off");
                return Err(LocationError::SettingOff);
            }
        }
        Ok(())
    }

    fn watch_settings(&mut self) {
        let mut settings = self.settings.borrow_mut();
        for &key in required_toggles(self.method) {
            let tx = self.changes_tx.clone();
            let callback = Box::new(move |key: &str, value: i32| {
                let _ = tx.send((key.to_string(), value));
            });
            match settings.add_notify(key, callback) {
                Ok(handle) => self.watches.push((key, handle)),
                Err(err) => tracing::warn!(method = %self.method, key, %err, "Cannot watch setting"),
            }
        }
    }

    fn unwatch_settings(&mut self) {
        if self.watches.is_empty() {
            return;
        }
        // The store may still be borrowed by a notification in progress
        let Ok(mut settings) = self.settings.try_borrow_mut() else {
            tracing::warn!(method = %self.method, "Settings store busy, watches left attached");
            return;
        };
        for (key, handle) in self.watches.drain(..) {
            if let Err(err) = settings.ignore_notify(key, handle) {
                tracing::debug!(key, %err, "Setting watch already removed");
            }
        }
        drop(settings);
        while self.changes_rx.try_recv().is_ok() {}
    }

    fn apply_setting_changes(&mut self) {
        while let Ok((key, value)) = self.changes_rx.try_recv() {
            if value == 0 && self.running {
                tracing::info!(method = %self.method, key = %key, "Setting turned off, stopping provider");
                if let Err(err) = self.stop() {
                    tracing::warn!(method = %self.method, %err, "Backend stop failed");
                }
            }
        }
    }
}

impl LocationService for LocationProvider {
    fn method(&self) -> ProviderMethod {
        self.method
    }

    /// Starting a running provider is a no-op. On failure nothing changes
    /// and no event is published.
    fn start(&mut self) -> LocationResult<()> {
        if self.running {
            return Ok(());
        }
        self.check_toggles()?;
        if let Err(err) = self.backend.start() {
            tracing::warn!(method = %self.method, %err, "Backend failed to start");
            return Err(err);
        }
        self.running = true;
        self.watch_settings();
        tracing::info!(method = %self.method, "Provider started");
        Ok(())
    }

    /// Tears down timers and watches even when the backend reports an error,
    /// which is then returned.
    fn stop(&mut self) -> LocationResult<()> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }
        let result = self.backend.stop();
        self.running = false;
        self.keepalive.cancel_all();
        self.unwatch_settings();
        if let Some(event) = self.dispatcher.on_enabled_changed(false, FixStatus::NoFix) {
            self.publish(event);
        }
        match &result {
            Ok(()) => tracing::info!(method = %self.method, "Provider stopped"),
            Err(err) => tracing::warn!(method = %self.method, %err, "Backend failed to stop cleanly"),
        }
        result
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    fn process(&mut self, now: i64) {
        self.apply_setting_changes();
        while let Some(report) = self.backend.poll_report() {
            self.handle_report(report);
        }
        for kind in self.keepalive.poll(now) {
            if let Some(event) = self.dispatcher.keepalive(kind, now) {
                tracing::trace!(method = %self.method, ?kind, "Keepalive update");
                self.publish(event);
            }
        }
    }

    fn set_interval(&mut self, kind: StreamKind, seconds: u32) -> u32 {
        let applied = self.dispatcher.set_interval(kind, seconds);
        if self.keepalive.is_armed(kind) {
            self.keepalive.arm(kind, applied);
        }
        applied
    }

    fn interval(&self, kind: StreamKind) -> u32 {
        self.dispatcher.interval(kind)
    }

    fn add_boundary(&mut self, boundary: Boundary) -> LocationResult<()> {
        self.dispatcher.register_boundary(boundary)
    }

    fn remove_boundary(&mut self, boundary: &Boundary) -> LocationResult<Boundary> {
        self.dispatcher.unregister_boundary(boundary)
    }

    fn boundaries(&self) -> Vec<Boundary> {
        self.dispatcher.zones().boundaries()
    }

    fn subscribe(&mut self, callback: EventCallback) -> SubscriptionHandle {
        self.bus.subscribe(callback)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> LocationResult<()> {
        self.bus.unsubscribe(handle)
    }

    fn get_position(&mut self) -> LocationResult<(Coordinate, Accuracy)> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }
        self.backend.get_position()
    }

    fn get_velocity(&mut self) -> LocationResult<(Velocity, Accuracy)> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }
        self.backend.get_velocity()
    }

    fn get_satellite(&mut self) -> LocationResult<SatelliteView> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }
        self.backend.get_satellite()
    }

    fn get_last_position(&mut self) -> LocationResult<(Coordinate, Accuracy)> {
        self.backend.get_last_position()
    }
}

impl Drop for LocationProvider {
    fn drop(&mut self) {
        self.unwatch_settings();
    }
}
