//! Hybrid provider: fuses GPS and WPS into one stream
//!
//! Both children run their own dispatcher and bus. The hybrid listens to the
//! children's already-dispatched events, decides which child is
//! authoritative and re-runs the winning data through its own dispatcher, so
//! fused throttling and zone state never alias a child's.
//!
//! Priority: GPS always wins when it produces a value. WPS is only used while
//! it is the current method, which it becomes once the fused position is more
//! than [`FUSION_EXPIRATION_SECS`] older than a WPS position.
//!
//! Only fresh child data takes part in arbitration: an update no newer than
//! the last one accepted from the same child and stream is dropped. Child
//! keepalives re-send old fixes and never reclaim the fused stream.

use crate::algorithms::Boundary;
use crate::api::events::{EventBus, EventCallback, LocationEvent, LocationUpdate, SubscriptionHandle};
use crate::api::provider::LocationProvider;
use crate::api::service::LocationService;
use crate::backend::{ProviderMethod, ProviderRegistry};
use crate::core::{
    Accuracy, Coordinate, FixStatus, LocationError, LocationResult, SatelliteView, StreamKind, Timestamped,
    Velocity, FUSION_EXPIRATION_SECS,
};
use crate::processing::{KeepaliveTimers, UpdateDispatcher};
use crate::utils::settings::{keys, SharedSettings, STATE_SEARCHING};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};

/// Source currently feeding the fused stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMethod {
    /// No child provider could be constructed
    None,
    /// Idle, no authoritative source yet
    Hybrid,
    Gps,
    Wps,
}

impl From<ProviderMethod> for ActiveMethod {
    fn from(method: ProviderMethod) -> Self {
        match method {
            ProviderMethod::Gps => ActiveMethod::Gps,
            ProviderMethod::Wps => ActiveMethod::Wps,
            ProviderMethod::Hybrid | ProviderMethod::Cps => ActiveMethod::Hybrid,
        }
    }
}

/// Arbitration state of the hybrid provider
#[derive(Debug, Clone)]
pub struct FusionState {
    pub method: ActiveMethod,
    pub gps_enabled: bool,
    pub wps_enabled: bool,
    pub position: Option<(Coordinate, Accuracy)>,
    pub velocity: Option<(Velocity, Accuracy)>,
    pub satellite: Option<SatelliteView>,
}

impl FusionState {
    fn new(method: ActiveMethod) -> Self {
        Self {
            method,
            gps_enabled: false,
            wps_enabled: false,
            position: None,
            velocity: None,
            satellite: None,
        }
    }

    fn any_enabled(&self) -> bool {
        self.gps_enabled || self.wps_enabled
    }

    fn is_authoritative(&self, source: ProviderMethod) -> bool {
        match source {
            ProviderMethod::Gps => true,
            ProviderMethod::Wps => self.method == ActiveMethod::Wps,
            _ => false,
        }
    }

    /// A missing fused position counts as expired
    fn fused_position_expired(&self, candidate: &Coordinate) -> bool {
        match &self.position {
            None => true,
            Some((fused, _)) => candidate.timestamp().saturating_sub(fused.timestamp()) > FUSION_EXPIRATION_SECS,
        }
    }
}

struct Child {
    method: ProviderMethod,
    provider: LocationProvider,
    subscription: SubscriptionHandle,
}

pub struct HybridProvider {
    children: Vec<Child>,
    child_events: Receiver<(ProviderMethod, LocationEvent)>,
    settings: SharedSettings,
    dispatcher: UpdateDispatcher,
    bus: EventBus,
    keepalive: KeepaliveTimers,
    state: FusionState,
    /// Newest timestamp accepted per child and stream
    accepted: HashMap<(ProviderMethod, StreamKind), i64>,
    running: bool,
}

impl HybridProvider {
    /// Build GPS and WPS children from `registry`. A child whose backend
    /// cannot be created is skipped.
    pub fn new(registry: &ProviderRegistry, settings: SharedSettings) -> Self {
        let (tx, child_events) = mpsc::channel();
        let mut children = Vec::new();

        for method in [ProviderMethod::Gps, ProviderMethod::Wps] {
            let backend = match registry.create(method) {
                Ok(backend) => backend,
                Err(err) => {
                    tracing::warn!(method = %method, %err, "Hybrid child unavailable");
                    continue;
                }
            };
            let mut provider = LocationProvider::new(backend, settings.clone());
            let tx = tx.clone();
            let subscription = provider.subscribe(Box::new(move |event: &LocationEvent| {
                let _ = tx.send((method, event.clone()));
            }));
            children.push(Child {
                method,
                provider,
                subscription,
            });
        }

        let method = if children.is_empty() {
            ActiveMethod::None
        } else {
            ActiveMethod::Hybrid
        };
        tracing::debug!(children = children.len(), "Hybrid provider created");

        Self {
            children,
            child_events,
            settings,
            dispatcher: UpdateDispatcher::new(),
            bus: EventBus::new(),
            keepalive: KeepaliveTimers::new(),
            state: FusionState::new(method),
            accepted: HashMap::new(),
            running: false,
        }
    }

    pub fn state(&self) -> &FusionState {
        &self.state
    }

    pub fn active_method(&self) -> ActiveMethod {
        self.state.method
    }

    pub fn has_child(&self, method: ProviderMethod) -> bool {
        self.children.iter().any(|c| c.method == method)
    }

    /// Arbitrate one event published by a child
    pub fn handle_child_event(&mut self, source: ProviderMethod, event: LocationEvent) {
        if !self.running {
            return;
        }
        match event {
            LocationEvent::ServiceEnabled(status) => self.on_child_enabled(source, true, status),
            LocationEvent::ServiceDisabled => self.on_child_enabled(source, false, FixStatus::NoFix),
            LocationEvent::Updated(update) => self.on_child_update(source, update),
            // Fused zones are evaluated on the fused stream only
            LocationEvent::ZoneIn { .. } | LocationEvent::ZoneOut { .. } => {}
        }
    }

    fn on_child_enabled(&mut self, source: ProviderMethod, enabled: bool, status: FixStatus) {
        match source {
            ProviderMethod::Gps => self.state.gps_enabled = enabled,
            ProviderMethod::Wps => self.state.wps_enabled = enabled,
            _ => return,
        }

        let any_enabled = self.state.any_enabled();
        if !any_enabled {
            self.set_method(ActiveMethod::Hybrid);
        }
        if let Some(event) = self.dispatcher.on_enabled_changed(any_enabled, status) {
            tracing::info!(enabled = any_enabled, ?status, "Hybrid service state changed");
            if any_enabled {
                self.arm_keepalive();
            } else {
                self.keepalive.cancel_all();
            }
            self.bus.publish(&event);
        }
    }

    fn on_child_update(&mut self, source: ProviderMethod, update: LocationUpdate) {
        if update.timestamp() == 0 || !self.accept_fresh(source, &update) {
            return;
        }

        if let LocationUpdate::Satellite(view) = update {
            // Satellites bypass arbitration; only GPS has them
            if source == ProviderMethod::Gps {
                self.state.satellite = Some(view.clone());
                if let Some(event) = self.dispatcher.on_satellite(view, true) {
                    self.bus.publish(&event);
                }
            }
            return;
        }

        if self.is_searching(source) {
            tracing::debug!(method = %source, "Update dropped, provider still searching");
            return;
        }

        if self.state.is_authoritative(source) {
            self.set_method(source.into());
            match update {
                LocationUpdate::Position { position, accuracy } => {
                    self.state.position = Some((position, accuracy));
                    for event in self.dispatcher.on_position(position, accuracy) {
                        self.bus.publish(&event);
                    }
                }
                LocationUpdate::Velocity { velocity, accuracy } => {
                    self.state.velocity = Some((velocity, accuracy));
                    if let Some(event) = self.dispatcher.on_velocity(velocity, accuracy) {
                        self.bus.publish(&event);
                    }
                }
                LocationUpdate::Satellite(_) => {}
            }
        } else if let LocationUpdate::Position { position, .. } = update {
            // Promote only; the next update from this source is emitted
            if self.state.fused_position_expired(&position) {
                self.set_method(source.into());
            }
        }
    }

    /// Record `update` as the newest from `source`, or reject a repeat
    fn accept_fresh(&mut self, source: ProviderMethod, update: &LocationUpdate) -> bool {
        let timestamp = update.timestamp();
        let newest = self.accepted.entry((source, update.kind())).or_insert(i64::MIN);
        if timestamp <= *newest {
            tracing::trace!(method = %source, timestamp, "Repeated child update dropped");
            return false;
        }
        *newest = timestamp;
        true
    }

    fn is_searching(&self, source: ProviderMethod) -> bool {
        let key = match source {
            ProviderMethod::Gps => keys::GPS_STATE,
            ProviderMethod::Wps => keys::WPS_STATE,
            _ => return false,
        };
        self.settings
            .borrow()
            .get_int(key)
            .map_or(false, |state| state == STATE_SEARCHING)
    }

    fn set_method(&mut self, method: ActiveMethod) {
        if self.state.method != method {
            tracing::info!(from = ?self.state.method, to = ?method, "Fusion method changed");
            self.state.method = method;
        }
    }

    fn arm_keepalive(&mut self) {
        for kind in [StreamKind::Position, StreamKind::Velocity] {
            self.keepalive.arm(kind, self.dispatcher.interval(kind));
        }
        if self.has_child(ProviderMethod::Gps) {
            self.keepalive
                .arm(StreamKind::Satellite, self.dispatcher.interval(StreamKind::Satellite));
        }
    }

    fn fused<T>(&self, value: Option<T>) -> LocationResult<T> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }
        value.ok_or(LocationError::NotAvailable)
    }
}

impl LocationService for HybridProvider {
    fn method(&self) -> ProviderMethod {
        ProviderMethod::Hybrid
    }

    /// Succeeds when at least one child starts
    fn start(&mut self) -> LocationResult<()> {
        if self.running {
            return Ok(());
        }
        if self.children.is_empty() {
            return Err(LocationError::NotAvailable);
        }

        let mut errors = Vec::new();
        for child in self.children.iter_mut() {
            if let Err(err) = child.provider.start() {
                tracing::debug!(method = %child.method, %err, "Hybrid child failed to start");
                errors.push(err);
            }
        }
        if errors.len() == self.children.len() {
            let err = LocationError::aggregate(&errors);
            tracing::warn!(%err, "No hybrid child could start");
            return Err(err);
        }

        self.running = true;
        self.accepted.clear();
        self.set_method(ActiveMethod::Hybrid);
        tracing::info!(started = self.children.len() - errors.len(), "Hybrid provider started");
        Ok(())
    }

    /// Succeeds when at least one child stops
    fn stop(&mut self) -> LocationResult<()> {
        if !self.running {
            return Err(LocationError::NotAvailable);
        }

        let mut errors = Vec::new();
        for child in self.children.iter_mut() {
            if let Err(err) = child.provider.stop() {
                errors.push(err);
            }
        }
        // Child shutdown events are not arbitrated
        while self.child_events.try_recv().is_ok() {}

        self.running = false;
        self.keepalive.cancel_all();
        self.state.gps_enabled = false;
        self.state.wps_enabled = false;
        self.set_method(ActiveMethod::Hybrid);
        if let Some(event) = self.dispatcher.on_enabled_changed(false, FixStatus::NoFix) {
            self.bus.publish(&event);
        }

        if errors.len() == self.children.len() {
            return Err(LocationError::aggregate(&errors));
        }
        tracing::info!("Hybrid provider stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    fn process(&mut self, now: i64) {
        for child in self.children.iter_mut() {
            child.provider.process(now);
        }
        while let Ok((source, event)) = self.child_events.try_recv() {
            self.handle_child_event(source, event);
        }
        for kind in self.keepalive.poll(now) {
            if let Some(event) = self.dispatcher.keepalive(kind, now) {
                self.bus.publish(&event);
            }
        }
    }

    /// Applies to the fused stream; children keep the minimum interval so
    /// arbitration sees every fix.
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
        self.fused(self.state.position)
    }

    fn get_velocity(&mut self) -> LocationResult<(Velocity, Accuracy)> {
        self.fused(self.state.velocity)
    }

    fn get_satellite(&mut self) -> LocationResult<SatelliteView> {
        self.fused(self.state.satellite.clone())
    }

    /// Newest last-known position of any child
    fn get_last_position(&mut self) -> LocationResult<(Coordinate, Accuracy)> {
        self.children
            .iter_mut()
            .filter_map(|child| child.provider.get_last_position().ok())
            .max_by_key(|(position, _)| position.timestamp())
            .ok_or(LocationError::NotAvailable)
    }
}

impl Drop for HybridProvider {
    fn drop(&mut self) {
        for child in self.children.iter_mut() {
            if let Err(err) = child.provider.unsubscribe(child.subscription) {
                tracing::debug!(method = %child.method, %err, "Hybrid child subscription already removed");
            }
        }
    }
}
