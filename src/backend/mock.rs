//! Scripted backend for testing and the demo binary

use crate::backend::plugin::{BackendReport, ProviderBackend, ProviderMethod};
use crate::backend::registry::BackendFactory;
use crate::core::{
    Accuracy, Coordinate, FixStatus, LocationError, LocationResult, SatelliteView, Velocity,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug)]
struct MockState {
    method: ProviderMethod,
    started: bool,
    reports: VecDeque<BackendReport>,
    start_error: Option<LocationError>,
    stop_error: Option<LocationError>,
    position: Option<(Coordinate, Accuracy)>,
    velocity: Option<(Velocity, Accuracy)>,
    satellite: Option<SatelliteView>,
    last_position: Option<(Coordinate, Accuracy)>,
    start_calls: u32,
    stop_calls: u32,
}

/// Test-side handle for scripting a [`MockBackend`] after it has been moved
/// into a provider.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Rc<RefCell<MockState>>,
}

impl MockHandle {
    /// Queue a raw report; the provider picks it up on its next `process`
    pub fn push_report(&self, report: BackendReport) {
        self.state.borrow_mut().reports.push_back(report);
    }

    /// Queue an enabled position fix and make it the current/last position
    pub fn push_fix(&self, position: Coordinate, velocity: Velocity, accuracy: Accuracy) {
        let mut state = self.state.borrow_mut();
        state.position = Some((position, accuracy));
        state.velocity = Some((velocity, accuracy));
        state.last_position = Some((position, accuracy));
        state.reports.push_back(BackendReport::Position {
            enabled: true,
            position,
            velocity,
            accuracy,
        });
    }

    pub fn push_status(&self, enabled: bool, status: FixStatus) {
        self.push_report(BackendReport::Status { enabled, status });
    }

    pub fn push_satellite(&self, satellite: SatelliteView) {
        let mut state = self.state.borrow_mut();
        state.satellite = Some(satellite.clone());
        state.reports.push_back(BackendReport::Satellite {
            enabled: true,
            satellite,
        });
    }

    /// Make the next `start` calls fail with `error` (`None` clears it)
    pub fn fail_start(&self, error: Option<LocationError>) {
        self.state.borrow_mut().start_error = error;
    }

    pub fn fail_stop(&self, error: Option<LocationError>) {
        self.state.borrow_mut().stop_error = error;
    }

    pub fn set_last_position(&self, position: Coordinate, accuracy: Accuracy) {
        self.state.borrow_mut().last_position = Some((position, accuracy));
    }

    pub fn is_started(&self) -> bool {
        self.state.borrow().started
    }

    pub fn start_calls(&self) -> u32 {
        self.state.borrow().start_calls
    }

    pub fn stop_calls(&self) -> u32 {
        self.state.borrow().stop_calls
    }

    pub fn pending_reports(&self) -> usize {
        self.state.borrow().reports.len()
    }

    /// Registry factory producing backends that share this handle's state
    pub fn factory(&self) -> BackendFactory {
        let handle = self.clone();
        Box::new(move || {
            let backend: Box<dyn ProviderBackend> = Box::new(MockBackend {
                handle: handle.clone(),
            });
            Ok(backend)
        })
    }
}

/// Backend whose behaviour is driven entirely through its [`MockHandle`]
#[derive(Debug)]
pub struct MockBackend {
    handle: MockHandle,
}

impl MockBackend {
    pub fn new(method: ProviderMethod) -> (Self, MockHandle) {
        let handle = MockHandle {
            state: Rc::new(RefCell::new(MockState {
                method,
                started: false,
                reports: VecDeque::new(),
                start_error: None,
                stop_error: None,
                position: None,
                velocity: None,
                satellite: None,
                last_position: None,
                start_calls: 0,
                stop_calls: 0,
            })),
        };
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl ProviderBackend for MockBackend {
    fn method(&self) -> ProviderMethod {
        self.handle.state.borrow().method
    }

    fn start(&mut self) -> LocationResult<()> {
        let mut state = self.handle.state.borrow_mut();
        state.start_calls += 1;
        if let Some(error) = state.start_error {
            return Err(error);
        }
        state.started = true;
        Ok(())
    }

    fn stop(&mut self) -> LocationResult<()> {
        let mut state = self.handle.state.borrow_mut();
        state.stop_calls += 1;
        if let Some(error) = state.stop_error {
            return Err(error);
        }
        state.started = false;
        Ok(())
    }

    // Queued reports are handed out even after stop, like late plugin callbacks
    fn poll_report(&mut self) -> Option<BackendReport> {
        self.handle.state.borrow_mut().reports.pop_front()
    }

    fn get_position(&mut self) -> LocationResult<(Coordinate, Accuracy)> {
        self.handle.state.borrow().position.ok_or(LocationError::NotAvailable)
    }

    fn get_velocity(&mut self) -> LocationResult<(Velocity, Accuracy)> {
        self.handle.state.borrow().velocity.ok_or(LocationError::NotAvailable)
    }

    fn get_satellite(&mut self) -> LocationResult<SatelliteView> {
        let state = self.handle.state.borrow();
        if !state.method.reports_satellites() {
            return Err(LocationError::NotSupported);
        }
        state.satellite.clone().ok_or(LocationError::NotAvailable)
    }

    fn get_last_position(&mut self) -> LocationResult<(Coordinate, Accuracy)> {
        self.handle
            .state
            .borrow()
            .last_position
            .ok_or(LocationError::NotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_scripting() {
        let (mut backend, handle) = MockBackend::new(ProviderMethod::Gps);
        handle.fail_start(Some(LocationError::SecurityDenied));
        assert_eq!(backend.start(), Err(LocationError::SecurityDenied));
        assert!(!handle.is_started());

        handle.fail_start(None);
        backend.start().unwrap();
        assert!(handle.is_started());
        assert_eq!(handle.start_calls(), 2);

        backend.stop().unwrap();
        assert!(!handle.is_started());
        assert_eq!(handle.stop_calls(), 1);
    }

    #[test]
    fn test_reports_are_fifo() {
        let (mut backend, handle) = MockBackend::new(ProviderMethod::Wps);
        let fix = Coordinate::new(10, 1.0, 2.0, 0.0, FixStatus::Fix2D).unwrap();
        handle.push_status(true, FixStatus::Fix2D);
        handle.push_fix(fix, Velocity::default(), Accuracy::default());
        assert_eq!(handle.pending_reports(), 2);

        assert!(matches!(backend.poll_report(), Some(BackendReport::Status { .. })));
        assert!(matches!(backend.poll_report(), Some(BackendReport::Position { .. })));
        assert!(backend.poll_report().is_none());
        assert_eq!(backend.get_last_position().unwrap().0, fix);
    }

    #[test]
    fn test_satellites_only_from_gps() {
        let (mut wps, _) = MockBackend::new(ProviderMethod::Wps);
        assert_eq!(wps.get_satellite(), Err(LocationError::NotSupported));

        let (mut gps, handle) = MockBackend::new(ProviderMethod::Gps);
        assert_eq!(gps.get_satellite(), Err(LocationError::NotAvailable));
        handle.push_satellite(SatelliteView::from_satellites(3, Vec::new()));
        assert_eq!(gps.get_satellite().unwrap().timestamp, 3);
    }
}
