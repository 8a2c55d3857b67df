//! Key/value settings store consumed by providers
//!
//! Providers read the location toggles and search-state values through the
//! [`SettingsStore`] trait and watch toggles for changes. The platform store
//! lives outside this crate; [`MemorySettings`] is the in-process version used
//! by tests and the demo binary.

use crate::core::{LocationError, LocationResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Setting keys read by the providers
pub mod keys {
    /// Master location toggle (0 = off)
    pub const LOCATION_ENABLED: &str = "location.enabled";
    /// Network positioning toggle (0 = off), needed by WPS and CPS
    pub const NETWORK_ENABLED: &str = "location.network.enabled";
    /// GPS search state
    pub const GPS_STATE: &str = "location.gps.state";
    /// WPS search state
    pub const WPS_STATE: &str = "location.wps.state";
}

/// Search-state values; 0 is off
pub const STATE_SEARCHING: i32 = 1;
pub const STATE_CONNECTED: i32 = 2;

/// Called with the key and its new value
pub type NotifyCallback = Box<dyn FnMut(&str, i32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifyHandle(u32);

pub trait SettingsStore {
    fn get_int(&self, key: &str) -> LocationResult<i32>;

    /// Watch `key`; the callback runs on every change of its value
    fn add_notify(&mut self, key: &str, callback: NotifyCallback) -> LocationResult<NotifyHandle>;

    fn ignore_notify(&mut self, key: &str, handle: NotifyHandle) -> LocationResult<()>;
}

/// Store shared between a provider, its children and the application
pub type SharedSettings = Rc<RefCell<dyn SettingsStore>>;

/// In-memory settings store
#[derive(Default)]
pub struct MemorySettings {
    values: HashMap<String, i32>,
    watchers: HashMap<String, Vec<(NotifyHandle, NotifyCallback)>>,
    next_id: u32,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with both toggles on and every provider connected
    pub fn all_enabled() -> Self {
        let mut settings = Self::new();
        settings.set_int(keys::LOCATION_ENABLED, 1);
        settings.set_int(keys::NETWORK_ENABLED, 1);
        settings.set_int(keys::GPS_STATE, STATE_CONNECTED);
        settings.set_int(keys::WPS_STATE, STATE_CONNECTED);
        settings
    }

    /// Set `key` and notify its watchers synchronously if the value changed
    pub fn set_int(&mut self, key: &str, value: i32) {
        let previous = self.values.insert(key.to_string(), value);
        if previous == Some(value) {
            return;
        }
        tracing::debug!(key, value, "Setting changed");
        if let Some(watchers) = self.watchers.get_mut(key) {
            for (_, callback) in watchers.iter_mut() {
                callback(key, value);
            }
        }
    }

    pub fn watcher_count(&self, key: &str) -> usize {
        self.watchers.get(key).map_or(0, Vec::len)
    }
}

impl SettingsStore for MemorySettings {
    fn get_int(&self, key: &str) -> LocationResult<i32> {
        self.values.get(key).copied().ok_or(LocationError::NotAvailable)
    }

    fn add_notify(&mut self, key: &str, callback: NotifyCallback) -> LocationResult<NotifyHandle> {
        if key.is_empty() {
            return Err(LocationError::Parameter);
        }
        self.next_id += 1;
        let handle = NotifyHandle(self.next_id);
        self.watchers
            .entry(key.to_string())
            .or_default()
            .push((handle, callback));
        Ok(handle)
    }

    fn ignore_notify(&mut self, key: &str, handle: NotifyHandle) -> LocationResult<()> {
        let watchers = self.watchers.get_mut(key).ok_or(LocationError::Parameter)?;
        let index = watchers
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(LocationError::Parameter)?;
        watchers.remove(index);
        Ok(())
    }
}
