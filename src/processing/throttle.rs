//! Per-stream update throttling

use crate::core::{MAX_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL};

/// Clamp a requested interval to the supported range; 0 means the minimum.
pub fn clamp_interval(seconds: u32) -> u32 {
    seconds.clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL)
}

/// Throttle state for one stream of one provider.
///
/// Every offered value is remembered; only values at least `interval`
/// seconds after the previous emission are let through.
#[derive(Debug, Clone)]
pub struct StreamThrottle<T> {
    interval: u32,
    last_emitted: Option<i64>,
    last_value: Option<T>,
}

impl<T: Clone> StreamThrottle<T> {
    pub fn new() -> Self {
        Self {
            interval: MIN_UPDATE_INTERVAL,
            last_emitted: None,
            last_value: None,
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the interval actually applied
    pub fn set_interval(&mut self, seconds: u32) -> u32 {
        self.interval = clamp_interval(seconds);
        self.interval
    }

    /// Record `value` and decide whether it should be emitted
    pub fn offer(&mut self, timestamp: i64, value: T) -> bool {
        self.last_value = Some(value);
        let due = match self.last_emitted {
            None => true,
            Some(last) => timestamp.saturating_sub(last) >= i64::from(self.interval),
        };
        if due {
            self.last_emitted = Some(timestamp);
        }
        due
    }

    /// Record `value` without any chance of emission
    pub fn record(&mut self, value: T) {
        self.last_value = Some(value);
    }

    pub fn last_value(&self) -> Option<&T> {
        self.last_value.as_ref()
    }

    pub fn last_emitted(&self) -> Option<i64> {
        self.last_emitted
    }

    /// Nothing emitted within the last interval as of `now`
    pub fn is_quiet(&self, now: i64) -> bool {
        match self.last_emitted {
            None => true,
            Some(last) => now.saturating_sub(last) >= i64::from(self.interval),
        }
    }
}

impl<T: Clone> Default for StreamThrottle<T> {
    fn default() -> Self {
        Self::new()
    }
}
