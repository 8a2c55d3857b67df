//! Fixed-rate periodic tasks driven by an external clock
//!
//! A task fires once per interval when polled with the current time. It is
//! cancelled by dropping it; nothing keeps running in the background.

use crate::core::StreamKind;
use crate::processing::throttle::clamp_interval;

/// Periodic task ticking every `interval` seconds
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    interval: i64,
    next_due: Option<i64>,
}

impl PeriodicTask {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval: i64::from(clamp_interval(interval_secs)),
            next_due: None,
        }
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// The first poll arms the task; later polls return true once per elapsed
    /// period. Missed periods are skipped rather than replayed.
    pub fn poll(&mut self, now: i64) -> bool {
        match self.next_due {
            None => {
                self.next_due = Some(now.saturating_add(self.interval));
                false
            }
            Some(due) if now >= due => {
                let periods = now.saturating_sub(due) / self.interval + 1;
                self.next_due = Some(due.saturating_add(periods.saturating_mul(self.interval)));
                true
            }
            Some(_) => false,
        }
    }
}

/// Keepalive tasks of one provider, one per stream
#[derive(Debug, Default)]
pub struct KeepaliveTimers {
    position: Option<PeriodicTask>,
    velocity: Option<PeriodicTask>,
    satellite: Option<PeriodicTask>,
}

impl KeepaliveTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the task for `kind`
    pub fn arm(&mut self, kind: StreamKind, interval_secs: u32) {
        *self.slot(kind) = Some(PeriodicTask::new(interval_secs));
    }

    pub fn cancel(&mut self, kind: StreamKind) {
        *self.slot(kind) = None;
    }

    pub fn cancel_all(&mut self) {
        self.position = None;
        self.velocity = None;
        self.satellite = None;
    }

    pub fn is_armed(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Position => self.position.is_some(),
            StreamKind::Velocity => self.velocity.is_some(),
            StreamKind::Satellite => self.satellite.is_some(),
        }
    }

    /// Streams whose task fired at `now`
    pub fn poll(&mut self, now: i64) -> Vec<StreamKind> {
        [StreamKind::Position, StreamKind::Velocity, StreamKind::Satellite]
            .into_iter()
            .filter(|&kind| self.slot(kind).as_mut().map_or(false, |task| task.poll(now)))
            .collect()
    }

    fn slot(&mut self, kind: StreamKind) -> &mut Option<PeriodicTask> {
        match kind {
            StreamKind::Position => &mut self.position,
            StreamKind::Velocity => &mut self.velocity,
            StreamKind::Satellite => &mut self.satellite,
        }
    }
}
