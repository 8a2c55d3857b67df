//! Update dispatching: throttling, zone detection and keepalive timers

pub mod throttle;
pub mod zones;
pub mod keepalive;
pub mod dispatcher;

pub use throttle::{clamp_interval, StreamThrottle};
pub use zones::{BoundaryRegistration, ZoneSet, ZoneStatus};
pub use keepalive::{KeepaliveTimers, PeriodicTask};
pub use dispatcher::UpdateDispatcher;
