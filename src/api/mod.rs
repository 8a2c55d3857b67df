//! Application-facing API: events, providers and the `Location` facade

pub mod events;
pub mod provider;
pub mod hybrid;
pub mod service;

pub use events::{event_channel, EventBus, EventCallback, LocationEvent, LocationUpdate, SubscriptionHandle};
pub use provider::LocationProvider;
pub use hybrid::{ActiveMethod, FusionState, HybridProvider};
pub use service::{Location, LocationService};
