//! Provider backend abstraction
//!
//! Backends are the positioning plugins (GPS, Wi-Fi, cell) that produce raw
//! fixes. They are created through a [`ProviderRegistry`] populated at startup
//! and deliver their data as [`BackendReport`]s.

pub mod plugin;
pub mod registry;
pub mod mock;

pub use plugin::{BackendReport, ProviderBackend, ProviderMethod};
pub use registry::{BackendFactory, ProviderRegistry};
pub use mock::{MockBackend, MockHandle};
