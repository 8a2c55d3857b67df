//! Core types, errors and constants for the location middleware

pub mod types;
pub mod constants;
pub mod error;

pub use types::*;
pub use constants::*;
pub use error::{LocationError, LocationResult};
