//! Geometry kernel and geodesic distance

pub mod distance;
pub mod boundary;
mod polygon;

pub use distance::distance;
pub use boundary::{Boundary, BoundaryKind, CircleBoundary, PolygonBoundary, RectBoundary};
