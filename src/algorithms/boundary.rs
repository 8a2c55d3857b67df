//! Geofence boundaries and point-in-region tests
//!
//! Three shapes are supported: an axis-aligned rectangle that may straddle the
//! antimeridian, a geodesic circle and an arbitrary polygon. Boundaries are
//! only obtainable through the validating factories, so every test below can
//! assume a well-formed shape.

use crate::algorithms::distance::distance;
use crate::algorithms::polygon;
use crate::core::Coordinate;

/// Rectangle given by its north-west and south-east corners
#[derive(Debug, Clone)]
pub struct RectBoundary {
    left_top: Coordinate,
    right_bottom: Coordinate,
}

impl RectBoundary {
    pub fn left_top(&self) -> &Coordinate {
        &self.left_top
    }

    pub fn right_bottom(&self) -> &Coordinate {
        &self.right_bottom
    }

    /// True when the rectangle wraps across the ±180° meridian
    pub fn crosses_antimeridian(&self) -> bool {
        let dx = self.left_top.longitude() - self.right_bottom.longitude();
        !(dx > -180.0 && dx < 180.0)
    }

    fn contains(&self, point: &Coordinate) -> bool {
        let lat = point.latitude();
        let lon = point.longitude();
        let inside_lat = self.right_bottom.latitude() < lat && lat < self.left_top.latitude();
        let inside_lon = if self.crosses_antimeridian() {
            self.left_top.longitude() < lon || lon < self.right_bottom.longitude()
        } else {
            self.left_top.longitude() < lon && lon < self.right_bottom.longitude()
        };
        inside_lat && inside_lon
    }
}

/// Geodesic circle, radius in meters
#[derive(Debug, Clone)]
pub struct CircleBoundary {
    center: Coordinate,
    radius: f64,
}

impl CircleBoundary {
    pub fn center(&self) -> &Coordinate {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn contains(&self, point: &Coordinate) -> bool {
        match distance(&self.center, point) {
            Ok(meters) => meters < self.radius,
            // Only nearly antipodal points fail to converge, far outside any fence
            Err(_) => false,
        }
    }
}

/// Closed polygon; the last vertex connects back to the first
#[derive(Debug, Clone)]
pub struct PolygonBoundary {
    vertices: Vec<Coordinate>,
}

impl PolygonBoundary {
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }
}

/// A registered geofence region
#[derive(Debug, Clone)]
pub enum Boundary {
    Rect(RectBoundary),
    Circle(CircleBoundary),
    Polygon(PolygonBoundary),
}

impl Boundary {
    /// Rectangle from its north-west and south-east corners.
    ///
    /// When the corners are less than 180° of longitude apart the left corner
    /// must lie west of the right one. A gap of 180° or more is read as a
    /// rectangle wrapping across the antimeridian, which requires the left
    /// corner to have the larger longitude. The top corner must lie strictly
    /// north of the bottom one.
    pub fn rect(left_top: Coordinate, right_bottom: Coordinate) -> Option<Boundary> {
        if right_bottom.latitude() >= left_top.latitude() {
            return None;
        }
        let dx = left_top.longitude() - right_bottom.longitude();
        let ordered = if dx > -180.0 && dx < 180.0 {
            left_top.longitude() < right_bottom.longitude()
        } else {
            right_bottom.longitude() < left_top.longitude()
        };
        if !ordered {
            return None;
        }
        Some(Boundary::Rect(RectBoundary {
            left_top,
            right_bottom,
        }))
    }

    pub fn circle(center: Coordinate, radius: f64) -> Option<Boundary> {
        if !(radius > 0.0) || !radius.is_finite() {
            return None;
        }
        Some(Boundary::Circle(CircleBoundary { center, radius }))
    }

    /// Polygon of at least three vertices; vertex order is kept as given
    pub fn polygon(vertices: Vec<Coordinate>) -> Option<Boundary> {
        if vertices.len() <= 2 {
            return None;
        }
        Some(Boundary::Polygon(PolygonBoundary { vertices }))
    }

    /// Open-interval containment test
    pub fn contains(&self, point: &Coordinate) -> bool {
        match self {
            Boundary::Rect(rect) => rect.contains(point),
            Boundary::Circle(circle) => circle.contains(point),
            Boundary::Polygon(poly) => polygon::contains(&poly.vertices, point),
        }
    }

    /// Geometric center. `None` for a polygon with zero signed area.
    pub fn centroid(&self) -> Option<Coordinate> {
        match self {
            Boundary::Rect(rect) => {
                let lt = &rect.left_top;
                let rb = &rect.right_bottom;
                Coordinate::new(
                    0,
                    (lt.latitude() + rb.latitude()) / 2.0,
                    (lt.longitude() + rb.longitude()) / 2.0,
                    (lt.altitude() + rb.altitude()) / 2.0,
                    lt.status(),
                )
            }
            Boundary::Circle(circle) => Some(circle.center),
            Boundary::Polygon(poly) => polygon::centroid(&poly.vertices),
        }
    }

    pub fn kind(&self) -> BoundaryKind {
        match self {
            Boundary::Rect(_) => BoundaryKind::Rect,
            Boundary::Circle(_) => BoundaryKind::Circle,
            Boundary::Polygon(_) => BoundaryKind::Polygon,
        }
    }
}

/// Structural equality: same shape and same defining points. Polygons match
/// when one vertex ring is a rotation of the other in either direction.
impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Boundary::Rect(a), Boundary::Rect(b)) => {
                a.left_top.same_location(&b.left_top) && a.right_bottom.same_location(&b.right_bottom)
            }
            (Boundary::Circle(a), Boundary::Circle(b)) => {
                a.center.same_location(&b.center) && a.radius == b.radius
            }
            (Boundary::Polygon(a), Boundary::Polygon(b)) => polygon::same_ring(&a.vertices, &b.vertices),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Rect,
    Circle,
    Polygon,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixStatus;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate::point(lat, lon).unwrap()
    }

    #[test]
    fn test_rect_factory_validation() {
        assert!(Boundary::rect(pt(10.0, 10.0), pt(0.0, 20.0)).is_some());
        // Top below bottom
        assert!(Boundary::rect(pt(0.0, 10.0), pt(10.0, 20.0)).is_none());
        // Left east of right without wraparound
        assert!(Boundary::rect(pt(10.0, 20.0), pt(0.0, 10.0)).is_none());
        // Wraparound rectangle from 170E to 170W
        assert!(Boundary::rect(pt(10.0, 170.0), pt(0.0, -170.0)).is_some());
        // 340° wide is ambiguous under the wraparound rule
        assert!(Boundary::rect(pt(10.0, -170.0), pt(0.0, 170.0)).is_none());
    }

    #[test]
    fn test_rect_contains_is_strict() {
        let rect = Boundary::rect(pt(10.0, 10.0), pt(0.0, 20.0)).unwrap();
        assert!(rect.contains(&pt(5.0, 15.0)));
        assert!(!rect.contains(&pt(10.0, 15.0)));
        assert!(!rect.contains(&pt(5.0, 20.0)));
        assert!(!rect.contains(&pt(5.0, 25.0)));
    }

    #[test]
    fn test_rect_across_antimeridian() {
        let rect = Boundary::rect(pt(10.0, 170.0), pt(0.0, -170.0)).unwrap();
        assert!(rect.contains(&pt(5.0, 175.0)));
        assert!(rect.contains(&pt(5.0, -175.0)));
        assert!(!rect.contains(&pt(5.0, 0.0)));
        assert!(!rect.contains(&pt(15.0, 175.0)));
    }

    #[test]
    fn test_rect_centroid_property() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let top = rng.gen_range(-60.0..60.0);
            let bottom = top - rng.gen_range(0.5..20.0);
            let left = rng.gen_range(-170.0..100.0);
            let right = left + rng.gen_range(0.5..60.0);
            let rect = Boundary::rect(pt(top, left), pt(bottom, right)).unwrap();

            let center = rect.centroid().unwrap();
            assert!(rect.contains(&center));

            // ~1000 km north of the top edge
            let outside = pt(top + 9.0, center.longitude());
            assert!(!rect.contains(&outside));
        }
    }

    #[test]
    fn test_rect_centroid_averages_altitude() {
        let lt = Coordinate::new(0, 10.0, 10.0, 100.0, FixStatus::Fix3D).unwrap();
        let rb = Coordinate::new(0, 0.0, 20.0, 50.0, FixStatus::Fix3D).unwrap();
        let center = Boundary::rect(lt, rb).unwrap().centroid().unwrap();
        assert_eq!(center.latitude(), 5.0);
        assert_eq!(center.longitude(), 15.0);
        assert_eq!(center.altitude(), 75.0);
    }

    #[test]
    fn test_circle_contains() {
        let circle = Boundary::circle(pt(0.0, 0.0), 1000.0).unwrap();
        // ~501 m and ~2004 m east along the equator
        assert!(circle.contains(&pt(0.0, 0.0045)));
        assert!(!circle.contains(&pt(0.0, 0.018)));
        assert_eq!(circle.centroid().unwrap(), pt(0.0, 0.0));
    }

    #[test]
    fn test_circle_factory_validation() {
        assert!(Boundary::circle(pt(0.0, 0.0), 0.0).is_none());
        assert!(Boundary::circle(pt(0.0, 0.0), -5.0).is_none());
        assert!(Boundary::circle(pt(0.0, 0.0), f64::NAN).is_none());
    }

    #[test]
    fn test_polygon_factory_requires_three_vertices() {
        assert!(Boundary::polygon(vec![pt(0.0, 0.0), pt(1.0, 1.0)]).is_none());
        assert!(Boundary::polygon(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)]).is_some());
    }

    #[test]
    fn test_equality_across_kinds() {
        let rect = Boundary::rect(pt(10.0, 10.0), pt(0.0, 20.0)).unwrap();
        let same_rect = Boundary::rect(pt(10.0, 10.0), pt(0.0, 20.0)).unwrap();
        let circle = Boundary::circle(pt(5.0, 15.0), 100.0).unwrap();
        let bigger = Boundary::circle(pt(5.0, 15.0), 200.0).unwrap();
        assert_eq!(rect, same_rect);
        assert_ne!(rect, circle);
        assert_ne!(circle, bigger);
        assert_eq!(rect.kind(), BoundaryKind::Rect);
    }
}
