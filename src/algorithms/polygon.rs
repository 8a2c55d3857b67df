//! Polygon ring math: crossing-number containment, centroid and ring equality

use crate::core::Coordinate;
use nalgebra::Vector2;

/// Crossing-number test over every edge `prev -> next`, wrapping last to first.
///
/// Edges whose longitude span exceeds 180° are taken to run across the
/// antimeridian. For those, the point is a crossing candidate when both edge
/// ends lie on the same side of it, and the sign of `prev.lon * point.lon`
/// tells whether the point sits on the far side of the ±180° line from
/// `prev`, in which case its offset from `prev` is unwrapped by 360°.
///
/// The sign test only selects that correction; it does not gate the crossing.
/// Gating on it drops every crossing where the point and `prev` lie in
/// opposite hemispheres, which misses points just east of the line.
pub(crate) fn contains(vertices: &[Coordinate], point: &Coordinate) -> bool {
    let lat = point.latitude();
    let lon = point.longitude();
    let mut crossings = 0usize;

    let mut prev = match vertices.last() {
        Some(last) => last,
        None => return false,
    };
    for next in vertices {
        let mut d_lon = next.longitude() - prev.longitude();
        let d_lat = next.latitude() - prev.latitude();
        let mut antimeridian = false;
        if d_lon > 180.0 {
            d_lon -= 360.0;
            antimeridian = true;
        } else if d_lon < -180.0 {
            d_lon += 360.0;
            antimeridian = true;
        }

        let prev_east = prev.longitude() > lon;
        let next_east = next.longitude() > lon;

        if antimeridian {
            if prev_east == next_east {
                let mut offset = lon - prev.longitude();
                if prev.longitude() * lon < 0.0 {
                    offset += if offset > 0.0 { -360.0 } else { 360.0 };
                }
                if lat < prev.latitude() + d_lat / d_lon * offset {
                    crossings += 1;
                }
            }
        } else if prev_east != next_east {
            let offset = lon - prev.longitude();
            if lat < prev.latitude() + d_lat / d_lon * offset {
                crossings += 1;
            }
        }

        prev = next;
    }

    crossings % 2 == 1
}

/// Area-weighted centroid. Coordinates are shifted by +90/+180 so every term
/// is positive; `None` when the signed area is exactly zero.
pub(crate) fn centroid(vertices: &[Coordinate]) -> Option<Coordinate> {
    let shifted: Vec<Vector2<f64>> = vertices
        .iter()
        .map(|v| Vector2::new(v.latitude() + 90.0, v.longitude() + 180.0))
        .collect();

    let mut twice_area = 0.0;
    let mut weighted: Vector2<f64> = Vector2::zeros();
    for (i, p) in shifted.iter().enumerate() {
        let q = &shifted[(i + 1) % shifted.len()];
        let cross = p.perp(q);
        twice_area += cross;
        weighted += (p + q) * cross;
    }

    let area = twice_area / 2.0;
    if area == 0.0 {
        return None;
    }
    let center = weighted / (6.0 * area);
    Coordinate::point(center.x - 90.0, center.y - 180.0)
}

/// True when `b` lists the same vertices as `a`, starting anywhere and read
/// in either direction.
pub(crate) fn same_ring(a: &[Coordinate], b: &[Coordinate]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let n = a.len();
    if n == 0 {
        return true;
    }
    let start = match b.iter().position(|v| v.same_location(&a[0])) {
        Some(index) => index,
        None => return false,
    };

    let forward = (1..n).all(|i| a[i].same_location(&b[(start + i) % n]));
    if forward {
        return true;
    }
    (1..n).all(|i| a[i].same_location(&b[(start + n - i) % n]))
}
