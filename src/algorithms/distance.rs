//! Ellipsoidal distance on WGS84 using the Vincenty inverse solution

use crate::core::{
    Coordinate, LocationError, LocationResult, VINCENTY_CONVERGENCE, VINCENTY_MAX_ITERATIONS,
    WGS84_FLATTENING, WGS84_SEMI_MAJOR_AXIS, WGS84_SEMI_MINOR_AXIS,
};

/// Geodesic distance between two coordinates in whole meters.
///
/// Coincident points return 0. Nearly antipodal points, where lambda does not
/// settle within the iteration cap, fail with [`LocationError::Unknown`].
pub fn distance(from: &Coordinate, to: &Coordinate) -> LocationResult<f64> {
    let a = WGS84_SEMI_MAJOR_AXIS;
    let b = WGS84_SEMI_MINOR_AXIS;
    let f = WGS84_FLATTENING;

    let l = (to.longitude() - from.longitude()).to_radians();
    let u1 = ((1.0 - f) * from.latitude().to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.latitude().to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;

    let mut sin_sigma = 0.0;
    let mut cos_sigma = 0.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 0.0;
    let mut cos_2sigma_m = 0.0;

    for _ in 0..VINCENTY_MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Ok(0.0);
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos_sq_alpha is zero
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));
        if (lambda - previous).abs() < VINCENTY_CONVERGENCE {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::debug!(
            from_lat = from.latitude(),
            from_lon = from.longitude(),
            to_lat = to.latitude(),
            to_lon = to.longitude(),
            "Vincenty iteration did not converge"
        );
        return Err(LocationError::Unknown);
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma.powi(2))
                        * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

    Ok((b * big_a * (sigma - delta_sigma)).trunc())
}
