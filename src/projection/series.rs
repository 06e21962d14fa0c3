//! Auxiliary functions shared by the ellipsoidal projections (Snyder 1987)

use std::f64::consts::{FRAC_PI_2, PI};

use crate::types::{SarError, SarResult};

/// Tolerance used for degenerate-case checks inside projection math
pub const EPSLN: f64 = 1.0e-8;

/// Maximum iterations of the Albers inverse latitude solver
pub const PHI1Z_MAX_ITERATIONS: usize = 25;

/// Convergence threshold of the Albers inverse latitude solver (radians)
pub const PHI1Z_TOLERANCE: f64 = 1.0e-7;

/// Wrap a longitude in radians into (-PI, PI]
pub fn adjust_lon(mut x: f64) -> f64 {
    while x > PI {
        x -= 2.0 * PI;
    }
    while x <= -PI {
        x += 2.0 * PI;
    }
    x
}

/// Wrap a longitude in degrees into (-180, 180]
pub fn adjust_lon_deg(x: f64) -> f64 {
    adjust_lon(x.to_radians()).to_degrees()
}

/// asin with the argument clamped to [-1, 1]
pub fn asinz(con: f64) -> f64 {
    num_traits::clamp(con, -1.0, 1.0).asin()
}

/// Radius of a parallel divided by the semi-major axis (Snyder's small m)
pub fn msfnz(eccent: f64, sinphi: f64, cosphi: f64) -> f64 {
    let con = eccent * sinphi;
    cosphi / (1.0 - con * con).sqrt()
}

/// Snyder's small q, with the spherical form for tiny eccentricities
pub fn qsfnz(eccent: f64, sinphi: f64) -> f64 {
    if eccent > 1.0e-7 {
        let con = eccent * sinphi;
        (1.0 - eccent * eccent)
            * (sinphi / (1.0 - con * con) - (0.5 / eccent) * ((1.0 - con) / (1.0 + con)).ln())
    } else {
        2.0 * sinphi
    }
}

/// Snyder's small t: tan(pi/4 - phi/2) over the eccentricity correction
pub fn tsfnz(eccent: f64, phi: f64) -> f64 {
    let con = eccent * phi.sin();
    (FRAC_PI_2 * 0.5 - phi * 0.5).tan() / ((1.0 - con) / (1.0 + con)).powf(eccent * 0.5)
}

/// Geodetic latitude from conformal latitude `chi`, series to the sin(6 chi) term
pub fn conformal_to_geodetic(chi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    chi + (e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0) * (2.0 * chi).sin()
        + (7.0 * e4 / 48.0 + 29.0 * e6 / 240.0) * (4.0 * chi).sin()
        + (7.0 * e6 / 120.0) * (6.0 * chi).sin()
}

/// Latitude whose q equals `qs`, by Newton iteration on the authalic relation
pub fn phi1z(eccent: f64, qs: f64) -> SarResult<f64> {
    phi1z_with_iterations(eccent, qs).map(|(phi, _)| phi)
}

/// [`phi1z`] together with the number of Newton steps it took
///
/// The spherical case is closed form and reports zero iterations.
pub fn phi1z_with_iterations(eccent: f64, qs: f64) -> SarResult<(f64, usize)> {
    let mut phi = asinz(0.5 * qs);
    if eccent < EPSLN {
        return Ok((phi, 0));
    }
    let e2 = eccent * eccent;
    for i in 1..=PHI1Z_MAX_ITERATIONS {
        let (sinpi, cospi) = phi.sin_cos();
        let con = eccent * sinpi;
        let com = 1.0 - con * con;
        let dphi = 0.5 * com * com / cospi
            * (qs / (1.0 - e2) - sinpi / com + 0.5 / eccent * ((1.0 - con) / (1.0 + con)).ln());
        if !dphi.is_finite() {
            return Err(SarError::Projection(format!(
                "phi1z: non-finite step at iteration {} for q {}",
                i, qs
            )));
        }
        phi += dphi;
        if dphi.abs() <= PHI1Z_TOLERANCE {
            log::debug!("phi1z converged after {} iterations", i);
            return Ok((phi, i));
        }
    }
    Err(SarError::Convergence {
        routine: "Albers inverse (phi1z)",
        iterations: PHI1Z_MAX_ITERATIONS,
    })
}

/// Meridian distance from the equator to `lat` (radians) on an ellipsoid
pub fn meridian_distance(re_major: f64, e2: f64, lat: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let c1 = 1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0;
    let c2 = 3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0;
    let c3 = 15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0;
    let c4 = 35.0 * e6 / 3072.0;
    re_major * (c1 * lat - c2 * (2.0 * lat).sin() + c3 * (4.0 * lat).sin() - c4 * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ellipsoid;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_adjust_lon() {
        assert_abs_diff_eq!(adjust_lon_deg(190.0), -170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(adjust_lon_deg(-180.0), 180.0, epsilon = 1e-12);
        assert_abs_diff_eq!(adjust_lon_deg(45.0), 45.0, epsilon = 1e-12);
    }

    #[test]
    fn test_conformal_series_inverts_t() {
        let e = Ellipsoid::wgs84();
        let ecc = e.eccentricity();
        for lat_deg in [10.0_f64, 45.0, 63.0, 85.0] {
            let phi = lat_deg.to_radians();
            let chi = FRAC_PI_2 - 2.0 * tsfnz(ecc, phi).atan();
            let back = conformal_to_geodetic(chi, e.e2());
            assert_abs_diff_eq!(back.to_degrees(), lat_deg, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_qsfnz_spherical_fallback() {
        assert_abs_diff_eq!(qsfnz(0.0, 0.5), 1.0);
        // Pole value is finite and near 2 for the Earth.
        let e = Ellipsoid::wgs84().eccentricity();
        let q = qsfnz(e, 1.0);
        assert!(q > 1.99 && q < 2.0);
    }

    #[test]
    fn test_phi1z_recovers_latitude() {
        let e = Ellipsoid::wgs84().eccentricity();
        for lat_deg in [-89.9_f64, -30.0, 0.0, 52.0, 89.9] {
            let phi = lat_deg.to_radians();
            let qs = qsfnz(e, phi.sin());
            let back = phi1z(e, qs).unwrap();
            assert_abs_diff_eq!(back.to_degrees(), lat_deg, epsilon = 1e-6);
        }
        // Spherical case returns directly
        assert_abs_diff_eq!(phi1z(0.0, 1.0).unwrap(), (0.5_f64).asin());
    }

    #[test]
    fn test_phi1z_iteration_budget() {
        let e = Ellipsoid::wgs84().eccentricity();
        let (_, easy) = phi1z_with_iterations(e, qsfnz(e, 45.0_f64.to_radians().sin())).unwrap();
        assert!(easy <= 4, "45 degrees took {} iterations", easy);

        // Close to the pole cos(phi) is tiny and Newton needs most of the budget
        for lat_deg in [89.9999_f64, -89.9999] {
            let qs = qsfnz(e, lat_deg.to_radians().sin());
            let (phi, iterations) = phi1z_with_iterations(e, qs).unwrap();
            assert!(
                (15..=PHI1Z_MAX_ITERATIONS).contains(&iterations),
                "{} took {} iterations",
                lat_deg,
                iterations
            );
            assert_abs_diff_eq!(phi.to_degrees(), lat_deg, epsilon = 1e-5);
        }
        assert_eq!(phi1z_with_iterations(0.0, 1.0).unwrap().1, 0);
    }

    #[test]
    fn test_phi1z_reports_exhausted_budget() {
        let e = Ellipsoid::wgs84().eccentricity();
        // |q| above the pole value has no solution
        for qs in [2.5, -2.5] {
            assert!(matches!(
                phi1z(e, qs),
                Err(SarError::Convergence { iterations: PHI1Z_MAX_ITERATIONS, .. })
            ));
        }
        assert!(matches!(phi1z(e, f64::NAN), Err(SarError::Projection(_))));
    }

    #[test]
    fn test_meridian_distance_quarter() {
        let e = Ellipsoid::wgs84();
        let quarter = meridian_distance(e.re_major, e.e2(), FRAC_PI_2);
        assert_abs_diff_eq!(quarter, 10_001_965.7, epsilon = 1.0);
    }
}
