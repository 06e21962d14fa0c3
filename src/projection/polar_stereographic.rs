//! Polar Stereographic (ellipsoidal)

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::series::{adjust_lon, conformal_to_geodetic, msfnz, tsfnz};
use super::MapProjector;
use crate::types::{Ellipsoid, SarError, SarResult};

/// Inverse radius below which a point is taken to be the pole (m)
const POLE_RADIUS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarStereographicParameters {
    /// Latitude of true scale (degrees); its sign selects the pole
    pub slat: f64,
    /// Meridian running from the pole along the negative y axis, positive y for
    /// a south pole projection (degrees)
    pub slon: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl PolarStereographicParameters {
    pub fn is_north_pole(&self) -> bool {
        self.slat >= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// +1 north pole, -1 south pole
    sn: f64,
    slon: f64,
    e: f64,
    e2: f64,
    /// rho = scale * t
    scale: f64,
    false_easting: f64,
    false_northing: f64,
}

impl PolarStereographic {
    pub fn new(params: &PolarStereographicParameters, ellipsoid: &Ellipsoid) -> SarResult<Self> {
        if !(params.slat.abs() <= 90.0) || params.slat == 0.0 {
            return Err(SarError::Projection(format!(
                "Polar stereographic standard parallel {} must be nonzero and within +/-90",
                params.slat
            )));
        }
        let sn = if params.is_north_pole() { 1.0 } else { -1.0 };
        let e = ellipsoid.eccentricity();
        let a = ellipsoid.re_major;
        let slat = params.slat.abs().to_radians();

        let scale = if (FRAC_PI_2 - slat).abs() < 1e-10 {
            // True scale at the pole
            2.0 * a / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
        } else {
            let (sin_c, cos_c) = slat.sin_cos();
            a * msfnz(e, sin_c, cos_c) / tsfnz(e, slat)
        };

        Ok(Self {
            sn,
            slon: params.slon.to_radians(),
            e,
            e2: ellipsoid.e2(),
            scale,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        })
    }
}

impl MapProjector for PolarStereographic {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> SarResult<(f64, f64)> {
        let phi = self.sn * lat_deg.to_radians();
        let rho = self.scale * tsfnz(self.e, phi);
        let theta = adjust_lon(lon_deg.to_radians() - self.slon);
        let x = rho * theta.sin() + self.false_easting;
        let y = -self.sn * rho * theta.cos() + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;
        let rho = dx.hypot(dy);
        if rho <= POLE_RADIUS {
            return Ok((self.sn * 90.0, 0.0));
        }
        let t = rho / self.scale;
        let chi = FRAC_PI_2 - 2.0 * t.atan();
        let lat = self.sn * conformal_to_geodetic(chi, self.e2);
        let lon = adjust_lon(dx.atan2(-self.sn * dy) + self.slon);
        Ok((lat.to_degrees(), lon.to_degrees()))
    }
}

pub fn forward(
    params: &PolarStereographicParameters,
    ellipsoid: &Ellipsoid,
    lat: f64,
    lon: f64,
) -> SarResult<(f64, f64)> {
    PolarStereographic::new(params, ellipsoid)?.forward(lat, lon)
}

pub fn inverse(
    params: &PolarStereographicParameters,
    ellipsoid: &Ellipsoid,
    x: f64,
    y: f64,
) -> SarResult<(f64, f64)> {
    PolarStereographic::new(params, ellipsoid)?.inverse(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn north() -> PolarStereographicParameters {
        PolarStereographicParameters {
            slat: 70.0,
            slon: -45.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    #[test]
    fn test_roundtrip_north() {
        let e = Ellipsoid::wgs84();
        for &(lat, lon) in &[(63.066240, -145.958271), (75.0, 10.0), (89.5, 179.0), (60.0, -45.0)] {
            let (x, y) = forward(&north(), &e, lat, lon).unwrap();
            let (lat2, lon2) = inverse(&north(), &e, x, y).unwrap();
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-6);
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_roundtrip_south_with_offset_meridian() {
        let e = Ellipsoid::wgs84();
        let p = PolarStereographicParameters {
            slat: -71.0,
            slon: 30.0,
            false_easting: 1000.0,
            false_northing: -2000.0,
        };
        for &(lat, lon) in &[(-65.0, 100.0), (-80.0, -120.0), (-71.0, 30.0)] {
            let (x, y) = forward(&p, &e, lat, lon).unwrap();
            let (lat2, lon2) = inverse(&p, &e, x, y).unwrap();
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-6);
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_meridian_orientation() {
        let e = Ellipsoid::wgs84();
        // Points on slon lie on the negative y axis for a north pole projection.
        let (x, y) = forward(&north(), &e, 70.0, -45.0).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-6);
        assert!(y < 0.0);

        let south = PolarStereographicParameters { slat: -70.0, ..north() };
        let (x, y) = forward(&south, &e, -70.0, -45.0).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-6);
        assert!(y > 0.0);
    }

    #[test]
    fn test_true_scale_at_standard_parallel() {
        let e = Ellipsoid::wgs84();
        let (_, y) = forward(&north(), &e, 70.0, -45.0).unwrap();
        // At the standard parallel rho equals the parallel radius a*m.
        let phi = 70.0_f64.to_radians();
        let expected = e.re_major * msfnz(e.eccentricity(), phi.sin(), phi.cos());
        assert_abs_diff_eq!(-y, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_pole_inverse_is_special_cased() {
        let e = Ellipsoid::wgs84();
        assert_eq!(inverse(&north(), &e, 0.0, 0.001).unwrap(), (90.0, 0.0));
        let south = PolarStereographicParameters { slat: -70.0, ..north() };
        assert_eq!(inverse(&south, &e, 0.0, 0.0).unwrap(), (-90.0, 0.0));
    }

    #[test]
    fn test_pole_standard_parallel_roundtrip() {
        let e = Ellipsoid::wgs84();
        let p = PolarStereographicParameters { slat: 90.0, slon: 0.0, false_easting: 2_000_000.0, false_northing: 2_000_000.0 };
        let (x, y) = forward(&p, &e, 72.5, 33.0).unwrap();
        let (lat, lon) = inverse(&p, &e, x, y).unwrap();
        assert_abs_diff_eq!(lat, 72.5, epsilon = 1e-6);
        assert_abs_diff_eq!(lon, 33.0, epsilon = 1e-6);
    }
}
