//! Lambert Conformal Conic (ellipsoidal, one or two standard parallels)

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::series::{adjust_lon, conformal_to_geodetic, msfnz, tsfnz};
use super::MapProjector;
use crate::types::{is_valid_double, Ellipsoid, SarError, SarResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertConformalParameters {
    /// First standard parallel (degrees)
    pub plat1: f64,
    /// Second standard parallel (degrees)
    pub plat2: f64,
    /// Latitude of origin (degrees)
    pub lat0: f64,
    /// Central meridian (degrees)
    pub lon0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Applied to the semi-major axis when set
    pub scale_factor: f64,
}

#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    e: f64,
    e2: f64,
    /// Cone constant
    n: f64,
    /// a * F
    af: f64,
    rho0: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConic {
    pub fn new(params: &LambertConformalParameters, ellipsoid: &Ellipsoid) -> SarResult<Self> {
        let e = ellipsoid.eccentricity();
        let plat1 = params.plat1.to_radians();
        let plat2 = params.plat2.to_radians();
        let lat0 = params.lat0.to_radians();

        let m1 = msfnz(e, plat1.sin(), plat1.cos());
        let m2 = msfnz(e, plat2.sin(), plat2.cos());
        let t1 = tsfnz(e, plat1);
        let t2 = tsfnz(e, plat2);
        let t0 = tsfnz(e, lat0);

        let n = if approx::abs_diff_eq!(params.plat1, params.plat2, epsilon = 1e-10) {
            plat1.sin()
        } else {
            (m1 / m2).ln() / (t1 / t2).ln()
        };
        if !n.is_finite() || n.abs() < 1e-12 {
            return Err(SarError::Projection(format!(
                "Lambert conformal conic: degenerate cone constant {} for parallels {}, {}",
                n, params.plat1, params.plat2
            )));
        }

        let a = if is_valid_double(params.scale_factor) && params.scale_factor > 0.0 {
            ellipsoid.re_major * params.scale_factor
        } else {
            ellipsoid.re_major
        };
        let f = m1 / (n * t1.powf(n));
        let af = a * f;

        Ok(Self {
            e,
            e2: ellipsoid.e2(),
            n,
            af,
            rho0: af * t0.powf(n),
            lon0: params.lon0.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        })
    }

    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

impl MapProjector for LambertConformalConic {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> SarResult<(f64, f64)> {
        let t = tsfnz(self.e, lat_deg.to_radians());
        let rho = self.af * t.powf(self.n);
        let theta = self.n * adjust_lon(lon_deg.to_radians() - self.lon0);
        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let sign = self.n.signum();
        let dx = sign * (x - self.false_easting);
        let dy = sign * (self.rho0 - (y - self.false_northing));
        let rho = sign * dx.hypot(dy);

        let theta = dx.atan2(dy);
        let lon = adjust_lon(theta / self.n + self.lon0);

        let lat = if rho == 0.0 {
            sign * FRAC_PI_2
        } else {
            let t = (rho / self.af).powf(1.0 / self.n);
            let chi = FRAC_PI_2 - 2.0 * t.atan();
            conformal_to_geodetic(chi, self.e2)
        };
        Ok((lat.to_degrees(), lon.to_degrees()))
    }
}

pub fn forward(
    params: &LambertConformalParameters,
    ellipsoid: &Ellipsoid,
    lat: f64,
    lon: f64,
) -> SarResult<(f64, f64)> {
    LambertConformalConic::new(params, ellipsoid)?.forward(lat, lon)
}

pub fn inverse(
    params: &LambertConformalParameters,
    ellipsoid: &Ellipsoid,
    x: f64,
    y: f64,
) -> SarResult<(f64, f64)> {
    LambertConformalConic::new(params, ellipsoid)?.inverse(x, y)
}
