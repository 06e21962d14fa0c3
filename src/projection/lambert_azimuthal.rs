//! Lambert Azimuthal Equal-Area (spherical)
//!
//! The sphere radius is the ellipsoid's equatorial radius. Coordinates
//! therefore differ from ellipsoidal implementations by up to about 1.4 km.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::series::{adjust_lon, EPSLN};
use super::MapProjector;
use crate::types::{Ellipsoid, SarError, SarResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertAzimuthalParameters {
    pub center_lon: f64,
    pub center_lat: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// Sphere radius used for the projection centered at `center_lat`
pub fn lambert_azimuthal_radius(_center_lat: f64, ellipsoid: &Ellipsoid) -> f64 {
    ellipsoid.re_major
}

#[derive(Debug, Clone)]
pub struct LambertAzimuthal {
    r: f64,
    lon_center: f64,
    lat_center: f64,
    sin_lat_o: f64,
    cos_lat_o: f64,
    false_easting: f64,
    false_northing: f64,
}

impl LambertAzimuthal {
    pub fn new(params: &LambertAzimuthalParameters, ellipsoid: &Ellipsoid) -> SarResult<Self> {
        let lat_center = params.center_lat.to_radians();
        let (sin_lat_o, cos_lat_o) = lat_center.sin_cos();
        Ok(Self {
            r: lambert_azimuthal_radius(params.center_lat, ellipsoid),
            lon_center: params.center_lon.to_radians(),
            lat_center,
            sin_lat_o,
            cos_lat_o,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        })
    }
}

impl MapProjector for LambertAzimuthal {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> SarResult<(f64, f64)> {
        let delta_lon = adjust_lon(lon_deg.to_radians() - self.lon_center);
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_dlon, cos_dlon) = delta_lon.sin_cos();

        let g = self.sin_lat_o * sin_lat + self.cos_lat_o * cos_lat * cos_dlon;
        if (g + 1.0).abs() < 1e-15 {
            return Err(SarError::Projection(format!(
                "Lambert azimuthal: point ({}, {}) projects to the circle of radius {}",
                lat_deg,
                lon_deg,
                2.0 * self.r
            )));
        }
        let ksp = self.r * (2.0 / (1.0 + g)).sqrt();
        let x = ksp * cos_lat * sin_dlon + self.false_easting;
        let y = ksp * (self.cos_lat_o * sin_lat - self.sin_lat_o * cos_lat * cos_dlon) + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let rh = x.hypot(y);
        let temp = rh / (2.0 * self.r);
        if temp > 1.0 {
            return Err(SarError::Projection(format!(
                "Lambert azimuthal: ({}, {}) lies outside the projection",
                x, y
            )));
        }
        if rh <= EPSLN {
            return Ok((self.lat_center.to_degrees(), self.lon_center.to_degrees()));
        }

        let z = 2.0 * temp.asin();
        let (sin_z, cos_z) = z.sin_cos();
        let lat = (self.sin_lat_o * cos_z + self.cos_lat_o * sin_z * y / rh).asin();

        let lon = if (self.lat_center.abs() - FRAC_PI_2).abs() > EPSLN {
            let temp = cos_z - self.sin_lat_o * lat.sin();
            if temp != 0.0 {
                adjust_lon(self.lon_center + (x * sin_z * self.cos_lat_o).atan2(temp * rh))
            } else {
                self.lon_center
            }
        } else if self.lat_center < 0.0 {
            adjust_lon(self.lon_center - (-x).atan2(y))
        } else {
            adjust_lon(self.lon_center + x.atan2(-y))
        };

        Ok((lat.to_degrees(), lon.to_degrees()))
    }
}

pub fn forward(
    params: &LambertAzimuthalParameters,
    ellipsoid: &Ellipsoid,
    lat: f64,
    lon: f64,
) -> SarResult<(f64, f64)> {
    LambertAzimuthal::new(params, ellipsoid)?.forward(lat, lon)
}

pub fn inverse(
    params: &LambertAzimuthalParameters,
    ellipsoid: &Ellipsoid,
    x: f64,
    y: f64,
) -> SarResult<(f64, f64)> {
    LambertAzimuthal::new(params, ellipsoid)?.inverse(x, y)
}
