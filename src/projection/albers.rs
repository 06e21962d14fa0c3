//! Albers Conical Equal-Area (ellipsoidal)

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::series::{adjust_lon, msfnz, phi1z, qsfnz, EPSLN};
use super::MapProjector;
use crate::types::{Ellipsoid, SarError, SarResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlbersParameters {
    pub std_parallel1: f64,
    pub std_parallel2: f64,
    pub center_meridian: f64,
    pub orig_latitude: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    r_major: f64,
    e: f64,
    es: f64,
    c: f64,
    /// Cone constant
    ns0: f64,
    /// Radius of the origin parallel
    rh: f64,
    lon_center: f64,
    false_easting: f64,
    false_northing: f64,
}

impl AlbersEqualArea {
    pub fn new(params: &AlbersParameters, ellipsoid: &Ellipsoid) -> SarResult<Self> {
        let lat1 = params.std_parallel1.to_radians();
        let lat2 = params.std_parallel2.to_radians();
        let lat0 = params.orig_latitude.to_radians();

        if (lat1 + lat2).abs() < EPSLN {
            return Err(SarError::Projection(format!(
                "Albers: equal latitudes for standard parallels on opposite sides of equator ({}, {})",
                params.std_parallel1, params.std_parallel2
            )));
        }

        let r_major = ellipsoid.re_major;
        let es = ellipsoid.e2();
        let e = es.sqrt();

        let (sin1, cos1) = lat1.sin_cos();
        let ms1 = msfnz(e, sin1, cos1);
        let qs1 = qsfnz(e, sin1);

        let (sin2, cos2) = lat2.sin_cos();
        let ms2 = msfnz(e, sin2, cos2);
        let qs2 = qsfnz(e, sin2);

        let qs0 = qsfnz(e, lat0.sin());

        let ns0 = if (lat1 - lat2).abs() > EPSLN {
            (ms1 * ms1 - ms2 * ms2) / (qs2 - qs1)
        } else {
            sin1
        };
        let c = ms1 * ms1 + ns0 * qs1;
        let rh = r_major * (c - ns0 * qs0).sqrt() / ns0;

        Ok(Self {
            r_major,
            e,
            es,
            c,
            ns0,
            rh,
            lon_center: params.center_meridian.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        })
    }

    /// q at the poles, the largest magnitude q can take
    fn q_pole(&self) -> f64 {
        1.0 - 0.5 * (1.0 - self.es) / self.e * ((1.0 - self.e) / (1.0 + self.e)).ln()
    }
}

impl MapProjector for AlbersEqualArea {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> SarResult<(f64, f64)> {
        let qs = qsfnz(self.e, lat_deg.to_radians().sin());
        let rh1 = self.r_major * (self.c - self.ns0 * qs).sqrt() / self.ns0;
        let theta = self.ns0 * adjust_lon(lon_deg.to_radians() - self.lon_center);
        let x = rh1 * theta.sin() + self.false_easting;
        let y = self.rh - rh1 * theta.cos() + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = self.rh - y + self.false_northing;

        let sign = if self.ns0 >= 0.0 { 1.0 } else { -1.0 };
        let rh1 = sign * x.hypot(y);
        let theta = if rh1 != 0.0 {
            (sign * x).atan2(sign * y)
        } else {
            0.0
        };

        let con = rh1 * self.ns0 / self.r_major;
        let qs = (self.c - con * con) / self.ns0;

        let lat = if self.e >= 1e-10 {
            if (self.q_pole().abs() - qs.abs()).abs() > 1e-10 {
                phi1z(self.e, qs)?
            } else if qs >= 0.0 {
                FRAC_PI_2
            } else {
                -FRAC_PI_2
            }
        } else {
            phi1z(self.e, qs)?
        };

        let lon = adjust_lon(theta / self.ns0 + self.lon_center);
        Ok((lat.to_degrees(), lon.to_degrees()))
    }
}

pub fn forward(params: &AlbersParameters, ellipsoid: &Ellipsoid, lat: f64, lon: f64) -> SarResult<(f64, f64)> {
    AlbersEqualArea::new(params, ellipsoid)?.forward(lat, lon)
}

pub fn inverse(params: &AlbersParameters, ellipsoid: &Ellipsoid, x: f64, y: f64) -> SarResult<(f64, f64)> {
    AlbersEqualArea::new(params, ellipsoid)?.inverse(x, y)
}
