//! Universal Transverse Mercator

use serde::{Deserialize, Serialize};

use super::series::{adjust_lon_deg, meridian_distance};
use super::MapProjector;
use crate::types::{is_valid_double, Ellipsoid, Hemisphere, SarError, SarResult};

/// Central meridian scale factor
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

pub const UTM_FALSE_EASTING: f64 = 500_000.0;

const FOOTPOINT_TOLERANCE: f64 = 1e-12;
const FOOTPOINT_MAX_ITERATIONS: usize = 10;

/// False northing of southern-hemisphere zones
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmParameters {
    /// Zone number, 1 to 60
    pub zone: i32,
    pub false_easting: f64,
    pub false_northing: f64,
    pub hemisphere: Hemisphere,
}

impl UtmParameters {
    /// Standard zone parameters for the hemisphere
    pub fn new(zone: i32, hemisphere: Hemisphere) -> Self {
        let false_northing = match hemisphere {
            Hemisphere::North => 0.0,
            Hemisphere::South => UTM_FALSE_NORTHING_SOUTH,
        };
        Self {
            zone,
            false_easting: UTM_FALSE_EASTING,
            false_northing,
            hemisphere,
        }
    }

    /// Zone and hemisphere containing a point
    pub fn for_location(lat: f64, lon: f64) -> Self {
        Self::new(utm_zone(lon), Hemisphere::from_latitude(lat))
    }

    /// Longitude of the zone's central meridian (degrees)
    pub fn central_meridian(&self) -> f64 {
        (self.zone - 1) as f64 * 6.0 - 177.0
    }
}

/// UTM zone containing a longitude (degrees)
pub fn utm_zone(lon: f64) -> i32 {
    let zone = ((180.0 + adjust_lon_deg(lon)) / 6.0 + 1.0).floor() as i32;
    zone.clamp(1, 60)
}

/// Transverse Mercator on the given ellipsoid, UTM zone conventions
#[derive(Debug, Clone)]
pub struct Utm {
    params: UtmParameters,
    re_major: f64,
    e2: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Utm {
    pub fn new(params: &UtmParameters, ellipsoid: &Ellipsoid) -> SarResult<Self> {
        if !(1..=60).contains(&params.zone) {
            return Err(SarError::Projection(format!(
                "UTM zone {} is outside 1..60",
                params.zone
            )));
        }
        let defaults = UtmParameters::new(params.zone, params.hemisphere);
        let false_easting = if is_valid_double(params.false_easting) {
            params.false_easting
        } else {
            defaults.false_easting
        };
        let false_northing = if is_valid_double(params.false_northing) {
            params.false_northing
        } else {
            defaults.false_northing
        };
        Ok(Self {
            params: *params,
            re_major: ellipsoid.re_major,
            e2: ellipsoid.e2(),
            lon0: params.central_meridian(),
            false_easting,
            false_northing,
        })
    }

    pub fn parameters(&self) -> &UtmParameters {
        &self.params
    }
}

impl MapProjector for Utm {
    fn forward(&self, lat_deg: f64, lon_deg: f64) -> SarResult<(f64, f64)> {
        let k0 = UTM_SCALE_FACTOR;
        let e2 = self.e2;
        let ep2 = e2 / (1.0 - e2);
        let lat = lat_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();

        let rn = self.re_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let tan_lat = lat.tan();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a = cos_lat * adjust_lon_deg(lon_deg - self.lon0).to_radians();
        let (a2, a3, a4, a5, a6) = (a * a, a * a * a, a.powi(4), a.powi(5), a.powi(6));

        let x = k0
            * rn
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + self.false_easting;

        let m = meridian_distance(self.re_major, e2, lat);
        let y = k0
            * (m + rn
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0))
            + self.false_northing;

        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let k0 = UTM_SCALE_FACTOR;
        let esq = self.e2;
        let ep2 = esq / (1.0 - esq);

        // Footpoint latitude
        let m = (y - self.false_northing) / k0;
        let e1 = (1.0 - (1.0 - esq).sqrt()) / (1.0 + (1.0 - esq).sqrt());
        let mu = m / (self.re_major * (1.0 - esq / 4.0 - 3.0 * esq * esq / 64.0 - 5.0 * esq.powi(3) / 256.0));
        let lat1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();
        let lat1 = footpoint_latitude(self.re_major, esq, m, lat1)?;

        let (sin1, cos1) = lat1.sin_cos();
        let esqsin2 = 1.0 - esq * sin1 * sin1;
        let c1 = ep2 * cos1 * cos1;
        let tan1 = sin1 / cos1;
        let t1 = tan1 * tan1;
        let rn1 = self.re_major / esqsin2.sqrt();
        let r1 = self.re_major * (1.0 - esq) / (esqsin2 * esqsin2 * esqsin2).sqrt();
        let d = (x - self.false_easting) / (rn1 * k0);

        let lat = lat1
            - (rn1 * tan1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
                / 120.0)
            / cos1;

        Ok((lat.to_degrees(), adjust_lon_deg(self.lon0 + dlon.to_degrees())))
    }
}

/// Newton refinement of the footpoint latitude against [`meridian_distance`]
///
/// The closed-form series above is truncated at a lower order than the
/// forward meridian arc, which leaves sub-millimeter round-trip drift.
fn footpoint_latitude(re_major: f64, esq: f64, m: f64, guess: f64) -> SarResult<f64> {
    let mut lat = guess;
    for iteration in 1..=FOOTPOINT_MAX_ITERATIONS {
        let sin_lat = lat.sin();
        let w = 1.0 - esq * sin_lat * sin_lat;
        // dM/dphi is the meridional radius of curvature
        let step = (m - meridian_distance(re_major, esq, lat)) * (w * w * w).sqrt() / (re_major * (1.0 - esq));
        if !step.is_finite() {
            return Err(SarError::Projection(format!("UTM footpoint: non-finite step for arc {}", m)));
        }
        lat += step;
        if step.abs() <= FOOTPOINT_TOLERANCE {
            log::trace!("UTM footpoint converged after {} iterations", iteration);
            return Ok(lat);
        }
    }
    Err(SarError::Convergence {
        routine: "UTM footpoint latitude",
        iterations: FOOTPOINT_MAX_ITERATIONS,
    })
}

/// Forward UTM: (lat, lon) degrees to (easting, northing) meters
pub fn forward(params: &UtmParameters, ellipsoid: &Ellipsoid, lat: f64, lon: f64) -> SarResult<(f64, f64)> {
    Utm::new(params, ellipsoid)?.forward(lat, lon)
}

/// Inverse UTM: (easting, northing) meters to (lat, lon) degrees
pub fn inverse(params: &UtmParameters, ellipsoid: &Ellipsoid, x: f64, y: f64) -> SarResult<(f64, f64)> {
    Utm::new(params, ellipsoid)?.inverse(x, y)
}
