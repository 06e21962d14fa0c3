//! Along-track / cross-track coordinates
//!
//! A sphere of radius `rlocal` rotated so that the satellite position at the
//! reference time sits at the origin and the orbit plane is the equator.
//! `c1` is along-track distance, `c2` cross-track distance.

use serde::{Deserialize, Serialize};

use super::MapProjector;
use crate::core::vector::{cart2sph, sph2cart, Vector3};
use crate::types::{Ellipsoid, LookDirection, SarResult, StateVector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtctParameters {
    /// Earth radius at scene center (m)
    pub rlocal: f64,
    /// Rotation angles in degrees, derived by [`atct_init`]
    pub alpha1: f64,
    pub alpha2: f64,
    pub alpha3: f64,
}

impl AtctParameters {
    /// Parameters for the frame centered under `state`, the image start state vector
    pub fn from_state_vector(rlocal: f64, state: &StateVector) -> SarResult<Self> {
        let (alpha1, alpha2, alpha3) = atct_init(state)?;
        Ok(Self {
            rlocal,
            alpha1,
            alpha2,
            alpha3,
        })
    }
}

/// Rotation angles (degrees) placing `state` at the origin of the along-track frame
pub fn atct_init(state: &StateVector) -> SarResult<(f64, f64, f64)> {
    let up = Vector3::new(0.0, 0.0, 1.0);

    let z_orbit = state.pos.cross(&state.vel).normalize()?;
    let y_axis = z_orbit.cross(&up).normalize()?;
    let a = y_axis.cross(&z_orbit).normalize()?;

    let mut alpha1 = a.y.atan2(a.x).to_degrees();
    let mut alpha2 = -(a.z.clamp(-1.0, 1.0).asin().to_degrees());
    if z_orbit.z < 0.0 {
        alpha1 += 180.0;
        alpha2 = -(180.0 - alpha2.abs());
    }

    let nd = a.cross(&state.pos).normalize()?;
    let cos_alpha3 = (a.dot(&state.pos) / state.pos.magnitude()).clamp(-1.0, 1.0);
    let mut alpha3 = cos_alpha3.acos().to_degrees();
    if nd.dot(&z_orbit) < 0.0 {
        alpha3 = -alpha3;
    }

    log::debug!("atct_init: alpha1={:.6} alpha2={:.6} alpha3={:.6}", alpha1, alpha2, alpha3);
    Ok((alpha1, alpha2, alpha3))
}

/// Geodetic lat/lon (degrees) to along-track / cross-track (c1, c2) meters
pub fn ll_to_atct(
    params: &AtctParameters,
    ellipsoid: &Ellipsoid,
    look: LookDirection,
    lat_d: f64,
    lon: f64,
) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let lat = (lat_d.to_radians().tan() * (1.0 - e2)).atan();
    let pos = sph2cart(params.rlocal, lat, lon.to_radians())
        .rotate_z(params.alpha1)
        .rotate_y(params.alpha2)
        .rotate_z(params.alpha3);

    let (_, qlat, qlon) = cart2sph(&pos);
    let c1 = qlon * params.rlocal * qlat.cos();
    let c2 = look.cross_track_sign() * qlat * params.rlocal;
    (c1, c2)
}

/// Along-track / cross-track (c1, c2) meters to geodetic lat/lon (degrees)
pub fn atct_to_ll(
    params: &AtctParameters,
    ellipsoid: &Ellipsoid,
    look: LookDirection,
    c1: f64,
    c2: f64,
) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let qlat = look.cross_track_sign() * c2 / params.rlocal;
    let qlon = c1 / (params.rlocal * qlat.cos());

    let pos = sph2cart(params.rlocal, qlat, qlon)
        .rotate_z(-params.alpha3)
        .rotate_y(-params.alpha2)
        .rotate_z(-params.alpha1);

    let (_, lat, lon) = cart2sph(&pos);
    let lat_d = (lat.tan() / (1.0 - e2)).atan().to_degrees();
    (lat_d, lon.to_degrees())
}

/// Projector over the along-track frame; x is cross-track, y along-track
#[derive(Debug, Clone)]
pub struct AlongTrackCrossTrack {
    params: AtctParameters,
    ellipsoid: Ellipsoid,
    look: LookDirection,
}

impl AlongTrackCrossTrack {
    pub fn new(params: &AtctParameters, ellipsoid: &Ellipsoid, look: LookDirection) -> Self {
        Self {
            params: *params,
            ellipsoid: *ellipsoid,
            look,
        }
    }
}

impl MapProjector for AlongTrackCrossTrack {
    fn forward(&self, lat: f64, lon: f64) -> SarResult<(f64, f64)> {
        let (c1, c2) = ll_to_atct(&self.params, &self.ellipsoid, self.look, lat, lon);
        Ok((c2, c1))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        Ok(atct_to_ll(&self.params, &self.ellipsoid, self.look, y, x))
    }
}
