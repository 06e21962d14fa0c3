//! Geolocation: conversions between image pixels, slant range / time /
//! Doppler, Earth-fixed target positions, geodetic coordinates and map
//! coordinates.
//!
//! Heights are applied by growing both ellipsoid axes by the height, so a
//! point at height `h` lies on the ellipsoid `(a + h, b + h)` and its
//! latitude is the geodetic latitude on that ellipsoid.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::state_vectors::DEFAULT_MAX_EXTRAPOLATION;
use crate::core::vector::Vector3;
use crate::projection::{MapProjector, ProjectionType};
use crate::types::{
    is_valid_double, is_valid_int, Ellipsoid, ImageType, LookDirection, MetaLocation, MetaParameters,
    MetaSar, SarError, SarResult, StateVector,
};

/// Half-width of the central difference used for the pixel Jacobian
const PIXEL_DIFFERENCE_STEP: f64 = 0.5;

/// Convergence of the zero-Doppler time search (s)
const ZERO_DOPPLER_TOLERANCE: f64 = 1e-9;

/// Solver settings for geolocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Iteration cap for every root finder
    pub max_iterations: usize,
    /// Target position convergence (m)
    pub position_tolerance: f64,
    /// Pixel search convergence (pixels)
    pub pixel_tolerance: f64,
    /// How far outside the state vectors propagation is allowed (s)
    pub max_extrapolation_seconds: f64,
    /// Orbit propagation step (s)
    pub propagation_step_seconds: f64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            position_tolerance: 1e-6,
            pixel_tolerance: 1e-4,
            max_extrapolation_seconds: DEFAULT_MAX_EXTRAPOLATION,
            propagation_step_seconds: 1.0,
        }
    }
}

/// Coordinate spaces understood by [`Geolocator::transform`]. Each point is
/// a triple:
///
/// * `ImagePixels`: `[line, sample, height]`
/// * `SlantTimeDoppler`: `[time (s), slant range (m), Doppler (Hz)]`, on the
///   ellipsoid surface
/// * `TargetPosition`: Earth-fixed `[x, y, z]` (m)
/// * `LonLatDegrees`: `[longitude, latitude, height]`
/// * `MapCoordinates`: projection `[x, y, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSpace {
    ImagePixels,
    SlantTimeDoppler,
    TargetPosition,
    LonLatDegrees,
    MapCoordinates,
}

/// Image has a map projection block of a supported map projection
/// (not the along-track/cross-track frame of ScanSAR products)
pub fn is_map_projected(meta: &MetaParameters) -> bool {
    match &meta.projection {
        Some(proj) => proj.projection_type() != ProjectionType::ScansarProjection,
        None => false,
    }
}

/// Image is a plain latitude/longitude raster
pub fn is_lat_lon_pseudo(meta: &MetaParameters) -> bool {
    matches!(
        &meta.projection,
        Some(proj) if proj.projection_type() == ProjectionType::LatLongPseudoProjection
    )
}

/// SAR block of an image that still carries usable SAR geometry
pub(crate) fn require_sar_geometry<'m>(meta: &'m MetaParameters, routine: &str) -> SarResult<&'m MetaSar> {
    if is_lat_lon_pseudo(meta) {
        return Err(SarError::Precondition(format!(
            "{} cannot be used with lat/lon pseudo-projected images",
            routine
        )));
    }
    meta.sar()
}

fn require_valid(value: f64, name: &str) -> SarResult<f64> {
    if is_valid_double(value) {
        Ok(value)
    } else {
        Err(SarError::Metadata(format!("{} is not set", name)))
    }
}

/// Azimuth time (s from the state vector epoch) of a SAR image line
pub fn pixel_time(meta: &MetaParameters, line: f64, _sample: f64) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "pixel_time")?;
    let az = require_valid(sar.azimuth_time_per_pixel, "azimuth_time_per_pixel")?;
    let shift = if is_valid_double(sar.time_shift) { sar.time_shift } else { 0.0 };
    Ok((line + meta.general.start_line as f64) * az + shift)
}

/// Slant range (m) of a SAR image sample
pub fn slant_range(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    slant_range_with(meta, line, sample, &GeolocationConfig::default())
}

/// [`slant_range`] with ground range geometry taken from orbits limited by `config`
pub fn slant_range_with(
    meta: &MetaParameters,
    line: f64,
    sample: f64,
    config: &GeolocationConfig,
) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "slant_range")?;
    let slant_first = require_valid(sar.slant_range_first_pixel, "slant_range_first_pixel")?;
    let pixel = require_valid(meta.general.x_pixel_size, "x_pixel_size")?;
    let shift = if is_valid_double(sar.slant_shift) { sar.slant_shift } else { 0.0 };
    let x = sample + meta.general.start_sample as f64;

    match sar.image_type {
        ImageType::SlantRange => Ok(slant_first + x * pixel + shift),
        ImageType::GroundRange => {
            let er = crate::core::sar_geometry::earth_radius_with(meta, line, sample, config)?;
            let ht = crate::core::sar_geometry::satellite_height_with(meta, line, sample, config)?;
            let min_phi = ((ht * ht + er * er - slant_first * slant_first) / (2.0 * ht * er)).acos();
            let phi = min_phi + x * pixel / er;
            Ok((ht * ht + er * er - 2.0 * ht * er * phi.cos()).sqrt() + shift)
        }
        ImageType::Projected => Err(SarError::Precondition(
            "slant_range requires a slant or ground range image".to_string(),
        )),
    }
}

/// Doppler centroid (Hz) at a SAR image pixel; zero for deskewed images
pub fn doppler(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "doppler")?;
    if sar.deskewed {
        return Ok(0.0);
    }
    let x = sample + meta.general.start_sample as f64;
    let y = line + meta.general.start_line as f64;
    let rd = sar.range_doppler_coefficients;
    let ad = sar.azimuth_doppler_coefficients;
    Ok(rd[0] + rd[1] * x + rd[2] * x * x + ad[1] * y + ad[2] * y * y)
}

/// Doppler (Hz) seen by a sensor at `state` looking at `target`
pub fn geometric_doppler(state: &StateVector, target: &Vector3, wavelength: f64) -> f64 {
    let d = *target - state.pos;
    2.0 * d.dot(&state.vel) / (wavelength * d.magnitude())
}

/// Earth-fixed position of geodetic latitude/longitude (degrees) at `height` (m)
pub fn llh_to_xyz(ellipsoid: &Ellipsoid, lat: f64, lon: f64, height: f64) -> Vector3 {
    let e = ellipsoid.inflated(height);
    let (a2, b2) = (e.re_major * e.re_major, e.re_minor * e.re_minor);
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let n = a2 / (a2 * cos_lat * cos_lat + b2 * sin_lat * sin_lat).sqrt();
    Vector3::new(n * cos_lat * cos_lon, n * cos_lat * sin_lon, n * (b2 / a2) * sin_lat)
}

/// Geodetic latitude, longitude (degrees) and height (m) of an Earth-fixed position
pub fn xyz_to_llh(
    ellipsoid: &Ellipsoid,
    pos: &Vector3,
    max_iterations: usize,
    tolerance: f64,
) -> SarResult<(f64, f64, f64)> {
    let (a, b) = (ellipsoid.re_major, ellipsoid.re_minor);
    let p2 = pos.x * pos.x + pos.y * pos.y;
    let z2 = pos.z * pos.z;
    let r = pos.magnitude();
    if r == 0.0 {
        return Err(SarError::Degenerate("Cannot geolocate the Earth's center".to_string()));
    }

    let geocentric = (pos.z / r).asin().to_degrees();
    let mut h = r - ellipsoid.radius_at(geocentric);
    let mut converged = false;
    for _ in 0..max_iterations {
        let (ah, bh) = (a + h, b + h);
        let g = p2 / (ah * ah) + z2 / (bh * bh) - 1.0;
        let dg = -2.0 * p2 / (ah * ah * ah) - 2.0 * z2 / (bh * bh * bh);
        let step = g / dg;
        h -= step;
        if step.abs() <= tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(SarError::Convergence {
            routine: "xyz_to_llh",
            iterations: max_iterations,
        });
    }

    let (ah, bh) = (a + h, b + h);
    let lat = (pos.z * ah * ah).atan2(p2.sqrt() * bh * bh).to_degrees();
    let lon = pos.y.atan2(pos.x).to_degrees();
    Ok((lat, lon, h))
}

/// Geolocation of a single image described by its metadata
pub struct Geolocator<'a> {
    meta: &'a MetaParameters,
    config: GeolocationConfig,
    ellipsoid: Ellipsoid,
    look: LookDirection,
    projector: Option<Box<dyn MapProjector + Send + Sync>>,
}

impl<'a> Geolocator<'a> {
    pub fn new(meta: &'a MetaParameters) -> SarResult<Self> {
        Self::with_config(meta, GeolocationConfig::default())
    }

    pub fn with_config(meta: &'a MetaParameters, config: GeolocationConfig) -> SarResult<Self> {
        let look = meta.sar.as_ref().map(|s| s.look_direction).unwrap_or_default();
        let projector = match &meta.projection {
            Some(proj) => {
                proj.validate()?;
                Some(proj.projector(look)?)
            }
            None => None,
        };
        let ellipsoid = match &meta.projection {
            Some(proj) => proj.ellipsoid,
            None => meta.general.ellipsoid(),
        };
        Ok(Self {
            meta,
            config,
            ellipsoid,
            look,
            projector,
        })
    }

    pub fn meta(&self) -> &MetaParameters {
        self.meta
    }

    pub fn config(&self) -> &GeolocationConfig {
        &self.config
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Pixels address a projection grid rather than SAR geometry
    pub fn is_projected_grid(&self) -> bool {
        self.meta.projection.is_some()
            && self
                .meta
                .sar
                .as_ref()
                .map_or(true, |sar| sar.image_type == ImageType::Projected)
    }

    fn projector(&self) -> SarResult<&(dyn MapProjector + Send + Sync)> {
        self.projector
            .as_deref()
            .ok_or(SarError::MissingParameters("projection"))
    }

    /// Satellite state at `time` (s from the state vector epoch)
    pub fn state_vector(&self, time: f64) -> SarResult<StateVector> {
        self.meta.state_vectors()?.get_state_vector_with(
            time,
            self.config.max_extrapolation_seconds,
            self.config.propagation_step_seconds,
        )
    }

    /// Azimuth time of a pixel; zero-Doppler time for projected images
    pub fn time(&self, line: f64, sample: f64) -> SarResult<f64> {
        if self.is_projected_grid() {
            let (lat, lon) = self.pixel_to_ll(line, sample, 0.0)?;
            let target = llh_to_xyz(&self.ellipsoid, lat, lon, self.grid_height());
            return self.zero_doppler_time(&target);
        }
        pixel_time(self.meta, line, sample)
    }

    /// Slant range of a pixel (m)
    pub fn slant(&self, line: f64, sample: f64) -> SarResult<f64> {
        if self.is_projected_grid() {
            let (t, r, _) = self.pixel_to_std(line, sample)?;
            log::trace!("slant at zero-Doppler time {:.6}", t);
            return Ok(r);
        }
        slant_range_with(self.meta, line, sample, &self.config)
    }

    /// Doppler of a pixel (Hz); projected images are zero Doppler
    pub fn doppler(&self, line: f64, sample: f64) -> SarResult<f64> {
        if self.is_projected_grid() {
            return Ok(0.0);
        }
        doppler(self.meta, line, sample)
    }

    /// Time, slant range and Doppler of a pixel
    pub fn pixel_to_std(&self, line: f64, sample: f64) -> SarResult<(f64, f64, f64)> {
        if self.is_projected_grid() {
            let (lat, lon) = self.pixel_to_ll(line, sample, 0.0)?;
            let target = llh_to_xyz(&self.ellipsoid, lat, lon, self.grid_height());
            let t = self.zero_doppler_time(&target)?;
            let state = self.state_vector(t)?;
            return Ok((t, target.distance(&state.pos), 0.0));
        }
        Ok((
            pixel_time(self.meta, line, sample)?,
            slant_range_with(self.meta, line, sample, &self.config)?,
            doppler(self.meta, line, sample)?,
        ))
    }

    fn grid_height(&self) -> f64 {
        self.meta
            .projection
            .as_ref()
            .map(|p| p.height)
            .filter(|h| is_valid_double(*h))
            .unwrap_or(0.0)
    }

    /// Range rate (m/s) matching a Doppler frequency
    fn range_rate(&self, doppler: f64) -> SarResult<f64> {
        if doppler == 0.0 {
            return Ok(0.0);
        }
        let wavelength = require_valid(self.meta.sar()?.wavelength, "wavelength")?;
        Ok(doppler * wavelength / 2.0)
    }

    /// Earth-fixed target at the given time, slant range and Doppler, lying on
    /// the ellipsoid raised by `height`
    pub fn target_from_std(&self, time: f64, slant: f64, doppler: f64, height: f64) -> SarResult<Vector3> {
        let state = self.state_vector(time)?;
        let w = self.range_rate(doppler)?;
        let e = self.ellipsoid.inflated(height);
        let (a2, b2) = (e.re_major * e.re_major, e.re_minor * e.re_minor);
        let (s, v) = (state.pos, state.vel);

        let sat_radius = s.magnitude();
        let up = s.normalize()?;
        let along = (v - up * v.dot(&up)).normalize()?;
        let right = along.cross(&up);
        let side = match self.look {
            LookDirection::Right => right,
            LookDirection::Left => -right,
        };

        let earth_radius = e.radius_at((s.z / sat_radius).asin().to_degrees());
        let cos_look = (sat_radius * sat_radius + slant * slant - earth_radius * earth_radius)
            / (2.0 * sat_radius * slant);
        if !(cos_look <= 1.0) {
            return Err(SarError::Precondition(format!(
                "Slant range {:.1} m does not reach the ellipsoid from radius {:.1} m",
                slant, sat_radius
            )));
        }
        let look = cos_look.max(-1.0).acos();
        let squint = w * slant / v.magnitude();
        let mut target = s - up * (slant * look.cos()) + side * (slant * look.sin()) + along * squint;

        for iter in 0..self.config.max_iterations {
            let d = target - s;
            let r = d.magnitude();
            let f = [
                r - slant,
                d.dot(&v) - w * slant,
                (target.x * target.x + target.y * target.y) / a2 + target.z * target.z / b2 - 1.0,
            ];
            let rows = [
                d * (1.0 / r),
                v,
                Vector3::new(2.0 * target.x / a2, 2.0 * target.y / a2, 2.0 * target.z / b2),
            ];
            let step = solve3(&rows, &[-f[0], -f[1], -f[2]]).ok_or_else(|| {
                SarError::Degenerate(format!("Singular range/Doppler system at time {:.6}", time))
            })?;
            target = target + step;
            if step.magnitude() <= self.config.position_tolerance {
                log::trace!("target_from_std converged in {} iterations", iter + 1);
                return Ok(target);
            }
        }
        Err(SarError::Convergence {
            routine: "target_from_std",
            iterations: self.config.max_iterations,
        })
    }

    /// Latitude/longitude (degrees) at the given time, slant range, Doppler and height
    pub fn std_to_ll(&self, time: f64, slant: f64, doppler: f64, height: f64) -> SarResult<(f64, f64)> {
        let target = self.target_from_std(time, slant, doppler, height)?;
        self.ll_on_inflated(&target, height)
    }

    fn ll_on_inflated(&self, target: &Vector3, height: f64) -> SarResult<(f64, f64)> {
        let e = self.ellipsoid.inflated(height);
        let (a2, b2) = (e.re_major * e.re_major, e.re_minor * e.re_minor);
        let p = target.x.hypot(target.y);
        if p == 0.0 && target.z == 0.0 {
            return Err(SarError::Degenerate("Target at the Earth's center".to_string()));
        }
        let lat = (target.z * a2).atan2(p * b2).to_degrees();
        let lon = target.y.atan2(target.x).to_degrees();
        Ok((lat, lon))
    }

    /// Latitude/longitude (degrees) of a pixel at `height`
    pub fn pixel_to_ll(&self, line: f64, sample: f64, height: f64) -> SarResult<(f64, f64)> {
        if self.is_projected_grid() {
            let (x, y) = self.pixel_to_map(line, sample)?;
            return self.projector()?.inverse(x, y);
        }
        let (t, r, f) = self.pixel_to_std(line, sample)?;
        self.std_to_ll(t, r, f, height)
    }

    /// Pixel (line, sample) seeing latitude/longitude (degrees) at `height`
    pub fn ll_to_pixel(&self, lat: f64, lon: f64, height: f64) -> SarResult<(f64, f64)> {
        if self.is_projected_grid() {
            let (x, y) = self.projector()?.forward(lat, lon)?;
            return self.map_to_pixel(x, y);
        }

        let target = llh_to_xyz(&self.ellipsoid, lat, lon, height);
        let sar = require_sar_geometry(self.meta, "ll_to_pixel")?;
        let az = require_valid(sar.azimuth_time_per_pixel, "azimuth_time_per_pixel")?;
        let shift = if is_valid_double(sar.time_shift) { sar.time_shift } else { 0.0 };
        let zero_doppler = self.zero_doppler_time(&target)?;
        let mut line = (zero_doppler - shift) / az - self.meta.general.start_line as f64;
        let mut sample = if is_valid_int(self.meta.general.sample_count) {
            self.meta.general.sample_count as f64 / 2.0
        } else {
            0.0
        };

        let h = PIXEL_DIFFERENCE_STEP;
        for iter in 0..self.config.max_iterations {
            let f = self.range_doppler_residual(&target, line, sample)?;
            let fl = diff(
                self.range_doppler_residual(&target, line + h, sample)?,
                self.range_doppler_residual(&target, line - h, sample)?,
                2.0 * h,
            );
            let fs = diff(
                self.range_doppler_residual(&target, line, sample + h)?,
                self.range_doppler_residual(&target, line, sample - h)?,
                2.0 * h,
            );
            let det = fl[0] * fs[1] - fs[0] * fl[1];
            if det == 0.0 || !det.is_finite() {
                return Err(SarError::Degenerate(format!(
                    "Singular pixel Jacobian locating ({}, {})",
                    lat, lon
                )));
            }
            let dl = -(fs[1] * f[0] - fs[0] * f[1]) / det;
            let ds = -(fl[0] * f[1] - fl[1] * f[0]) / det;
            line += dl;
            sample += ds;
            if dl.abs() <= self.config.pixel_tolerance && ds.abs() <= self.config.pixel_tolerance {
                log::trace!("ll_to_pixel converged in {} iterations", iter + 1);
                return Ok((line, sample));
            }
        }
        Err(SarError::Convergence {
            routine: "ll_to_pixel",
            iterations: self.config.max_iterations,
        })
    }

    /// Slant range (m) and range rate (m/s) mismatch between the pixel's
    /// geometry and the target
    fn range_doppler_residual(&self, target: &Vector3, line: f64, sample: f64) -> SarResult<[f64; 2]> {
        let (t, r, f) = self.pixel_to_std(line, sample)?;
        let state = self.state_vector(t)?;
        let d = *target - state.pos;
        let range = d.magnitude();
        Ok([range - r, d.dot(&state.vel) / range - self.range_rate(f)?])
    }

    /// Time (s) at which the target is broadside to the satellite
    pub fn zero_doppler_time(&self, target: &Vector3) -> SarResult<f64> {
        let series = self.meta.state_vectors()?;
        let (first, last) = series
            .time_range()
            .ok_or_else(|| SarError::Orbit("State vector series is empty".to_string()))?;
        let mut t = 0.5 * (first + last);
        for iter in 0..self.config.max_iterations {
            let state = self.state_vector(t)?;
            let d = *target - state.pos;
            let dt = d.dot(&state.vel) / state.vel.dot(&state.vel);
            t += dt;
            if dt.abs() <= ZERO_DOPPLER_TOLERANCE {
                log::trace!("zero_doppler_time converged in {} iterations", iter + 1);
                return Ok(t);
            }
        }
        Err(SarError::Convergence {
            routine: "zero_doppler_time",
            iterations: self.config.max_iterations,
        })
    }

    /// Time, slant range and Doppler at which a ground point is imaged
    pub fn ll_to_std(&self, lat: f64, lon: f64, height: f64) -> SarResult<(f64, f64, f64)> {
        let target = llh_to_xyz(&self.ellipsoid, lat, lon, height);
        if self.is_projected_grid() {
            let t = self.zero_doppler_time(&target)?;
            let state = self.state_vector(t)?;
            return Ok((t, target.distance(&state.pos), 0.0));
        }
        let (line, sample) = self.ll_to_pixel(lat, lon, height)?;
        self.pixel_to_std(line, sample)
    }

    /// Projection coordinates of a pixel of a projected image
    pub fn pixel_to_map(&self, line: f64, sample: f64) -> SarResult<(f64, f64)> {
        let proj = self.meta.projection()?;
        Ok(proj.pixel_to_proj(sample, line))
    }

    /// Pixel (line, sample) of projection coordinates
    pub fn map_to_pixel(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        let (sample, line) = self.meta.projection()?.proj_to_pixel(x, y)?;
        Ok((line, sample))
    }

    pub fn ll_to_map(&self, lat: f64, lon: f64) -> SarResult<(f64, f64)> {
        self.projector()?.forward(lat, lon)
    }

    pub fn map_to_ll(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        self.projector()?.inverse(x, y)
    }

    pub fn xyz_to_llh(&self, pos: &Vector3) -> SarResult<(f64, f64, f64)> {
        xyz_to_llh(
            &self.ellipsoid,
            pos,
            self.config.max_iterations,
            self.config.position_tolerance,
        )
    }

    /// Convert a point between coordinate spaces
    pub fn transform(&self, from: CoordinateSpace, to: CoordinateSpace, point: [f64; 3]) -> SarResult<[f64; 3]> {
        use CoordinateSpace::*;

        if from == to {
            return Ok(point);
        }
        match (from, to) {
            (ImagePixels, SlantTimeDoppler) => {
                let (t, r, f) = self.pixel_to_std(point[0], point[1])?;
                return Ok([t, r, f]);
            }
            (ImagePixels, MapCoordinates) if self.is_projected_grid() => {
                let (x, y) = self.pixel_to_map(point[0], point[1])?;
                return Ok([x, y, point[2]]);
            }
            (MapCoordinates, ImagePixels) if self.is_projected_grid() => {
                let (line, sample) = self.map_to_pixel(point[0], point[1])?;
                return Ok([line, sample, point[2]]);
            }
            _ => {}
        }

        let (lat, lon, height) = match from {
            ImagePixels => {
                let (lat, lon) = self.pixel_to_ll(point[0], point[1], point[2])?;
                (lat, lon, point[2])
            }
            SlantTimeDoppler => {
                let (lat, lon) = self.std_to_ll(point[0], point[1], point[2], 0.0)?;
                (lat, lon, 0.0)
            }
            TargetPosition => self.xyz_to_llh(&Vector3::new(point[0], point[1], point[2]))?,
            LonLatDegrees => (point[1], point[0], point[2]),
            MapCoordinates => {
                let (lat, lon) = self.map_to_ll(point[0], point[1])?;
                (lat, lon, point[2])
            }
        };

        match to {
            ImagePixels => {
                let (line, sample) = self.ll_to_pixel(lat, lon, height)?;
                Ok([line, sample, height])
            }
            SlantTimeDoppler => {
                let (t, r, f) = self.ll_to_std(lat, lon, height)?;
                Ok([t, r, f])
            }
            TargetPosition => {
                let p = llh_to_xyz(&self.ellipsoid, lat, lon, height);
                Ok([p.x, p.y, p.z])
            }
            LonLatDegrees => Ok([lon, lat, height]),
            MapCoordinates => {
                let (x, y) = self.ll_to_map(lat, lon)?;
                Ok([x, y, height])
            }
        }
    }

    fn image_size(&self) -> SarResult<(usize, usize)> {
        let general = &self.meta.general;
        if !is_valid_int(general.line_count)
            || !is_valid_int(general.sample_count)
            || general.line_count <= 0
            || general.sample_count <= 0
        {
            return Err(SarError::Metadata(format!(
                "Invalid image size {} x {}",
                general.line_count, general.sample_count
            )));
        }
        Ok((general.line_count as usize, general.sample_count as usize))
    }

    /// Latitude/longitude of the four image corners at sea level
    pub fn corner_coords(&self) -> SarResult<MetaLocation> {
        let (lines, samples) = self.image_size()?;
        let last_line = (lines - 1) as f64;
        let last_sample = (samples - 1) as f64;

        let (lat_start_near_range, lon_start_near_range) = self.pixel_to_ll(0.0, 0.0, 0.0)?;
        let (lat_start_far_range, lon_start_far_range) = self.pixel_to_ll(0.0, last_sample, 0.0)?;
        let (lat_end_near_range, lon_end_near_range) = self.pixel_to_ll(last_line, 0.0, 0.0)?;
        let (lat_end_far_range, lon_end_far_range) = self.pixel_to_ll(last_line, last_sample, 0.0)?;

        Ok(MetaLocation {
            lat_start_near_range,
            lon_start_near_range,
            lat_start_far_range,
            lon_start_far_range,
            lat_end_near_range,
            lon_end_near_range,
            lat_end_far_range,
            lon_end_far_range,
        })
    }

    /// Latitude and longitude grids sampled every `step` lines and samples
    pub fn lat_lon_grid(&self, step: usize, height: f64) -> SarResult<(Array2<f64>, Array2<f64>)> {
        let (lines, samples) = self.image_size()?;
        let step = step.max(1);
        let rows = (lines + step - 1) / step;
        let cols = (samples + step - 1) / step;
        log::info!(
            "Geolocating {}x{} grid (step {}) over {}x{} image",
            rows,
            cols,
            step,
            lines,
            samples
        );

        let coords: Vec<(usize, usize)> = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .collect();
        let locate = |(i, j): (usize, usize)| self.pixel_to_ll((i * step) as f64, (j * step) as f64, height);

        #[cfg(feature = "parallel")]
        let values: SarResult<Vec<(f64, f64)>> = {
            use rayon::prelude::*;
            coords.into_par_iter().map(locate).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let values: SarResult<Vec<(f64, f64)>> = coords.into_iter().map(locate).collect();

        let (lat, lon): (Vec<f64>, Vec<f64>) = values?.into_iter().unzip();
        let lat = Array2::from_shape_vec((rows, cols), lat)
            .map_err(|e| SarError::Processing(format!("Shape error: {}", e)))?;
        let lon = Array2::from_shape_vec((rows, cols), lon)
            .map_err(|e| SarError::Processing(format!("Shape error: {}", e)))?;
        Ok((lat, lon))
    }
}

fn diff(plus: [f64; 2], minus: [f64; 2], width: f64) -> [f64; 2] {
    [(plus[0] - minus[0]) / width, (plus[1] - minus[1]) / width]
}

/// Solve `M x = y` where `rows` are the rows of M
fn solve3(rows: &[Vector3; 3], y: &[f64; 3]) -> Option<Vector3> {
    let [a, b, c] = rows;
    let bc = b.cross(c);
    let det = a.dot(&bc);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let x = bc * y[0] + c.cross(a) * y[1] + a.cross(b) * y[2];
    Some(x * (1.0 / det))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{MetaProjection, ProjectionParameters, UtmParameters};
    use crate::types::{Hemisphere, MetaGeneral, StateLoc, StateVectorSeries};
    use approx::assert_abs_diff_eq;

    fn ers_series() -> StateVectorSeries {
        let s0 = StateVector::new(
            Vector3::new(-2_423_929.8125, -2_113_451.3611, 6_391_908.6914),
            Vector3::new(-6_520.257_272_7, -2_099.355_996_9, -3_160.138_183_6),
        );
        let mut series = StateVectorSeries::new(1995, 313, 75_322.359_375);
        for i in 0..5 {
            let t = i as f64 * 10.0;
            series.vectors.push(StateLoc {
                time: t,
                vec: crate::core::propagate::propagate(&s0, 0.0, t),
            });
        }
        series
    }

    fn slant_meta() -> MetaParameters {
        MetaParameters {
            general: MetaGeneral {
                line_count: 2000,
                sample_count: 1000,
                x_pixel_size: 20.0,
                y_pixel_size: 4.0,
                ..MetaGeneral::default()
            },
            sar: Some(MetaSar {
                azimuth_time_per_pixel: 0.005,
                time_shift: 10.0,
                slant_range_first_pixel: 840_000.0,
                wavelength: 0.056_565_94,
                range_doppler_coefficients: [300.0, -0.02, 0.0],
                ..MetaSar::default()
            }),
            state_vectors: Some(ers_series()),
            ..MetaParameters::default()
        }
    }

    #[test]
    fn test_llh_xyz_roundtrip() {
        let e = Ellipsoid::wgs84();
        for &(lat, lon, h) in &[(63.8, -145.0, 0.0), (-33.0, 151.2, 1200.0), (89.9, 10.0, -50.0), (0.0, 0.0, 0.0)] {
            let p = llh_to_xyz(&e, lat, lon, h);
            let (lat2, lon2, h2) = xyz_to_llh(&e, &p, 50, 1e-6).unwrap();
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-9);
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-9);
            assert_abs_diff_eq!(h2, h, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_equator_point_is_semi_major() {
        let e = Ellipsoid::wgs84();
        let p = llh_to_xyz(&e, 0.0, 90.0, 100.0);
        assert_abs_diff_eq!(p.y, e.re_major + 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pixel_geometry() {
        let meta = slant_meta();
        assert_abs_diff_eq!(pixel_time(&meta, 100.0, 0.0).unwrap(), 10.5, epsilon = 1e-12);
        assert_abs_diff_eq!(slant_range(&meta, 0.0, 10.0).unwrap(), 840_200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(doppler(&meta, 0.0, 100.0).unwrap(), 298.0, epsilon = 1e-9);

        let mut deskewed = meta.clone();
        if let Some(sar) = deskewed.sar.as_mut() {
            sar.deskewed = true;
        }
        assert_eq!(doppler(&deskewed, 0.0, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn test_std_closure() {
        let meta = slant_meta();
        let geo = Geolocator::new(&meta).unwrap();
        let (t, r, f) = geo.pixel_to_std(1000.0, 500.0).unwrap();
        let target = geo.target_from_std(t, r, f, 0.0).unwrap();
        let state = geo.state_vector(t).unwrap();
        assert_abs_diff_eq!(target.distance(&state.pos), r, epsilon = 1e-4);
        assert_abs_diff_eq!(geometric_doppler(&state, &target, 0.056_565_94), f, epsilon = 1e-4);
    }

    #[test]
    fn test_pixel_roundtrip() {
        let meta = slant_meta();
        let geo = Geolocator::new(&meta).unwrap();
        for &(line, sample) in &[(0.0, 0.0), (1000.0, 500.0), (1999.0, 999.0)] {
            let (lat, lon) = geo.pixel_to_ll(line, sample, 0.0).unwrap();
            let (line2, sample2) = geo.ll_to_pixel(lat, lon, 0.0).unwrap();
            assert_abs_diff_eq!(line2, line, epsilon = 1e-2);
            assert_abs_diff_eq!(sample2, sample, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_right_looking_is_right_of_track() {
        let meta = slant_meta();
        let geo = Geolocator::new(&meta).unwrap();
        let (t, r, f) = geo.pixel_to_std(0.0, 0.0).unwrap();
        let target = geo.target_from_std(t, r, f, 0.0).unwrap();
        let state = geo.state_vector(t).unwrap();
        let right = state.vel.cross(&state.pos);
        assert!((target - state.pos).dot(&right) > 0.0);

        let mut left = meta.clone();
        if let Some(sar) = left.sar.as_mut() {
            sar.look_direction = LookDirection::Left;
        }
        let geo = Geolocator::new(&left).unwrap();
        let target = geo.target_from_std(t, r, f, 0.0).unwrap();
        assert!((target - state.pos).dot(&right) < 0.0);
    }

    #[test]
    fn test_pseudo_projection_refuses_sar_helpers() {
        let mut meta = slant_meta();
        meta.projection = Some(MetaProjection::new(
            ProjectionParameters::LatLonPseudo,
            Ellipsoid::wgs84(),
        ));
        assert!(is_lat_lon_pseudo(&meta));
        assert!(matches!(doppler(&meta, 0.0, 0.0), Err(SarError::Precondition(_))));
        assert!(matches!(slant_range(&meta, 0.0, 0.0), Err(SarError::Precondition(_))));
    }

    #[test]
    fn test_projected_grid_pixels() {
        let mut proj = MetaProjection::new(
            ProjectionParameters::Utm(UtmParameters::new(6, Hemisphere::North)),
            Ellipsoid::wgs84(),
        );
        proj.start_x = 500_000.0;
        proj.start_y = 7_000_000.0;
        proj.per_x = 30.0;
        proj.per_y = -30.0;
        let meta = MetaParameters {
            general: MetaGeneral {
                line_count: 100,
                sample_count: 100,
                ..MetaGeneral::default()
            },
            projection: Some(proj),
            ..MetaParameters::default()
        };
        assert!(is_map_projected(&meta));
        let geo = Geolocator::new(&meta).unwrap();
        assert!(geo.is_projected_grid());
        let (lat, lon) = geo.pixel_to_ll(10.0, 20.0, 0.0).unwrap();
        let (line, sample) = geo.ll_to_pixel(lat, lon, 0.0).unwrap();
        assert_abs_diff_eq!(line, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sample, 20.0, epsilon = 1e-6);
        assert_eq!(geo.doppler(10.0, 20.0).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_projection_for_map_space() {
        let meta = slant_meta();
        let geo = Geolocator::new(&meta).unwrap();
        let err = geo
            .transform(CoordinateSpace::LonLatDegrees, CoordinateSpace::MapCoordinates, [-145.0, 63.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, SarError::MissingParameters("projection")));
    }

    #[test]
    fn test_solve3() {
        let rows = [
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(1.0, 0.0, 4.0),
        ];
        let x = solve3(&rows, &[2.0, 6.0, 9.0]).unwrap();
        assert_abs_diff_eq!(x.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x.z, 2.0, epsilon = 1e-12);
    }
}
