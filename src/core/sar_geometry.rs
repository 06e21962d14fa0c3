//! SAR imaging geometry helpers: earth radius, satellite height, look and
//! incidence angles, and the range resampling tables used when converting
//! between slant and ground range.

use std::f64::consts::PI;

use crate::core::geolocate::{pixel_time, require_sar_geometry, slant_range, GeolocationConfig};
use crate::types::{is_valid_double, is_valid_int, ImageType, MetaParameters, SarError, SarResult};

/// Height increment used to measure terrain induced pixel shifts (m)
const HEIGHT_SHIFT_STEP: f64 = 1000.0;

/// Distance from the Earth's center to the satellite (m)
pub fn satellite_height(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    satellite_height_with(meta, line, sample, &GeolocationConfig::default())
}

/// [`satellite_height`] with the orbit extrapolation limits of `config`
pub fn satellite_height_with(
    meta: &MetaParameters,
    line: f64,
    sample: f64,
    config: &GeolocationConfig,
) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "satellite_height")?;
    if is_valid_double(sar.satellite_height) {
        return Ok(sar.satellite_height);
    }
    let time = pixel_time(meta, line, sample)?;
    let state = meta.state_vectors()?.get_state_vector_with(
        time,
        config.max_extrapolation_seconds,
        config.propagation_step_seconds,
    )?;
    Ok(state.pos.magnitude())
}

/// Earth radius (m) below the satellite at a pixel
pub fn earth_radius(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    earth_radius_with(meta, line, sample, &GeolocationConfig::default())
}

/// [`earth_radius`] with the orbit extrapolation limits of `config`
pub fn earth_radius_with(
    meta: &MetaParameters,
    line: f64,
    sample: f64,
    config: &GeolocationConfig,
) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "earth_radius")?;
    if is_valid_double(sar.earth_radius) {
        return Ok(sar.earth_radius);
    }
    let ellipsoid = meta.general.ellipsoid();

    if sar.image_type == ImageType::Projected {
        // The projection block may not be usable yet; estimate from the scene center.
        if !is_valid_double(meta.general.center_latitude) {
            return Err(SarError::Precondition(
                "earth_radius: center latitude must be valid".to_string(),
            ));
        }
        return Ok(ellipsoid.radius_at(meta.general.center_latitude));
    }

    let time = pixel_time(meta, line, sample)?;
    let state = meta.state_vectors()?.get_state_vector_with(
        time,
        config.max_extrapolation_seconds,
        config.propagation_step_seconds,
    )?;
    let lat = (state.pos.z / state.pos.magnitude()).asin();
    Ok(ellipsoid.radius_at(lat.to_degrees()))
}

/// Slant range to the first pixel and slant range pixel spacing (m)
pub fn slants(meta: &MetaParameters) -> SarResult<(f64, f64)> {
    let sar = require_sar_geometry(meta, "slants")?;
    Ok((sar.slant_range_first_pixel, meta.general.x_pixel_size))
}

/// Radar wavenumber 2pi/lambda (rad/m)
pub fn wavenumber(meta: &MetaParameters) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "wavenumber")?;
    if !is_valid_double(sar.wavelength) || sar.wavelength <= 0.0 {
        return Err(SarError::Metadata(format!("Invalid wavelength {}", sar.wavelength)));
    }
    Ok(2.0 * PI / sar.wavelength)
}

/// Signed fraction of the original scene from its center line
pub fn scene_fraction(meta: &MetaParameters, line: i32) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "scene_fraction")?;
    let lines = sar.original_line_count;
    if !is_valid_int(lines) || lines <= 0 {
        return Err(SarError::Metadata(format!("Invalid original line count {}", lines)));
    }
    Ok((line - lines / 2) as f64 / lines as f64)
}

/// Look angle (radians) off nadir at a pixel
pub fn look_angle(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    let sr = slant_range(meta, line, sample)?;
    let re = earth_radius(meta, line, sample)?;
    let ht = satellite_height(meta, line, sample)?;
    Ok(((sr * sr + ht * ht - re * re) / (2.0 * sr * ht)).acos())
}

/// Incidence angle (radians) on a spherical Earth at a pixel
pub fn incidence_angle(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    let sr = slant_range(meta, line, sample)?;
    let re = earth_radius(meta, line, sample)?;
    let ht = satellite_height(meta, line, sample)?;
    Ok(PI - ((sr * sr + re * re - ht * ht) / (2.0 * sr * re)).acos())
}

/// Look angle relative to the look angle at mid swath of the first line
pub fn flat_earth_look(meta: &MetaParameters, line: f64, sample: f64) -> SarResult<f64> {
    let sar = require_sar_geometry(meta, "flat_earth_look")?;
    if !is_valid_int(sar.original_sample_count) {
        return Err(SarError::Metadata("original_sample_count is not set".to_string()));
    }
    let center = (sar.original_sample_count / 2) as f64;
    Ok(look_angle(meta, line, sample)? - look_angle(meta, 0.0, center)?)
}

/// Per-sample range geometry of a slant range image, held in caller-owned
/// buffers of one entry per sample.
#[derive(Debug, Clone, Default)]
pub struct RangeTables {
    /// Slant range of each slant range pixel (m)
    pub slant_range: Vec<f64>,
    pub slant_range_sqr: Vec<f64>,
    /// Incidence angle of each slant range pixel (radians)
    pub incidence: Vec<f64>,
    pub sin_incidence: Vec<f64>,
    pub cos_incidence: Vec<f64>,
    /// Slant range pixel of each ground range pixel
    pub slant_gr: Vec<f64>,
    /// Ground range pixel shift per meter of height, by ground range pixel
    pub height_shift_gr: Vec<f64>,
    /// Ground range pixel of each slant range pixel
    pub ground_sr: Vec<f64>,
    /// Slant range pixel shift per meter of height, by slant range pixel
    pub height_shift_sr: Vec<f64>,
    /// Earth central angle of the first and last pixel (radians)
    pub min_phi: f64,
    pub max_phi: f64,
    /// Ground range pixels per radian of central angle
    pub phi_mul: f64,
}

impl RangeTables {
    /// Tables for an image `samples` wide
    pub fn new(samples: usize) -> Self {
        Self {
            slant_range: vec![0.0; samples],
            slant_range_sqr: vec![0.0; samples],
            incidence: vec![0.0; samples],
            sin_incidence: vec![0.0; samples],
            cos_incidence: vec![0.0; samples],
            slant_gr: vec![0.0; samples],
            height_shift_gr: vec![0.0; samples],
            ground_sr: vec![0.0; samples],
            height_shift_sr: vec![0.0; samples],
            min_phi: 0.0,
            max_phi: 0.0,
            phi_mul: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.slant_range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slant_range.is_empty()
    }

    /// Earth central angle of a ground range pixel
    pub fn gr_x_to_phi(&self, gr: f64) -> f64 {
        self.min_phi + gr / self.phi_mul
    }

    /// Ground range pixel of an Earth central angle
    pub fn phi_to_gr_x(&self, phi: f64) -> f64 {
        (phi - self.min_phi) * self.phi_mul
    }
}

/// Fill `tables` with the range geometry of a slant range image and return
/// the ground range pixel spacing (m).
pub fn calc_ranges(meta: &MetaParameters, tables: &mut RangeTables) -> SarResult<f64> {
    let ns = tables.len();
    if ns < 2 {
        return Err(SarError::Processing(format!(
            "Range tables need at least 2 samples, got {}",
            ns
        )));
    }
    let center_line = (meta.general.line_count / 2) as f64;
    let center_sample = (meta.general.sample_count / 2) as f64;
    let er = earth_radius(meta, center_line, center_sample)?;
    let ht = satellite_height(meta, center_line, center_sample)?;

    let (first, per) = slants(meta)?;
    let slant_first = first + per * meta.general.start_sample as f64;
    let slant_per = per;
    let er2_ht2 = er * er - ht * ht;
    let central_angle = |er: f64, slant_sqr: f64| ((ht * ht + er * er - slant_sqr) / (2.0 * ht * er)).acos();

    tables.min_phi = central_angle(er, slant_first * slant_first);
    for x in 0..ns {
        let sr = slant_first + x as f64 * slant_per;
        tables.slant_range[x] = sr;
        tables.slant_range_sqr[x] = sr * sr;
        let incidence = PI - ((sr * sr + er2_ht2) / (2.0 * er * sr)).acos();
        tables.incidence[x] = incidence;
        tables.sin_incidence[x] = incidence.sin();
        tables.cos_incidence[x] = incidence.cos();
    }
    tables.max_phi = central_angle(er, tables.slant_range_sqr[ns - 1]);
    tables.phi_mul = (ns - 1) as f64 / (tables.max_phi - tables.min_phi);

    let raised = er + HEIGHT_SHIFT_STEP;
    for x in 0..ns {
        let phi_sea = tables.gr_x_to_phi(x as f64);
        let sr = (ht * ht + er * er - 2.0 * ht * er * phi_sea.cos()).sqrt();
        tables.slant_gr[x] = (sr - slant_first) / slant_per;
        let phi = central_angle(raised, sr * sr);
        tables.height_shift_gr[x] = (tables.phi_to_gr_x(phi) - x as f64) / HEIGHT_SHIFT_STEP;
    }
    for x in 0..ns {
        let phi_sea = central_angle(er, tables.slant_range_sqr[x]);
        tables.ground_sr[x] = tables.phi_to_gr_x(phi_sea);
        let sr = (ht * ht + raised * raised - 2.0 * ht * raised * phi_sea.cos()).sqrt();
        tables.height_shift_sr[x] = ((sr - slant_first) / slant_per - x as f64) / HEIGHT_SHIFT_STEP;
    }

    let ground_pixel = er / tables.phi_mul;
    log::debug!(
        "calc_ranges: {} samples, phi [{:.6}, {:.6}], ground pixel {:.3} m",
        ns,
        tables.min_phi,
        tables.max_phi,
        ground_pixel
    );
    Ok(ground_pixel)
}

/// Fill `gr2sr` with the ground range pixel of each output slant range pixel
/// spaced `sr_inc` meters apart.
pub fn gr2sr_vec(meta: &MetaParameters, sr_inc: f64, gr2sr: &mut [f64]) -> SarResult<()> {
    let r_sc = satellite_height(meta, 0.0, 0.0)?;
    let r_close = slant_range(meta, 0.0, 0.0)?;
    let r_earth = earth_radius(meta, 0.0, 0.0)?;
    let grinc = meta.general.x_pixel_size;
    if !is_valid_double(grinc) || grinc <= 0.0 {
        return Err(SarError::Metadata(format!("Invalid ground range pixel size {}", grinc)));
    }

    let x = 1.0 + (r_sc - r_earth) / r_earth;
    let x2 = x * x;
    let ground = |slant: f64| {
        let y = slant / r_earth;
        r_earth * ((1.0 + x2 - y * y) / (2.0 * x)).acos()
    };
    let rg0 = ground(r_close);
    for (i, value) in gr2sr.iter_mut().enumerate() {
        *value = (ground(r_close + i as f64 * sr_inc) - rg0) / grinc;
    }
    Ok(())
}

/// Number of slant range samples whose ground range source lies inside an
/// image `ground_samples` wide
pub fn slant_sample_count(gr2sr: &[f64], ground_samples: usize) -> usize {
    gr2sr
        .iter()
        .position(|&g| !(g < ground_samples as f64))
        .unwrap_or(gr2sr.len())
        .saturating_sub(1)
}
