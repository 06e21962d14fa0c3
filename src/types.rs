use serde::{Deserialize, Serialize};

use crate::core::vector::Vector3;
use crate::projection::MetaProjection;

/// Unset marker for optional `f64` metadata fields
pub const MAGIC_UNSET_DOUBLE: f64 = f64::NAN;

/// Unset marker for optional integer metadata fields
pub const MAGIC_UNSET_INT: i32 = -999_999_999;

/// Unset marker for optional character metadata fields
pub const MAGIC_UNSET_CHAR: char = '?';

/// Unset marker for optional string metadata fields
pub const MAGIC_UNSET_STRING: &str = "???";

/// WGS84 semi-major axis, used when the metadata leaves the ellipsoid unset
pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;

/// WGS84 semi-minor axis, used when the metadata leaves the ellipsoid unset
pub const WGS84_SEMI_MINOR: f64 = 6_356_752.31414;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// A double is valid when it is finite (NaN is the unset marker).
pub fn is_valid_double(value: f64) -> bool {
    value.is_finite()
}

pub fn is_valid_int(value: i32) -> bool {
    value != MAGIC_UNSET_INT
}

pub fn is_valid_char(value: char) -> bool {
    value != MAGIC_UNSET_CHAR
}

pub fn is_valid_string(value: &str) -> bool {
    value != MAGIC_UNSET_STRING
}

/// Error types for geolocation and projection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SarError {
    #[error("Unrecognized map projection '{0}'")]
    UnknownProjection(String),

    #[error("Missing parameter block: {0}")]
    MissingParameters(&'static str),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("{routine} failed to converge after {iterations} iterations")]
    Convergence {
        routine: &'static str,
        iterations: usize,
    },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Orbit error: {0}")]
    Orbit(String),

    #[error("Time conversion error: {0}")]
    Time(String),

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

/// Reference ellipsoid. Eccentricity is always derived from the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major (equatorial) axis in meters
    pub re_major: f64,
    /// Semi-minor (polar) axis in meters
    pub re_minor: f64,
}

impl Ellipsoid {
    pub fn new(re_major: f64, re_minor: f64) -> SarResult<Self> {
        if !(re_minor > 0.0) || re_major < re_minor || !re_major.is_finite() {
            return Err(SarError::Metadata(format!(
                "Invalid ellipsoid axes: major={}, minor={}",
                re_major, re_minor
            )));
        }
        Ok(Self { re_major, re_minor })
    }

    pub fn wgs84() -> Self {
        Self {
            re_major: WGS84_SEMI_MAJOR,
            re_minor: WGS84_SEMI_MINOR,
        }
    }

    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        let ratio = self.re_minor / self.re_major;
        1.0 - ratio * ratio
    }

    /// First eccentricity
    pub fn eccentricity(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Ellipsoid grown by `height` meters along both axes, the height
    /// convention used by the geolocation routines.
    pub fn inflated(&self, height: f64) -> Self {
        Self {
            re_major: self.re_major + height,
            re_minor: self.re_minor + height,
        }
    }

    /// Geocentric radius at a geodetic latitude (degrees)
    pub fn radius_at(&self, lat_deg: f64) -> f64 {
        let lat = lat_deg.to_radians();
        let (re, rp) = (self.re_major, self.re_minor);
        (re * rp) / (rp * rp * lat.cos().powi(2) + re * re * lat.sin().powi(2)).sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Satellite position and velocity in the Earth-fixed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Position in meters
    pub pos: Vector3,
    /// Velocity in m/s
    pub vel: Vector3,
}

impl StateVector {
    pub fn new(pos: Vector3, vel: Vector3) -> Self {
        Self { pos, vel }
    }
}

/// Time-tagged state vector; `time` is seconds from the start of the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateLoc {
    pub time: f64,
    pub vec: StateVector,
}

/// 'S' slant range, 'G' ground range, 'P' projected (map or along-track/cross-track)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    SlantRange,
    GroundRange,
    Projected,
}

impl ImageType {
    pub fn from_char(c: char) -> SarResult<Self> {
        match c.to_ascii_uppercase() {
            'S' => Ok(ImageType::SlantRange),
            'G' => Ok(ImageType::GroundRange),
            'P' => Ok(ImageType::Projected),
            other => Err(SarError::Metadata(format!("Unknown image type '{}'", other))),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ImageType::SlantRange => 'S',
            ImageType::GroundRange => 'G',
            ImageType::Projected => 'P',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookDirection {
    Left,
    Right,
}

impl LookDirection {
    pub fn from_char(c: char) -> SarResult<Self> {
        match c.to_ascii_uppercase() {
            'L' => Ok(LookDirection::Left),
            'R' => Ok(LookDirection::Right),
            other => Err(SarError::Metadata(format!("Unknown look direction '{}'", other))),
        }
    }

    /// Sign applied to the cross-track axis: right-looking negates.
    pub fn cross_track_sign(&self) -> f64 {
        match self {
            LookDirection::Left => 1.0,
            LookDirection::Right => -1.0,
        }
    }
}

impl Default for LookDirection {
    fn default() -> Self {
        LookDirection::Right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// 'S' is southern, anything else northern
    pub fn from_char(c: char) -> Self {
        if c.to_ascii_uppercase() == 'S' {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }

    pub fn from_latitude(lat_deg: f64) -> Self {
        if lat_deg < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }
}

/// General image parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaGeneral {
    pub sensor: String,
    pub orbit_direction: char,
    pub line_count: i32,
    pub sample_count: i32,
    /// First line relative to the original image
    pub start_line: i32,
    /// First sample relative to the original image
    pub start_sample: i32,
    /// Range pixel size in meters
    pub x_pixel_size: f64,
    /// Azimuth pixel size in meters
    pub y_pixel_size: f64,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub re_major: f64,
    pub re_minor: f64,
}

impl Default for MetaGeneral {
    fn default() -> Self {
        Self {
            sensor: MAGIC_UNSET_STRING.to_string(),
            orbit_direction: MAGIC_UNSET_CHAR,
            line_count: MAGIC_UNSET_INT,
            sample_count: MAGIC_UNSET_INT,
            start_line: 0,
            start_sample: 0,
            x_pixel_size: MAGIC_UNSET_DOUBLE,
            y_pixel_size: MAGIC_UNSET_DOUBLE,
            center_latitude: MAGIC_UNSET_DOUBLE,
            center_longitude: MAGIC_UNSET_DOUBLE,
            re_major: MAGIC_UNSET_DOUBLE,
            re_minor: MAGIC_UNSET_DOUBLE,
        }
    }
}

impl MetaGeneral {
    /// Image ellipsoid, falling back to WGS84 for unset axes
    pub fn ellipsoid(&self) -> Ellipsoid {
        let re = if is_valid_double(self.re_major) { self.re_major } else { WGS84_SEMI_MAJOR };
        let rp = if is_valid_double(self.re_minor) { self.re_minor } else { WGS84_SEMI_MINOR };
        Ellipsoid { re_major: re, re_minor: rp }
    }
}

/// SAR sensor geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSar {
    pub image_type: ImageType,
    pub look_direction: LookDirection,
    /// Image has been moved to zero Doppler
    pub deskewed: bool,
    pub original_line_count: i32,
    pub original_sample_count: i32,
    pub line_increment: f64,
    pub sample_increment: f64,
    pub range_time_per_pixel: f64,
    pub azimuth_time_per_pixel: f64,
    /// Slant range correction in meters
    pub slant_shift: f64,
    /// Azimuth time correction in seconds
    pub time_shift: f64,
    pub slant_range_first_pixel: f64,
    pub wavelength: f64,
    pub prf: f64,
    /// Earth radius at scene center; NaN when it should be computed
    pub earth_radius: f64,
    /// Satellite distance from Earth's center; NaN when it should be computed
    pub satellite_height: f64,
    /// Doppler constant (Hz), per pixel and per pixel squared, in range
    pub range_doppler_coefficients: [f64; 3],
    /// Doppler constant (Hz), per pixel and per pixel squared, in azimuth
    pub azimuth_doppler_coefficients: [f64; 3],
}

impl Default for MetaSar {
    fn default() -> Self {
        Self {
            image_type: ImageType::SlantRange,
            look_direction: LookDirection::Right,
            deskewed: false,
            original_line_count: MAGIC_UNSET_INT,
            original_sample_count: MAGIC_UNSET_INT,
            line_increment: 1.0,
            sample_increment: 1.0,
            range_time_per_pixel: MAGIC_UNSET_DOUBLE,
            azimuth_time_per_pixel: MAGIC_UNSET_DOUBLE,
            slant_shift: 0.0,
            time_shift: 0.0,
            slant_range_first_pixel: MAGIC_UNSET_DOUBLE,
            wavelength: MAGIC_UNSET_DOUBLE,
            prf: MAGIC_UNSET_DOUBLE,
            earth_radius: MAGIC_UNSET_DOUBLE,
            satellite_height: MAGIC_UNSET_DOUBLE,
            range_doppler_coefficients: [0.0; 3],
            azimuth_doppler_coefficients: [0.0; 3],
        }
    }
}

/// Fixed-earth state vectors around the image, strictly increasing in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVectorSeries {
    /// Year of the first state vector
    pub year: i32,
    /// Day of year of the first state vector
    pub julian_day: i32,
    /// Seconds of day of the first state vector
    pub second: f64,
    pub vectors: Vec<StateLoc>,
}

/// Corner coordinates of the image in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaLocation {
    pub lat_start_near_range: f64,
    pub lon_start_near_range: f64,
    pub lat_start_far_range: f64,
    pub lon_start_far_range: f64,
    pub lat_end_near_range: f64,
    pub lon_end_near_range: f64,
    pub lat_end_far_range: f64,
    pub lon_end_far_range: f64,
}

/// In-memory description of an image, supplied by the metadata layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaParameters {
    pub general: MetaGeneral,
    pub sar: Option<MetaSar>,
    pub projection: Option<MetaProjection>,
    pub state_vectors: Option<StateVectorSeries>,
    pub location: Option<MetaLocation>,
}

impl MetaParameters {
    pub fn sar(&self) -> SarResult<&MetaSar> {
        self.sar.as_ref().ok_or(SarError::MissingParameters("sar"))
    }

    pub fn projection(&self) -> SarResult<&MetaProjection> {
        self.projection
            .as_ref()
            .ok_or(SarError::MissingParameters("projection"))
    }

    pub fn state_vectors(&self) -> SarResult<&StateVectorSeries> {
        self.state_vectors
            .as_ref()
            .ok_or(SarError::MissingParameters("state_vectors"))
    }
}
