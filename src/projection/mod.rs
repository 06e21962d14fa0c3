//! Map projection engine
//!
//! Every projection converts geodetic latitude/longitude in degrees to
//! projection coordinates (meters, or degrees for the lat/lon pseudo
//! projection) and back.

pub mod albers;
pub mod atct;
pub mod lambert_azimuthal;
pub mod lambert_conformal;
pub mod polar_stereographic;
pub mod series;
pub mod utm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{is_valid_double, Ellipsoid, Hemisphere, LookDirection, SarError, SarResult};

pub use albers::{AlbersEqualArea, AlbersParameters};
pub use atct::{atct_init, AlongTrackCrossTrack, AtctParameters};
pub use lambert_azimuthal::{LambertAzimuthal, LambertAzimuthalParameters};
pub use lambert_conformal::{LambertConformalConic, LambertConformalParameters};
pub use polar_stereographic::{PolarStereographic, PolarStereographicParameters};
pub use utm::{utm_zone, Utm, UtmParameters};

/// Forward and inverse transform between geodetic and projection coordinates
pub trait MapProjector {
    /// Latitude/longitude (degrees) to projection (x, y)
    fn forward(&self, lat: f64, lon: f64) -> SarResult<(f64, f64)>;

    /// Projection (x, y) to latitude/longitude (degrees)
    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)>;
}

/// Projection type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionType {
    UniversalTransverseMercator,
    PolarStereographic,
    AlbersEqualArea,
    LambertConformalConic,
    LambertAzimuthalEqualArea,
    /// Along-track / cross-track
    ScansarProjection,
    StatePlane,
    LatLongPseudoProjection,
}

impl ProjectionType {
    pub const ALL: [ProjectionType; 8] = [
        ProjectionType::UniversalTransverseMercator,
        ProjectionType::PolarStereographic,
        ProjectionType::AlbersEqualArea,
        ProjectionType::LambertConformalConic,
        ProjectionType::LambertAzimuthalEqualArea,
        ProjectionType::ScansarProjection,
        ProjectionType::StatePlane,
        ProjectionType::LatLongPseudoProjection,
    ];

    /// Tag as written in metadata files
    pub fn code(&self) -> &'static str {
        match self {
            ProjectionType::UniversalTransverseMercator => "UNIVERSAL_TRANSVERSE_MERCATOR",
            ProjectionType::PolarStereographic => "POLAR_STEREOGRAPHIC",
            ProjectionType::AlbersEqualArea => "ALBERS_EQUAL_AREA",
            ProjectionType::LambertConformalConic => "LAMBERT_CONFORMAL_CONIC",
            ProjectionType::LambertAzimuthalEqualArea => "LAMBERT_AZIMUTHAL_EQUAL_AREA",
            ProjectionType::ScansarProjection => "SCANSAR_PROJECTION",
            ProjectionType::StatePlane => "STATE_PLANE",
            ProjectionType::LatLongPseudoProjection => "LAT_LONG_PSEUDO_PROJECTION",
        }
    }

    /// Parse a tag; accepts the full names and the legacy single-letter codes
    pub fn from_code(code: &str) -> SarResult<Self> {
        let trimmed = code.trim();
        let upper = trimmed.to_ascii_uppercase();
        let parsed = match upper.as_str() {
            "UNIVERSAL_TRANSVERSE_MERCATOR" | "UTM" | "U" => ProjectionType::UniversalTransverseMercator,
            "POLAR_STEREOGRAPHIC" | "PS" | "P" => ProjectionType::PolarStereographic,
            "ALBERS_EQUAL_AREA" | "ALBERS" => ProjectionType::AlbersEqualArea,
            "LAMBERT_CONFORMAL_CONIC" | "LAMCC" | "L" => ProjectionType::LambertConformalConic,
            "LAMBERT_AZIMUTHAL_EQUAL_AREA" | "LAMAZ" => ProjectionType::LambertAzimuthalEqualArea,
            "SCANSAR_PROJECTION" | "ATCT" | "A" => ProjectionType::ScansarProjection,
            "STATE_PLANE" | "STATE" => ProjectionType::StatePlane,
            "LAT_LONG_PSEUDO_PROJECTION" | "LATLON" => ProjectionType::LatLongPseudoProjection,
            _ => return Err(SarError::UnknownProjection(trimmed.to_string())),
        };
        Ok(parsed)
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProjectionType {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionType::from_code(s)
    }
}

/// Parameters of one projection; the variant is the projection type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionParameters {
    Utm(UtmParameters),
    PolarStereographic(PolarStereographicParameters),
    Albers(AlbersParameters),
    LambertConformal(LambertConformalParameters),
    LambertAzimuthal(LambertAzimuthalParameters),
    AlongTrackCrossTrack(AtctParameters),
    StatePlane { zone: i32 },
    LatLonPseudo,
}

impl ProjectionParameters {
    pub fn projection_type(&self) -> ProjectionType {
        match self {
            ProjectionParameters::Utm(_) => ProjectionType::UniversalTransverseMercator,
            ProjectionParameters::PolarStereographic(_) => ProjectionType::PolarStereographic,
            ProjectionParameters::Albers(_) => ProjectionType::AlbersEqualArea,
            ProjectionParameters::LambertConformal(_) => ProjectionType::LambertConformalConic,
            ProjectionParameters::LambertAzimuthal(_) => ProjectionType::LambertAzimuthalEqualArea,
            ProjectionParameters::AlongTrackCrossTrack(_) => ProjectionType::ScansarProjection,
            ProjectionParameters::StatePlane { .. } => ProjectionType::StatePlane,
            ProjectionParameters::LatLonPseudo => ProjectionType::LatLongPseudoProjection,
        }
    }
}

/// The lat/lon pseudo projection: x is longitude, y latitude
#[derive(Debug, Clone, Copy, Default)]
pub struct LatLonPseudo;

impl MapProjector for LatLonPseudo {
    fn forward(&self, lat: f64, lon: f64) -> SarResult<(f64, f64)> {
        Ok((lon, lat))
    }

    fn inverse(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        Ok((y, x))
    }
}

/// Map projection block of an image's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaProjection {
    /// Projection x of the top-left pixel
    pub start_x: f64,
    /// Projection y of the top-left pixel
    pub start_y: f64,
    /// Projection x units per pixel
    pub per_x: f64,
    /// Projection y units per pixel (usually negative)
    pub per_y: f64,
    /// "meters", "arcsec" or "degrees"
    pub units: String,
    pub hemisphere: Hemisphere,
    pub ellipsoid: Ellipsoid,
    /// Height the image is geocoded to (m)
    pub height: f64,
    pub params: ProjectionParameters,
}

impl MetaProjection {
    pub fn new(params: ProjectionParameters, ellipsoid: Ellipsoid) -> Self {
        let units = match params {
            ProjectionParameters::LatLonPseudo => "degrees",
            _ => "meters",
        };
        Self {
            start_x: 0.0,
            start_y: 0.0,
            per_x: 1.0,
            per_y: -1.0,
            units: units.to_string(),
            hemisphere: Hemisphere::North,
            ellipsoid,
            height: 0.0,
            params,
        }
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.params.projection_type()
    }

    /// Check the pixel spacing is usable
    pub fn validate(&self) -> SarResult<()> {
        if !is_valid_double(self.per_x) || !is_valid_double(self.per_y) || self.per_x == 0.0 || self.per_y == 0.0 {
            return Err(SarError::Metadata(format!(
                "Invalid projection pixel spacing: per_x={}, per_y={}",
                self.per_x, self.per_y
            )));
        }
        Ok(())
    }

    /// Projector for this block; `look` only matters for along-track/cross-track
    pub fn projector(&self, look: LookDirection) -> SarResult<Box<dyn MapProjector + Send + Sync>> {
        let e = &self.ellipsoid;
        let projector: Box<dyn MapProjector + Send + Sync> = match &self.params {
            ProjectionParameters::Utm(p) => Box::new(Utm::new(p, e)?),
            ProjectionParameters::PolarStereographic(p) => Box::new(PolarStereographic::new(p, e)?),
            ProjectionParameters::Albers(p) => Box::new(AlbersEqualArea::new(p, e)?),
            ProjectionParameters::LambertConformal(p) => Box::new(LambertConformalConic::new(p, e)?),
            ProjectionParameters::LambertAzimuthal(p) => Box::new(LambertAzimuthal::new(p, e)?),
            ProjectionParameters::AlongTrackCrossTrack(p) => Box::new(AlongTrackCrossTrack::new(p, e, look)),
            ProjectionParameters::StatePlane { zone } => {
                return Err(SarError::Projection(format!(
                    "State plane zone {} is not supported for coordinate transforms",
                    zone
                )))
            }
            ProjectionParameters::LatLonPseudo => Box::new(LatLonPseudo),
        };
        Ok(projector)
    }

    /// Projection coordinates of a pixel (sample, line)
    pub fn pixel_to_proj(&self, sample: f64, line: f64) -> (f64, f64) {
        (self.start_x + sample * self.per_x, self.start_y + line * self.per_y)
    }

    /// Pixel (sample, line) of projection coordinates
    pub fn proj_to_pixel(&self, x: f64, y: f64) -> SarResult<(f64, f64)> {
        self.validate()?;
        Ok(((x - self.start_x) / self.per_x, (y - self.start_y) / self.per_y))
    }
}

/// Geodetic latitude/longitude (degrees) to projection coordinates
pub fn ll_to_proj(
    proj: Option<&MetaProjection>,
    look: LookDirection,
    lat: f64,
    lon: f64,
) -> SarResult<(f64, f64)> {
    let proj = proj.ok_or(SarError::MissingParameters("projection"))?;
    proj.projector(look)?.forward(lat, lon)
}

/// Projection coordinates to geodetic latitude/longitude (degrees)
pub fn proj_to_ll(
    proj: Option<&MetaProjection>,
    look: LookDirection,
    x: f64,
    y: f64,
) -> SarResult<(f64, f64)> {
    let proj = proj.ok_or(SarError::MissingParameters("projection"))?;
    proj.projector(look)?.inverse(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_type_codes_roundtrip() {
        for t in ProjectionType::ALL {
            assert_eq!(t.code().parse::<ProjectionType>().unwrap(), t);
        }
        assert_eq!(ProjectionType::from_code("utm").unwrap(), ProjectionType::UniversalTransverseMercator);
        assert!(matches!(
            ProjectionType::from_code("MERCATOR"),
            Err(SarError::UnknownProjection(ref s)) if s == "MERCATOR"
        ));
    }

    #[test]
    fn test_variant_determines_type() {
        let p = ProjectionParameters::Utm(UtmParameters::new(6, Hemisphere::North));
        assert_eq!(p.projection_type(), ProjectionType::UniversalTransverseMercator);
        assert_eq!(
            ProjectionParameters::LatLonPseudo.projection_type(),
            ProjectionType::LatLongPseudoProjection
        );
    }

    #[test]
    fn test_missing_block_and_state_plane() {
        assert!(matches!(
            ll_to_proj(None, LookDirection::Right, 0.0, 0.0),
            Err(SarError::MissingParameters(_))
        ));
        let sp = MetaProjection::new(ProjectionParameters::StatePlane { zone: 5010 }, Ellipsoid::wgs84());
        assert!(matches!(
            proj_to_ll(Some(&sp), LookDirection::Right, 0.0, 0.0),
            Err(SarError::Projection(_))
        ));
    }

    #[test]
    fn test_pseudo_projection_axis_order() {
        let mp = MetaProjection::new(ProjectionParameters::LatLonPseudo, Ellipsoid::wgs84());
        let (x, y) = ll_to_proj(Some(&mp), LookDirection::Right, 63.0, -146.0).unwrap();
        assert_eq!((x, y), (-146.0, 63.0));
        assert_eq!(proj_to_ll(Some(&mp), LookDirection::Right, x, y).unwrap(), (63.0, -146.0));
        assert_eq!(mp.units, "degrees");
    }

    #[test]
    fn test_pixel_mapping() {
        let mut mp = MetaProjection::new(
            ProjectionParameters::Utm(UtmParameters::new(6, Hemisphere::North)),
            Ellipsoid::wgs84(),
        );
        mp.start_x = 500_000.0;
        mp.start_y = 7_000_000.0;
        mp.per_x = 12.5;
        mp.per_y = -12.5;
        let (x, y) = mp.pixel_to_proj(10.0, 20.0);
        assert_abs_diff_eq!(x, 500_125.0);
        assert_abs_diff_eq!(y, 6_999_750.0);
        let (s, l) = mp.proj_to_pixel(x, y).unwrap();
        assert_abs_diff_eq!(s, 10.0);
        assert_abs_diff_eq!(l, 20.0);

        mp.per_x = 0.0;
        assert!(matches!(mp.proj_to_pixel(x, y), Err(SarError::Metadata(_))));
    }
}
