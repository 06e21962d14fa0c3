//! sargeo: SAR geolocation and map projection engine
//!
//! Converts between SAR image geometry (line/sample, slant range, Doppler,
//! satellite state vectors), geodetic coordinates and the map projections
//! used for SAR products.

pub mod core;
pub mod projection;
pub mod types;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    Ellipsoid, Hemisphere, ImageType, LookDirection, MetaGeneral, MetaLocation, MetaParameters, MetaSar,
    SarError, SarResult, StateLoc, StateVector, StateVectorSeries,
};

pub use crate::core::{CoordinateSpace, GeolocationConfig, Geolocator, Vector3};
pub use projection::{ll_to_proj, proj_to_ll, MapProjector, MetaProjection, ProjectionParameters, ProjectionType};
