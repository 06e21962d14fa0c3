//! Core geolocation modules

pub mod frames;
pub mod geolocate;
pub mod propagate;
pub mod sar_geometry;
pub mod state_vectors;
pub mod time;
pub mod vector;

// Re-export main types
pub use frames::{fixed2gei, gei2fixed, EARTH_ROTATION_RATE};
pub use geolocate::{
    is_lat_lon_pseudo, is_map_projected, llh_to_xyz, xyz_to_llh, CoordinateSpace, GeolocationConfig,
    Geolocator,
};
pub use propagate::propagate;
pub use sar_geometry::{calc_ranges, gr2sr_vec, RangeTables};
pub use state_vectors::get_state_vector;
pub use time::{julian_day_from_year, julian_day_from_ymd, utc2gha, TAI_from_UTC, UT1_from_UTC};
pub use vector::{cart2sph, sph2cart, Vector3};
