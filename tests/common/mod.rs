#![allow(dead_code)]

use sargeo::core::propagate::propagate;
use sargeo::projection::{
    AlbersParameters, LambertAzimuthalParameters, LambertConformalParameters, PolarStereographicParameters,
    UtmParameters,
};
use sargeo::{
    Ellipsoid, Hemisphere, MetaGeneral, MetaParameters, MetaProjection, MetaSar, ProjectionParameters, StateLoc,
    StateVector, StateVectorSeries, Vector3,
};

/// Reference point used by the map-projected fixtures
pub const CENTER_LAT: f64 = 63.066240;
pub const CENTER_LON: f64 = -145.958271;

/// Pixel and expected slant range / time / Doppler of the ERS scene
pub const REF_LINE: f64 = 12465.0;
pub const REF_SAMPLE: f64 = 2238.0;
pub const REF_SLANT: f64 = 855_186.9809;
pub const REF_TIME: f64 = 7.420_075_794_039_6;
pub const REF_DOPPLER: f64 = 312.6913;

/// Ground point of the reference pixel at zero height, from an independent
/// range-Doppler solve over the same propagated orbit
pub const REF_LAT: f64 = 63.852_026_214_6;
pub const REF_LON: f64 = -144.961_670_185_1;

const ERS_PIXEL: f64 = 7.904_89;
const ERS_DOPPLER_SLOPE: f64 = -0.01;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// ERS-1 state vector, 1995 day 313, 75322.359375 s
pub fn ers_state() -> StateVector {
    StateVector::new(
        Vector3::new(-2_423_929.8125, -2_113_451.3611, 6_391_908.6914),
        Vector3::new(-6_520.257_272_7, -2_099.355_996_9, -3_160.138_183_6),
    )
}

/// Five vectors 10 s apart propagated from [`ers_state`]
pub fn ers_series() -> StateVectorSeries {
    let s0 = ers_state();
    let mut series = StateVectorSeries::new(1995, 313, 75_322.359_375);
    for i in 0..5 {
        let t = i as f64 * 10.0;
        series = series
            .with_vector(t, propagate(&s0, 0.0, t))
            .expect("increasing times");
    }
    series
}

/// Right-looking slant range ERS scene over interior Alaska
pub fn ers_scene() -> MetaParameters {
    MetaParameters {
        general: MetaGeneral {
            sensor: "ERS1".to_string(),
            orbit_direction: 'D',
            line_count: 26_000,
            sample_count: 5_616,
            x_pixel_size: ERS_PIXEL,
            y_pixel_size: 3.98,
            center_latitude: 63.85,
            center_longitude: -145.1,
            re_major: 6_378_137.0,
            re_minor: 6_356_752.31414,
            ..MetaGeneral::default()
        },
        sar: Some(MetaSar {
            original_line_count: 26_000,
            original_sample_count: 5_616,
            azimuth_time_per_pixel: REF_TIME / REF_LINE,
            range_time_per_pixel: 2.0 * ERS_PIXEL / sargeo::types::SPEED_OF_LIGHT,
            slant_range_first_pixel: REF_SLANT - REF_SAMPLE * ERS_PIXEL,
            wavelength: 0.056_565_94,
            prf: 1679.9,
            range_doppler_coefficients: [REF_DOPPLER - ERS_DOPPLER_SLOPE * REF_SAMPLE, ERS_DOPPLER_SLOPE, 0.0],
            ..MetaSar::default()
        }),
        state_vectors: Some(ers_series()),
        ..MetaParameters::default()
    }
}

pub fn utm_params() -> ProjectionParameters {
    ProjectionParameters::Utm(UtmParameters::new(6, Hemisphere::North))
}

pub fn polar_stereographic_params() -> ProjectionParameters {
    ProjectionParameters::PolarStereographic(PolarStereographicParameters {
        slat: 70.0,
        slon: -45.0,
        false_easting: 0.0,
        false_northing: 0.0,
    })
}

pub fn albers_params() -> ProjectionParameters {
    ProjectionParameters::Albers(AlbersParameters {
        std_parallel1: 55.0,
        std_parallel2: 65.0,
        center_meridian: -154.0,
        orig_latitude: 50.0,
        false_easting: 0.0,
        false_northing: 0.0,
    })
}

pub fn lambert_conformal_params() -> ProjectionParameters {
    ProjectionParameters::LambertConformal(LambertConformalParameters {
        plat1: 55.0,
        plat2: 65.0,
        lat0: 60.0,
        lon0: -146.0,
        false_easting: 0.0,
        false_northing: 0.0,
        scale_factor: 1.0,
    })
}

pub fn lambert_azimuthal_params() -> ProjectionParameters {
    ProjectionParameters::LambertAzimuthal(LambertAzimuthalParameters {
        center_lon: -150.0,
        center_lat: 60.0,
        false_easting: 0.0,
        false_northing: 0.0,
    })
}

/// 200 x 200 pixel, 30 m image centered on the reference point
pub fn projected_scene(params: ProjectionParameters) -> MetaParameters {
    let mut proj = MetaProjection::new(params, Ellipsoid::wgs84());
    let (cx, cy) = proj
        .projector(sargeo::LookDirection::Right)
        .and_then(|p| p.forward(CENTER_LAT, CENTER_LON))
        .expect("fixture center projects");
    proj.per_x = 30.0;
    proj.per_y = -30.0;
    proj.start_x = cx - 100.0 * proj.per_x;
    proj.start_y = cy - 100.0 * proj.per_y;

    MetaParameters {
        general: MetaGeneral {
            line_count: 200,
            sample_count: 200,
            x_pixel_size: 30.0,
            y_pixel_size: 30.0,
            center_latitude: CENTER_LAT,
            center_longitude: CENTER_LON,
            ..MetaGeneral::default()
        },
        projection: Some(proj),
        ..MetaParameters::default()
    }
}

pub fn all_projected_params() -> Vec<(&'static str, ProjectionParameters)> {
    vec![
        ("utm", utm_params()),
        ("polar_stereographic", polar_stereographic_params()),
        ("albers", albers_params()),
        ("lambert_conformal", lambert_conformal_params()),
        ("lambert_azimuthal", lambert_azimuthal_params()),
    ]
}
