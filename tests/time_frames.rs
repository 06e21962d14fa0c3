mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use sargeo::core::frames::{fixed2gei, gei2fixed, EARTH_ROTATION_RATE};
use sargeo::core::vector::{cart2sph, sph2cart};
use sargeo::core::time::{add_time, is_leap_year, julian_day_from_year, julian_day_from_ymd, utc2gha, TAI_from_UTC, UT1_from_UTC};
use sargeo::{StateVector, Vector3};

#[test]
fn test_calendar_matches_chrono_dates() {
    assert!(is_leap_year(2000) && !is_leap_year(2100));
    // Day-of-year triples and calendar dates agree on the Julian day
    let (y, d, _) = add_time(2004, 1, 0.0, 356.0 * 86_400.0);
    assert_eq!((y, d), (2004, 357));
    assert_eq!(
        julian_day_from_year(2004) + (d - 1) as f64,
        julian_day_from_ymd(2004, 12, 22).unwrap()
    );
}

#[test]
fn test_gha_fixed_point_and_rate() {
    common::init_logging();
    let gha = utc2gha(1995, 313, 0, 0, 75_322.359_375).unwrap();
    assert_abs_diff_eq!(gha, 2.400_339_841_842_651, epsilon = 1e-5);

    // One hour of sidereal rotation
    let later = utc2gha(1995, 313, 1, 0, 75_322.359_375).unwrap();
    let advance = (later - gha).rem_euclid(360.0);
    assert_abs_diff_eq!(advance, EARTH_ROTATION_RATE.to_degrees() * 3600.0, epsilon = 1e-4);

    // The same instant expressed on the next day
    let (y, d, s) = add_time(1995, 313, 75_322.359_375, 86_400.0);
    let next_day = utc2gha(y, d, 0, 0, s).unwrap();
    assert_abs_diff_eq!((next_day - gha).rem_euclid(360.0), 0.9856, epsilon = 1e-3);
}

#[test]
fn test_time_scales_across_leap_second() {
    // 2005-12-31 leap second: TAI-UTC 32 -> 33
    assert_abs_diff_eq!(TAI_from_UTC(2005, 365, 86_000.0).unwrap() - 86_000.0, 32.0);
    assert_abs_diff_eq!(TAI_from_UTC(2006, 1, 0.0).unwrap(), 33.0);

    // UT1 stays within a second of UTC and is continuous across the step
    let before = UT1_from_UTC(2005, 365, 86_399.0).unwrap() - 86_399.0;
    let after = UT1_from_UTC(2006, 1, 0.0).unwrap();
    assert!(before.abs() < 0.9 && after.abs() < 0.9);
    assert_abs_diff_eq!(after - before, 1.0, epsilon = 0.01);
}

#[test]
fn test_frame_rotation_roundtrip() {
    let s = common::ers_state();
    for gha in [0.0, 2.400_339_841_842_651, 90.0, 164.044, 271.5, 359.9] {
        let back = gei2fixed(&fixed2gei(&s, gha), gha);
        assert_relative_eq!(back.pos.x, s.pos.x, max_relative = 1e-6);
        assert_relative_eq!(back.pos.y, s.pos.y, max_relative = 1e-6);
        assert_relative_eq!(back.pos.z, s.pos.z, max_relative = 1e-6);
        assert_relative_eq!(back.vel.x, s.vel.x, max_relative = 1e-6);
        assert_relative_eq!(back.vel.y, s.vel.y, max_relative = 1e-6);
        assert_relative_eq!(back.vel.z, s.vel.z, max_relative = 1e-6);
    }
}

#[test]
fn test_spherical_roundtrip() {
    let s = common::ers_state();
    let (r, lat, lon) = cart2sph(&s.pos);
    let back = sph2cart(r, lat, lon);
    assert_relative_eq!(back.x, s.pos.x, max_relative = 1e-12);
    assert_relative_eq!(back.y, s.pos.y, max_relative = 1e-12);
    assert_relative_eq!(back.z, s.pos.z, max_relative = 1e-12);
    assert!(lat > 0.0 && lon < 0.0);
}

#[test]
fn test_ground_point_moves_in_inertial_frame() {
    let point = StateVector::new(Vector3::new(6_378_137.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
    let inertial = fixed2gei(&point, 0.0);
    assert_abs_diff_eq!(inertial.vel.magnitude(), EARTH_ROTATION_RATE * 6_378_137.0, epsilon = 1e-9);
    assert!(inertial.vel.y > 0.0);
}
