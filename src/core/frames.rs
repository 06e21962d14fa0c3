//! Earth-fixed <-> Greenwich inertial (GEI) state vector rotation

use crate::core::vector::Vector3;
use crate::types::StateVector;

/// Sidereal rotation rate of the Earth (rad/s)
pub const EARTH_ROTATION_RATE: f64 = (366.225 / 365.225) * 2.0 * std::f64::consts::PI / 86_400.0;

fn rotation_velocity(pos: &Vector3) -> Vector3 {
    // omega * z_hat x pos
    Vector3::new(-EARTH_ROTATION_RATE * pos.y, EARTH_ROTATION_RATE * pos.x, 0.0)
}

/// Rotate an Earth-fixed state vector into the inertial frame at hour angle `gha` (degrees)
pub fn fixed2gei(state: &StateVector, gha: f64) -> StateVector {
    let pos = state.pos.rotate_z(-gha);
    let vel = state.vel.rotate_z(-gha) + rotation_velocity(&pos);
    StateVector { pos, vel }
}

/// Rotate an inertial state vector into the Earth-fixed frame at hour angle `gha` (degrees)
pub fn gei2fixed(state: &StateVector, gha: f64) -> StateVector {
    let pos = state.pos.rotate_z(gha);
    let vel = (state.vel - rotation_velocity(&state.pos)).rotate_z(gha);
    StateVector { pos, vel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ers_state() -> StateVector {
        StateVector::new(
            Vector3::new(-2_423_929.8125, -2_113_451.3611, 6_391_908.6914),
            Vector3::new(-6_520.257_272_7, -2_099.355_996_9, -3_160.138_183_6),
        )
    }

    #[test]
    fn test_fixed_gei_roundtrip() {
        let s = ers_state();
        for gha in [0.0, 45.0, 123.0, 271.5] {
            let back = gei2fixed(&fixed2gei(&s, gha), gha);
            assert_relative_eq!(back.pos.x, s.pos.x, max_relative = 1e-9);
            assert_relative_eq!(back.pos.z, s.pos.z, max_relative = 1e-9);
            assert_relative_eq!(back.vel.x, s.vel.x, max_relative = 1e-9);
            assert_relative_eq!(back.vel.y, s.vel.y, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_gei_adds_earth_rotation() {
        // A point at rest on the equator moves eastward in the inertial frame.
        let s = StateVector::new(Vector3::new(6_378_137.0, 0.0, 0.0), Vector3::default());
        let gei = fixed2gei(&s, 0.0);
        assert_relative_eq!(gei.vel.y, 6_378_137.0 * EARTH_ROTATION_RATE, max_relative = 1e-12);
        assert_relative_eq!(gei.vel.magnitude(), 465.1, max_relative = 1e-3);
    }

    #[test]
    fn test_hour_angle_rotation_direction() {
        let s = StateVector::new(Vector3::new(1.0e7, 0.0, 0.0), Vector3::default());
        let gei = fixed2gei(&s, 90.0);
        // Greenwich at 90 deg from the equinox: fixed x axis lies along inertial y.
        assert_relative_eq!(gei.pos.y, 1.0e7, max_relative = 1e-12);
        assert!(gei.pos.x.abs() < 1e-6);
    }
}
