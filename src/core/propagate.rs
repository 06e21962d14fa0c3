//! Single state vector propagation (two-body + J2, RK4 in the inertial frame)

use crate::core::frames::{fixed2gei, gei2fixed, EARTH_ROTATION_RATE};
use crate::core::vector::Vector3;
use crate::types::StateVector;

/// Earth gravitational constant (m^3/s^2)
const GM: f64 = 3.986_004_418e14;

/// Second zonal harmonic
const J2: f64 = 1.082_63e-3;

/// Equatorial radius used by the J2 term (m)
const J2_RADIUS: f64 = 6_378_137.0;

/// Default integration step (s)
pub const DEFAULT_STEP_SECONDS: f64 = 1.0;

fn acceleration(pos: &Vector3) -> Vector3 {
    let r2 = pos.dot(pos);
    let r = r2.sqrt();
    let k = -GM / (r2 * r);
    let j = 1.5 * J2 * (J2_RADIUS * J2_RADIUS) / r2;
    let z2 = pos.z * pos.z / r2;
    Vector3::new(
        k * pos.x * (1.0 + j * (1.0 - 5.0 * z2)),
        k * pos.y * (1.0 + j * (1.0 - 5.0 * z2)),
        k * pos.z * (1.0 + j * (3.0 - 5.0 * z2)),
    )
}

fn rk4_step(state: &StateVector, h: f64) -> StateVector {
    let (p0, v0) = (state.pos, state.vel);

    let k1v = acceleration(&p0);
    let k1p = v0;

    let k2v = acceleration(&(p0 + k1p * (h / 2.0)));
    let k2p = v0 + k1v * (h / 2.0);

    let k3v = acceleration(&(p0 + k2p * (h / 2.0)));
    let k3p = v0 + k2v * (h / 2.0);

    let k4v = acceleration(&(p0 + k3p * h));
    let k4p = v0 + k3v * h;

    StateVector {
        pos: p0 + (k1p + k2p * 2.0 + k3p * 2.0 + k4p) * (h / 6.0),
        vel: v0 + (k1v + k2v * 2.0 + k3v * 2.0 + k4v) * (h / 6.0),
    }
}

/// Propagate an Earth-fixed state vector from `source_time` to `dest_time` (seconds)
pub fn propagate(source: &StateVector, source_time: f64, dest_time: f64) -> StateVector {
    propagate_with_step(source, source_time, dest_time, DEFAULT_STEP_SECONDS)
}

/// Propagate with an explicit maximum integration step (seconds)
pub fn propagate_with_step(
    source: &StateVector,
    source_time: f64,
    dest_time: f64,
    max_step: f64,
) -> StateVector {
    let dt = dest_time - source_time;
    if dt == 0.0 {
        return *source;
    }

    let max_step = if max_step > 0.0 { max_step } else { DEFAULT_STEP_SECONDS };
    let steps = (dt.abs() / max_step).ceil().max(1.0) as usize;
    let h = dt / steps as f64;

    // Fixed frame at source_time coincides with the inertial frame.
    let mut state = fixed2gei(source, 0.0);
    for _ in 0..steps {
        state = rk4_step(&state, h);
    }

    let earth_rotation_deg = (EARTH_ROTATION_RATE * dt).to_degrees();
    gei2fixed(&state, earth_rotation_deg)
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
    fn test_zero_interval_is_identity() {
        let s = ers_state();
        assert_eq!(propagate(&s, 10.0, 10.0), s);
    }

    #[test]
    fn test_propagation_roundtrip() {
        let s = ers_state();
        let forward = propagate(&s, 0.0, 600.0);
        let back = propagate(&forward, 600.0, 0.0);
        assert_relative_eq!(back.pos.x, s.pos.x, max_relative = 1e-6);
        assert_relative_eq!(back.pos.y, s.pos.y, max_relative = 1e-6);
        assert_relative_eq!(back.pos.z, s.pos.z, max_relative = 1e-6);
        assert_relative_eq!(back.vel.x, s.vel.x, max_relative = 1e-6);
        assert_relative_eq!(back.vel.z, s.vel.z, max_relative = 1e-6);
    }

    #[test]
    fn test_orbit_radius_is_preserved() {
        let s = ers_state();
        let r0 = s.pos.magnitude();
        let later = propagate(&s, 0.0, 300.0);
        // Near-circular orbit: radius changes by well under a percent in 5 minutes.
        assert_relative_eq!(later.pos.magnitude(), r0, max_relative = 5e-3);
        // The satellite moved roughly |v| * dt in the inertial sense.
        let travelled = later.pos.distance(&s.pos);
        assert!(travelled > 1.9e6 && travelled < 2.4e6, "travelled {}", travelled);
    }
}
