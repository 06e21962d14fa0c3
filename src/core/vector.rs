use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

use crate::types::{SarError, SarResult};

/// Simple 3D vector for geometric calculations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; fails on a (near) zero vector
    pub fn normalize(&self) -> SarResult<Vector3> {
        let mag = self.magnitude();
        if !(mag > 1e-12) {
            return Err(SarError::Degenerate(format!(
                "Cannot normalize vector ({}, {}, {}) with magnitude {}",
                self.x, self.y, self.z, mag
            )));
        }
        Ok(self.scale(1.0 / mag))
    }

    pub fn scale(&self, factor: f64) -> Vector3 {
        Vector3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn distance(&self, other: &Vector3) -> f64 {
        (*self - *other).magnitude()
    }

    /// Rotate about the z axis by `theta_deg` (frame rotation, right-handed)
    pub fn rotate_z(&self, theta_deg: f64) -> Vector3 {
        let (s, c) = theta_deg.to_radians().sin_cos();
        Vector3 {
            x: self.x * c + self.y * s,
            y: -self.x * s + self.y * c,
            z: self.z,
        }
    }

    /// Rotate about the y axis by `theta_deg` (frame rotation, right-handed)
    pub fn rotate_y(&self, theta_deg: f64) -> Vector3 {
        let (s, c) = theta_deg.to_radians().sin_cos();
        Vector3 {
            x: -self.z * s + self.x * c,
            y: self.y,
            z: self.z * c + self.x * s,
        }
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: f64) -> Vector3 {
        self.scale(rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// Cartesian to spherical: (radius, latitude, longitude), angles in radians.
/// Latitude is measured from the equatorial plane.
pub fn cart2sph(v: &Vector3) -> (f64, f64, f64) {
    let r = v.magnitude();
    if r == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let lat = (v.z / r).clamp(-1.0, 1.0).asin();
    let lon = v.y.atan2(v.x);
    (r, lat, lon)
}

/// Spherical to Cartesian, angles in radians
pub fn sph2cart(r: f64, lat: f64, lon: f64) -> Vector3 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Vector3::new(r * cos_lat * cos_lon, r * cos_lat * sin_lon, r * sin_lat)
}
