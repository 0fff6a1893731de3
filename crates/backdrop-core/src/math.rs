//! Minimal 3-D vector math.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or direction in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    /// Component-wise product.
    pub fn scale_by(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation in radians, applied in X-Y-Z order (the matrix is `Rx * Ry * Rz`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        // Rz first
        let (sz, cz) = self.z.sin_cos();
        let v = Vec3::new(v.x * cz - v.y * sz, v.x * sz + v.y * cz, v.z);
        // then Ry
        let (sy, cy) = self.y.sin_cos();
        let v = Vec3::new(v.x * cy + v.z * sy, v.y, -v.x * sy + v.z * cy);
        // then Rx
        let (sx, cx) = self.x.sin_cos();
        Vec3::new(v.x, v.y * cx - v.z * sx, v.y * sx + v.z * cx)
    }
}

/// Local transform of a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Euler,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Euler::default(),
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Map a point from this node's local space into its parent's space.
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.rotation.rotate(local.scale_by(self.scale)) + self.position
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = Vec3::new(s, s, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Vec3::new(0.0, 3.0, 0.0).distance(Vec3::new(4.0, 0.0, 0.0)), 5.0);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_minus_z() {
        let r = Euler::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        assert!(approx(r.rotate(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn transform_scales_then_rotates_then_translates() {
        let t = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Euler::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        assert!(approx(t.apply(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(10.0, 2.0, 0.0)));
    }
}
