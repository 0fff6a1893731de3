//! Perspective camera.

use crate::math::Vec3;

/// A point projected into normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Horizontal position, `-1` (left) to `1` (right) when on screen.
    pub x: f32,
    /// Vertical position, `-1` (bottom) to `1` (top) when on screen.
    pub y: f32,
    /// Distance along the view direction.
    pub depth: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    target: Vec3,
    focal: f32,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: -Vec3::Z,
            focal: 1.0,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute projection terms after changing `fov` or `aspect`.
    pub fn update_projection_matrix(&mut self) {
        let half = (self.fov.to_radians() * 0.5).tan();
        self.focal = if half > f32::EPSILON { 1.0 / half } else { 1.0 };
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Project a world-space point. Returns `None` for points outside the
    /// near/far range.
    pub fn project(&self, world: Vec3) -> Option<Projected> {
        let forward = (self.target - self.position).normalize();
        let mut right = forward.cross(Vec3::Y).normalize();
        if right == Vec3::ZERO {
            right = forward.cross(Vec3::Z).normalize();
        }
        let up = right.cross(forward);

        let rel = world - self.position;
        let depth = rel.dot(forward);
        if depth < self.near || depth > self.far {
            return None;
        }

        let aspect = if self.aspect > f32::EPSILON { self.aspect } else { 1.0 };
        Some(Projected {
            x: rel.dot(right) * self.focal / (depth * aspect),
            y: rel.dot(up) * self.focal / depth,
            depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_center() {
        let mut camera = PerspectiveCamera::new(20.0, 1.5, 0.01, 10000.0);
        camera.position = Vec3::new(50.0, 100.0, 150.0);
        camera.look_at(Vec3::new(-40.0, 0.0, 0.0));
        let p = camera.project(Vec3::new(-40.0, 0.0, 0.0)).unwrap();
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
    }

    #[test]
    fn points_behind_the_camera_are_culled() {
        let camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        assert!(camera.project(Vec3::new(0.0, 0.0, 5.0)).is_none());
        assert!(camera.project(Vec3::new(0.0, 0.0, -5.0)).is_some());
    }

    #[test]
    fn right_of_view_is_positive_x() {
        let camera = PerspectiveCamera::new(90.0, 1.0, 0.1, 100.0);
        let p = camera.project(Vec3::new(1.0, 0.0, -1.0)).unwrap();
        assert!((p.x - 1.0).abs() < 1e-4);
    }
}
