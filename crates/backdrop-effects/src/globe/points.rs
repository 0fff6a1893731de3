//! The animated point lattice.

use backdrop_core::{Color, Node, NodeKind, ObjectId, Scene, Vec3};

/// Radius of the marker sphere drawn at each point.
pub const MARKER_RADIUS: f32 = 0.25;

/// Stand-in for a pointer distance; there is no pointer interaction, so the
/// derived point scale is always 1.
const PLACEHOLDER_DISTANCE: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Current position, rewritten every frame.
    pub position: Vec3,
    /// Position at creation. Never changes.
    pub origin: Vec3,
    /// Always 0.
    pub rotation_rate: f32,
    pub scale: f32,
    /// Marker or anchor node mirroring this point in the scene.
    pub node: ObjectId,
}

/// All points of one globe instance, in lattice order.
#[derive(Debug, Clone, Default)]
pub struct PointField {
    points: Vec<Point>,
}

impl PointField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the `(n+1)²` lattice under `parent`. See [`lattice`].
    pub fn grid(scene: &mut Scene, parent: ObjectId, n: u32, spacing: f32, marker: Option<Color>) -> Self {
        let mut field = Self::new();
        for position in lattice(n, spacing) {
            field.generate_point(scene, parent, position, marker);
        }
        field
    }

    /// Append a point at `position`. With `marker` set the scene gets a small
    /// sphere in that color, otherwise an invisible anchor.
    pub fn generate_point(
        &mut self,
        scene: &mut Scene,
        parent: ObjectId,
        position: Vec3,
        marker: Option<Color>,
    ) -> &Point {
        let kind = match marker {
            Some(color) => NodeKind::Marker {
                radius: MARKER_RADIUS,
                color,
            },
            None => NodeKind::Anchor,
        };
        let node = scene.add(Some(parent), Node::new(kind).with_position(position));
        let index = self.points.len();
        self.points.push(Point {
            position,
            origin: position,
            rotation_rate: 0.0,
            scale: 1.0,
            node,
        });
        &self.points[index]
    }

    /// Move every point to its wave height at time `t` and sync the scene.
    pub fn advance(&mut self, scene: &mut Scene, t: f32) {
        let scale = point_scale();
        for point in &mut self.points {
            point.scale = scale;
            point.position.y = wave_height(point.origin, t);
            if let Some(node) = scene.get_mut(point.node) {
                node.transform.position = point.position;
                node.transform.set_uniform_scale(scale);
            }
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Centred lattice in the X/Z plane at `y = 0`, `i` major.
pub fn lattice(n: u32, spacing: f32) -> Vec<Vec3> {
    let half = n as f32 / 2.0;
    (0..=n)
        .flat_map(|i| {
            (0..=n).map(move |j| Vec3::new((i as f32 - half) * spacing, 0.0, (j as f32 - half) * spacing))
        })
        .collect()
}

fn point_scale() -> f32 {
    ((15.0 - PLACEHOLDER_DISTANCE.clamp(5.0, 15.0)) * 0.25).clamp(1.0, 100.0)
}

/// `y = 2 sin(x/10 + t/100 + z/20)`.
pub fn wave_height(origin: Vec3, t: f32) -> f32 {
    2.0 * (origin.x / 10.0 + t * 0.01 + origin.z / 20.0).sin()
}
