//! Static scene pieces around the point network: camera, lights and the
//! decorative globe.

use std::f32::consts::TAU;

use backdrop_core::{
    Color, Euler, Light, LineGeometry, LineMaterial, LineSegments, Node, NodeKind, ObjectId,
    PerspectiveCamera, Scene, Vec3,
};

const RAY_COUNT: usize = 80;
const ORNAMENT_ARMS: usize = 4;
const ORNAMENT_HEIGHTS: [f32; 18] = [
    17.9, 12.0, 8.0, 5.0, 3.0, 2.0, 1.5, 1.1, 0.8, 0.6, 0.45, 0.3, 0.2, 0.1, 0.05, 0.03, 0.02, 0.01,
];
const SPHERE_RADIUS: f32 = 18.0;
const SPHERE_WIDTH_SEGMENTS: usize = 18;
const SPHERE_HEIGHT_SEGMENTS: usize = 14;

/// Node ids of the decorative globe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobeParts {
    pub group: ObjectId,
    pub rays: ObjectId,
    pub ornament: ObjectId,
    pub sphere: ObjectId,
}

/// Builds the static geometry. Owns the random source for the rays.
#[derive(Debug)]
pub struct SceneComposer {
    rng: fastrand::Rng,
}

impl SceneComposer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn rn(&mut self, min: f32, max: f32) -> f32 {
        min + self.rng.f32() * (max - min)
    }

    /// Container for the point network and its line mesh.
    pub fn network_group(scene: &mut Scene) -> ObjectId {
        scene.add(None, Node::new(NodeKind::Group).with_position(Vec3::new(-50.0, -20.0, 0.0)))
    }

    pub fn camera(aspect: f32, viewport_width: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(20.0, aspect, 0.01, 10000.0);
        camera.position = Vec3::new(50.0, 100.0, 150.0);
        camera.look_at(Self::look_at_target(viewport_width));
        camera
    }

    /// Narrow viewports pull the framing toward the network.
    pub fn look_at_target(viewport_width: f32) -> Vec3 {
        let x = if viewport_width < 480.0 {
            -10.0
        } else if viewport_width < 720.0 {
            -20.0
        } else {
            -40.0
        };
        Vec3::new(x, 0.0, 0.0)
    }

    /// Ambient fill plus a spot light aimed at `target`.
    pub fn lights(scene: &mut Scene, target: ObjectId) -> ObjectId {
        scene.add(
            None,
            Node::new(NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: 0.75,
            })),
        );
        scene.add(
            None,
            Node::new(NodeKind::Light(Light::Spot {
                color: Color::WHITE,
                intensity: 1.0,
                distance: 400.0,
                target: Some(target),
            }))
            .with_position(Vec3::new(0.0, 200.0, 0.0)),
        )
    }

    /// Rays, ornament and wireframe sphere in a tilted group.
    pub fn globe(&mut self, scene: &mut Scene, color: Color, color2: Color, size: f32) -> GlobeParts {
        let mut group = Node::new(NodeKind::Group).with_position(Vec3::new(0.0, 15.0, 0.0));
        group.transform.rotation = Euler::new(-0.25, 0.0, 0.0);
        let group = scene.add(None, group);

        let rays = self.rays();
        let rays = scene.add(Some(group), lines(&rays, LineMaterial::solid(color2)));

        let ornament_material = LineMaterial {
            line_width: 2.0,
            ..LineMaterial::solid(color2)
        };
        let ornament = scene.add(Some(group), lines(&ornament(), ornament_material));

        let sphere = sphere_edges(SPHERE_RADIUS * size, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS);
        let sphere = scene.add(Some(group), lines(&sphere, LineMaterial::solid(color)));

        GlobeParts {
            group,
            rays,
            ornament,
            sphere,
        }
    }

    /// Short radial segments scattered uniformly over a sphere shell.
    fn rays(&mut self) -> Vec<Vec3> {
        let mut points = Vec::with_capacity(RAY_COUNT * 2);
        for _ in 0..RAY_COUNT {
            let inner = self.rn(18.0, 24.0);
            let outer = inner + self.rn(1.0, 6.0);
            let z = self.rn(-1.0, 1.0);
            let r = (1.0 - z * z).sqrt();
            let theta = self.rn(0.0, TAU);
            let direction = Vec3::new(theta.cos() * r, theta.sin() * r, z);
            points.push(direction * inner);
            points.push(direction * outer);
        }
        points
    }
}

/// Per-frame spin of the globe pieces.
pub fn spin(scene: &mut Scene, parts: &GlobeParts) {
    if let Some(node) = scene.get_mut(parts.rays) {
        let rotation = &mut node.transform.rotation;
        rotation.z += 0.002;
        rotation.x += 0.0008;
        rotation.y += 0.0005;
    }
    if let Some(node) = scene.get_mut(parts.sphere) {
        node.transform.rotation.y += 0.002;
    }
    if let Some(node) = scene.get_mut(parts.ornament) {
        node.transform.rotation.y -= 0.004;
    }
}

/// Push live option colors into the globe materials.
pub fn refresh_colors(scene: &mut Scene, parts: &GlobeParts, color: Color, color2: Color) {
    for (id, value) in [(parts.sphere, color), (parts.rays, color2), (parts.ornament, color2)] {
        if let Some(lines) = scene.get_mut(id).and_then(Node::lines_mut) {
            lines.material.color = value;
        }
    }
}

fn lines(points: &[Vec3], material: LineMaterial) -> Node {
    Node::new(NodeKind::Lines(LineSegments {
        geometry: LineGeometry::from_points(points),
        material,
    }))
}

/// Vertical axis with four arms of stepped ticks shrinking outward.
fn ornament() -> Vec<Vec3> {
    let mut points = vec![Vec3::new(0.0, 30.0, 0.0), Vec3::new(0.0, -30.0, 0.0)];
    for arm in 0..ORNAMENT_ARMS {
        let angle = arm as f32 / ORNAMENT_ARMS as f32 * TAU;
        let (x, z) = (0.15 * angle.cos(), 0.15 * angle.sin());
        for (j, h) in ORNAMENT_HEIGHTS.iter().enumerate() {
            let r = 6.0 * (j + 1) as f32;
            points.push(Vec3::new(x * r, *h, z * r));
            points.push(Vec3::new(x * r, -h, z * r));
        }
    }
    points
}

/// Meridians and parallels of a UV sphere; poles are not drawn as rings.
fn sphere_edges(radius: f32, width_segments: usize, height_segments: usize) -> Vec<Vec3> {
    let vertex = |u: usize, v: usize| {
        let phi = u as f32 / width_segments as f32 * TAU;
        let theta = v as f32 / height_segments as f32 * std::f32::consts::PI;
        Vec3::new(
            -radius * phi.cos() * theta.sin(),
            radius * theta.cos(),
            radius * phi.sin() * theta.sin(),
        )
    };

    let mut points = Vec::new();
    for u in 0..width_segments {
        for v in 0..height_segments {
            points.push(vertex(u, v));
            points.push(vertex(u, v + 1));
        }
    }
    for v in 1..height_segments {
        for u in 0..width_segments {
            points.push(vertex(u, v));
            points.push(vertex(u + 1, v));
        }
    }
    points
}
