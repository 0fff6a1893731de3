//! Core types shared by the backdrop crates.
//!
//! Colors, vector math, the arena scene graph and the perspective camera.
//! Nothing here knows about hosts, lifecycles or any particular effect.

mod camera;
mod color;
mod math;
mod scene;

pub use camera::{PerspectiveCamera, Projected};
pub use color::Color;
pub use math::{Euler, Transform, Vec3};
pub use scene::{
    Blending, Light, LineGeometry, LineMaterial, LineSegments, Node, NodeKind, ObjectId, Scene,
};

/// Host element identifier, assigned by the host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);
