//! Scene graph shared by effects and renderers.
//!
//! Nodes live in an arena keyed by [`ObjectId`]. Effects keep the ids of the
//! nodes they animate; renderers walk the graph read-only and release
//! per-node resources through their own disposal hook.

use std::collections::HashMap;

use crate::color::Color;
use crate::math::{Transform, Vec3};

/// Scene-unique node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// How line colors combine with what is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Material for line segment meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMaterial {
    pub color: Color,
    /// Use the per-vertex color buffer instead of `color`.
    pub vertex_colors: bool,
    pub blending: Blending,
    pub transparent: bool,
    pub line_width: f32,
}

impl LineMaterial {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            vertex_colors: false,
            blending: Blending::Normal,
            transparent: false,
            line_width: 1.0,
        }
    }
}

/// Flat vertex buffers for a line segment mesh.
///
/// Every two consecutive vertices form one segment. Only the first
/// [`draw_range`](Self::draw_range) vertices are meaningful; the remainder of
/// a dynamic buffer holds stale data from earlier frames.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    positions: Vec<f32>,
    colors: Option<Vec<f32>>,
    draw_range: usize,
    needs_update: bool,
}

impl LineGeometry {
    /// Static geometry from a list of segment endpoints.
    pub fn from_points(points: &[Vec3]) -> Self {
        let positions: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let draw_range = points.len() - points.len() % 2;
        Self {
            positions,
            colors: None,
            draw_range,
            needs_update: true,
        }
    }

    /// Preallocated dynamic geometry for up to `segments` colored segments,
    /// starting with an empty draw range.
    pub fn with_capacity(segments: usize) -> Self {
        Self {
            positions: vec![0.0; segments * 6],
            colors: Some(vec![0.0; segments * 6]),
            draw_range: 0,
            needs_update: true,
        }
    }

    pub fn vertex_capacity(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn segment_capacity(&self) -> usize {
        self.vertex_capacity() / 2
    }

    /// Number of leading vertices that hold valid data.
    pub fn draw_range(&self) -> usize {
        self.draw_range
    }

    pub fn set_draw_range(&mut self, vertices: usize) {
        self.draw_range = vertices.min(self.vertex_capacity());
    }

    /// Write one colored segment into `slot`. Returns `false` if the slot is
    /// beyond the preallocated capacity.
    pub fn write_segment(&mut self, slot: usize, a: Vec3, b: Vec3, color: Color) -> bool {
        if slot >= self.segment_capacity() {
            return false;
        }
        let base = slot * 6;
        self.positions[base..base + 6].copy_from_slice(&[a.x, a.y, a.z, b.x, b.y, b.z]);
        if let Some(colors) = self.colors.as_mut() {
            colors[base..base + 6]
                .copy_from_slice(&[color.r, color.g, color.b, color.r, color.g, color.b]);
        }
        true
    }

    /// Positions of the valid prefix, three floats per vertex.
    pub fn valid_positions(&self) -> &[f32] {
        &self.positions[..self.draw_range * 3]
    }

    /// Colors of the valid prefix, if the geometry carries vertex colors.
    pub fn valid_colors(&self) -> Option<&[f32]> {
        self.colors.as_deref().map(|c| &c[..self.draw_range * 3])
    }

    /// Endpoints and (optional) color of each valid segment.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, Option<Color>)> + '_ {
        let colors = self.valid_colors();
        self.valid_positions()
            .chunks_exact(6)
            .enumerate()
            .map(move |(i, p)| {
                let color = colors.map(|c| Color::new(c[i * 6], c[i * 6 + 1], c[i * 6 + 2]));
                (Vec3::new(p[0], p[1], p[2]), Vec3::new(p[3], p[4], p[5]), color)
            })
    }

    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Consume the dirty flag once the renderer has re-uploaded the buffers.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.needs_update, false)
    }
}

/// A line segment mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegments {
    pub geometry: LineGeometry,
    pub material: LineMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Spot {
        color: Color,
        intensity: f32,
        distance: f32,
        target: Option<ObjectId>,
    },
}

/// What a node draws, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Transform-only container.
    Group,
    /// Invisible placeholder that still takes part in the transform hierarchy.
    Anchor,
    /// Small sphere marker.
    Marker { radius: f32, color: Color },
    Lines(LineSegments),
    Light(Light),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            transform: Transform::default(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn lines(&self) -> Option<&LineSegments> {
        match &self.kind {
            NodeKind::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn lines_mut(&mut self) -> Option<&mut LineSegments> {
        match &mut self.kind {
            NodeKind::Lines(lines) => Some(lines),
            _ => None,
        }
    }
}

/// Arena-backed scene graph.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: HashMap<ObjectId, Node>,
    roots: Vec<ObjectId>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` under `parent`, or at the top level when `parent` is `None`
    /// or no longer part of the scene.
    pub fn add(&mut self, parent: Option<ObjectId>, mut node: Node) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let parent = parent.filter(|p| self.nodes.contains_key(p));
        node.parent = parent;
        node.children.clear();
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Top-level children.
    pub fn children(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove a node and its whole subtree, returning the removed nodes.
    pub fn remove(&mut self, id: ObjectId) -> Vec<Node> {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return Vec::new();
        };
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(p) => p.children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children.iter().copied());
                removed.push(node);
            }
        }
        removed
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Node ids in depth-first pre-order (parents before children).
    pub fn pre_order(&self) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Node ids with every child listed before its parent.
    pub fn post_order(&self) -> Vec<ObjectId> {
        let mut ids = self.pre_order();
        ids.reverse();
        ids
    }

    /// Map a point in `id`'s local space to world space.
    pub fn to_world(&self, id: ObjectId, local: Vec3) -> Vec3 {
        let mut point = local;
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            point = node.transform.apply(point);
            current = node.parent.and_then(|p| self.nodes.get(&p));
        }
        point
    }

    /// A node is drawn only if it and all of its ancestors are visible.
    pub fn is_visible(&self, id: ObjectId) -> bool {
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            if !node.visible {
                return false;
            }
            current = node.parent.and_then(|p| self.nodes.get(&p));
        }
        true
    }

    pub fn line_geometry_mut(&mut self, id: ObjectId) -> Option<&mut LineGeometry> {
        self.get_mut(id)
            .and_then(Node::lines_mut)
            .map(|lines| &mut lines.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_position_composes_parent_transforms() {
        let mut scene = Scene::new();
        let group = scene.add(
            None,
            Node::new(NodeKind::Group).with_position(Vec3::new(-50.0, -20.0, 0.0)),
        );
        let child = scene.add(
            Some(group),
            Node::new(NodeKind::Anchor).with_position(Vec3::new(10.0, 0.0, 5.0)),
        );
        assert_eq!(scene.to_world(child, Vec3::ZERO), Vec3::new(-40.0, -20.0, 5.0));
    }

    #[test]
    fn remove_drops_the_whole_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(None, Node::new(NodeKind::Group));
        let a = scene.add(Some(group), Node::new(NodeKind::Anchor));
        scene.add(Some(a), Node::new(NodeKind::Anchor));
        let other = scene.add(None, Node::new(NodeKind::Group));

        assert_eq!(scene.remove(group).len(), 3);
        assert_eq!(scene.children(), &[other]);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn post_order_lists_children_first() {
        let mut scene = Scene::new();
        let group = scene.add(None, Node::new(NodeKind::Group));
        let child = scene.add(Some(group), Node::new(NodeKind::Anchor));
        let order = scene.post_order();
        let pos = |id| order.iter().position(|x| *x == id);
        assert!(pos(child) < pos(group));
    }

    #[test]
    fn dynamic_geometry_exposes_only_the_draw_range() {
        let mut geometry = LineGeometry::with_capacity(4);
        assert!(geometry.write_segment(0, Vec3::ZERO, Vec3::ONE, Color::WHITE));
        assert!(geometry.write_segment(1, Vec3::ONE, Vec3::ZERO, Color::BLACK));
        assert!(!geometry.write_segment(4, Vec3::ZERO, Vec3::ONE, Color::WHITE));

        geometry.set_draw_range(2);
        assert_eq!(geometry.valid_positions().len(), 6);
        assert_eq!(geometry.segments().count(), 1);

        geometry.set_draw_range(100);
        assert_eq!(geometry.draw_range(), 8);
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let mut scene = Scene::new();
        let group = scene.add(None, Node::new(NodeKind::Group));
        let child = scene.add(Some(group), Node::new(NodeKind::Anchor));
        if let Some(node) = scene.get_mut(group) {
            node.visible = false;
        }
        assert!(!scene.is_visible(child));
    }
}
