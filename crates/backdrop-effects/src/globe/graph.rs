//! Proximity graph: connect every pair of points closer than a threshold.
//!
//! The scan is exhaustive, `O(P²)` in the number of points, and rewrites the
//! line buffer from slot 0 every frame.

use backdrop_core::{Blending, Color, LineGeometry};
use tracing::warn;

use super::points::Point;

/// How segment colors relate to the background, fixed when the scene is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Primary is brighter than the background: add `primary - background`.
    Additive,
    /// Draw plain primary-colored segments over the background.
    Subtractive,
}

impl BlendMode {
    pub fn select(primary: Color, background: Color) -> Self {
        if primary.brightness() > background.brightness() {
            BlendMode::Additive
        } else {
            BlendMode::Subtractive
        }
    }

    /// Material blending for the line mesh.
    pub fn blending(self) -> Blending {
        match self {
            BlendMode::Additive => Blending::Additive,
            BlendMode::Subtractive => Blending::Normal,
        }
    }

    /// Per-vertex color written for every visible segment.
    pub fn segment_color(self, primary: Color, background: Color) -> Color {
        match self {
            BlendMode::Additive => Color::BLACK.lerp(primary - background, 1.0),
            BlendMode::Subtractive => background.lerp(primary, 1.0),
        }
    }
}

/// Line buffer capacity, in segments, for `points` points.
pub fn segment_capacity(points: usize) -> Option<usize> {
    points.checked_mul(points)
}

/// Write a segment for every pair `i ≤ j` closer than `max_distance`.
///
/// Self-pairs have distance 0 and are included whenever `max_distance` is
/// positive. Returns the number of segments written; the geometry's draw
/// range becomes twice that and it is marked for upload.
pub fn build(
    points: &[Point],
    max_distance: f32,
    primary: Color,
    background: Color,
    blend: BlendMode,
    geometry: &mut LineGeometry,
) -> usize {
    let color = blend.segment_color(primary, background);
    let mut visible = 0;

    'scan: for (i, a) in points.iter().enumerate() {
        for b in &points[i..] {
            if a.position.distance(b.position) < max_distance {
                if !geometry.write_segment(visible, a.position, b.position, color) {
                    warn!(capacity = geometry.segment_capacity(), "line buffer full, dropping segments");
                    break 'scan;
                }
                visible += 1;
            }
        }
    }

    geometry.set_draw_range(visible * 2);
    geometry.mark_dirty();
    visible
}
