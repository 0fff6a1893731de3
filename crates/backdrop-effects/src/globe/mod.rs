//! The network ("globe") effect.
//!
//! A lattice of points waves up and down; every pair of points closer than
//! `max_distance` is joined by a segment. Beside the network sits a slowly
//! turning wireframe globe with radial rays and an ornament.

mod composer;
mod graph;
mod options;
mod points;

pub use composer::{GlobeParts, SceneComposer};
pub use graph::{BlendMode, build, segment_capacity};
pub use options::GlobeOptions;
pub use points::{MARKER_RADIUS, Point, PointField, lattice, wave_height};

use backdrop_config::{Options, OptionsPatch};
use backdrop_core::{
    Blending, Color, LineGeometry, LineMaterial, LineSegments, Node, NodeKind, ObjectId, Scene,
};
use backdrop_engine::{Effect, EffectContext, EffectError};
use tracing::debug;

/// Upper bound on preallocated line segments.
const MAX_SEGMENTS: usize = 1 << 20;

/// Ids of everything the effect animates.
#[derive(Debug, Clone, Copy)]
struct Handles {
    lines: ObjectId,
    globe: GlobeParts,
}

#[derive(Debug)]
pub struct GlobeEffect {
    options: GlobeOptions,
    composer: SceneComposer,
    field: PointField,
    blend: Option<BlendMode>,
    handles: Option<Handles>,
}

impl Default for GlobeEffect {
    fn default() -> Self {
        Self::with_seed(fastrand::u64(..))
    }
}

impl GlobeEffect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic rays, for tests and reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            options: GlobeOptions::default(),
            composer: SceneComposer::new(seed),
            field: PointField::new(),
            blend: None,
            handles: None,
        }
    }

    /// Values from the last accepted configuration.
    pub fn options(&self) -> &GlobeOptions {
        &self.options
    }

    /// Blend mode chosen by the last successful init.
    pub fn blend_mode(&self) -> Option<BlendMode> {
        self.blend
    }

    pub fn points(&self) -> &PointField {
        &self.field
    }

    pub fn lines(&self) -> Option<ObjectId> {
        self.handles.map(|h| h.lines)
    }

    fn reset(&mut self) {
        self.field = PointField::new();
        self.blend = None;
        self.handles = None;
    }
}

fn background(options: &Options) -> Color {
    options.background_color.unwrap_or(Color::BLACK)
}

fn line_capacity(n: u32) -> Result<usize, EffectError> {
    let side = n as usize + 1;
    let points = side.checked_mul(side);
    match points.and_then(segment_capacity) {
        Some(segments) if segments <= MAX_SEGMENTS => Ok(segments),
        _ => Err(EffectError::Capacity {
            what: "line buffer",
            needed: points.and_then(segment_capacity).unwrap_or(usize::MAX),
            available: MAX_SEGMENTS,
        }),
    }
}

impl Effect for GlobeEffect {
    fn name(&self) -> &'static str {
        "globe"
    }

    fn default_options(&self) -> OptionsPatch {
        OptionsPatch {
            background_color: Some(Color::from_hex(0x23153c)),
            effect: GlobeOptions::default().to_keys(),
            ..OptionsPatch::default()
        }
    }

    fn configure(&mut self, options: &Options) -> Result<(), EffectError> {
        self.options = GlobeOptions::from_options(options)?;
        Ok(())
    }

    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.reset();
        let globe = &self.options;
        let capacity = line_capacity(globe.points)?;

        let blend = BlendMode::select(globe.color, background(ctx.options));
        let group = SceneComposer::network_group(ctx.scene);
        let material = LineMaterial {
            color: Color::WHITE,
            vertex_colors: true,
            blending: blend.blending(),
            transparent: true,
            line_width: 1.0,
        };
        let lines = ctx.scene.add(
            Some(group),
            Node::new(NodeKind::Lines(LineSegments {
                geometry: LineGeometry::with_capacity(capacity),
                material,
            })),
        );

        let marker = globe.show_dots.then_some(globe.color);
        let field = PointField::grid(ctx.scene, group, globe.points, globe.spacing, marker);

        *ctx.camera = Some(SceneComposer::camera(ctx.size.aspect(), ctx.viewport_width));
        SceneComposer::lights(ctx.scene, group);
        let parts = self
            .composer
            .globe(ctx.scene, globe.color, globe.color2, globe.size);

        self.field = field;
        debug!(
            points = self.field.len(),
            capacity,
            blend = ?blend,
            "globe scene built"
        );
        self.blend = Some(blend);
        self.handles = Some(Handles { lines, globe: parts });
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EffectContext<'_>) {
        let (Some(handles), Some(blend)) = (self.handles, self.blend) else {
            return;
        };
        let globe = &self.options;

        if let Some(camera) = ctx.camera.as_mut() {
            camera.look_at(SceneComposer::look_at_target(ctx.viewport_width));
        }
        composer::spin(ctx.scene, &handles.globe);

        self.field.advance(ctx.scene, ctx.time.t);
        if let Some(geometry) = ctx.scene.line_geometry_mut(handles.lines) {
            build(
                self.field.points(),
                globe.max_distance,
                globe.color,
                background(ctx.options),
                blend,
                geometry,
            );
        }
        composer::refresh_colors(ctx.scene, &handles.globe, globe.color, globe.color2);
    }

    fn on_restart(&mut self) {
        self.reset();
    }

    fn on_destroy(&mut self) {
        self.reset();
    }
}

/// Material blending of the network line mesh, if present.
pub fn line_blending(scene: &Scene, lines: ObjectId) -> Option<Blending> {
    scene.get(lines).and_then(Node::lines).map(|l| l.material.blending)
}
