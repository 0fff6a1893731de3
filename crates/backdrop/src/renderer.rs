//! Software line renderer producing a display list for the terminal canvas.
//!
//! Geometry is "uploaded" into renderer-owned buffers whenever a node's
//! dirty flag is set, the way a GPU backend would, and drawn from those
//! buffers. Coordinates in the display list are logical pixels with the
//! origin at the bottom left.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use backdrop_core::{
    Blending, Color, LineGeometry, Node, NodeKind, ObjectId, PerspectiveCamera, Scene, Vec3,
};
use backdrop_engine::{Engine, Renderer, RendererOptions, SurfaceId};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub at: (f64, f64),
    pub color: Color,
}

/// What the last rendered frame looks like.
#[derive(Debug, Clone)]
pub struct DisplayList {
    pub surface: Option<SurfaceId>,
    pub clear_color: Color,
    pub clear_alpha: f32,
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub strokes: Vec<Stroke>,
    pub dots: Vec<Dot>,
}

impl Default for DisplayList {
    fn default() -> Self {
        Self {
            surface: None,
            clear_color: Color::BLACK,
            clear_alpha: 1.0,
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            strokes: Vec::new(),
            dots: Vec::new(),
        }
    }
}

/// Creates renderers that all draw into one shared [`DisplayList`].
#[derive(Debug, Clone, Default)]
pub struct TerminalEngine {
    display: Rc<RefCell<DisplayList>>,
    next_surface: u64,
}

impl TerminalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> Ref<'_, DisplayList> {
        self.display.borrow()
    }
}

impl Engine for TerminalEngine {
    type Renderer = TerminalRenderer;

    fn create_renderer(&mut self, options: RendererOptions) -> Option<TerminalRenderer> {
        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        debug!(surface = surface.0, ?options, "created terminal renderer");
        {
            let mut display = self.display.borrow_mut();
            *display = DisplayList {
                surface: Some(surface),
                ..DisplayList::default()
            };
        }
        Some(TerminalRenderer {
            surface,
            display: self.display.clone(),
            buffers: HashMap::new(),
        })
    }
}

/// Renderer-side copy of a line geometry's valid prefix.
#[derive(Debug, Default)]
struct LineBuffer {
    positions: Vec<f32>,
    colors: Option<Vec<f32>>,
}

impl LineBuffer {
    fn upload(&mut self, geometry: &LineGeometry) {
        self.positions.clear();
        self.positions.extend_from_slice(geometry.valid_positions());
        self.colors = geometry.valid_colors().map(<[f32]>::to_vec);
    }

    fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, Option<Color>)> + '_ {
        self.positions.chunks_exact(6).enumerate().map(|(i, p)| {
            let color = self
                .colors
                .as_ref()
                .and_then(|c| c.get(i * 6..i * 6 + 3))
                .map(|c| Color::new(c[0], c[1], c[2]));
            (Vec3::new(p[0], p[1], p[2]), Vec3::new(p[3], p[4], p[5]), color)
        })
    }
}

#[derive(Debug)]
pub struct TerminalRenderer {
    surface: SurfaceId,
    display: Rc<RefCell<DisplayList>>,
    buffers: HashMap<ObjectId, LineBuffer>,
}

/// Map a world point to logical pixel coordinates.
fn to_screen(camera: &PerspectiveCamera, world: Vec3, width: f32, height: f32) -> Option<(f64, f64)> {
    let p = camera.project(world)?;
    let x = (p.x + 1.0) * 0.5 * width;
    let y = (p.y + 1.0) * 0.5 * height;
    Some((f64::from(x), f64::from(y)))
}

/// Color of a stroke as it lands on the cleared background.
fn composite(color: Color, blending: Blending, background: Color) -> Color {
    match blending {
        Blending::Additive => (background + color).clamped(),
        Blending::Normal => color.clamped(),
    }
}

impl Renderer for TerminalRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_clear_color(&mut self, color: Color, alpha: f32) {
        let mut display = self.display.borrow_mut();
        display.clear_color = color;
        display.clear_alpha = alpha;
    }

    fn clear(&mut self) {
        let mut display = self.display.borrow_mut();
        display.strokes.clear();
        display.dots.clear();
    }

    fn set_size(&mut self, width: f32, height: f32) {
        let mut display = self.display.borrow_mut();
        display.width = width;
        display.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.display.borrow_mut().pixel_ratio = ratio;
    }

    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) {
        let mut list = self.display.borrow_mut();
        let (width, height) = (list.width, list.height);
        let background = list.clear_color;
        let mut uploads = 0;

        for id in scene.pre_order() {
            if let Some(geometry) = scene.line_geometry_mut(id) {
                let fresh = !self.buffers.contains_key(&id);
                if geometry.take_dirty() || fresh {
                    self.buffers.entry(id).or_default().upload(geometry);
                    uploads += 1;
                }
            }
            if !scene.is_visible(id) {
                continue;
            }
            let Some(node) = scene.get(id) else {
                continue;
            };

            match &node.kind {
                NodeKind::Lines(lines) => {
                    let Some(buffer) = self.buffers.get(&id) else {
                        continue;
                    };
                    for (a, b, vertex_color) in buffer.segments() {
                        let color = match vertex_color {
                            Some(c) if lines.material.vertex_colors => c,
                            _ => lines.material.color,
                        };
                        let from = to_screen(camera, scene.to_world(id, a), width, height);
                        let to = to_screen(camera, scene.to_world(id, b), width, height);
                        if let (Some(from), Some(to)) = (from, to) {
                            list.strokes.push(Stroke {
                                from,
                                to,
                                color: composite(color, lines.material.blending, background),
                            });
                        }
                    }
                }
                NodeKind::Marker { color, .. } => {
                    if let Some(at) = to_screen(camera, scene.to_world(id, Vec3::ZERO), width, height) {
                        list.dots.push(Dot { at, color: *color });
                    }
                }
                NodeKind::Group | NodeKind::Anchor | NodeKind::Light(_) => {}
            }
        }
        let (strokes, dots) = (list.strokes.len(), list.dots.len());
        trace!(strokes, dots, uploads, "rendered frame");
    }

    fn dispose(&mut self, id: ObjectId, _node: &Node) {
        if self.buffers.remove(&id).is_some() {
            trace!(node = id.value(), "released line buffer");
        }
    }
}
