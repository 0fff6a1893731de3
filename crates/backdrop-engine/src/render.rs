//! Rendering engine contract.

use backdrop_core::{Color, Node, ObjectId, PerspectiveCamera, Scene};

use crate::host::SurfaceId;

/// Renderer construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub alpha: bool,
    pub antialias: bool,
    /// Keep the previous frame unless explicitly cleared.
    pub preserve_drawing_buffer: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            preserve_drawing_buffer: true,
        }
    }
}

/// Factory for renderers. Returning `None` means the host has no usable 3-D
/// engine; the instance then stays non-animating.
pub trait Engine {
    type Renderer: Renderer;

    fn create_renderer(&mut self, options: RendererOptions) -> Option<Self::Renderer>;
}

pub trait Renderer {
    /// The surface this renderer draws into.
    fn surface(&self) -> SurfaceId;

    fn set_clear_color(&mut self, color: Color, alpha: f32);

    /// Clear color, depth and stencil.
    fn clear(&mut self);

    /// Logical size of the drawing surface.
    fn set_size(&mut self, width: f32, height: f32);

    /// Physical pixels per logical pixel.
    fn set_pixel_ratio(&mut self, ratio: f32);

    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera);

    /// Release engine-side resources (buffers, materials) held for `node`.
    fn dispose(&mut self, id: ObjectId, node: &Node);
}
