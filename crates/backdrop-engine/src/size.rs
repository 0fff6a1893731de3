//! Logical canvas sizing.

use backdrop_config::Options;
use backdrop_core::PerspectiveCamera;

use crate::host::ContentBox;
use crate::render::Renderer;

/// Logical size of an instance's canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
    /// Logical pixels per physical pixel; the renderer's pixel ratio is the
    /// inverse.
    pub scale: f32,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: 1.0,
        }
    }
}

impl Size {
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Clamp the element's content box to the configured minimums.
///
/// `previous_scale` is kept when the configured scale is not a positive
/// number.
pub fn compute_size(content: ContentBox, options: &Options, mobile: bool, previous_scale: f32) -> Size {
    let configured = if mobile {
        options.scale_mobile
    } else {
        options.scale
    };
    let scale = if configured > 0.0 {
        configured
    } else if previous_scale > 0.0 {
        previous_scale
    } else {
        1.0
    };

    Size {
        width: content.width.max(options.min_width),
        height: content.height.max(options.min_height),
        scale,
    }
}

/// Push `size` to the camera and the renderer.
pub fn apply<R: Renderer>(size: Size, camera: Option<&mut PerspectiveCamera>, renderer: Option<&mut R>) {
    if let Some(camera) = camera {
        camera.aspect = size.aspect();
        camera.update_projection_matrix();
    }
    if let Some(renderer) = renderer {
        renderer.set_size(size.width, size.height);
        renderer.set_pixel_ratio(1.0 / size.scale);
    }
}
