//! Host environment contract.
//!
//! A host owns the "page": it resolves bind targets to elements, measures
//! them, mounts rendering surfaces, and delivers frame and resize callbacks.
//! Callbacks are cooperative: the host's driver dispatches them one at a time
//! by calling [`EffectInstance::on_frame`](crate::EffectInstance::on_frame)
//! and [`EffectInstance::handle_resize`](crate::EffectInstance::handle_resize).

use backdrop_config::BindTarget;
use backdrop_core::{Color, ElementId};

/// Identifies one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Identifies a resize subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identifies a rendering surface (the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Content box of an element, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentBox {
    pub width: f32,
    pub height: f32,
}

impl ContentBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Styling applied to a mounted surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasStyle {
    /// Nearest-neighbour sampling when the surface is upscaled.
    pub pixelated: bool,
}

pub trait Host {
    /// Resolve a bind target to an element.
    fn resolve(&self, target: &BindTarget) -> Option<ElementId>;

    /// Ensure `el` and its direct children have a non-default stacking
    /// context so a surface mounted underneath layers correctly.
    fn prepare_element(&mut self, el: ElementId);

    fn content_box(&self, el: ElementId) -> ContentBox;

    /// Width of the whole viewport, used by effects that adapt framing.
    fn viewport_width(&self) -> f32;

    fn is_mobile(&self) -> bool {
        false
    }

    fn attach_surface(&mut self, el: ElementId, surface: SurfaceId, style: CanvasStyle);

    fn detach_surface(&mut self, el: ElementId, surface: SurfaceId);

    /// Static background shown when the effect cannot run.
    fn apply_fallback_background(&mut self, el: ElementId, color: Color);

    /// Monotonic clock in milliseconds, on the same base as the timestamps
    /// passed to `on_frame`.
    fn now(&self) -> f64;

    fn request_frame(&mut self) -> FrameToken;

    fn cancel_frame(&mut self, token: FrameToken);

    fn subscribe_resize(&mut self) -> ListenerId;

    fn unsubscribe_resize(&mut self, listener: ListenerId);
}
