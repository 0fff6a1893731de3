//! The capability interface every effect variant implements.

use backdrop_config::{Options, OptionsPatch};
use backdrop_core::{PerspectiveCamera, Scene};

use crate::clock::FrameTime;
use crate::error::EffectError;
use crate::size::Size;

/// Everything a hook may read or mutate. The instance owns all of it; hooks
/// only borrow it for the duration of the call.
pub struct EffectContext<'a> {
    pub scene: &'a mut Scene,
    /// The effect's camera. Set it in [`Effect::init`] to get aspect updates
    /// on resize and to have the scene rendered.
    pub camera: &'a mut Option<PerspectiveCamera>,
    pub options: &'a Options,
    pub size: Size,
    pub time: FrameTime,
    pub viewport_width: f32,
}

/// A background effect driven by [`EffectInstance`](crate::EffectInstance).
pub trait Effect {
    fn name(&self) -> &'static str;

    /// Effect defaults, layered between framework defaults and caller values.
    fn default_options(&self) -> OptionsPatch {
        OptionsPatch::default()
    }

    /// Read this effect's own keys out of the resolved options. Runs before
    /// every [`init`](Self::init) and after every `set_options`; on error the
    /// previous values must stay in effect.
    fn configure(&mut self, _options: &Options) -> Result<(), EffectError> {
        Ok(())
    }

    /// Build the scene. Called once after construction and again on every
    /// restart, always with an empty scene.
    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError>;

    /// Advance the animation by one frame.
    fn on_update(&mut self, ctx: &mut EffectContext<'_>);

    fn on_resize(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn on_restart(&mut self) {}

    fn on_destroy(&mut self) {}

    fn after_render(&mut self, _ctx: &EffectContext<'_>) {}
}
