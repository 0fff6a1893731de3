//! Effect instance lifecycle.
//!
//! ```text
//! Uninitialized ─▶ Preparing ─▶ SceneReady ─▶ Running ─▶ Destroyed
//!                      │             │
//!                      └─────────────┴──▶ FailedInit
//! ```
//!
//! A missing bind target leaves the instance `Uninitialized`. Setup failures
//! are logged and kept in [`EffectInstance::setup_error`]; they never reach
//! the caller as a panic or an `Err`.

use backdrop_config::{BindTarget, ConfigResolver, Options, OptionsPatch};
use backdrop_core::{Color, ElementId, PerspectiveCamera, Scene};
use tracing::{debug, error, info, trace, warn};

use crate::clock::{FrameClock, FrameStats, FrameTime};
use crate::current::{self, InstanceId};
use crate::effect::{Effect, EffectContext};
use crate::error::{EffectError, SetupError};
use crate::host::{CanvasStyle, FrameToken, Host, ListenerId};
use crate::render::{Engine, Renderer, RendererOptions};
use crate::size::{self, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Preparing,
    SceneReady,
    Running,
    FailedInit,
    Destroyed,
}

/// One effect bound to one host element.
pub struct EffectInstance<H: Host, R: Renderer> {
    id: InstanceId,
    effect: Box<dyn Effect>,
    host: H,
    renderer: Option<R>,
    surface_attached: bool,
    el: Option<ElementId>,
    options: Options,
    size: Size,
    clock: FrameClock,
    stats: FrameStats,
    scene: Scene,
    camera: Option<PerspectiveCamera>,
    state: LifecycleState,
    setup_error: Option<SetupError>,
    frame_request: Option<FrameToken>,
    resize_request: Option<FrameToken>,
    resize_listener: Option<ListenerId>,
}

impl<H: Host, R: Renderer> EffectInstance<H, R> {
    /// Construct, mount and start an effect.
    ///
    /// Always returns an instance; check [`state`](Self::state) and
    /// [`setup_error`](Self::setup_error) to learn whether it is animating.
    pub fn new<E>(effect: Box<dyn Effect>, patch: &OptionsPatch, host: H, engine: &mut E) -> Self
    where
        E: Engine<Renderer = R>,
    {
        let id = InstanceId::next();
        current::set_current(id);
        let options = ConfigResolver::resolve(&effect.default_options(), patch);

        let mut instance = Self {
            id,
            effect,
            host,
            renderer: None,
            surface_attached: false,
            el: None,
            options,
            size: Size::default(),
            clock: FrameClock::new(),
            stats: FrameStats::default(),
            scene: Scene::new(),
            camera: None,
            state: LifecycleState::Uninitialized,
            setup_error: None,
            frame_request: None,
            resize_request: None,
            resize_listener: None,
        };

        let el = match instance.bind() {
            Ok(el) => el,
            Err(err) => {
                error!(instance = %id, effect = instance.effect.name(), error = %err, "cannot bind effect");
                instance.setup_error = Some(err);
                return instance;
            }
        };
        instance.el = Some(el);

        instance.state = LifecycleState::Preparing;
        instance.host.prepare_element(el);
        instance.init_renderer(el, engine);
        instance.set_size();

        instance.state = LifecycleState::SceneReady;
        if let Err(err) = instance.run_init() {
            instance.fail_init(err);
            return instance;
        }

        instance.resize();
        instance.start();
        instance
    }

    fn bind(&self) -> Result<ElementId, SetupError> {
        let target = self.options.el.as_ref().ok_or(SetupError::MissingBindTarget)?;
        self.host.resolve(target).ok_or_else(|| {
            SetupError::BindTarget(match target {
                BindTarget::Selector(selector) => selector.clone(),
                BindTarget::Element(id) => format!("element {}", id.0),
            })
        })
    }

    fn init_renderer<E: Engine<Renderer = R>>(&mut self, el: ElementId, engine: &mut E) {
        let Some(renderer) = engine.create_renderer(RendererOptions::default()) else {
            warn!(instance = %self.id, "no rendering engine available, effect will not animate");
            return;
        };
        self.host.attach_surface(
            el,
            renderer.surface(),
            CanvasStyle {
                pixelated: self.options.pixelated,
            },
        );
        self.surface_attached = true;
        self.renderer = Some(renderer);
        self.options.normalize();
    }

    fn run_init(&mut self) -> Result<(), EffectError> {
        self.effect.configure(&self.options)?;
        let viewport_width = self.host.viewport_width();
        let mut ctx = EffectContext {
            scene: &mut self.scene,
            camera: &mut self.camera,
            options: &self.options,
            size: self.size,
            time: self.clock.time(),
            viewport_width,
        };
        self.effect.init(&mut ctx)
    }

    fn fail_init(&mut self, err: EffectError) {
        error!(instance = %self.id, effect = self.effect.name(), error = %err, "init error");
        self.cancel_callbacks();
        self.detach_surface();
        if let (Some(el), Some(color)) = (self.el, self.options.background_color) {
            warn!(instance = %self.id, color = %color, "falling back to background color");
            self.host.apply_fallback_background(el, color);
        }
        self.state = LifecycleState::FailedInit;
        self.setup_error = Some(SetupError::Init(err));
    }

    fn start(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        self.state = LifecycleState::Running;
        info!(instance = %self.id, effect = self.effect.name(), "effect running");

        let now = self.host.now();
        self.step(now);
        self.resize_listener = Some(self.host.subscribe_resize());
        // Layout may not have settled yet; measure again next frame.
        self.resize_request = Some(self.host.request_frame());
    }

    /// Deliver a frame callback previously requested from the host.
    ///
    /// Callbacks that arrive after teardown, or for tokens this instance no
    /// longer waits on, are ignored.
    pub fn on_frame(&mut self, token: FrameToken, now_ms: f64) {
        if self.state != LifecycleState::Running {
            trace!(instance = %self.id, state = ?self.state, "ignoring frame callback");
            return;
        }
        if self.resize_request == Some(token) {
            self.resize_request = None;
            self.resize();
        }
        if self.frame_request == Some(token) {
            self.frame_request = None;
            self.step(now_ms);
        }
    }

    /// Deliver a host resize event.
    pub fn handle_resize(&mut self) {
        if self.state != LifecycleState::Running || self.resize_listener.is_none() {
            return;
        }
        self.resize();
    }

    fn set_size(&mut self) {
        let Some(el) = self.el else {
            return;
        };
        let content = self.host.content_box(el);
        self.size = size::compute_size(content, &self.options, self.host.is_mobile(), self.size.scale);
    }

    fn resize(&mut self) {
        self.set_size();
        size::apply(self.size, self.camera.as_mut(), self.renderer.as_mut());

        let viewport_width = self.host.viewport_width();
        let mut ctx = EffectContext {
            scene: &mut self.scene,
            camera: &mut self.camera,
            options: &self.options,
            size: self.size,
            time: self.clock.time(),
            viewport_width,
        };
        self.effect.on_resize(&mut ctx);
        debug!(instance = %self.id, width = self.size.width, height = self.size.height, scale = self.size.scale, "resized");
    }

    fn step(&mut self, now_ms: f64) {
        self.clock.advance(now_ms, self.options.effective_speed());

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let background = self.options.background_color.unwrap_or(Color::BLACK);
        renderer.set_clear_color(background, self.options.background_alpha);
        renderer.clear();

        let viewport_width = self.host.viewport_width();
        let mut ctx = EffectContext {
            scene: &mut self.scene,
            camera: &mut self.camera,
            options: &self.options,
            size: self.size,
            time: self.clock.time(),
            viewport_width,
        };
        self.effect.on_update(&mut ctx);

        if let Some(camera) = self.camera.as_ref() {
            renderer.render(&mut self.scene, camera);
        }

        if let Some(fps) = self.stats.record(now_ms) {
            trace!(instance = %self.id, fps, frames = self.stats.frames(), "frame stats");
        }
        let ctx = EffectContext {
            scene: &mut self.scene,
            camera: &mut self.camera,
            options: &self.options,
            size: self.size,
            time: self.clock.time(),
            viewport_width,
        };
        self.effect.after_render(&ctx);

        if self.state == LifecycleState::Running {
            self.frame_request = Some(self.host.request_frame());
        }
    }

    /// Merge new values into the live options. Geometry is not rebuilt; call
    /// [`restart`](Self::restart) for that. The bind target cannot change.
    pub fn set_options(&mut self, patch: &OptionsPatch) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        if patch.el.is_some() {
            warn!(instance = %self.id, "ignoring `el` in set_options, bind target is fixed");
        }
        let patch = OptionsPatch {
            el: None,
            ..patch.clone()
        };
        self.options.merge(&patch);
        if let Err(err) = self.effect.configure(&self.options) {
            warn!(instance = %self.id, effect = self.effect.name(), error = %err, "rejected effect options");
        }
    }

    /// Tear the scene down and run the effect's init again.
    pub fn restart(&mut self) {
        if self.state != LifecycleState::Running {
            warn!(instance = %self.id, state = ?self.state, "restart ignored, instance is not running");
            return;
        }
        self.dispose_scene();
        self.effect.on_restart();
        match self.run_init() {
            Ok(()) => info!(instance = %self.id, effect = self.effect.name(), "effect restarted"),
            Err(err) => {
                self.dispose_scene();
                self.fail_init(err);
            }
        }
    }

    /// Release everything. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.effect.on_destroy();
        self.cancel_callbacks();
        self.dispose_scene();
        self.detach_surface();
        self.renderer = None;
        self.camera = None;
        current::clear_current(self.id);
        self.state = LifecycleState::Destroyed;
        info!(instance = %self.id, effect = self.effect.name(), "effect destroyed");
    }

    fn cancel_callbacks(&mut self) {
        if let Some(listener) = self.resize_listener.take() {
            self.host.unsubscribe_resize(listener);
        }
        for token in [self.frame_request.take(), self.resize_request.take()]
            .into_iter()
            .flatten()
        {
            self.host.cancel_frame(token);
        }
    }

    fn dispose_scene(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            for id in self.scene.post_order() {
                if let Some(node) = self.scene.get(id) {
                    renderer.dispose(id, node);
                }
            }
        }
        self.scene.clear();
    }

    fn detach_surface(&mut self) {
        if !self.surface_attached {
            return;
        }
        if let (Some(el), Some(renderer)) = (self.el, self.renderer.as_ref()) {
            self.host.detach_surface(el, renderer.surface());
        }
        self.surface_attached = false;
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn effect_name(&self) -> &'static str {
        self.effect.name()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn setup_error(&self) -> Option<&SetupError> {
        self.setup_error.as_ref()
    }

    pub fn element(&self) -> Option<ElementId> {
        self.el
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn time(&self) -> FrameTime {
        self.clock.time()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn has_surface(&self) -> bool {
        self.surface_attached
    }
}

impl<H: Host, R: Renderer> Drop for EffectInstance<H, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}
