//! Recording doubles for [`Host`] and [`Engine`].
//!
//! All handles share state through `Rc<RefCell<_>>`, so a test can keep a
//! clone of the host or engine after moving one into an instance and inspect
//! what happened.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use backdrop_config::BindTarget;
use backdrop_core::{Color, ElementId, Node, ObjectId, PerspectiveCamera, Scene};

use crate::host::{CanvasStyle, ContentBox, FrameToken, Host, ListenerId, SurfaceId};
use crate::instance::EffectInstance;
use crate::render::{Engine, Renderer, RendererOptions};

/// Side effects a [`MockHost`] observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Prepare(ElementId),
    Attach(ElementId, SurfaceId, CanvasStyle),
    Detach(ElementId, SurfaceId),
    Fallback(ElementId, Color),
}

#[derive(Debug)]
struct HostState {
    elements: HashMap<String, (ElementId, ContentBox)>,
    calls: Vec<HostCall>,
    pending: Vec<FrameToken>,
    listeners: Vec<ListenerId>,
    next_id: u64,
    now: f64,
    viewport_width: f32,
    mobile: bool,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            calls: Vec::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
            next_id: 1,
            now: 0.0,
            viewport_width: 1024.0,
            mobile: false,
        }
    }
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory page with selector-addressed elements and a manual frame queue.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    state: Rc<RefCell<HostState>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element reachable through `selector`.
    pub fn with_element(self, selector: &str, content: ContentBox) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = ElementId(state.next_id());
            state.elements.insert(selector.to_string(), (id, content));
        }
        self
    }

    pub fn element(&self, selector: &str) -> Option<ElementId> {
        self.state.borrow().elements.get(selector).map(|(id, _)| *id)
    }

    pub fn set_content_box(&self, selector: &str, content: ContentBox) {
        if let Some(entry) = self.state.borrow_mut().elements.get_mut(selector) {
            entry.1 = content;
        }
    }

    pub fn set_viewport_width(&self, width: f32) {
        self.state.borrow_mut().viewport_width = width;
    }

    pub fn set_mobile(&self, mobile: bool) {
        self.state.borrow_mut().mobile = mobile;
    }

    pub fn set_now(&self, now_ms: f64) {
        self.state.borrow_mut().now = now_ms;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    /// Frame callbacks requested and not yet delivered or cancelled.
    pub fn pending_frames(&self) -> Vec<FrameToken> {
        self.state.borrow().pending.clone()
    }

    pub fn resize_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Deliver `frames` rounds of callbacks, advancing the clock by
    /// `step_ms` before each round.
    pub fn pump<R: Renderer>(&self, instance: &mut EffectInstance<MockHost, R>, frames: usize, step_ms: f64) {
        for _ in 0..frames {
            let (now, due) = {
                let mut state = self.state.borrow_mut();
                state.now += step_ms;
                (state.now, std::mem::take(&mut state.pending))
            };
            for token in due {
                instance.on_frame(token, now);
            }
        }
    }
}

impl Host for MockHost {
    fn resolve(&self, target: &BindTarget) -> Option<ElementId> {
        let state = self.state.borrow();
        match target {
            BindTarget::Selector(selector) => state.elements.get(selector).map(|(id, _)| *id),
            BindTarget::Element(id) => state.elements.values().find(|(el, _)| el == id).map(|(el, _)| *el),
        }
    }

    fn prepare_element(&mut self, el: ElementId) {
        self.state.borrow_mut().calls.push(HostCall::Prepare(el));
    }

    fn content_box(&self, el: ElementId) -> ContentBox {
        self.state
            .borrow()
            .elements
            .values()
            .find(|(id, _)| *id == el)
            .map(|(_, content)| *content)
            .unwrap_or_default()
    }

    fn viewport_width(&self) -> f32 {
        self.state.borrow().viewport_width
    }

    fn is_mobile(&self) -> bool {
        self.state.borrow().mobile
    }

    fn attach_surface(&mut self, el: ElementId, surface: SurfaceId, style: CanvasStyle) {
        self.state.borrow_mut().calls.push(HostCall::Attach(el, surface, style));
    }

    fn detach_surface(&mut self, el: ElementId, surface: SurfaceId) {
        self.state.borrow_mut().calls.push(HostCall::Detach(el, surface));
    }

    fn apply_fallback_background(&mut self, el: ElementId, color: Color) {
        self.state.borrow_mut().calls.push(HostCall::Fallback(el, color));
    }

    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn request_frame(&mut self) -> FrameToken {
        let mut state = self.state.borrow_mut();
        let token = FrameToken(state.next_id());
        state.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.state.borrow_mut().pending.retain(|t| *t != token);
    }

    fn subscribe_resize(&mut self) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let listener = ListenerId(state.next_id());
        state.listeners.push(listener);
        listener
    }

    fn unsubscribe_resize(&mut self, listener: ListenerId) {
        self.state.borrow_mut().listeners.retain(|l| *l != listener);
    }
}

/// What every renderer created by one [`MockEngine`] did.
#[derive(Debug, Clone, Default)]
pub struct RendererLog {
    pub created: usize,
    pub clear_color: Option<(Color, f32)>,
    pub clears: usize,
    pub size: Option<(f32, f32)>,
    pub pixel_ratio: Option<f32>,
    pub renders: usize,
    /// Line geometries whose dirty flag a render consumed.
    pub uploads: usize,
    pub disposed: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct MockEngine {
    available: bool,
    log: Rc<RefCell<RendererLog>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            available: true,
            log: Rc::default(),
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that never produces a renderer.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn log(&self) -> Ref<'_, RendererLog> {
        self.log.borrow()
    }
}

impl Engine for MockEngine {
    type Renderer = MockRenderer;

    fn create_renderer(&mut self, _options: RendererOptions) -> Option<MockRenderer> {
        if !self.available {
            return None;
        }
        let mut log = self.log.borrow_mut();
        log.created += 1;
        Some(MockRenderer {
            surface: SurfaceId(log.created as u64),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockRenderer {
    surface: SurfaceId,
    log: Rc<RefCell<RendererLog>>,
}

impl Renderer for MockRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_clear_color(&mut self, color: Color, alpha: f32) {
        self.log.borrow_mut().clear_color = Some((color, alpha));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().clears += 1;
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.log.borrow_mut().size = Some((width, height));
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.log.borrow_mut().pixel_ratio = Some(ratio);
    }

    fn render(&mut self, scene: &mut Scene, _camera: &PerspectiveCamera) {
        let mut uploads = 0;
        for id in scene.pre_order() {
            if scene.line_geometry_mut(id).is_some_and(|g| g.take_dirty()) {
                uploads += 1;
            }
        }
        let mut log = self.log.borrow_mut();
        log.renders += 1;
        log.uploads += uploads;
    }

    fn dispose(&mut self, id: ObjectId, _node: &Node) {
        self.log.borrow_mut().disposed.push(id);
    }
}
