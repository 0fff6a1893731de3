//! The terminal as a host page.
//!
//! The page has one element, the whole screen, reachable as `body` or
//! `#backdrop`. Its children are text runs and overlay layers; mounting a
//! surface adds an absolutely positioned canvas. Paint order follows the
//! usual stacking rules: non-positioned children first, then positioned ones
//! by z-index, ties in document order.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use backdrop_config::BindTarget;
use backdrop_core::{Color, ElementId};
use backdrop_engine::{CanvasStyle, ContentBox, FrameToken, Host, ListenerId, SurfaceId};
use tracing::{debug, warn};

/// Pixel size of one cell when the terminal does not report one.
const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 16.0;

const BODY: ElementId = ElementId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub text: String,
    pub position: Position,
    /// `None` is `auto`.
    pub z_index: Option<i32>,
}

impl Layer {
    fn positioned(&self) -> bool {
        self.position != Position::Static
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Child {
    /// Bare text directly inside the element.
    Text(String),
    Layer(Layer),
    Canvas { surface: SurfaceId, style: CanvasStyle },
}

#[derive(Debug)]
struct Element {
    id: ElementId,
    selectors: Vec<&'static str>,
    position: Position,
    children: Vec<Child>,
    fallback: Option<Color>,
}

/// One entry of the element's paint order, bottom first.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Background(Color),
    Canvas { surface: SurfaceId, style: CanvasStyle },
    Text(String),
}

#[derive(Debug)]
struct Page {
    body: Element,
    columns: u16,
    rows: u16,
    pixels: (f32, f32),
    frames: Vec<FrameToken>,
    listeners: Vec<ListenerId>,
    next_id: u64,
    epoch: Instant,
}

impl Page {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn element(&self, el: ElementId) -> Option<&Element> {
        (self.body.id == el).then_some(&self.body)
    }

    fn element_mut(&mut self, el: ElementId) -> Option<&mut Element> {
        (self.body.id == el).then_some(&mut self.body)
    }
}

fn pixel_size(columns: u16, rows: u16, reported: Option<(u16, u16)>) -> (f32, f32) {
    match reported {
        Some((width, height)) if width > 0 && height > 0 => (f32::from(width), f32::from(height)),
        _ => (f32::from(columns) * CELL_WIDTH, f32::from(rows) * CELL_HEIGHT),
    }
}

/// Shared handle to the page; clones see the same state.
#[derive(Debug, Clone)]
pub struct TerminalHost {
    page: Rc<RefCell<Page>>,
}

impl TerminalHost {
    /// `pixels` is the terminal's reported size in pixels, if any.
    pub fn new(columns: u16, rows: u16, pixels: Option<(u16, u16)>) -> Self {
        let body = Element {
            id: BODY,
            selectors: vec!["body", "#backdrop"],
            position: Position::Static,
            children: Vec::new(),
            fallback: None,
        };
        Self {
            page: Rc::new(RefCell::new(Page {
                body,
                columns,
                rows,
                pixels: pixel_size(columns, rows, pixels),
                frames: Vec::new(),
                listeners: Vec::new(),
                next_id: BODY.0,
                epoch: Instant::now(),
            })),
        }
    }

    /// Append bare text to the page, e.g. a title.
    pub fn add_text(&self, text: impl Into<String>) {
        self.page.borrow_mut().body.children.push(Child::Text(text.into()));
    }

    #[cfg(test)]
    pub fn add_layer(&self, layer: Layer) {
        self.page.borrow_mut().body.children.push(Child::Layer(layer));
    }

    pub fn body(&self) -> ElementId {
        BODY
    }

    /// Record a new terminal size. Returns `true` if anything changed.
    pub fn set_viewport(&self, columns: u16, rows: u16, pixels: Option<(u16, u16)>) -> bool {
        let mut page = self.page.borrow_mut();
        let size = pixel_size(columns, rows, pixels);
        let changed = page.columns != columns || page.rows != rows || page.pixels != size;
        page.columns = columns;
        page.rows = rows;
        page.pixels = size;
        changed
    }

    /// Frame callbacks requested so far; they all fire with the same
    /// timestamp.
    pub fn take_due_frames(&self) -> Vec<FrameToken> {
        std::mem::take(&mut self.page.borrow_mut().frames)
    }

    pub fn has_resize_listeners(&self) -> bool {
        !self.page.borrow().listeners.is_empty()
    }

    /// Paint order of `el`, bottom first.
    pub fn paint_order(&self, el: ElementId) -> Vec<Paint> {
        let page = self.page.borrow();
        let Some(element) = page.element(el) else {
            return Vec::new();
        };

        let mut paints = Vec::new();
        if let Some(color) = element.fallback {
            paints.push(Paint::Background(color));
        }

        let mut positioned = Vec::new();
        for (order, child) in element.children.iter().enumerate() {
            match child {
                Child::Text(text) => paints.push(Paint::Text(text.clone())),
                Child::Layer(layer) if !layer.positioned() => paints.push(Paint::Text(layer.text.clone())),
                Child::Layer(layer) => {
                    positioned.push((layer.z_index.unwrap_or(0), order, Paint::Text(layer.text.clone())));
                }
                Child::Canvas { surface, style } => positioned.push((
                    0,
                    order,
                    Paint::Canvas {
                        surface: *surface,
                        style: *style,
                    },
                )),
            }
        }
        positioned.sort_by_key(|(z, order, _)| (*z, *order));
        paints.extend(positioned.into_iter().map(|(_, _, paint)| paint));
        paints
    }
}

impl Host for TerminalHost {
    fn resolve(&self, target: &BindTarget) -> Option<ElementId> {
        let page = self.page.borrow();
        match target {
            BindTarget::Selector(selector) => page
                .body
                .selectors
                .iter()
                .any(|s| s == selector)
                .then_some(page.body.id),
            BindTarget::Element(id) => page.element(*id).map(|e| e.id),
        }
    }

    fn prepare_element(&mut self, el: ElementId) {
        let mut page = self.page.borrow_mut();
        let Some(element) = page.element_mut(el) else {
            return;
        };
        for child in &mut element.children {
            if let Child::Text(text) = child {
                *child = Child::Layer(Layer {
                    text: std::mem::take(text),
                    position: Position::Static,
                    z_index: None,
                });
            }
            if let Child::Layer(layer) = child {
                if layer.position == Position::Static {
                    layer.position = Position::Relative;
                }
                layer.z_index.get_or_insert(1);
            }
        }
        if element.position == Position::Static {
            element.position = Position::Relative;
        }
        debug!(element = el.0, children = element.children.len(), "prepared stacking context");
    }

    fn content_box(&self, el: ElementId) -> ContentBox {
        let page = self.page.borrow();
        match page.element(el) {
            Some(_) => ContentBox::new(page.pixels.0, page.pixels.1),
            None => ContentBox::default(),
        }
    }

    fn viewport_width(&self) -> f32 {
        self.page.borrow().pixels.0
    }

    fn attach_surface(&mut self, el: ElementId, surface: SurfaceId, style: CanvasStyle) {
        match self.page.borrow_mut().element_mut(el) {
            Some(element) => element.children.push(Child::Canvas { surface, style }),
            None => warn!(element = el.0, "cannot attach surface to unknown element"),
        }
    }

    fn detach_surface(&mut self, el: ElementId, surface: SurfaceId) {
        if let Some(element) = self.page.borrow_mut().element_mut(el) {
            element
                .children
                .retain(|c| !matches!(c, Child::Canvas { surface: s, .. } if *s == surface));
        }
    }

    fn apply_fallback_background(&mut self, el: ElementId, color: Color) {
        if let Some(element) = self.page.borrow_mut().element_mut(el) {
            element.fallback = Some(color);
        }
    }

    fn now(&self) -> f64 {
        self.page.borrow().epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&mut self) -> FrameToken {
        let mut page = self.page.borrow_mut();
        let token = FrameToken(page.next_id());
        page.frames.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.page.borrow_mut().frames.retain(|t| *t != token);
    }

    fn subscribe_resize(&mut self) -> ListenerId {
        let mut page = self.page.borrow_mut();
        let listener = ListenerId(page.next_id());
        page.listeners.push(listener);
        listener
    }

    fn unsubscribe_resize(&mut self, listener: ListenerId) {
        self.page.borrow_mut().listeners.retain(|l| *l != listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(surface: u64) -> Paint {
        Paint::Canvas {
            surface: SurfaceId(surface),
            style: CanvasStyle::default(),
        }
    }

    #[test]
    fn selectors_resolve_to_the_screen() {
        let host = TerminalHost::new(80, 24, None);
        assert_eq!(host.resolve(&BindTarget::from("body")), Some(host.body()));
        assert_eq!(host.resolve(&BindTarget::from("#backdrop")), Some(host.body()));
        assert_eq!(host.resolve(&BindTarget::from("#hero")), None);
        assert_eq!(host.resolve(&BindTarget::Element(ElementId(99))), None);
    }

    #[test]
    fn missing_pixel_report_falls_back_to_cell_size() {
        let host = TerminalHost::new(80, 24, Some((0, 0)));
        assert_eq!(host.content_box(host.body()), ContentBox::new(640.0, 384.0));
        assert_eq!(host.viewport_width(), 640.0);
    }

    #[test]
    fn unprepared_text_sinks_below_the_canvas() {
        let mut host = TerminalHost::new(80, 24, None);
        host.add_text("hello");
        host.attach_surface(host.body(), SurfaceId(1), CanvasStyle::default());
        assert_eq!(host.paint_order(host.body()), vec![Paint::Text("hello".into()), canvas(1)]);
    }

    #[test]
    fn prepared_children_paint_above_the_canvas() {
        let mut host = TerminalHost::new(80, 24, None);
        host.add_text("hello");
        host.add_layer(Layer {
            text: "under".into(),
            position: Position::Relative,
            z_index: Some(-1),
        });
        let body = host.body();
        host.prepare_element(body);
        host.attach_surface(body, SurfaceId(1), CanvasStyle::default());

        assert_eq!(
            host.paint_order(body),
            vec![Paint::Text("under".into()), canvas(1), Paint::Text("hello".into())]
        );
    }

    #[test]
    fn detach_and_fallback() {
        let mut host = TerminalHost::new(80, 24, None);
        let body = host.body();
        host.attach_surface(body, SurfaceId(4), CanvasStyle { pixelated: true });
        host.detach_surface(body, SurfaceId(4));
        host.apply_fallback_background(body, Color::from_hex(0x23153c));
        assert_eq!(host.paint_order(body), vec![Paint::Background(Color::from_hex(0x23153c))]);
    }

    #[test]
    fn cancelled_frames_never_fire() {
        let mut host = TerminalHost::new(80, 24, None);
        let a = host.request_frame();
        let b = host.request_frame();
        host.cancel_frame(a);
        assert_eq!(host.take_due_frames(), vec![b]);
        assert!(host.take_due_frames().is_empty());
    }

    #[test]
    fn viewport_changes_are_reported_once() {
        let host = TerminalHost::new(80, 24, None);
        assert!(host.set_viewport(100, 30, None));
        assert!(!host.set_viewport(100, 30, None));
        assert_eq!(host.content_box(host.body()), ContentBox::new(800.0, 480.0));
    }
}
