//! The application loop: dispatch frame callbacks, draw, handle input.

use std::time::Duration;

use backdrop_config::OptionsPatch;
use backdrop_core::Color;
use backdrop_engine::{CanvasStyle, EffectInstance, Host, Registry, SurfaceId};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color as TuiColor, Style, Stylize},
    symbols::Marker,
    text::Line,
    widgets::{
        Block, Paragraph,
        canvas::{Canvas, Line as CanvasLine, Points},
    },
};
use tracing::{info, warn};

use crate::host::{Paint, TerminalHost};
use crate::renderer::{DisplayList, TerminalEngine, TerminalRenderer};

/// Frame budget while idle; input wakes the loop earlier.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Hue step for the color cycling key, in degrees.
const HUE_STEP: f32 = 40.0;

fn tui_color(color: Color) -> TuiColor {
    let [r, g, b] = color.to_rgb8();
    TuiColor::Rgb(r, g, b)
}

/// Braille gives the finest lines; a scale above 1 coarsens to half blocks.
fn marker_for(style: CanvasStyle, display: &DisplayList) -> Marker {
    if style.pixelated {
        Marker::Block
    } else if display.pixel_ratio < 1.0 {
        Marker::HalfBlock
    } else {
        Marker::Braille
    }
}

/// Pixel size reported by the terminal, if it knows.
pub fn terminal_pixels() -> Option<(u16, u16)> {
    crossterm::terminal::window_size()
        .ok()
        .map(|size| (size.width, size.height))
}

pub struct App {
    running: bool,
    host: TerminalHost,
    engine: TerminalEngine,
    instance: EffectInstance<TerminalHost, TerminalRenderer>,
    hue: f32,
}

impl App {
    /// Mount `effect` on the terminal page.
    pub fn new(
        registry: &Registry,
        effect: &str,
        patch: &OptionsPatch,
        host: TerminalHost,
    ) -> color_eyre::Result<Self> {
        let mut engine = TerminalEngine::new();
        let instance = registry.create(effect, patch, host.clone(), &mut engine)?;
        Ok(Self {
            running: false,
            host,
            engine,
            instance,
            hue: 0.0,
        })
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        while self.running {
            self.dispatch_frames();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }
        self.instance.destroy();
        Ok(())
    }

    fn dispatch_frames(&mut self) {
        let now = self.host.now();
        for token in self.host.take_due_frames() {
            self.instance.on_frame(token, now);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [title_area, _, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        for paint in self.host.paint_order(self.host.body()) {
            match paint {
                Paint::Background(color) => {
                    frame.render_widget(Block::new().style(Style::new().bg(tui_color(color))), area);
                }
                Paint::Canvas { surface, style } => self.render_canvas(frame, area, surface, style),
                Paint::Text(text) => {
                    let title = Paragraph::new(Line::from(text).bold().centered());
                    frame.render_widget(title, title_area.inner(Margin::new(0, 1)));
                }
            }
        }

        if let Some(err) = self.instance.setup_error() {
            let message = Line::from(err.to_string()).red().centered();
            frame.render_widget(Paragraph::new(message), center_row(area));
        }

        let help = Line::from(vec![
            "q".bold(),
            " quit  ".dark_gray(),
            "r".bold(),
            " restart  ".dark_gray(),
            "c".bold(),
            " cycle color  ".dark_gray(),
            "+/-".bold(),
            " speed".dark_gray(),
        ])
        .centered();
        frame.render_widget(help, help_area);
    }

    fn render_canvas(&self, frame: &mut Frame, area: Rect, surface: SurfaceId, style: CanvasStyle) {
        let display = self.engine.display();
        if display.surface != Some(surface) {
            return;
        }
        let background = if display.clear_alpha < 1.0 {
            TuiColor::Reset
        } else {
            tui_color(display.clear_color)
        };
        let canvas = Canvas::default()
            .marker(marker_for(style, &display))
            .background_color(background)
            .x_bounds([0.0, f64::from(display.width)])
            .y_bounds([0.0, f64::from(display.height)])
            .paint(|ctx| {
                for stroke in &display.strokes {
                    ctx.draw(&CanvasLine::new(
                        stroke.from.0,
                        stroke.from.1,
                        stroke.to.0,
                        stroke.to.1,
                        tui_color(stroke.color),
                    ));
                }
                for dot in &display.dots {
                    ctx.draw(&Points {
                        coords: &[dot.at],
                        color: tui_color(dot.color),
                    });
                }
            });
        frame.render_widget(canvas, area);
    }

    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        if event::poll(FRAME_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Resize(columns, rows) => self.on_resize(columns, rows),
                _ => {}
            }
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('r')) => self.instance.restart(),
            (_, KeyCode::Char('c')) => self.cycle_color(),
            (_, KeyCode::Char('+') | KeyCode::Char('=')) => self.scale_speed(1.25),
            (_, KeyCode::Char('-')) => self.scale_speed(0.8),
            _ => {}
        }
    }

    fn on_resize(&mut self, columns: u16, rows: u16) {
        if self.host.set_viewport(columns, rows, terminal_pixels()) && self.host.has_resize_listeners() {
            self.instance.handle_resize();
        }
    }

    /// New primary color; the blend mode stays until the next restart.
    fn cycle_color(&mut self) {
        self.hue = (self.hue + HUE_STEP) % 360.0;
        let color = Color::from_hsl(self.hue, 1.0, 0.62);
        info!(color = %color, "cycling primary color");
        let mut patch = OptionsPatch::default();
        match patch.set_effect_key("color", color) {
            Ok(()) => self.instance.set_options(&patch),
            Err(err) => warn!(error = %err, "cannot cycle color"),
        }
    }

    fn scale_speed(&mut self, factor: f32) {
        let speed = (self.instance.options().effective_speed() * factor).clamp(0.1, 10.0);
        self.instance.set_options(&OptionsPatch {
            speed: Some(speed),
            ..OptionsPatch::default()
        });
    }

    fn quit(&mut self) {
        self.running = false;
    }
}

fn center_row(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height / 2,
        height: 1.min(area.height),
        ..area
    }
}
