use crate::render::Camera;
use macroquad::miniquad::window::set_mouse_cursor;
use macroquad::miniquad::CursorIcon;
use macroquad::prelude::*;

/// Text panels the overlay shows while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Instructions,
    Layers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
}

/// Pointer input in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(Vec2),
    Down(Vec2),
}

/// What the overlay needs from whatever hosts it.
///
/// Shapes are in world coordinates and persist on the surface until the
/// next clear.
pub trait DebugHost {
    fn is_interactive(&self) -> bool {
        true
    }

    /// Layer names the host offers for debugging, `None` if it cannot say.
    fn discover_layers(&self) -> Option<Vec<String>> {
        None
    }

    fn attach_pointer(&mut self);
    fn detach_pointer(&mut self);
    fn create_surface(&mut self);
    fn destroy_surface(&mut self);
    fn clear_surface(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color);
    fn set_highlight(&mut self, rect: Option<Rect>);
    /// Place (`Some`) or remove (`None`) a labelled auxiliary box.
    fn set_tracked(&mut self, label: &str, rect: Option<Rect>);
    fn show_panel(&mut self, panel: Panel, lines: Vec<String>);
    fn hide_panels(&mut self);
    fn set_cursor(&mut self, cursor: CursorHint);
}

/// Host without any display or input. Every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl DebugHost for NullHost {
    fn is_interactive(&self) -> bool {
        false
    }
    fn attach_pointer(&mut self) {}
    fn detach_pointer(&mut self) {}
    fn create_surface(&mut self) {}
    fn destroy_surface(&mut self) {}
    fn clear_surface(&mut self) {}
    fn fill_rect(&mut self, _rect: Rect, _color: Color) {}
    fn stroke_rect(&mut self, _rect: Rect, _thickness: f32, _color: Color) {}
    fn set_highlight(&mut self, _rect: Option<Rect>) {}
    fn set_tracked(&mut self, _label: &str, _rect: Option<Rect>) {}
    fn show_panel(&mut self, _panel: Panel, _lines: Vec<String>) {}
    fn hide_panels(&mut self) {}
    fn set_cursor(&mut self, _cursor: CursorHint) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Fill(Rect, Color),
    Stroke(Rect, f32, Color),
}

const HIGHLIGHT_COLOR: Color = Color::new(1.0, 0.9, 0.1, 1.0);
const TRACKED_COLOR: Color = Color::new(0.1, 0.9, 1.0, 1.0);
const PANEL_BG: Color = Color::new(0.0, 0.0, 0.0, 0.7);
const PANEL_FONT: f32 = 18.0;

/// Macroquad host. The overlay writes into a retained shape list;
/// [`InteractiveHost::present`] replays it every frame, so the overlay
/// itself only re-renders on events.
#[derive(Debug, Default)]
pub struct InteractiveHost {
    surface: Option<Vec<Shape>>,
    highlight: Option<Rect>,
    tracked: Vec<(String, Rect)>,
    panels: Vec<(Panel, Vec<String>)>,
    listening: bool,
    cursor: CursorHint,
    layer_names: Option<Vec<String>>,
    last_pointer: Option<Vec2>,
    // set once polled from inside the macroquad loop
    in_window: bool,
}

impl InteractiveHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that offers `names` for layer discovery.
    pub fn with_layers(names: Vec<String>) -> Self {
        Self {
            layer_names: Some(names),
            ..Self::default()
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        self.surface.as_deref().unwrap_or_default()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn highlight(&self) -> Option<Rect> {
        self.highlight
    }

    pub fn tracked(&self) -> &[(String, Rect)] {
        &self.tracked
    }

    pub fn panel(&self, panel: Panel) -> Option<&[String]> {
        self.panels
            .iter()
            .find(|(p, _)| *p == panel)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    /// Read the mouse and turn it into world-space events. Nothing is
    /// reported while no listener is attached.
    pub fn poll_pointer(&mut self, camera: &Camera) -> Vec<PointerEvent> {
        self.in_window = true;
        if !self.listening {
            return Vec::new();
        }
        let (mx, my) = mouse_position();
        let world = camera.screen_to_world(vec2(mx, my));
        let mut events = Vec::new();
        if self.last_pointer != Some(world) {
            self.last_pointer = Some(world);
            events.push(PointerEvent::Move(world));
        }
        if is_mouse_button_pressed(MouseButton::Left) {
            events.push(PointerEvent::Down(world));
        }
        events
    }

    /// Draw the retained surface, highlight and panels.
    pub fn present(&self, camera: &Camera) {
        let to_screen = |r: Rect| {
            let p = camera.world_to_screen(vec2(r.x, r.y));
            let s = camera.world_to_screen(vec2(r.x + r.w, r.y + r.h)) - p;
            Rect::new(p.x, p.y, s.x, s.y)
        };

        for shape in self.shapes() {
            match *shape {
                Shape::Fill(r, color) => {
                    let r = to_screen(r);
                    draw_rectangle(r.x, r.y, r.w, r.h, color);
                }
                Shape::Stroke(r, thickness, color) => {
                    let r = to_screen(r);
                    draw_rectangle_lines(r.x, r.y, r.w, r.h, thickness, color);
                }
            }
        }
        if let Some(r) = self.highlight {
            let r = to_screen(r);
            draw_rectangle_lines(r.x, r.y, r.w, r.h, 2.0, HIGHLIGHT_COLOR);
        }
        for (_, r) in &self.tracked {
            let r = to_screen(*r);
            draw_rectangle_lines(r.x, r.y, r.w, r.h, 1.0, TRACKED_COLOR);
        }

        let mut y = 10.0;
        for (panel, lines) in &self.panels {
            let x = match panel {
                Panel::Instructions => 10.0,
                Panel::Layers => screen_width() - 260.0,
            };
            let py = if *panel == Panel::Instructions { y } else { 10.0 };
            let h = lines.len() as f32 * PANEL_FONT + 8.0;
            draw_rectangle(x - 4.0, py - 4.0, 250.0, h, PANEL_BG);
            for (i, line) in lines.iter().enumerate() {
                draw_text(line, x, py + PANEL_FONT * (i as f32 + 0.8), PANEL_FONT, WHITE);
            }
            if *panel == Panel::Instructions {
                y += h + 6.0;
            }
        }
    }
}

impl DebugHost for InteractiveHost {
    fn discover_layers(&self) -> Option<Vec<String>> {
        self.layer_names.clone()
    }

    fn attach_pointer(&mut self) {
        self.listening = true;
    }

    fn detach_pointer(&mut self) {
        self.listening = false;
        self.last_pointer = None;
    }

    fn create_surface(&mut self) {
        if self.surface.is_none() {
            self.surface = Some(Vec::new());
        }
    }

    fn destroy_surface(&mut self) {
        self.surface = None;
    }

    fn clear_surface(&mut self) {
        if let Some(shapes) = &mut self.surface {
            shapes.clear();
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(shapes) = &mut self.surface {
            shapes.push(Shape::Fill(rect, color));
        }
    }

    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        if let Some(shapes) = &mut self.surface {
            shapes.push(Shape::Stroke(rect, thickness, color));
        }
    }

    fn set_highlight(&mut self, rect: Option<Rect>) {
        self.highlight = rect;
    }

    fn set_tracked(&mut self, label: &str, rect: Option<Rect>) {
        let slot = self.tracked.iter().position(|(l, _)| l == label);
        match (slot, rect) {
            (Some(i), Some(r)) => self.tracked[i].1 = r,
            (Some(i), None) => {
                self.tracked.remove(i);
            }
            (None, Some(r)) => self.tracked.push((label.to_owned(), r)),
            (None, None) => {}
        }
    }

    fn show_panel(&mut self, panel: Panel, lines: Vec<String>) {
        match self.panels.iter_mut().find(|(p, _)| *p == panel) {
            Some(entry) => entry.1 = lines,
            None => self.panels.push((panel, lines)),
        }
    }

    fn hide_panels(&mut self) {
        self.panels.clear();
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        if self.cursor == cursor {
            return;
        }
        self.cursor = cursor;
        if self.in_window {
            set_mouse_cursor(match cursor {
                CursorHint::Default => CursorIcon::Default,
                CursorHint::Pointer => CursorIcon::Pointer,
            });
        }
    }
}
