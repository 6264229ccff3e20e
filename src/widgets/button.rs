//! Momentary or toggle button.
//!
//! Reports `{"press": 1}` when pressed and `{"press": 0}` when released. With
//! the `mode` property set to `"toggle"`, each press flips the state and
//! releases are ignored.

use eframe::egui::{Color32, Painter, Rect, Stroke};
use serde_json::{json, Value};

use super::{aspect_color, draw_label};
use crate::app::theme;
use crate::registry::{Interaction, Widget, WidgetState};

pub struct Button {
    state: WidgetState,
    pressed: bool,
}

impl Button {
    pub fn new(state: WidgetState) -> Self {
        Self {
            state,
            pressed: false,
        }
    }

    pub fn boxed(state: WidgetState) -> Box<dyn Widget> {
        Box::new(Self::new(state))
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn toggles(&self) -> bool {
        self.state.properties.get("mode").and_then(Value::as_str) == Some("toggle")
    }

    fn press(&mut self, pressed: bool) -> Option<Value> {
        if self.pressed == pressed {
            return None;
        }
        self.pressed = pressed;
        Some(self.value())
    }
}

impl Widget for Button {
    fn state(&self) -> &WidgetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    fn init(&mut self) {
        self.draw();
    }

    fn draw(&mut self) {
        self.state.mark_drawn();
    }

    fn handle_interaction(&mut self, interaction: Interaction) -> Option<Value> {
        match interaction {
            Interaction::Press { .. } if self.toggles() => self.press(!self.pressed),
            Interaction::Press { .. } => self.press(true),
            Interaction::Release if !self.toggles() => self.press(false),
            _ => None,
        }
    }

    fn value(&self) -> Value {
        json!({ "press": u8::from(self.pressed) })
    }

    fn set_value(&mut self, value: &Value) -> Value {
        let pressed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::Object(map) => map
                .get("press")
                .and_then(Value::as_f64)
                .map(|v| v != 0.0),
            _ => None,
        };
        if let Some(pressed) = pressed {
            self.pressed = pressed;
        }
        self.value()
    }

    fn paint(&self, painter: &Painter, rect: Rect) {
        let radius = rect.width().min(rect.height()) / 2.0 - 2.0;
        if radius <= 0.0 {
            return;
        }
        let center = rect.center();
        let fill = aspect_color(&self.state, "fill", theme::background::WIDGET);
        let border = aspect_color(&self.state, "border", theme::background::BORDER);
        let accent = aspect_color(&self.state, "accent", theme::accent::PRIMARY);

        painter.circle_filled(center, radius, fill);
        if self.pressed {
            // soft glow around the lit face
            painter.circle_filled(center, radius * 0.9, accent.gamma_multiply(0.4));
            painter.circle_filled(center, radius * 0.75, accent);
            painter.circle_filled(
                center,
                radius * 0.3,
                Color32::from_rgba_unmultiplied(255, 255, 255, 60),
            );
        }
        painter.circle_stroke(center, radius, Stroke::new(1.0, border));

        let label = if self.pressed { "on" } else { "off" };
        draw_label(painter, &self.state, center, label);
    }
}
