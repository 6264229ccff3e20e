//! Rotary dial widget.
//!
//! Vertical drag changes the value: up increases, down decreases. A drag
//! across the full surface height sweeps the full range.

use eframe::egui::{Painter, Pos2, Rect, Stroke, Vec2};
use serde_json::{json, Value};

use super::{aspect_color, draw_label, number_from, tidy};
use crate::app::theme;
use crate::registry::{Interaction, Widget, WidgetState};

/// Arc start, bottom-left.
const START_ANGLE: f32 = -225.0 * std::f32::consts::PI / 180.0;
/// Arc end, bottom-right. The arc spans 270 degrees.
const END_ANGLE: f32 = 45.0 * std::f32::consts::PI / 180.0;
const ARC_SEGMENTS: usize = 32;

pub struct Dial {
    state: WidgetState,
    /// Normalised value, 0.0 to 1.0.
    value: f64,
}

impl Dial {
    pub fn new(state: WidgetState) -> Self {
        Self { state, value: 0.0 }
    }

    pub fn boxed(state: WidgetState) -> Box<dyn Widget> {
        Box::new(Self::new(state))
    }

    fn store(&mut self, value: f64) -> bool {
        let value = tidy(value.clamp(0.0, 1.0));
        let changed = value != self.value;
        self.value = value;
        changed
    }
}

impl Widget for Dial {
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
            Interaction::Drag { dy, .. } => {
                if self.store(self.value - dy as f64) {
                    Some(self.value())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn set_value(&mut self, value: &Value) -> Value {
        if let Some(v) = number_from(value) {
            self.store(v);
        }
        self.value()
    }

    fn paint(&self, painter: &Painter, rect: Rect) {
        let center = rect.center();
        let radius = rect.width().min(rect.height()) / 2.0 - 2.0;
        if radius <= 0.0 {
            return;
        }
        let scale = radius / 25.0;

        let fill = aspect_color(&self.state, "fill", theme::background::WIDGET);
        let border = aspect_color(&self.state, "border", theme::background::BORDER);
        let accent = aspect_color(&self.state, "accent", theme::accent::PRIMARY);

        painter.circle_filled(center, radius, fill);
        painter.circle_stroke(center, radius, Stroke::new(1.0 * scale, border));

        let angle = START_ANGLE + self.value as f32 * (END_ANGLE - START_ANGLE);
        let arc_radius = radius - 4.0 * scale;
        let points: Vec<Pos2> = (0..=ARC_SEGMENTS)
            .map(|i| {
                let t = i as f32 / ARC_SEGMENTS as f32;
                let a = START_ANGLE + t * (angle - START_ANGLE);
                center + Vec2::angled(a) * arc_radius
            })
            .collect();
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], Stroke::new(3.0 * scale, accent));
        }

        let notch = Vec2::angled(angle);
        painter.line_segment(
            [
                center + notch * (radius - 12.0 * scale),
                center + notch * (radius - 4.0 * scale),
            ],
            Stroke::new(2.5 * scale, accent),
        );

        draw_label(painter, &self.state, center, &format!("{:.2}", self.value));
    }
}
