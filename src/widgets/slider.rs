//! Linear slider.
//!
//! Vertical by default: the value follows the pointer, 0 at the bottom and 1
//! at the top. Setting the `orientation` property to `"horizontal"` makes it
//! follow the pointer from left to right instead.

use eframe::egui::{Painter, Pos2, Rect, Rounding, Stroke, Vec2};
use serde_json::{json, Value};

use super::{aspect_color, draw_label, number_from, tidy};
use crate::app::theme;
use crate::registry::{Interaction, Widget, WidgetState};

const THUMB_SIZE: f32 = 12.0;
const TRACK_WIDTH: f32 = 6.0;

pub struct Slider {
    state: WidgetState,
    value: f64,
}

impl Slider {
    pub fn new(state: WidgetState) -> Self {
        Self { state, value: 0.0 }
    }

    pub fn boxed(state: WidgetState) -> Box<dyn Widget> {
        Box::new(Self::new(state))
    }

    pub fn is_horizontal(&self) -> bool {
        self.state.properties.get("orientation").and_then(Value::as_str) == Some("horizontal")
    }

    fn follow(&mut self, x: f32, y: f32) -> Option<Value> {
        let position = if self.is_horizontal() {
            x as f64
        } else {
            1.0 - y as f64
        };
        let value = tidy(position.clamp(0.0, 1.0));
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(self.value())
    }
}

impl Widget for Slider {
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
            Interaction::Press { x, y } | Interaction::Move { x, y } => self.follow(x, y),
            _ => None,
        }
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn set_value(&mut self, value: &Value) -> Value {
        if let Some(v) = number_from(value) {
            self.value = tidy(v.clamp(0.0, 1.0));
        }
        self.value()
    }

    fn paint(&self, painter: &Painter, rect: Rect) {
        let fill = aspect_color(&self.state, "fill", theme::background::WIDGET);
        let border = aspect_color(&self.state, "border", theme::background::BORDER);
        let accent = aspect_color(&self.state, "accent", theme::accent::PRIMARY);
        let value = self.value as f32;

        let horizontal = self.is_horizontal();
        let (track, filled, thumb_center) = if horizontal {
            let track = Rect::from_center_size(rect.center(), Vec2::new(rect.width(), TRACK_WIDTH));
            let x = track.left() + value * track.width();
            let filled = Rect::from_min_max(track.min, Pos2::new(x, track.bottom()));
            (track, filled, Pos2::new(x, track.center().y))
        } else {
            let track = Rect::from_center_size(rect.center(), Vec2::new(TRACK_WIDTH, rect.height()));
            let y = track.bottom() - value * track.height();
            let filled = Rect::from_min_max(Pos2::new(track.left(), y), track.max);
            (track, filled, Pos2::new(track.center().x, y))
        };

        painter.rect_filled(track, Rounding::same(TRACK_WIDTH / 2.0), fill);
        painter.rect_stroke(track, Rounding::same(TRACK_WIDTH / 2.0), Stroke::new(1.0, border));
        painter.rect_filled(filled, Rounding::same(TRACK_WIDTH / 2.0), accent);
        painter.circle_filled(thumb_center, THUMB_SIZE / 2.0, accent);
        painter.circle_stroke(thumb_center, THUMB_SIZE / 2.0, Stroke::new(1.0, border));

        let label_pos = if horizontal {
            Pos2::new(rect.center().x, rect.top() + THUMB_SIZE / 2.0)
        } else {
            Pos2::new(rect.center().x, rect.bottom() - THUMB_SIZE / 2.0)
        };
        draw_label(painter, &self.state, label_pos, &format!("{:.2}", self.value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ColorScheme, WidgetSettings};

    fn slider() -> Slider {
        Slider::new(WidgetState::new(
            "slider1",
            "slider",
            &ColorScheme::default(),
            &WidgetSettings::default(),
        ))
    }

    #[test]
    fn test_vertical_follows_pointer_from_bottom() {
        let mut slider = slider();
        assert_eq!(
            slider.handle_interaction(Interaction::Press { x: 0.9, y: 0.75 }),
            Some(json!(0.25))
        );
        assert_eq!(
            slider.handle_interaction(Interaction::Move { x: 0.1, y: 0.0 }),
            Some(json!(1.0))
        );
        // same position again is not a change
        assert_eq!(slider.handle_interaction(Interaction::Move { x: 0.5, y: -0.5 }), None);
    }

    #[test]
    fn test_horizontal_orientation() {
        let mut slider = slider();
        slider
            .state_mut()
            .set_property("orientation", &json!("horizontal"));
        assert!(slider.is_horizontal());
        assert_eq!(
            slider.handle_interaction(Interaction::Move { x: 0.5, y: 0.9 }),
            Some(json!(0.5))
        );
    }

    #[test]
    fn test_release_and_drag_ignored() {
        let mut slider = slider();
        assert_eq!(slider.handle_interaction(Interaction::Release), None);
        assert_eq!(slider.handle_interaction(Interaction::Drag { dx: 0.0, dy: -0.5 }), None);
    }

    #[test]
    fn test_set_value_clamps() {
        let mut slider = slider();
        assert_eq!(slider.set_value(&json!(-2)), json!(0.0));
        assert_eq!(slider.set_value(&json!({"value": 0.5})), json!(0.5));
    }
}
