//! Widgets module
//!
//! Built-in widget types: dial, button, and slider.
//! Each paints itself with egui using the colors copied into its state.

pub mod button;
pub mod dial;
pub mod slider;

pub use button::Button;
pub use dial::Dial;
pub use slider::Slider;

use eframe::egui::{self, Color32, Painter, Pos2};
use serde_json::Value;

use crate::app::theme;
use crate::registry::{WidgetCatalog, WidgetState};

/// Registers the built-in types. Names already taken are left alone.
pub fn register_builtins(catalog: &mut WidgetCatalog) {
    let builtins: [(&str, crate::registry::WidgetFactory); 3] = [
        ("dial", Dial::boxed),
        ("button", Button::boxed),
        ("slider", Slider::boxed),
    ];
    for (name, factory) in builtins {
        if let Err(err) = catalog.register(name, factory) {
            tracing::debug!(error = %err, "built-in widget not registered");
        }
    }
}

/// The widget's color for `aspect`, or `fallback` when unset or unparsable.
pub(crate) fn aspect_color(state: &WidgetState, aspect: &str, fallback: Color32) -> Color32 {
    state
        .color(aspect)
        .and_then(theme::parse_color)
        .unwrap_or(fallback)
}

/// Draws `text` centred at `pos` in the widget's font, if labels are on.
pub(crate) fn draw_label(painter: &Painter, state: &WidgetState, pos: Pos2, text: &str) {
    if !state.settings.show_labels {
        return;
    }
    let color = aspect_color(state, "black", theme::text::PRIMARY);
    painter.text(
        pos,
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(state.settings.font.size),
        color,
    );
}

/// Reads a number, accepting a bare number or `{"value": n}`.
pub(crate) fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("value").and_then(Value::as_f64),
        _ => None,
    }
}

/// Rounds to six decimals so transmitted values stay readable.
pub(crate) fn tidy(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
