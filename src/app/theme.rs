//! Theme definitions for the widget canvas
//!
//! Fallback colors used when a widget's own scheme has no usable entry, CSS
//! hex color parsing, and the egui style applied to the host window.

use eframe::egui::{self, Color32, Rounding, Stroke, Vec2};

/// Background colors
pub mod background {
    use super::Color32;

    /// Canvas background
    pub const CANVAS: Color32 = Color32::from_rgb(245, 245, 245);

    /// Grid line color - subtle
    pub const GRID: Color32 = Color32::from_rgb(228, 228, 228);

    /// Side panel background
    pub const PANEL: Color32 = Color32::from_rgb(232, 232, 236);

    /// Widget face
    pub const WIDGET: Color32 = Color32::from_rgb(238, 238, 238);

    /// Widget outline
    pub const BORDER: Color32 = Color32::from_rgb(187, 187, 187);
}

/// Text colors
pub mod text {
    use super::Color32;

    /// Primary text
    pub const PRIMARY: Color32 = Color32::from_rgb(20, 20, 20);

    /// Secondary text - dimmed
    pub const SECONDARY: Color32 = Color32::from_rgb(110, 110, 120);
}

/// UI accent colors
pub mod accent {
    use super::Color32;

    /// Primary accent - orange
    pub const PRIMARY: Color32 = Color32::from_rgb(255, 85, 0);
}

/// Grid spacing for the canvas pattern
pub const GRID_SPACING: f32 = 20.0;

/// Standard rounding for panels
pub const ROUNDING: Rounding = Rounding {
    nw: 6.0,
    ne: 6.0,
    sw: 6.0,
    se: 6.0,
};

/// Parses `#rgb`, `#rrggbb`, or `#rrggbbaa`.
pub fn parse_color(value: &str) -> Option<Color32> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);

    match hex.len() {
        3 => Some(Color32::from_rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)?,
        )),
        _ => None,
    }
}

/// Formats as `#rrggbb`, dropping alpha.
pub fn format_color(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Apply the canvas theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let visuals = &mut style.visuals;
    visuals.dark_mode = false;
    visuals.panel_fill = background::PANEL;
    visuals.window_fill = background::PANEL;
    visuals.window_stroke = Stroke::new(1.0, background::BORDER);
    visuals.window_rounding = ROUNDING;

    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text::SECONDARY);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, text::PRIMARY);
    visuals.selection.bg_fill = accent::PRIMARY.gamma_multiply(0.3);
    visuals.selection.stroke = Stroke::new(1.0, accent::PRIMARY);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}

/// Draw the grid background of the canvas
pub fn draw_grid_background(painter: &egui::Painter, rect: egui::Rect) {
    painter.rect_filled(rect, 0.0, background::CANVAS);

    let stroke = Stroke::new(1.0, background::GRID);
    let mut x = rect.left() - (rect.left() % GRID_SPACING);
    while x <= rect.right() {
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
        x += GRID_SPACING;
    }

    let mut y = rect.top() - (rect.top() % GRID_SPACING);
    while y <= rect.bottom() {
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
        y += GRID_SPACING;
    }
}
