//! Widget host window
//!
//! Contains the WidgetHost which implements eframe::App: it lays widgets out
//! at their surface geometry, turns pointer input into interactions, drives
//! the animation clock, and offers controls for the global broadcasts.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use eframe::egui::{self, Align, Layout, Pos2, Rect, RichText, Sense, Vec2};

use super::theme;
use crate::persistence::{save_to_file, Layout as SavedLayout};
use crate::registry::{Interaction, WidgetManager};
use crate::surface::SurfaceProvider;

/// Number of wildcard events kept for the event log.
const EVENT_LOG_LEN: usize = 12;
/// Gap between widgets that have no explicit position.
const FLOW_GAP: f32 = 16.0;

/// Pixel size used when a surface has none recorded.
fn default_size(widget_type: &str) -> Vec2 {
    match widget_type {
        "slider" => Vec2::new(30.0, 120.0),
        _ => Vec2::new(75.0, 75.0),
    }
}

/// Main application window hosting a widget manager.
pub struct WidgetHost {
    manager: WidgetManager,
    /// Identifier of the widget currently under a held pointer.
    pressed: Option<String>,
    events: Rc<RefCell<VecDeque<String>>>,
    layout_path: Option<PathBuf>,
    status: Option<String>,
    theme_applied: bool,
}

impl WidgetHost {
    pub fn new(mut manager: WidgetManager, layout_path: Option<PathBuf>) -> Self {
        let events = Rc::new(RefCell::new(VecDeque::with_capacity(EVENT_LOG_LEN)));
        let log = Rc::clone(&events);
        manager.on_any(move |widget, value| {
            let mut log = log.borrow_mut();
            if log.len() == EVENT_LOG_LEN {
                log.pop_front();
            }
            log.push_back(format!("{widget}: {value}"));
        });
        manager.start_animation(Instant::now());

        Self {
            manager,
            pressed: None,
            events,
            layout_path,
            status: None,
            theme_applied: false,
        }
    }

    pub fn manager(&self) -> &WidgetManager {
        &self.manager
    }

    /// Screen rectangles for every widget, sorted by identifier.
    fn layout_widgets(&self, canvas: Rect) -> Vec<(String, Rect)> {
        let mut ids: Vec<&str> = self.manager.widgets().ids().collect();
        ids.sort_unstable();

        let mut cursor = canvas.min + Vec2::splat(FLOW_GAP);
        let mut row_height: f32 = 0.0;
        let mut placed = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(widget) = self.manager.get(id) else {
                continue;
            };
            let geometry = self
                .manager
                .surface_of(id)
                .and_then(|s| self.manager.surfaces().geometry(s))
                .unwrap_or_default();

            let fallback = default_size(widget.widget_type());
            let size = Vec2::new(
                geometry.width.unwrap_or(fallback.x),
                geometry.height.unwrap_or(fallback.y),
            );

            let min = if geometry.absolute {
                canvas.min + Vec2::new(geometry.left.unwrap_or(0.0), geometry.top.unwrap_or(0.0))
            } else {
                if cursor.x + size.x > canvas.right() && cursor.x > canvas.left() + FLOW_GAP {
                    cursor = Pos2::new(canvas.left() + FLOW_GAP, cursor.y + row_height + FLOW_GAP);
                    row_height = 0.0;
                }
                let min = cursor;
                cursor.x += size.x + FLOW_GAP;
                row_height = row_height.max(size.y);
                min
            };
            placed.push((id.to_string(), Rect::from_min_size(min, size)));
        }
        placed
    }

    /// Interactions produced by the pointer on one widget this frame.
    fn pointer_interactions(
        &mut self,
        id: &str,
        rect: Rect,
        response: &egui::Response,
    ) -> Vec<Interaction> {
        let normalize = |pos: Pos2| {
            (
                (pos.x - rect.left()) / rect.width().max(1.0),
                (pos.y - rect.top()) / rect.height().max(1.0),
            )
        };

        let mut interactions = Vec::new();
        if response.is_pointer_button_down_on() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = normalize(pos);
                if self.pressed.as_deref() != Some(id) {
                    self.pressed = Some(id.to_string());
                    interactions.push(Interaction::Press { x, y });
                } else {
                    let delta = response.drag_delta();
                    if delta != Vec2::ZERO {
                        interactions.push(Interaction::Drag {
                            dx: delta.x / rect.width().max(1.0),
                            dy: delta.y / rect.height().max(1.0),
                        });
                        interactions.push(Interaction::Move { x, y });
                    }
                }
            }
        } else if self.pressed.as_deref() == Some(id) {
            self.pressed = None;
            interactions.push(Interaction::Release);
        }
        interactions
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let canvas = ui.available_rect_before_wrap();
        theme::draw_grid_background(ui.painter(), canvas);

        let placed = self.layout_widgets(canvas);
        for (id, rect) in &placed {
            if let Some(widget) = self.manager.get(id) {
                widget.paint(&ui.painter_at(*rect), *rect);
            }
        }

        for (id, rect) in placed {
            let response = ui.interact(rect, egui::Id::new(("widget", &id)), Sense::click_and_drag());
            for interaction in self.pointer_interactions(&id, rect, &response) {
                if let Err(err) = self.manager.interact(&id, interaction) {
                    tracing::error!(id = %id, error = %err, "interaction failed");
                }
            }
        }

        ui.allocate_rect(canvas, Sense::hover());
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Widgets");
        ui.add_space(4.0);

        let accent = self
            .manager
            .colors()
            .get("accent")
            .and_then(theme::parse_color)
            .unwrap_or(theme::accent::PRIMARY);
        let mut picked = accent;
        ui.horizontal(|ui| {
            ui.label("Accent");
            ui.color_edit_button_srgba(&mut picked);
        });
        if picked != accent {
            self.manager.recolor_accent(&theme::format_color(picked));
        }

        let mut labels = self.manager.settings().widget.show_labels;
        if ui.checkbox(&mut labels, "Show labels").changed() {
            self.manager.set_labels(if labels { "on" } else { "off" });
        }

        let mut throttle = self.manager.settings().widget.throttle_period_ms;
        ui.horizontal(|ui| {
            ui.label("Throttle (ms)");
            ui.add(egui::DragValue::new(&mut throttle).range(0..=1000));
        });
        if throttle != self.manager.settings().widget.throttle_period_ms {
            self.manager.set_throttle_period(throttle);
        }

        if let Some(path) = self.layout_path.clone() {
            ui.add_space(8.0);
            if ui.button("Save layout").clicked() {
                let layout = SavedLayout::capture(&self.manager);
                self.status = Some(match save_to_file(&layout, &path) {
                    Ok(()) => format!("Saved {}", path.display()),
                    Err(err) => {
                        tracing::error!(path = %path.display(), error = %err, "layout save failed");
                        format!("Save failed: {err}")
                    }
                });
            }
        }

        ui.separator();
        ui.label(RichText::new("Events").strong());
        for line in self.events.borrow().iter().rev() {
            ui.label(RichText::new(line).monospace().small());
        }
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            let text = self.status.clone().unwrap_or_else(|| {
                format!(
                    "{} widgets, sending to {}",
                    self.manager.len(),
                    self.manager.transmit_hub().destination().name()
                )
            });
            ui.label(RichText::new(text).color(theme::text::SECONDARY).small());

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("{} animations", self.manager.animation_count()))
                        .color(theme::text::SECONDARY)
                        .small(),
                );
            });
        });
    }
}

impl eframe::App for WidgetHost {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        let now = Instant::now();
        if let Some(report) = self.manager.update(now) {
            if !report.failed.is_empty() {
                tracing::debug!(failed = report.failed.len(), "animation tick had failures");
            }
        }

        egui::SidePanel::right("controls")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(theme::background::PANEL)
                    .inner_margin(egui::Margin::symmetric(0.0, 4.0)),
            )
            .show(ctx, |ui| self.draw_status_bar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.draw_canvas(ui));

        if let Some(wait) = self.manager.time_until_tick(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
