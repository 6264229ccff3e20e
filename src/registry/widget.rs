//! The Widget trait and supporting types.
//!
//! This module defines the interface every widget implementation provides,
//! whether built in or registered by the application.

use std::collections::hash_map::{self, HashMap};
use std::collections::BTreeMap;

use egui::{Painter, Rect};
use serde_json::Value;

use super::settings::{ColorScheme, WidgetSettings};

/// Per-widget copy of the shared configuration, plus identity.
///
/// Created by the manager from the current globals; afterwards the widget owns
/// it and only explicit broadcasts overwrite it.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetState {
    /// Registry identifier, equal to the surface identifier.
    pub id: String,
    /// Catalog type name this widget was built from.
    pub widget_type: String,
    pub colors: ColorScheme,
    pub settings: WidgetSettings,
    /// Properties set by name that have no typed field.
    pub properties: BTreeMap<String, Value>,
    /// Number of completed draws.
    pub draw_count: u64,
}

impl WidgetState {
    pub fn new(
        id: impl Into<String>,
        widget_type: impl Into<String>,
        colors: &ColorScheme,
        settings: &WidgetSettings,
    ) -> Self {
        Self {
            id: id.into(),
            widget_type: widget_type.into(),
            colors: colors.clone(),
            settings: settings.clone(),
            properties: BTreeMap::new(),
            draw_count: 0,
        }
    }

    /// Sets a property by name; typed settings first, property bag otherwise.
    pub fn set_property(&mut self, name: &str, value: &Value) {
        if !self.settings.apply_property(name, value) {
            self.properties.insert(name.to_string(), value.clone());
        }
    }

    pub fn color(&self, aspect: &str) -> Option<&str> {
        self.colors.get(aspect)
    }

    pub fn mark_drawn(&mut self) {
        self.draw_count += 1;
    }
}

/// A user interaction, already recognised by the host toolkit.
///
/// Coordinates are normalised to the surface: (0, 0) top-left, (1, 1) bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
    Press { x: f32, y: f32 },
    Release,
    /// Relative movement while pressed.
    Drag { dx: f32, dy: f32 },
    /// Absolute pointer position while pressed.
    Move { x: f32, y: f32 },
}

/// An interactive control bound to one surface and one identifier.
pub trait Widget {
    fn state(&self) -> &WidgetState;

    fn state_mut(&mut self) -> &mut WidgetState;

    /// Called once, right after registration.
    fn init(&mut self);

    /// Refreshes the widget after its state changed.
    fn draw(&mut self);

    /// Applies an interaction; returns the new value when it changed.
    fn handle_interaction(&mut self, interaction: Interaction) -> Option<Value>;

    /// The widget's current value in transmission form.
    fn value(&self) -> Value;

    /// Sets the value programmatically. Returns the value as the widget stored it.
    fn set_value(&mut self, value: &Value) -> Value;

    /// Paints the widget into `rect`. Widgets without a visual form skip this.
    fn paint(&self, _painter: &Painter, _rect: Rect) {}

    fn id(&self) -> &str {
        &self.state().id
    }

    fn widget_type(&self) -> &str {
        &self.state().widget_type
    }
}

/// The registry's widget storage: identifier → widget.
#[derive(Default)]
pub struct WidgetSet {
    widgets: HashMap<String, Box<dyn Widget>>,
}

impl WidgetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&(dyn Widget + 'static)> {
        self.widgets.get(id).map(|w| w.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Widget + 'static)> {
        self.widgets.get_mut(id).map(|w| w.as_mut())
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.widgets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Widget + 'static)> {
        self.widgets.values().map(|w| w.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Widget + 'static)> {
        self.widgets.values_mut().map(|w| w.as_mut())
    }

    /// Inserts a widget under its own identifier.
    ///
    /// Returns the widget back when the identifier is taken.
    pub(crate) fn insert(
        &mut self,
        widget: Box<dyn Widget>,
    ) -> Result<&mut (dyn Widget + 'static), Box<dyn Widget>> {
        match self.widgets.entry(widget.id().to_string()) {
            hash_map::Entry::Occupied(_) => Err(widget),
            hash_map::Entry::Vacant(slot) => Ok(slot.insert(widget).as_mut()),
        }
    }
}
