//! Catalog of constructible widget types.
//!
//! The catalog maps a type name to a factory function, enabling the manager to
//! instantiate widgets by the string stored on their surface.

use std::collections::HashMap;

use super::widget::{Widget, WidgetState};
use crate::error::{ManagerError, ManagerResult};

/// Factory function type for creating widget instances.
///
/// Receives the fully prepared state (identifier plus copies of the globals).
pub type WidgetFactory = fn(WidgetState) -> Box<dyn Widget>;

/// Central catalog of available widget types.
///
/// # Example
///
/// ```ignore
/// let mut catalog = WidgetCatalog::new();
/// catalog.register("gauge", Gauge::boxed)?;
///
/// let widget = catalog.create("gauge", state);
/// ```
pub struct WidgetCatalog {
    factories: HashMap<String, WidgetFactory>,
    /// Type names in registration order, for listing.
    names: Vec<String>,
}

impl WidgetCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Creates a catalog holding the built-in dial, button, and slider.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::widgets::register_builtins(&mut catalog);
        catalog
    }

    /// Registers a factory under `name`.
    ///
    /// Fails with `DuplicateWidgetType` when the name is already taken; the
    /// existing factory stays in place.
    pub fn register(&mut self, name: impl Into<String>, factory: WidgetFactory) -> ManagerResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ManagerError::DuplicateWidgetType(name));
        }
        self.factories.insert(name.clone(), factory);
        self.names.push(name);
        Ok(())
    }

    /// Creates a new widget of type `name`.
    ///
    /// Returns `None` if no factory is registered under that name.
    pub fn create(&self, name: &str, state: WidgetState) -> Option<Box<dyn Widget>> {
        self.factories.get(name).map(|factory| factory(state))
    }

    /// Registered type names, in registration order.
    pub fn list_types(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for WidgetCatalog {
    fn default() -> Self {
        Self::new()
    }
}
