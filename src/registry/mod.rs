//! Widget registry
//!
//! The manager, the catalog of constructible types, the shared color and
//! setting state copied into each widget, and the animation loop.

pub mod animation;
pub mod catalog;
pub mod manager;
pub mod settings;
pub mod widget;

pub use animation::{AnimationClock, Animator, CallbackId, TickReport};
pub use catalog::{WidgetCatalog, WidgetFactory};
pub use manager::{AdoptReport, WidgetManager};
pub use settings::{ColorScheme, FontSettings, GlobalSettings, WidgetSettings};
pub use widget::{Interaction, Widget, WidgetSet, WidgetState};
