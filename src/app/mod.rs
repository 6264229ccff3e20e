//! Application module
//!
//! Contains the egui host window and the theme it draws with.

pub mod host;
pub mod theme;

pub use host::WidgetHost;
