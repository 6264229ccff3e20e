//! Persistence module
//!
//! Layout save/load functionality using serde and JSON.

pub mod layout;

pub use layout::{load_from_file, save_to_file, Layout, LayoutWidget, TransmitConfig, LAYOUT_VERSION};
