//! Canvas Widgets Library
//!
//! Registry and dispatch layer for a canvas widget toolkit: creates widgets on
//! rendering surfaces, names them, keeps their shared colors and settings in
//! sync, forwards value changes to a transmission destination, and drives
//! animation callbacks at a fixed period.

pub mod app;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod surface;
pub mod transmit;
pub mod widgets;

pub use error::{ManagerError, ManagerResult};
pub use registry::{Interaction, Widget, WidgetCatalog, WidgetManager};
pub use surface::{HeadlessSurfaces, Placement, SurfaceProvider};
pub use transmit::{Destination, Transmission};
