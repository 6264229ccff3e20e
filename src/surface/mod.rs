//! Surface module
//!
//! Rendering surfaces backing widgets, and the provider interface the manager
//! uses to create, place, and name them. `HeadlessSurfaces` keeps the whole
//! tree in memory; the egui host reads geometry from it every frame.

mod headless;

pub use headless::HeadlessSurfaces;

use serde::{Deserialize, Serialize};

/// Handle to a node (surface or container) owned by a `SurfaceProvider`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub usize);

/// Reference to the container a new surface is attached to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentRef {
    /// Look the container up by its identifier.
    Id(String),
    /// A direct node reference.
    Node(NodeHandle),
    /// A wrapped collection; the first element is used.
    Collection(Vec<NodeHandle>),
}

impl From<&str> for ParentRef {
    fn from(id: &str) -> Self {
        ParentRef::Id(id.to_string())
    }
}

impl From<NodeHandle> for ParentRef {
    fn from(node: NodeHandle) -> Self {
        ParentRef::Node(node)
    }
}

/// Optional placement for a newly created surface.
///
/// Every field is optional; absent fields leave the provider's defaults alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Absolute left offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Absolute top offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f32>,
    /// Height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
    /// Explicit identifier for the surface (and so for the widget).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Container to attach to; the provider root when absent or unresolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl Placement {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, w: f32, h: f32) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<ParentRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Position and size recorded on a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceGeometry {
    /// True once a position was applied.
    pub absolute: bool,
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// The rendering environment the manager creates surfaces in.
///
/// Keeps registry logic independent from any real windowing or document model.
pub trait SurfaceProvider {
    /// The default container surfaces attach to.
    fn root(&self) -> NodeHandle;

    /// Creates a detached surface tagged with `widget_type`.
    fn create_surface(&mut self, widget_type: &str) -> NodeHandle;

    /// Switches the surface to absolute positioning at the given offsets.
    fn set_position(&mut self, surface: NodeHandle, x: Option<f32>, y: Option<f32>);

    /// Applies whichever dimensions are given.
    fn set_size(&mut self, surface: NodeHandle, w: Option<f32>, h: Option<f32>);

    /// Resolves a container reference, `None` if nothing matches.
    fn resolve_parent(&self, parent: &ParentRef) -> Option<NodeHandle>;

    /// Attaches `surface` as the last child of `parent`.
    fn set_parent(&mut self, surface: NodeHandle, parent: NodeHandle);

    /// The container a node is attached to, `None` while detached.
    fn parent_of(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// Sets the surface identifier.
    fn set_id(&mut self, surface: NodeHandle, id: &str);

    /// The surface identifier, if one was assigned.
    fn id(&self, surface: NodeHandle) -> Option<&str>;

    /// The type tag attached at creation.
    fn widget_type(&self, surface: NodeHandle) -> Option<&str>;

    /// Position and size, `None` for unknown handles.
    fn geometry(&self, surface: NodeHandle) -> Option<SurfaceGeometry>;

    /// All surfaces in creation order.
    fn surfaces(&self) -> Vec<NodeHandle>;

    /// Finds a surface by identifier.
    fn find(&self, id: &str) -> Option<NodeHandle> {
        self.surfaces()
            .into_iter()
            .find(|&surface| self.id(surface) == Some(id))
    }
}
