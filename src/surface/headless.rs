//! In-memory surface tree.

use super::{NodeHandle, ParentRef, SurfaceGeometry, SurfaceProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Container,
    Surface,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    id: Option<String>,
    widget_type: Option<String>,
    geometry: SurfaceGeometry,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl Node {
    fn container(id: Option<String>) -> Self {
        Self {
            kind: NodeKind::Container,
            id,
            widget_type: None,
            geometry: SurfaceGeometry::default(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A surface provider that keeps containers and surfaces in a flat arena.
///
/// Node 0 is the root container (`"body"`).
#[derive(Clone, Debug)]
pub struct HeadlessSurfaces {
    nodes: Vec<Node>,
}

impl HeadlessSurfaces {
    pub const ROOT_ID: &'static str = "body";

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::container(Some(Self::ROOT_ID.to_string()))],
        }
    }

    /// Adds a named container under `parent` (the root when `None`).
    pub fn create_container(&mut self, id: &str, parent: Option<NodeHandle>) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node::container(Some(id.to_string())));
        let parent = parent.filter(|p| self.is_container(*p)).unwrap_or(self.root());
        self.attach(handle, parent);
        handle
    }

    /// Children of a node in attachment order.
    pub fn children_of(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_container(&self, node: NodeHandle) -> bool {
        self.nodes
            .get(node.0)
            .is_some_and(|n| n.kind == NodeKind::Container)
    }

    fn attach(&mut self, node: NodeHandle, parent: NodeHandle) {
        if let Some(old) = self.nodes[node.0].parent.take() {
            self.nodes[old.0].children.retain(|&c| c != node);
        }
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.push(node);
    }
}

impl Default for HeadlessSurfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceProvider for HeadlessSurfaces {
    fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    fn create_surface(&mut self, widget_type: &str) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Surface,
            id: None,
            widget_type: Some(widget_type.to_string()),
            geometry: SurfaceGeometry::default(),
            parent: None,
            children: Vec::new(),
        });
        handle
    }

    fn set_position(&mut self, surface: NodeHandle, x: Option<f32>, y: Option<f32>) {
        if let Some(node) = self.nodes.get_mut(surface.0) {
            node.geometry.absolute = true;
            node.geometry.left = x;
            node.geometry.top = y;
        }
    }

    fn set_size(&mut self, surface: NodeHandle, w: Option<f32>, h: Option<f32>) {
        if let Some(node) = self.nodes.get_mut(surface.0) {
            if w.is_some() {
                node.geometry.width = w;
            }
            if h.is_some() {
                node.geometry.height = h;
            }
        }
    }

    fn resolve_parent(&self, parent: &ParentRef) -> Option<NodeHandle> {
        let exists = |h: NodeHandle| h.0 < self.nodes.len();
        match parent {
            ParentRef::Id(id) => self
                .nodes
                .iter()
                .position(|n| n.id.as_deref() == Some(id.as_str()))
                .map(NodeHandle),
            ParentRef::Node(handle) => Some(*handle).filter(|h| exists(*h)),
            ParentRef::Collection(handles) => handles.first().copied().filter(|h| exists(*h)),
        }
    }

    fn set_parent(&mut self, surface: NodeHandle, parent: NodeHandle) {
        if surface.0 < self.nodes.len() && parent.0 < self.nodes.len() && surface != parent {
            self.attach(surface, parent);
        }
    }

    fn parent_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn set_id(&mut self, surface: NodeHandle, id: &str) {
        if let Some(node) = self.nodes.get_mut(surface.0) {
            node.id = Some(id.to_string());
        }
    }

    fn id(&self, surface: NodeHandle) -> Option<&str> {
        self.nodes.get(surface.0).and_then(|n| n.id.as_deref())
    }

    fn widget_type(&self, surface: NodeHandle) -> Option<&str> {
        self.nodes
            .get(surface.0)
            .and_then(|n| n.widget_type.as_deref())
    }

    fn geometry(&self, surface: NodeHandle) -> Option<SurfaceGeometry> {
        self.nodes.get(surface.0).map(|n| n.geometry)
    }

    fn surfaces(&self) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Surface)
            .map(|(i, _)| NodeHandle(i))
            .collect()
    }
}
