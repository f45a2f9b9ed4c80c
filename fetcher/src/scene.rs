use log::error;
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::Rc,
};

/// The local scene of one participant.
pub type Scene = Rc<RefCell<SceneGraph>>;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct NodeId(u64);

/// 24 bit RGB color.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Color(pub u32);

impl Color {
    pub const GREEN: Color = Color(0x22ff22);
    pub const BLUE: Color = Color(0x2222ff);
    pub const RED: Color = Color(0xff2222);
    pub const GREY: Color = Color(0x4d4d4d);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BoxGeometry {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxGeometry {
    pub fn cube(side: f32) -> Self {
        Self {
            width: side,
            height: side,
            depth: side,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Primitive {
    Group { translation: [f32; 3] },
    Mesh { geometry: BoxGeometry, color: Color },
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    primitive: Primitive,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    pointer_listeners: BTreeSet<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Scene {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn add(&mut self, parent: Option<NodeId>, primitive: Primitive) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, Node { parent, primitive });
        id
    }

    /// Removes `id` and everything below it. Returns false if the node was
    /// already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.nodes.remove(&id).is_none() {
            return false;
        }
        self.pointer_listeners.remove(&id);
        for child in self.children(id) {
            self.remove(child);
        }
        true
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Primitive> {
        self.nodes.get(&id).map(|node| &node.primitive)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registers a pointer pressed listener on an existing node.
    pub fn listen_pointer(&mut self, id: NodeId) -> bool {
        self.contains(id) && self.pointer_listeners.insert(id)
    }

    pub fn unlisten_pointer(&mut self, id: NodeId) -> bool {
        self.pointer_listeners.remove(&id)
    }

    pub fn listens_pointer(&self, id: NodeId) -> bool {
        self.pointer_listeners.contains(&id)
    }
}

/// A node owned by whoever holds this guard. Dropping the guard removes the
/// node and its subtree from the scene.
#[derive(Debug)]
pub struct SceneNode {
    scene: Scene,
    id: NodeId,
}

impl SceneNode {
    pub fn attach(scene: &Scene, parent: Option<NodeId>, primitive: Primitive) -> Self {
        let id = scene.borrow_mut().add(parent, primitive);
        Self {
            scene: Rc::clone(scene),
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Drop for SceneNode {
    fn drop(&mut self) {
        match self.scene.try_borrow_mut() {
            Ok(mut scene) => {
                scene.remove(self.id);
            }
            Err(_) => error!("[SCENE] node {:?} leaked: scene is busy", self.id),
        }
    }
}
