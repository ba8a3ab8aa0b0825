//=========================================================================
// Node System
//=========================================================================
//
// Runtime node hierarchy that content units are made of.
//
// Architecture:
//   NodeWorld
//     ├─ slots: Vec<Slot>            (generational arena of Node)
//     └─ units: HashMap<UnitId, ..>  (root nodes per mounted unit)
//
//   Node
//     ├─ components: Vec<Component>  (kind tag + enabled flag)
//     ├─ lifecycle: SceneLifecycle   (optional, scene root object)
//     └─ events: SceneEventHandler   (optional, load/unload hooks)
//
// Capabilities are declared explicitly on each node rather than
// discovered by inspecting behaviour types at runtime.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::scene::{SceneEventHandler, SceneKey, SceneLifecycle};

//=== Module Declarations =================================================

mod blueprint;
mod node_world;

//=== Public API ==========================================================

pub use blueprint::{NodeBlueprint, UnitContent};
pub use node_world::NodeWorld;

//=== Identifiers =========================================================

/// Generational handle to a node in a [`NodeWorld`].
///
/// A handle stays invalid once its node is destroyed, even if the slot is
/// reused later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Identifies one mounted content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

//=== Components ==========================================================

/// Type tag for a behaviour component.
///
/// Typically declared as constants by the application:
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// const AUDIO_LISTENER: ComponentKind = ComponentKind::new("audio-listener");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(&'static str);

impl ComponentKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A behaviour component attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    pub enabled: bool,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self { kind, enabled: true }
    }
}

/// Addresses one component slot on one node.
///
/// Components are never removed from a living node, so the slot index is
/// stable for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    pub node: NodeId,
    pub slot: usize,
}

//=== Node ================================================================

/// A runtime node: the unit of activation and hierarchy.
pub struct Node<K: SceneKey> {
    pub(crate) name: String,
    pub(crate) active_self: bool,
    pub(crate) activation_exempt: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) unit: Option<UnitId>,
    pub(crate) components: Vec<Component>,
    pub(crate) lifecycle: Option<Box<dyn SceneLifecycle<K>>>,
    pub(crate) events: Option<Box<dyn SceneEventHandler<K>>>,
}

impl<K: SceneKey> Node<K> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active_self: true,
            activation_exempt: false,
            parent: None,
            children: Vec::new(),
            unit: None,
            components: Vec::new(),
            lifecycle: None,
            events: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local active flag, ignoring ancestors.
    pub fn is_active_self(&self) -> bool {
        self.active_self
    }

    /// Whether scene enable/disable should leave this node alone.
    pub fn is_activation_exempt(&self) -> bool {
        self.activation_exempt
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Owning content unit, or `None` for persistent nodes.
    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn has_lifecycle(&self) -> bool {
        self.lifecycle.is_some()
    }

    pub fn has_event_handler(&self) -> bool {
        self.events.is_some()
    }
}

impl<K: SceneKey> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("active_self", &self.active_self)
            .field("activation_exempt", &self.activation_exempt)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("unit", &self.unit)
            .field("components", &self.components)
            .field("lifecycle", &self.lifecycle.is_some())
            .field("events", &self.events.is_some())
            .finish()
    }
}
