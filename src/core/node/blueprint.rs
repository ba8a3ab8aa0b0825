//=========================================================================
// Node Blueprints
//=========================================================================
//
// Loader-side description of a content unit.
//
// A ContentLoader resolves a scene identifier into UnitContent; the
// orchestrator mounts it into the NodeWorld, which turns every blueprint
// into a live Node.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{Component, ComponentKind};
use crate::core::scene::{SceneEventHandler, SceneKey, SceneLifecycle};

//=== NodeBlueprint =======================================================

/// Describes one node and its subtree.
///
/// # Example
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum GameScene { Title }
/// # impl SceneKey for GameScene {}
/// const CAMERA: ComponentKind = ComponentKind::new("camera");
///
/// let root = NodeBlueprint::<GameScene>::new("Root")
///     .with_child(NodeBlueprint::new("Camera").with_component(CAMERA))
///     .with_child(NodeBlueprint::new("Debug Overlay").inactive());
/// ```
pub struct NodeBlueprint<K: SceneKey> {
    pub(crate) name: String,
    pub(crate) active: bool,
    pub(crate) activation_exempt: bool,
    pub(crate) components: Vec<Component>,
    pub(crate) lifecycle: Option<Box<dyn SceneLifecycle<K>>>,
    pub(crate) events: Option<Box<dyn SceneEventHandler<K>>>,
    pub(crate) children: Vec<NodeBlueprint<K>>,
}

impl<K: SceneKey> NodeBlueprint<K> {
    /// Creates an active node with no components.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            activation_exempt: false,
            components: Vec::new(),
            lifecycle: None,
            events: None,
            children: Vec::new(),
        }
    }

    /// Marks the node as inactive when mounted.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Opts the node out of scene enable/disable.
    pub fn activation_exempt(mut self) -> Self {
        self.activation_exempt = true;
        self
    }

    /// Attaches an enabled component.
    pub fn with_component(mut self, kind: ComponentKind) -> Self {
        self.components.push(Component::new(kind));
        self
    }

    /// Attaches a disabled component.
    pub fn with_disabled_component(mut self, kind: ComponentKind) -> Self {
        self.components.push(Component {
            kind,
            enabled: false,
        });
        self
    }

    /// Attaches the scene root lifecycle object.
    pub fn with_lifecycle(mut self, lifecycle: impl SceneLifecycle<K> + 'static) -> Self {
        self.lifecycle = Some(Box::new(lifecycle));
        self
    }

    /// Attaches a load/unload event handler.
    pub fn with_event_handler(mut self, handler: impl SceneEventHandler<K> + 'static) -> Self {
        self.events = Some(Box::new(handler));
        self
    }

    pub fn with_child(mut self, child: NodeBlueprint<K>) -> Self {
        self.children.push(child);
        self
    }
}

//=== UnitContent =========================================================

/// Top-level node set of a content unit, as produced by a loader.
pub struct UnitContent<K: SceneKey> {
    pub(crate) roots: Vec<NodeBlueprint<K>>,
}

impl<K: SceneKey> UnitContent<K> {
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    pub fn with_root(mut self, root: NodeBlueprint<K>) -> Self {
        self.roots.push(root);
        self
    }

    /// Number of top-level nodes.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }
}

impl<K: SceneKey> Default for UnitContent<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SceneKey> FromIterator<NodeBlueprint<K>> for UnitContent<K> {
    fn from_iter<I: IntoIterator<Item = NodeBlueprint<K>>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().collect(),
        }
    }
}
