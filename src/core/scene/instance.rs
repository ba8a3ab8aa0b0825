//=========================================================================
// Scene Instance
//=========================================================================
//
// Handle to one loaded content unit.
//
// The set of active roots is captured when the instance is created, so
// disable/enable restores exactly the nodes that were active at load
// time and never force-activates nodes that started inactive.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::SceneKey;
use crate::core::node::{NodeId, NodeWorld, UnitId};

//=== LoadMode ============================================================

/// How a content unit is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Replaces the foreground unit and every additive unit.
    Single,

    /// Layers the unit next to the foreground unit.
    Additive,
}

//=== SceneInstance =======================================================

/// A loaded content unit together with its scene root and active roots.
///
/// Instances are cheap to clone; clones refer to the same unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInstance<K: SceneKey> {
    identifier: Option<K>,
    unit: UnitId,
    mode: LoadMode,
    root: Option<NodeId>,
    active_roots: Vec<NodeId>,
}

impl<K: SceneKey> SceneInstance<K> {
    /// Captures the unit's current state.
    pub(crate) fn capture(
        world: &NodeWorld<K>,
        identifier: Option<K>,
        unit: UnitId,
        mode: LoadMode,
    ) -> Self {
        let active_roots = world
            .unit_roots(unit)
            .iter()
            .copied()
            .filter(|&id| world.node(id).is_some_and(|node| node.is_active_self()))
            .collect();

        Self {
            identifier,
            unit,
            mode,
            root: world.find_lifecycle_root(unit),
            active_roots,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn identifier(&self) -> Option<K> {
        self.identifier
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Node carrying the scene's lifecycle object, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Top-level nodes that were active when the unit finished loading.
    pub fn active_roots(&self) -> &[NodeId] {
        &self.active_roots
    }

    pub fn is_valid(&self, world: &NodeWorld<K>) -> bool {
        world.is_unit_valid(self.unit)
    }

    //--- Activation -------------------------------------------------------

    /// Activates the captured active roots.
    pub fn enable(&self, world: &mut NodeWorld<K>) {
        self.set_roots_active(world, true);
    }

    /// Deactivates the captured active roots.
    pub fn disable(&self, world: &mut NodeWorld<K>) {
        self.set_roots_active(world, false);
    }

    fn set_roots_active(&self, world: &mut NodeWorld<K>, active: bool) {
        if !self.is_valid(world) {
            return;
        }

        for &id in &self.active_roots {
            let exempt = match world.node(id) {
                Some(node) => node.is_activation_exempt(),
                None => continue,
            };
            if !exempt {
                world.set_active(id, active);
            }
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
