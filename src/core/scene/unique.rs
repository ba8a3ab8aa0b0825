//=========================================================================
// Unique Component Registry
//=========================================================================
//
// Keeps at most one live instance of each declared component kind across
// every loaded unit.
//
// Flow (per mounted unit):
//   scan unit ──> first instance found? ──> capture: move node under
//                                            the persistent container
//   every other live instance anywhere ──> DuplicatedAction
//
// The container node belongs to no unit, so captured instances survive
// unit releases for the lifetime of the orchestrator.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::SceneKey;
use crate::core::node::{ComponentHandle, ComponentKind, NodeId, NodeWorld, UnitId};

//=== Constants ===========================================================

const CONTAINER_NAME: &str = "[Unique Components]";

//=== DuplicatedAction ====================================================

/// What happens to a live duplicate of a captured unique component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicatedAction {
    /// Disable only the duplicate component.
    DisableComponent,

    /// Deactivate the node that owns the duplicate.
    DisableNode,

    /// Destroy the node that owns the duplicate, with its subtree.
    DestroyNode,
}

//=== UniqueDeclaration ===================================================

/// A component kind that may only have one live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueDeclaration {
    pub kind: ComponentKind,
    pub action: DuplicatedAction,

    /// Disable the captured instance while content loads.
    pub require_suspend: bool,
}

//=== UniqueComponentRegistry =============================================

/// Captures and polices unique components.
pub struct UniqueComponentRegistry {
    declarations: Vec<UniqueDeclaration>,
    captured: HashMap<ComponentKind, ComponentHandle>,
    container: NodeId,
    suspend_depth: usize,
}

impl UniqueComponentRegistry {
    //--- Construction -----------------------------------------------------

    /// Creates the registry and its persistent container node.
    pub fn new<K: SceneKey>(
        declarations: Vec<UniqueDeclaration>,
        world: &mut NodeWorld<K>,
    ) -> Self {
        Self {
            declarations,
            captured: HashMap::new(),
            container: world.spawn(CONTAINER_NAME),
            suspend_depth: 0,
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Persistent node that owns every captured instance.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn declarations(&self) -> &[UniqueDeclaration] {
        &self.declarations
    }

    /// The captured instance of `kind`, if one is still alive.
    pub fn captured<K: SceneKey>(
        &self,
        world: &NodeWorld<K>,
        kind: ComponentKind,
    ) -> Option<ComponentHandle> {
        self.captured
            .get(&kind)
            .copied()
            .filter(|&handle| world.component(handle).is_some())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_depth > 0
    }

    //--- Capture ----------------------------------------------------------

    /// Captures unique components from a freshly mounted unit and resolves
    /// duplicates across the whole world.
    ///
    /// Returns the number of duplicates acted upon.
    pub fn capture<K: SceneKey>(&mut self, world: &mut NodeWorld<K>, unit: UnitId) -> usize {
        let unit_nodes = world.unit_nodes(unit);
        let mut resolved = 0;

        for declaration in self.declarations.clone() {
            let kind = declaration.kind;

            let keep = match self.captured(world, kind) {
                Some(handle) => handle,
                None => {
                    self.captured.remove(&kind);
                    let Some(&first) = world.components_in(&unit_nodes, kind).first() else {
                        continue;
                    };
                    self.adopt(world, first);
                    first
                }
            };

            for handle in world.all_components(kind) {
                if handle == keep || !world.is_component_live(handle) {
                    continue;
                }
                Self::resolve_duplicate(world, handle, declaration.action);
                resolved += 1;
            }
        }

        resolved
    }

    fn adopt<K: SceneKey>(&mut self, world: &mut NodeWorld<K>, handle: ComponentHandle) {
        let node = handle.node;
        if !world.is_descendant_of(node, self.container) {
            world.set_parent(node, Some(self.container));
        }

        let name = world.node(node).map(|n| n.name().to_string()).unwrap_or_default();
        let kind = world.component(handle).map(|c| c.kind);
        if let Some(kind) = kind {
            info!("Captured unique component '{}' on node '{}'", kind, name);
            self.captured.insert(kind, handle);
        }
    }

    fn resolve_duplicate<K: SceneKey>(
        world: &mut NodeWorld<K>,
        handle: ComponentHandle,
        action: DuplicatedAction,
    ) {
        debug!("Resolving duplicate unique component on {} with {:?}", handle.node, action);

        match action {
            DuplicatedAction::DisableComponent => {
                world.set_component_enabled(handle, false);
            }
            DuplicatedAction::DisableNode => {
                world.set_active(handle.node, false);
            }
            DuplicatedAction::DestroyNode => {
                world.destroy(handle.node);
            }
        }
    }

    //--- Suspension -------------------------------------------------------

    /// Enables or disables every captured instance flagged
    /// `require_suspend`.
    pub fn set_enabled_for_captured<K: SceneKey>(&self, world: &mut NodeWorld<K>, enabled: bool) {
        for declaration in self.declarations.iter().filter(|d| d.require_suspend) {
            if let Some(handle) = self.captured(world, declaration.kind) {
                world.set_component_enabled(handle, enabled);
            }
        }
    }

    /// Enters a load. Nested loads keep the instances suspended until the
    /// last one resumes.
    pub(crate) fn suspend<K: SceneKey>(&mut self, world: &mut NodeWorld<K>) {
        self.suspend_depth += 1;
        if self.suspend_depth == 1 {
            self.set_enabled_for_captured(world, false);
        }
    }

    pub(crate) fn resume<K: SceneKey>(&mut self, world: &mut NodeWorld<K>) {
        if self.suspend_depth == 0 {
            return;
        }
        self.suspend_depth -= 1;
        if self.suspend_depth == 0 {
            self.set_enabled_for_captured(world, true);
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::{NodeBlueprint, UnitContent};

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum TestScene {
        A,
    }

    impl SceneKey for TestScene {}

    const LISTENER: ComponentKind = ComponentKind::new("listener");
    const MUSIC: ComponentKind = ComponentKind::new("music");

    fn unit_with_listener(name: &str) -> UnitContent<TestScene> {
        UnitContent::new().with_root(
            NodeBlueprint::new(format!("{name} Root"))
                .with_child(
                    NodeBlueprint::new(format!("{name} Listener")).with_component(LISTENER),
                ),
        )
    }

    fn registry(
        world: &mut NodeWorld<TestScene>,
        action: DuplicatedAction,
    ) -> UniqueComponentRegistry {
        UniqueComponentRegistry::new(
            vec![UniqueDeclaration {
                kind: LISTENER,
                action,
                require_suspend: false,
            }],
            world,
        )
    }

    //--- Capture Tests ----------------------------------------------------

    #[test]
    fn first_instance_moves_under_container() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableComponent);
        let unit = world.mount(unit_with_listener("A"));

        unique.capture(&mut world, unit);

        let handle = unique.captured(&world, LISTENER).unwrap();
        assert_eq!(world.node(handle.node).unwrap().parent(), Some(unique.container()));

        world.release_unit(unit);
        assert!(world.is_alive(handle.node));
        assert_eq!(world.count_live(LISTENER), 1);
    }

    #[test]
    fn unit_without_instance_captures_nothing() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableComponent);
        let unit = world.mount(UnitContent::new().with_root(NodeBlueprint::new("Empty")));

        assert_eq!(unique.capture(&mut world, unit), 0);
        assert!(unique.captured(&world, LISTENER).is_none());
    }

    #[test]
    fn descendant_of_captured_node_keeps_parent() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = UniqueComponentRegistry::new(
            vec![
                UniqueDeclaration {
                    kind: LISTENER,
                    action: DuplicatedAction::DisableComponent,
                    require_suspend: false,
                },
                UniqueDeclaration {
                    kind: MUSIC,
                    action: DuplicatedAction::DisableComponent,
                    require_suspend: false,
                },
            ],
            &mut world,
        );
        let unit = world.mount(UnitContent::new().with_root(
            NodeBlueprint::new("Audio")
                .with_component(LISTENER)
                .with_child(NodeBlueprint::new("Music").with_component(MUSIC)),
        ));

        unique.capture(&mut world, unit);

        let audio = world.find_by_name("Audio").unwrap();
        let music = world.find_by_name("Music").unwrap();
        assert_eq!(world.node(music).unwrap().parent(), Some(audio));
        assert!(world.is_descendant_of(music, unique.container()));
    }

    //--- Duplicate Tests --------------------------------------------------

    #[test]
    fn duplicate_component_is_disabled() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableComponent);
        let first = world.mount(unit_with_listener("A"));
        unique.capture(&mut world, first);

        let second = world.mount(unit_with_listener("B"));
        let resolved = unique.capture(&mut world, second);

        assert_eq!(resolved, 1);
        assert_eq!(world.count_live(LISTENER), 1);
        let duplicate = world.find_by_name("B Listener").unwrap();
        assert!(world.node(duplicate).unwrap().is_active_self());
    }

    #[test]
    fn duplicate_node_is_deactivated() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableNode);
        let first = world.mount(unit_with_listener("A"));
        unique.capture(&mut world, first);

        let second = world.mount(unit_with_listener("B"));
        unique.capture(&mut world, second);

        let duplicate = world.find_by_name("B Listener").unwrap();
        assert!(!world.node(duplicate).unwrap().is_active_self());
        assert_eq!(world.count_live(LISTENER), 1);
    }

    #[test]
    fn duplicate_node_is_destroyed() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DestroyNode);
        let first = world.mount(unit_with_listener("A"));
        unique.capture(&mut world, first);

        let second = world.mount(unit_with_listener("B"));
        unique.capture(&mut world, second);

        assert!(world.find_by_name("B Listener").is_none());
        assert!(world.find_by_name("B Root").is_some());
        assert_eq!(world.all_components(LISTENER).len(), 1);
    }

    #[test]
    fn duplicates_inside_one_unit_are_resolved() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableComponent);
        let unit = world.mount(UnitContent::new().with_root(
            NodeBlueprint::new("Root")
                .with_child(NodeBlueprint::new("One").with_component(LISTENER))
                .with_child(NodeBlueprint::new("Two").with_component(LISTENER)),
        ));

        assert_eq!(unique.capture(&mut world, unit), 1);
        assert_eq!(world.count_live(LISTENER), 1);
    }

    #[test]
    fn destroyed_capture_is_replaced_on_next_load() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = registry(&mut world, DuplicatedAction::DisableComponent);
        let first = world.mount(unit_with_listener("A"));
        unique.capture(&mut world, first);
        let captured = unique.captured(&world, LISTENER).unwrap();
        world.destroy(captured.node);

        let second = world.mount(unit_with_listener("B"));
        unique.capture(&mut world, second);

        let replacement = unique.captured(&world, LISTENER).unwrap();
        assert_eq!(Some(replacement.node), world.find_by_name("B Listener"));
    }

    //--- Suspension Tests -------------------------------------------------

    #[test]
    fn suspension_nests() {
        let mut world = NodeWorld::<TestScene>::new();
        let mut unique = UniqueComponentRegistry::new(
            vec![UniqueDeclaration {
                kind: LISTENER,
                action: DuplicatedAction::DisableComponent,
                require_suspend: true,
            }],
            &mut world,
        );
        let unit = world.mount(unit_with_listener("A"));
        unique.capture(&mut world, unit);

        unique.suspend(&mut world);
        unique.suspend(&mut world);
        assert_eq!(world.count_live(LISTENER), 0);

        unique.resume(&mut world);
        assert_eq!(world.count_live(LISTENER), 0);

        unique.resume(&mut world);
        assert_eq!(world.count_live(LISTENER), 1);
        assert!(!unique.is_suspended());

        unique.resume(&mut world);
        assert!(!unique.is_suspended());
    }
}
