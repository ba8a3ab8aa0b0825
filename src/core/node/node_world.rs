//=========================================================================
// Node World
//=========================================================================
//
// Generational arena holding every live node plus the bookkeeping of
// mounted content units.
//
// Architecture:
//   mount(UnitContent) ──> UnitId ──> units[UnitId].roots ──> Node tree
//   spawn(name)        ──> persistent NodeId (belongs to no unit)
//
// Unit membership follows the parent: moving a node under a persistent
// node makes its whole subtree persistent, moving it under a unit node
// makes it part of that unit. Releasing a unit destroys whatever it
// still owns.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{
    Component, ComponentHandle, ComponentKind, Node, NodeBlueprint, NodeId, UnitContent, UnitId,
};
use crate::core::scene::{SceneEventHandler, SceneKey, SceneLifecycle};

//=== Slot ================================================================

struct Slot<K: SceneKey> {
    generation: u32,
    node: Option<Node<K>>,
}

//=== NodeWorld ===========================================================

/// Owns all runtime nodes and tracks which unit each belongs to.
///
/// This is the node activation API the orchestrator drives: enable or
/// disable nodes, move them in the hierarchy, destroy them, and look up
/// their declared components and capabilities.
pub struct NodeWorld<K: SceneKey> {
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    units: HashMap<UnitId, Vec<NodeId>>,
    next_unit: u64,
}

impl<K: SceneKey> NodeWorld<K> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            units: HashMap::new(),
            next_unit: 1,
        }
    }

    /// Creates a persistent, parentless node that belongs to no unit.
    pub fn spawn(&mut self, name: impl Into<String>) -> NodeId {
        self.insert(Node::new(name))
    }

    /// Instantiates a unit's content and returns its identifier.
    pub fn mount(&mut self, content: UnitContent<K>) -> UnitId {
        let unit = UnitId(self.next_unit);
        self.next_unit += 1;

        let mut roots = Vec::with_capacity(content.roots.len());
        for blueprint in content.roots {
            roots.push(self.instantiate(blueprint, None, unit));
        }

        debug!("Mounted {} with {} root nodes", unit, roots.len());
        self.units.insert(unit, roots);
        unit
    }

    fn instantiate(
        &mut self,
        blueprint: NodeBlueprint<K>,
        parent: Option<NodeId>,
        unit: UnitId,
    ) -> NodeId {
        let NodeBlueprint {
            name,
            active,
            activation_exempt,
            components,
            lifecycle,
            events,
            children,
        } = blueprint;

        let mut node = Node::new(name);
        node.active_self = active;
        node.activation_exempt = activation_exempt;
        node.parent = parent;
        node.unit = Some(unit);
        node.components = components;
        node.lifecycle = lifecycle;
        node.events = events;

        let id = self.insert(node);
        for child in children {
            let child_id = self.instantiate(child, Some(id), unit);
            if let Some(node) = self.node_mut(id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn insert(&mut self, node: Node<K>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    //--- Units ------------------------------------------------------------

    /// Whether the unit is still mounted.
    pub fn is_unit_valid(&self, unit: UnitId) -> bool {
        self.units.contains_key(&unit)
    }

    /// Top-level nodes of a unit. Empty for released units.
    pub fn unit_roots(&self, unit: UnitId) -> &[NodeId] {
        self.units.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All mounted units, in mount order.
    pub fn units(&self) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self.units.keys().copied().collect();
        units.sort();
        units
    }

    /// All nodes owned by a unit, depth-first from its roots.
    pub fn unit_nodes(&self, unit: UnitId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        for &root in self.unit_roots(unit) {
            self.collect_descendants(root, &mut nodes);
        }
        nodes
    }

    /// Destroys every node the unit still owns and invalidates it.
    ///
    /// Returns false if the unit was not mounted.
    pub fn release_unit(&mut self, unit: UnitId) -> bool {
        let Some(roots) = self.units.remove(&unit) else {
            return false;
        };

        for root in roots {
            self.free_subtree(root);
        }

        debug!("Released {}", unit);
        true
    }

    //--- Node Access ------------------------------------------------------

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the first live node with the given name, in slot order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.live_ids().find(|&id| self.node(id).is_some_and(|node| node.name == name))
    }

    fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|_| NodeId::new(index as u32, slot.generation))
        })
    }

    //--- Activation -------------------------------------------------------

    /// Sets the node's local active flag. Returns false for dead nodes.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.active_self = active;
                true
            }
            None => false,
        }
    }

    /// True when the node and all of its ancestors are active.
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.node(current) {
                Some(node) if node.active_self => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    //--- Hierarchy --------------------------------------------------------

    /// Moves a node under a new parent, or to the top level with `None`.
    ///
    /// The subtree adopts the new parent's unit membership. A node moved
    /// to the top level keeps its unit and becomes one of its roots.
    /// Returns false if either node is dead or the move would create a
    /// cycle.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(parent) = parent {
            if !self.is_alive(parent) || parent == id || self.is_descendant_of(parent, id) {
                warn!("Rejected reparenting {} under {}", id, parent);
                return false;
            }
        }

        self.detach(id);

        match parent {
            Some(parent_id) => {
                let unit = self.node(parent_id).and_then(|node| node.unit);
                if let Some(parent_node) = self.node_mut(parent_id) {
                    parent_node.children.push(id);
                }
                if let Some(node) = self.node_mut(id) {
                    node.parent = Some(parent_id);
                }
                self.assign_unit(id, unit);
            }
            None => {
                let unit = self.node(id).and_then(|node| node.unit);
                if let Some(roots) = unit.and_then(|unit| self.units.get_mut(&unit)) {
                    roots.push(id);
                }
            }
        }
        true
    }

    /// True if `ancestor` lies on the parent chain of `id`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.node(id).and_then(|node| node.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|node| node.parent);
        }
        false
    }

    /// The node and all of its descendants, depth-first.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_descendants(root, &mut nodes);
        nodes
    }

    fn collect_descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.node(root) else {
            return;
        };
        out.push(root);
        for &child in &node.children {
            self.collect_descendants(child, out);
        }
    }

    fn assign_unit(&mut self, root: NodeId, unit: Option<UnitId>) {
        for id in self.descendants(root) {
            if let Some(node) = self.node_mut(id) {
                node.unit = unit;
            }
        }
    }

    // Unlinks the node from its parent or from its unit's root list.
    fn detach(&mut self, id: NodeId) {
        let Some((parent, unit)) = self.node(id).map(|node| (node.parent, node.unit)) else {
            return;
        };

        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.node_mut(parent_id) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
            None => {
                if let Some(roots) = unit.and_then(|unit| self.units.get_mut(&unit)) {
                    roots.retain(|&root| root != id);
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    //--- Destruction ------------------------------------------------------

    /// Destroys a node and its subtree. Returns false for dead nodes.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.detach(id);
        self.free_subtree(id);
        true
    }

    fn free_subtree(&mut self, root: NodeId) {
        for id in self.descendants(root) {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index() as u32);
            }
        }
    }

    //--- Components -------------------------------------------------------

    pub fn component(&self, handle: ComponentHandle) -> Option<&Component> {
        self.node(handle.node)
            .and_then(|node| node.components.get(handle.slot))
    }

    /// Sets a component's enabled flag. Returns false if it does not exist.
    pub fn set_component_enabled(&mut self, handle: ComponentHandle, enabled: bool) -> bool {
        match self
            .node_mut(handle.node)
            .and_then(|node| node.components.get_mut(handle.slot))
        {
            Some(component) => {
                component.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// A component is live when it is enabled and its node is active in
    /// hierarchy.
    pub fn is_component_live(&self, handle: ComponentHandle) -> bool {
        self.component(handle).is_some_and(|c| c.enabled)
            && self.is_active_in_hierarchy(handle.node)
    }

    /// Components of `kind` on the given nodes, in node order.
    pub fn components_in(&self, nodes: &[NodeId], kind: ComponentKind) -> Vec<ComponentHandle> {
        let mut found = Vec::new();
        for &id in nodes {
            if let Some(node) = self.node(id) {
                for (slot, component) in node.components.iter().enumerate() {
                    if component.kind == kind {
                        found.push(ComponentHandle { node: id, slot });
                    }
                }
            }
        }
        found
    }

    /// Components of `kind` anywhere in the world.
    pub fn all_components(&self, kind: ComponentKind) -> Vec<ComponentHandle> {
        let nodes: Vec<NodeId> = self.live_ids().collect();
        self.components_in(&nodes, kind)
    }

    /// Number of live components of `kind` anywhere in the world.
    pub fn count_live(&self, kind: ComponentKind) -> usize {
        self.all_components(kind)
            .into_iter()
            .filter(|&handle| self.is_component_live(handle))
            .count()
    }

    //--- Capabilities -----------------------------------------------------

    pub fn lifecycle_mut(&mut self, id: NodeId) -> Option<&mut (dyn SceneLifecycle<K> + 'static)> {
        self.node_mut(id).and_then(|node| node.lifecycle.as_deref_mut())
    }

    pub fn event_handler_mut(
        &mut self,
        id: NodeId,
    ) -> Option<&mut (dyn SceneEventHandler<K> + 'static)> {
        self.node_mut(id).and_then(|node| node.events.as_deref_mut())
    }

    /// First node of the unit carrying a lifecycle object, depth-first.
    pub fn find_lifecycle_root(&self, unit: UnitId) -> Option<NodeId> {
        self.unit_nodes(unit)
            .into_iter()
            .find(|&id| self.node(id).is_some_and(|node| node.lifecycle.is_some()))
    }

    /// Nodes of the unit carrying an event handler, depth-first.
    pub fn event_handler_nodes(&self, unit: UnitId) -> Vec<NodeId> {
        self.unit_nodes(unit)
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(|node| node.events.is_some()))
            .collect()
    }
}

impl<K: SceneKey> Default for NodeWorld<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
