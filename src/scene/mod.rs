//! The scene: entity tree, state arena and every attached machine.
//!
//! A [`Scene`] is the single owner of everything a transition can touch.
//! Machines refer to each other and to states by id, so a state shared
//! through propagation is one object seen from several registries.
//!
//! # Driving a scene
//!
//! The host calls [`Scene::tick`] once per frame. Each tick first activates
//! machines that were attached since the last tick (capturing their parent
//! and descendant machines), then evaluates every machine in attach order.
//! User code calls [`Scene::set_state`] and [`Scene::revert_state`] between
//! ticks.
//!
//! # Example
//!
//! ```rust
//! use posture::core::{Behavior, BehaviorBinding, EntityId, State, Toggle};
//! use posture::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let guard = EntityId(1);
//! scene.insert_entity(guard, None).unwrap();
//! let machine = scene.attach_machine(guard).unwrap();
//!
//! let patrol = Toggle::shared(false);
//! let mut idle = State::new();
//! idle.bind(BehaviorBinding::new(guard, "Patrol", patrol.clone()));
//! scene.add_state(machine, "Idle", idle).unwrap();
//!
//! scene.tick();
//! assert!(scene.set_state(machine, "Idle"));
//! assert!(patrol.is_enabled());
//! assert_eq!(scene.current_state_name(machine), Some("Idle"));
//! ```

mod error;
mod graph;
mod machine;
mod propagation;
mod transition;

pub use error::SceneError;
pub use graph::EntityGraph;
pub use machine::{Lifecycle, StateMachine, DEFAULT_STATE};

use crate::core::{ChangeListener, EntityId, State, StateArena, StateChanged, StateId};
use machine::Links;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Handle to a machine in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineId(pub(crate) usize);

impl MachineId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "machine#{}", self.0)
    }
}

/// Owner of the entity graph, the state arena and all machines.
#[derive(Debug, Default)]
pub struct Scene {
    graph: EntityGraph,
    arena: StateArena,
    machines: Vec<Option<StateMachine>>,
    by_entity: HashMap<EntityId, MachineId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- entities -------------------------------------------------------

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn insert_entity(
        &mut self,
        entity: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        self.graph.insert(entity, parent)
    }

    /// Move an entity in the tree.
    ///
    /// Captured machine links are not refreshed; call [`Scene::rescan`] on
    /// the machines whose hierarchy changed.
    pub fn reparent(
        &mut self,
        entity: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        self.graph.reparent(entity, parent)
    }

    /// Remove an entity with its subtree, dropping their machines.
    ///
    /// Links other machines hold to the dropped ones are pruned.
    /// Returns the ids of the machines that were dropped. States stay in the
    /// arena since other registries may still reference them.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<Vec<MachineId>, SceneError> {
        let removed = self.graph.remove(entity)?;
        let mut dropped = Vec::new();
        for entity in removed {
            if let Some(id) = self.by_entity.remove(&entity) {
                if let Some(slot) = self.machines.get_mut(id.0) {
                    *slot = None;
                }
                dropped.push(id);
            }
        }
        if !dropped.is_empty() {
            for machine in self.machines.iter_mut().flatten() {
                machine.links.children.retain(|child| !dropped.contains(child));
                if machine.links.parent.is_some_and(|parent| dropped.contains(&parent)) {
                    machine.links.parent = None;
                }
            }
        }
        debug!(%entity, machines = dropped.len(), "entity removed");
        Ok(dropped)
    }

    // ---- machines -------------------------------------------------------

    /// Attach a machine starting in [`DEFAULT_STATE`].
    pub fn attach_machine(&mut self, entity: EntityId) -> Result<MachineId, SceneError> {
        self.attach_machine_in(entity, DEFAULT_STATE)
    }

    /// Attach a machine whose current state name starts as `initial`.
    pub fn attach_machine_in(
        &mut self,
        entity: EntityId,
        initial: impl Into<String>,
    ) -> Result<MachineId, SceneError> {
        if !self.graph.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        if let Some(machine) = self.by_entity.get(&entity) {
            return Err(SceneError::MachineAlreadyAttached {
                entity,
                machine: *machine,
            });
        }

        let id = MachineId(self.machines.len());
        self.machines.push(Some(StateMachine::new(entity, initial)));
        self.by_entity.insert(entity, id);
        debug!(machine = %id, %entity, "machine attached");
        Ok(id)
    }

    pub fn machine(&self, id: MachineId) -> Option<&StateMachine> {
        self.machines.get(id.0)?.as_ref()
    }

    pub(crate) fn machine_mut(&mut self, id: MachineId) -> Option<&mut StateMachine> {
        self.machines.get_mut(id.0)?.as_mut()
    }

    fn require_machine_mut(&mut self, id: MachineId) -> Result<&mut StateMachine, SceneError> {
        self.machine_mut(id).ok_or(SceneError::UnknownMachine(id))
    }

    pub fn machine_for(&self, entity: EntityId) -> Option<MachineId> {
        self.by_entity.get(&entity).copied()
    }

    /// Ids of live machines in attach order.
    pub fn machine_ids(&self) -> Vec<MachineId> {
        self.machines
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| MachineId(index))
            .collect()
    }

    pub fn current_state_name(&self, id: MachineId) -> Option<&str> {
        self.machine(id).map(StateMachine::current_state_name)
    }

    /// Subscribe to state changes of one machine.
    pub fn subscribe<F>(&mut self, id: MachineId, listener: F) -> Result<(), SceneError>
    where
        F: Fn(&mut Scene, &StateChanged) + 'static,
    {
        self.subscribe_rc(id, Rc::new(listener))
    }

    /// Limit how many transitions `id` keeps in its history.
    ///
    /// Older records beyond the new limit are dropped immediately.
    pub fn set_history_limit(&mut self, id: MachineId, max_len: usize) -> Result<(), SceneError> {
        self.require_machine_mut(id)?.history.set_max_len(max_len);
        Ok(())
    }

    pub(crate) fn subscribe_rc(
        &mut self,
        id: MachineId,
        listener: ChangeListener,
    ) -> Result<(), SceneError> {
        self.require_machine_mut(id)?.listeners.push(listener);
        Ok(())
    }

    // ---- states ---------------------------------------------------------

    pub fn arena(&self) -> &StateArena {
        &self.arena
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.arena.get(id)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.arena.get_mut(id)
    }

    /// Look up the state a machine knows under `name`.
    pub fn state_id(&self, machine: MachineId, name: &str) -> Option<StateId> {
        self.machine(machine)?.registry.get(name)
    }

    /// Mutable access to the state a machine knows under `name`.
    ///
    /// The state may be shared with other machines; changes are visible
    /// through every registry that references it.
    pub fn state_named_mut(&mut self, machine: MachineId, name: &str) -> Option<&mut State> {
        let id = self.state_id(machine, name)?;
        self.arena.get_mut(id)
    }

    /// Store `state` in the arena and register it on `machine` under `name`.
    ///
    /// An existing entry with the same name is replaced. If that entry was
    /// the active state, the machine treats its active state as absent until
    /// the next `set_state`.
    pub fn add_state(
        &mut self,
        machine: MachineId,
        name: impl Into<String>,
        state: State,
    ) -> Result<StateId, SceneError> {
        if self.machine(machine).is_none() {
            return Err(SceneError::UnknownMachine(machine));
        }
        let id = self.arena.insert(state);
        self.share_state(machine, name, id)?;
        Ok(id)
    }

    /// Register an existing state on `machine` under `name`.
    pub fn share_state(
        &mut self,
        machine: MachineId,
        name: impl Into<String>,
        state: StateId,
    ) -> Result<Option<StateId>, SceneError> {
        let name = name.into();
        let target = self.require_machine_mut(machine)?;
        let replaced = target.registry.insert(name.clone(), state);
        debug!(%machine, state = %name, id = %state, "state registered");
        Ok(replaced)
    }

    /// Remove the entry `name` from one machine's registry.
    ///
    /// The state itself stays in the arena and in every other registry.
    pub fn remove_state(
        &mut self,
        machine: MachineId,
        name: &str,
    ) -> Result<Option<StateId>, SceneError> {
        let target = self.require_machine_mut(machine)?;
        let removed = target.registry.remove(name);
        if removed.is_some() {
            debug!(%machine, state = name, "state removed");
        }
        Ok(removed)
    }

    // ---- hierarchy ------------------------------------------------------

    fn resolve_links(&self, id: MachineId) -> Links {
        let Some(machine) = self.machine(id) else {
            return Links::default();
        };
        let entity = machine.entity;

        let parent = self
            .graph
            .ancestors(entity)
            .filter_map(|ancestor| self.machine_for(ancestor))
            .find(|candidate| *candidate != id);

        let children = self
            .graph
            .descendants(entity)
            .into_iter()
            .filter_map(|descendant| self.machine_for(descendant))
            .filter(|candidate| *candidate != id)
            .collect();

        Links { parent, children }
    }

    /// Capture the machine's parent and descendant machines and enter its
    /// initial state.
    ///
    /// Does nothing for a machine that is already active. The initial state
    /// becomes the active state (firing its `on_enter`) only when the
    /// machine's registry holds it at this point and no earlier `set_state`
    /// already entered it.
    pub fn activate(&mut self, id: MachineId) -> Result<(), SceneError> {
        let links = self.resolve_links(id);
        let target = self.require_machine_mut(id)?;
        if target.is_active() {
            return Ok(());
        }
        target.links = links;
        target.lifecycle = Lifecycle::Active;
        let entered = if target.active_state().is_some() {
            None
        } else {
            target.registry.get(&target.current)
        };
        if entered.is_some() {
            target.active = entered;
        }
        debug!(
            machine = %id,
            state = %target.current,
            parent = ?target.links.parent,
            children = target.links.children.len(),
            "machine activated"
        );

        if let Some(state) = entered {
            self.fire_enter(state, id);
        }
        Ok(())
    }

    /// Re-capture parent and descendant machines after the tree changed.
    pub fn rescan(&mut self, id: MachineId) -> Result<(), SceneError> {
        let links = self.resolve_links(id);
        let target = self.require_machine_mut(id)?;
        debug!(
            machine = %id,
            parent = ?links.parent,
            children = links.children.len(),
            "hierarchy rescanned"
        );
        target.links = links;
        Ok(())
    }

    /// Re-capture links for every live machine.
    pub fn rescan_all(&mut self) {
        for id in self.machine_ids() {
            let links = self.resolve_links(id);
            if let Some(machine) = self.machine_mut(id) {
                machine.links = links;
            }
        }
    }

    // ---- frame ----------------------------------------------------------

    /// Run one frame: activate new machines, then evaluate every machine.
    pub fn tick(&mut self) {
        let ids = self.machine_ids();
        for id in &ids {
            let pending = self.machine(*id).is_some_and(|m| !m.is_active());
            if pending {
                if let Err(error) = self.activate(*id) {
                    warn!(machine = %id, %error, "activation skipped");
                }
            }
        }
        for id in ids {
            self.evaluate_tick(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_HISTORY_LEN;

    fn scene_with_tree() -> (Scene, MachineId, MachineId, MachineId) {
        // 1 (machine)
        // └── 2 (no machine)
        //     ├── 3 (machine)
        //     └── 4 (machine)
        let mut scene = Scene::new();
        scene.insert_entity(EntityId(1), None).unwrap();
        scene.insert_entity(EntityId(2), Some(EntityId(1))).unwrap();
        scene.insert_entity(EntityId(3), Some(EntityId(2))).unwrap();
        scene.insert_entity(EntityId(4), Some(EntityId(2))).unwrap();
        let root = scene.attach_machine(EntityId(1)).unwrap();
        let left = scene.attach_machine(EntityId(3)).unwrap();
        let right = scene.attach_machine(EntityId(4)).unwrap();
        (scene, root, left, right)
    }

    #[test]
    fn attach_requires_known_entity() {
        let mut scene = Scene::new();
        assert_eq!(
            scene.attach_machine(EntityId(5)),
            Err(SceneError::UnknownEntity(EntityId(5)))
        );
    }

    #[test]
    fn one_machine_per_entity() {
        let mut scene = Scene::new();
        scene.insert_entity(EntityId(1), None).unwrap();
        let first = scene.attach_machine(EntityId(1)).unwrap();

        assert_eq!(
            scene.attach_machine(EntityId(1)),
            Err(SceneError::MachineAlreadyAttached {
                entity: EntityId(1),
                machine: first,
            })
        );
    }

    #[test]
    fn links_skip_entities_without_machines() {
        let (mut scene, root, left, right) = scene_with_tree();
        scene.tick();

        let root_machine = scene.machine(root).unwrap();
        assert_eq!(root_machine.parent(), None);
        assert_eq!(root_machine.children(), &[left, right]);

        let left_machine = scene.machine(left).unwrap();
        assert_eq!(left_machine.parent(), Some(root));
        assert!(left_machine.children().is_empty());
    }

    #[test]
    fn machine_is_never_its_own_relative() {
        let (mut scene, root, left, right) = scene_with_tree();
        scene.tick();

        for id in [root, left, right] {
            let machine = scene.machine(id).unwrap();
            assert_ne!(machine.parent(), Some(id));
            assert!(!machine.children().contains(&id));
        }
    }

    #[test]
    fn links_are_captured_once_until_rescan() {
        let (mut scene, root, _, _) = scene_with_tree();
        scene.tick();

        scene.insert_entity(EntityId(5), Some(EntityId(1))).unwrap();
        let late = scene.attach_machine(EntityId(5)).unwrap();
        scene.tick();
        assert!(!scene.machine(root).unwrap().children().contains(&late));

        scene.rescan(root).unwrap();
        assert!(scene.machine(root).unwrap().children().contains(&late));
    }

    #[test]
    fn tick_activates_pending_machines() {
        let (mut scene, root, left, _) = scene_with_tree();
        assert_eq!(
            scene.machine(root).unwrap().lifecycle(),
            Lifecycle::Uninitialized
        );

        scene.tick();

        assert!(scene.machine(root).unwrap().is_active());
        assert!(scene.machine(left).unwrap().is_active());
    }

    #[test]
    fn tick_survives_machines_removed_during_activation() {
        let (mut scene, root, left, right) = scene_with_tree();
        let mut start = State::new();
        start.on_enter.add(|scene, _| {
            scene.remove_entity(EntityId(2)).unwrap();
        });
        scene.add_state(root, DEFAULT_STATE, start).unwrap();

        scene.tick();
        scene.tick();

        assert!(scene.machine(root).unwrap().is_active());
        assert!(scene.machine(root).unwrap().children().is_empty());
        assert!(scene.machine(left).is_none());
        assert!(scene.machine(right).is_none());
    }

    #[test]
    fn activation_enters_initial_state_when_registered() {
        let mut scene = Scene::new();
        scene.insert_entity(EntityId(1), None).unwrap();
        let id = scene.attach_machine_in(EntityId(1), "Idle").unwrap();

        let entered = Rc::new(std::cell::Cell::new(0));
        let mut idle = State::new();
        let counter = Rc::clone(&entered);
        idle.on_enter.add(move |_, _| counter.set(counter.get() + 1));
        let idle = scene.add_state(id, "Idle", idle).unwrap();

        scene.tick();
        scene.tick();

        assert_eq!(entered.get(), 1);
        assert_eq!(scene.machine(id).unwrap().active_state(), Some(idle));
    }

    #[test]
    fn remove_entity_drops_machines_in_subtree() {
        let (mut scene, root, left, right) = scene_with_tree();
        scene.tick();

        let dropped = scene.remove_entity(EntityId(2)).unwrap();

        assert_eq!(dropped, vec![left, right]);
        assert!(scene.machine(left).is_none());
        assert_eq!(scene.machine_ids(), vec![root]);
        assert!(scene.machine(root).unwrap().children().is_empty());
        assert!(!scene.set_state(root, "Default"));
    }

    #[test]
    fn history_limit_caps_a_machine_log() {
        let (mut scene, root, _, _) = scene_with_tree();
        scene.add_state(root, "A", State::new()).unwrap();
        scene.add_state(root, "B", State::new()).unwrap();
        scene.set_history_limit(root, 4).unwrap();

        for round in 0..500 {
            scene.set_state(root, if round % 2 == 0 { "A" } else { "B" });
        }

        let history = scene.machine(root).unwrap().history();
        assert_eq!(history.len(), 4);
        assert_eq!(history.last().map(|t| t.to.as_str()), Some("B"));
        assert_eq!(
            scene.set_history_limit(MachineId(99), 1),
            Err(SceneError::UnknownMachine(MachineId(99)))
        );
    }

    #[test]
    fn machines_keep_default_history_length() {
        let (mut scene, root, _, _) = scene_with_tree();
        scene.add_state(root, "A", State::new()).unwrap();
        scene.add_state(root, "B", State::new()).unwrap();

        for round in 0..DEFAULT_HISTORY_LEN * 3 {
            scene.set_state(root, if round % 2 == 0 { "A" } else { "B" });
        }

        assert_eq!(scene.machine(root).unwrap().history().len(), DEFAULT_HISTORY_LEN);
    }

    #[test]
    fn remove_state_leaves_arena_untouched() {
        let (mut scene, root, _, _) = scene_with_tree();
        let idle = scene.add_state(root, "Idle", State::new()).unwrap();

        assert_eq!(scene.remove_state(root, "Idle").unwrap(), Some(idle));
        assert!(scene.state(idle).is_some());
        assert!(scene.state_id(root, "Idle").is_none());
        assert_eq!(
            scene.remove_state(MachineId(99), "Idle"),
            Err(SceneError::UnknownMachine(MachineId(99)))
        );
    }
}
