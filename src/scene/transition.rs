//! Transitions and per-tick evaluation.
//!
//! # Enable rule
//!
//! After a tick, a behavior bound in state `S` is enabled iff the machine's
//! current state is `S`, or the current state's known kinds contain the
//! behavior's kind. Each tick first records the kinds of the current state's
//! own bindings into its known set; the set only grows, so a kind stays
//! shared after the binding that introduced it is gone.
//!
//! # Re-entrancy
//!
//! Callbacks run with the scene borrowed mutably and may call
//! [`Scene::set_state`] again. The nested transition runs to completion
//! first. The outer transition then resumes with the target and previous
//! name it captured before the callback, so it can overwrite what the nested
//! call set. Hosts that chain transitions from callbacks should do it from
//! `on_enter` of the final target or from a change listener.

use super::{MachineId, Scene};
use crate::core::{BehaviorKind, Callbacks, State, StateChanged, StateId, TransitionRecord};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug)]
enum Hook {
    Enter,
    Update,
    Exit,
}

impl Hook {
    fn select(self, state: &State) -> &Callbacks {
        match self {
            Self::Enter => &state.on_enter,
            Self::Update => &state.on_update,
            Self::Exit => &state.on_exit,
        }
    }
}

impl Scene {
    /// Re-evaluate one machine: settle behavior flags for the current state,
    /// run the active state's `on_update`, then propagate states through the
    /// hierarchy.
    pub fn evaluate_tick(&mut self, id: MachineId) {
        let Some(machine) = self.machine(id) else {
            warn!(machine = %id, "tick for unknown machine");
            return;
        };
        let current = machine.current.clone();
        let current_state = machine.registry.get(&current);
        let entries: Vec<(String, StateId)> = machine
            .registry
            .iter()
            .map(|(name, state)| (name.to_string(), state))
            .collect();

        if let Some(current_state) = current_state {
            self.record_kinds(id, current_state);
        }

        let known = current_state.and_then(|state| self.arena.get(state));
        for (name, state) in &entries {
            let Some(state) = self.arena.get(*state) else {
                continue;
            };
            for binding in state.bindings() {
                let enabled =
                    *name == current || known.is_some_and(|known| known.knows_kind(&binding.kind));
                binding.set_enabled(enabled);
            }
        }

        if let Some(active) = self.resolve_active(id) {
            self.fire(Hook::Update, active, id);
        }

        self.propagate(id);
    }

    fn record_kinds(&mut self, id: MachineId, state: StateId) {
        let Some(target) = self.arena.get_mut(state) else {
            return;
        };
        let kinds: Vec<BehaviorKind> = target
            .bindings()
            .iter()
            .map(|binding| binding.kind.clone())
            .collect();
        for kind in &kinds {
            if target.record_kind(kind) {
                trace!(machine = %id, state = %state, %kind, "behavior kind recorded");
            }
        }
    }

    /// Switch `machine` to the state registered as `name`.
    ///
    /// The request first cascades to the parent machine and then to every
    /// descendant machine, whether or not `name` is known locally. Within one
    /// call each machine of the hierarchy is visited at most once.
    ///
    /// Returns `false` when this machine has no state called `name`; the
    /// machine is then left untouched, although relatives may have switched.
    pub fn set_state(&mut self, machine: MachineId, name: &str) -> bool {
        let mut visited = HashSet::from([machine]);
        self.cascade_set_state(machine, name, &mut visited)
    }

    fn cascade_set_state(
        &mut self,
        id: MachineId,
        name: &str,
        visited: &mut HashSet<MachineId>,
    ) -> bool {
        let Some(machine) = self.machine(id) else {
            warn!(machine = %id, state = name, "set_state on unknown machine");
            return false;
        };
        let parent = machine.parent();
        let children = machine.children().to_vec();

        if let Some(parent) = parent.filter(|parent| *parent != id) {
            if visited.insert(parent) {
                trace!(from = %id, to = %parent, state = name, "cascade to parent");
                self.cascade_set_state(parent, name, visited);
            }
        }
        for child in children {
            if child != id && visited.insert(child) {
                trace!(from = %id, to = %child, state = name, "cascade to child");
                self.cascade_set_state(child, name, visited);
            }
        }

        self.transition(id, name)
    }

    fn transition(&mut self, id: MachineId, name: &str) -> bool {
        let Some(machine) = self.machine(id) else {
            return false;
        };
        let Some(next) = machine.registry.get(name) else {
            debug!(machine = %id, state = name, "no such state, transition skipped");
            return false;
        };
        let from = machine.current.clone();

        let exiting = self.resolve_active(id);
        let Some(machine) = self.machine_mut(id) else {
            return false;
        };
        machine.previous = Some(from.clone());
        if let Some(exiting) = exiting {
            self.fire(Hook::Exit, exiting, id);
        }

        let Some(machine) = self.machine_mut(id) else {
            warn!(machine = %id, "machine removed during on_exit");
            return false;
        };
        machine.active = Some(next);
        self.fire(Hook::Enter, next, id);

        if let Some(state) = self.arena.get(next) {
            state.set_all_enabled(false);
        }
        let Some(machine) = self.machine_mut(id) else {
            warn!(machine = %id, "machine removed during on_enter");
            return false;
        };
        machine.current = name.to_string();
        machine
            .history
            .push(TransitionRecord::now(from.as_str(), name));
        if let Some(state) = self.arena.get(next) {
            state.set_all_enabled(true);
        }

        debug!(machine = %id, from = %from, to = name, "state changed");
        self.notify(StateChanged {
            machine: id,
            state: name.to_string(),
            previous: Some(from),
        });
        true
    }

    /// Go back to the state the machine was in before its last transition.
    ///
    /// The previous name is not cleared, so a second revert undoes the first
    /// and repeated reverts toggle between the last two states. Returns
    /// `false` (and does nothing) if the machine never transitioned.
    pub fn revert_state(&mut self, machine: MachineId) -> bool {
        let Some(previous) = self.machine(machine).and_then(|m| m.previous.clone()) else {
            return false;
        };
        self.set_state(machine, &previous)
    }

    /// The machine's active state, clearing a handle that no longer matches
    /// its registry.
    fn resolve_active(&mut self, id: MachineId) -> Option<StateId> {
        let machine = self.machine_mut(id)?;
        let active = machine.active?;
        if machine.registry.get(&machine.current) == Some(active) {
            return Some(active);
        }
        warn!(
            machine = %id,
            state = %machine.current,
            stale = %active,
            "active state no longer registered, treating as absent"
        );
        machine.active = None;
        None
    }

    pub(super) fn fire_enter(&mut self, state: StateId, id: MachineId) {
        self.fire(Hook::Enter, state, id);
    }

    fn fire(&mut self, hook: Hook, state: StateId, id: MachineId) {
        let Some(callbacks) = self.arena.get(state).map(|s| hook.select(s).clone()) else {
            return;
        };
        if !callbacks.is_empty() {
            trace!(machine = %id, %state, ?hook, "firing callbacks");
            callbacks.invoke(self, id);
        }
    }

    fn notify(&mut self, event: StateChanged) {
        let Some(listeners) = self.machine(event.machine).map(|m| m.listeners.clone()) else {
            return;
        };
        for listener in listeners {
            listener(self, &event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Behavior, BehaviorBinding, EntityId, Toggle};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn single() -> (Scene, MachineId) {
        let mut scene = Scene::new();
        scene.insert_entity(EntityId(1), None).unwrap();
        let id = scene.attach_machine(EntityId(1)).unwrap();
        (scene, id)
    }

    fn bound(kind: &str, toggle: &Rc<Toggle>) -> State {
        let mut state = State::new();
        state.bind(BehaviorBinding::new(EntityId(1), kind, toggle.clone()));
        state
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn logging(log: &Log, label: &str) -> State {
        let mut state = State::new();
        for (hook, callbacks) in [
            ("enter", &mut state.on_enter),
            ("update", &mut state.on_update),
            ("exit", &mut state.on_exit),
        ] {
            let log = Rc::clone(log);
            let entry = format!("{hook}:{label}");
            callbacks.add(move |_, _| log.borrow_mut().push(entry.clone()));
        }
        state
    }

    #[test]
    fn set_state_switches_and_records_previous() {
        let (mut scene, id) = single();
        scene.add_state(id, "Idle", State::new()).unwrap();
        scene.add_state(id, "Combat", State::new()).unwrap();

        assert!(scene.set_state(id, "Idle"));
        assert!(scene.set_state(id, "Combat"));

        let machine = scene.machine(id).unwrap();
        assert_eq!(machine.current_state_name(), "Combat");
        assert_eq!(machine.previous_state_name(), Some("Idle"));
        assert_eq!(machine.history().path(), vec!["Default", "Idle", "Combat"]);
    }

    #[test]
    fn unknown_state_changes_nothing() {
        let (mut scene, id) = single();
        let toggle = Toggle::shared(false);
        scene.add_state(id, "Idle", bound("Move", &toggle)).unwrap();
        scene.set_state(id, "Idle");

        assert!(!scene.set_state(id, "Nonexistent"));

        let machine = scene.machine(id).unwrap();
        assert_eq!(machine.current_state_name(), "Idle");
        assert_eq!(machine.previous_state_name(), Some("Default"));
        assert!(machine.active_state().is_some());
        assert!(toggle.is_enabled());
    }

    #[test]
    fn callbacks_fire_exit_then_enter() {
        let (mut scene, id) = single();
        let log: Log = Rc::default();
        scene.add_state(id, "A", logging(&log, "A")).unwrap();
        scene.add_state(id, "B", logging(&log, "B")).unwrap();

        scene.set_state(id, "A");
        scene.set_state(id, "B");

        assert_eq!(*log.borrow(), vec!["enter:A", "exit:A", "enter:B"]);
    }

    #[test]
    fn update_fires_only_for_active_state() {
        let (mut scene, id) = single();
        let log: Log = Rc::default();
        scene.add_state(id, "A", logging(&log, "A")).unwrap();

        scene.tick();
        assert!(log.borrow().is_empty());

        scene.set_state(id, "A");
        scene.tick();
        assert_eq!(*log.borrow(), vec!["enter:A", "update:A"]);
    }

    #[test]
    fn transition_settles_new_state_bindings_immediately() {
        let (mut scene, id) = single();
        let idle = Toggle::shared(true);
        let combat = Toggle::shared(false);
        scene.add_state(id, "Idle", bound("Wander", &idle)).unwrap();
        scene.add_state(id, "Combat", bound("Attack", &combat)).unwrap();

        scene.set_state(id, "Combat");

        // bindings of other states wait for the next tick
        assert!(combat.is_enabled());
        assert!(idle.is_enabled());

        scene.tick();
        assert!(!idle.is_enabled());
        assert!(combat.is_enabled());
    }

    #[test]
    fn enter_callback_sees_new_state_disabled_then_enabled() {
        let (mut scene, id) = single();
        let toggle = Toggle::shared(true);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut combat = bound("Attack", &toggle);
        {
            let toggle = Rc::clone(&toggle);
            let seen = Rc::clone(&seen);
            combat
                .on_enter
                .add(move |_, _| seen.borrow_mut().push(toggle.is_enabled()));
        }
        scene.add_state(id, "Combat", combat).unwrap();

        scene.set_state(id, "Combat");

        // on_enter runs before the pre-settle pass
        assert_eq!(*seen.borrow(), vec![true]);
        assert!(toggle.is_enabled());
    }

    #[test]
    fn listeners_receive_new_state_name() {
        let (mut scene, id) = single();
        scene.add_state(id, "Idle", State::new()).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        scene
            .subscribe(id, move |_, event| sink.borrow_mut().push(event.clone()))
            .unwrap();

        scene.set_state(id, "Idle");
        scene.set_state(id, "Missing");

        assert_eq!(
            *events.borrow(),
            vec![StateChanged {
                machine: id,
                state: "Idle".to_string(),
                previous: Some("Default".to_string()),
            }]
        );
    }

    #[test]
    fn revert_without_history_is_noop() {
        let (mut scene, id) = single();
        scene.add_state(id, "Idle", State::new()).unwrap();

        assert!(!scene.revert_state(id));
        assert_eq!(scene.current_state_name(id), Some("Default"));
    }

    #[test]
    fn reentrant_set_state_from_enter_nests() {
        let (mut scene, id) = single();
        let mut alert = State::new();
        alert.on_enter.add(|scene, machine| {
            scene.set_state(machine, "Combat");
        });
        scene.add_state(id, "Alert", alert).unwrap();
        scene.add_state(id, "Combat", State::new()).unwrap();

        assert!(scene.set_state(id, "Alert"));

        // the nested call finished first; the outer call then wrote its own target
        let machine = scene.machine(id).unwrap();
        assert_eq!(machine.current_state_name(), "Alert");
        assert_eq!(machine.previous_state_name(), Some("Default"));
        assert_eq!(machine.history().path(), vec!["Default", "Combat", "Alert"]);
        // active points at Combat while the name says Alert
        assert!(machine.active_state().is_none());
    }

    #[test]
    fn stale_active_state_skips_exit_and_update() {
        let (mut scene, id) = single();
        let log: Log = Rc::default();
        scene.add_state(id, "A", logging(&log, "A")).unwrap();
        scene.add_state(id, "B", State::new()).unwrap();
        scene.set_state(id, "A");

        scene.remove_state(id, "A").unwrap();
        scene.tick();
        scene.set_state(id, "B");

        assert_eq!(*log.borrow(), vec!["enter:A"]);
        assert!(scene.machine(id).unwrap().active_state().is_some());
    }

    #[test]
    fn set_state_on_unknown_machine_is_false() {
        let (mut scene, _) = single();
        assert!(!scene.set_state(MachineId(42), "Idle"));
        assert!(!scene.revert_state(MachineId(42)));
    }
}
