//! Builder for attaching configured machines to a scene.

use crate::builder::error::BuildError;
use crate::core::{ChangeListener, EntityId, State, StateChanged};
use crate::scene::{MachineId, Scene, DEFAULT_STATE};
use std::collections::HashSet;
use std::rc::Rc;

/// Builder for a machine with its initial state, states and listeners.
///
/// # Example
///
/// ```rust
/// use posture::builder::{MachineBuilder, StateBuilder};
/// use posture::core::{EntityId, Toggle};
/// use posture::scene::Scene;
///
/// let mut scene = Scene::new();
/// scene.insert_entity(EntityId(1), None).unwrap();
///
/// let machine = MachineBuilder::new()
///     .entity(EntityId(1))
///     .initial("Idle")
///     .state("Idle", StateBuilder::new().bind(EntityId(1), "Wander", Toggle::shared(false)))
///     .state("Combat", StateBuilder::new())
///     .build(&mut scene)
///     .unwrap();
///
/// assert_eq!(scene.current_state_name(machine), Some("Idle"));
/// ```
pub struct MachineBuilder {
    entity: Option<EntityId>,
    initial: Option<String>,
    states: Vec<(String, State)>,
    listeners: Vec<ChangeListener>,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self {
            entity: None,
            initial: None,
            states: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Set the owning entity (required).
    pub fn entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Set the initial state name. Defaults to [`DEFAULT_STATE`].
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    pub fn state(mut self, name: impl Into<String>, state: impl Into<State>) -> Self {
        self.states.push((name.into(), state.into()));
        self
    }

    pub fn on_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&mut Scene, &StateChanged) + 'static,
    {
        self.listeners.push(Rc::new(listener));
        self
    }

    /// Attach the machine to `scene` and register its states.
    ///
    /// Validates before touching the scene, so a failed build leaves it
    /// unchanged.
    pub fn build(self, scene: &mut Scene) -> Result<MachineId, BuildError> {
        let entity = self.entity.ok_or(BuildError::MissingEntity)?;

        let mut seen = HashSet::new();
        for (name, _) in &self.states {
            if !seen.insert(name.as_str()) {
                return Err(BuildError::DuplicateState(name.clone()));
            }
        }

        let initial = self.initial.unwrap_or_else(|| DEFAULT_STATE.to_string());
        let machine = scene.attach_machine_in(entity, initial)?;
        for (name, state) in self.states {
            scene.add_state(machine, name, state)?;
        }
        for listener in self.listeners {
            scene.subscribe_rc(machine, listener)?;
        }
        Ok(machine)
    }
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
