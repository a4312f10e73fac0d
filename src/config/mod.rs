//! Declarative machine configuration.
//!
//! A [`MachineConfig`] names states and the behaviors they bind, by entity and
//! kind. It derives serde traits so hosts can persist it in whatever format
//! their tooling uses; this crate does not pick one.
//!
//! Validation uses Stillwater's `Validation` to report every problem in one
//! pass instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use posture::config::{MachineConfig, StateConfig};
//! use posture::core::EntityId;
//!
//! let config = MachineConfig::new("Idle")
//!     .with_state(StateConfig::new("Idle").bind(EntityId(1), "Wander"))
//!     .with_state(StateConfig::new("Combat").bind(EntityId(1), "Attack"));
//!
//! assert!(config.validate().is_success());
//! ```

mod error;

pub use error::{ConfigError, ConfigureError};

use crate::core::{BehaviorBinding, BehaviorHandle, BehaviorKind, EntityId, State, StateId};
use crate::scene::{MachineId, Scene, SceneError, DEFAULT_STATE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, warn};

type Check = Validation<(), NonEmptyVec<ConfigError>>;

/// A behavior reference inside a state configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub entity: EntityId,
    pub kind: BehaviorKind,
}

/// One named state and the behaviors it binds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    pub name: String,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

impl StateConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, entity: EntityId, kind: impl Into<BehaviorKind>) -> Self {
        self.bindings.push(BindingConfig {
            entity,
            kind: kind.into(),
        });
        self
    }
}

/// Configuration of one machine: its initial state name and its states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub initial_state: String,
    pub states: Vec<StateConfig>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            initial_state: DEFAULT_STATE.to_string(),
            states: Vec::new(),
        }
    }
}

impl MachineConfig {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            initial_state: initial_state.into(),
            states: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: StateConfig) -> Self {
        self.states.push(state);
        self
    }

    /// Check the configuration's structure, accumulating every violation.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        Validation::all_vec(self.checks()).map(|_| ())
    }

    fn checks(&self) -> Vec<Check> {
        let mut checks: Vec<Check> = Vec::new();

        checks.push(if self.initial_state.trim().is_empty() {
            Validation::fail(ConfigError::EmptyInitialState)
        } else {
            Validation::success(())
        });

        let mut seen = HashSet::new();
        for (index, state) in self.states.iter().enumerate() {
            if state.name.trim().is_empty() {
                checks.push(Validation::fail(ConfigError::EmptyStateName { index }));
            } else if !seen.insert(state.name.as_str()) {
                checks.push(Validation::fail(ConfigError::DuplicateState {
                    name: state.name.clone(),
                }));
            }

            for (index, binding) in state.bindings.iter().enumerate() {
                if binding.kind.as_str().trim().is_empty() {
                    checks.push(Validation::fail(ConfigError::EmptyKind {
                        state: state.name.clone(),
                        index,
                    }));
                }
            }
        }

        checks
    }
}

impl Scene {
    /// Apply `config` to `machine`, resolving each binding through `resolve`.
    ///
    /// Nothing is applied unless the whole configuration is valid and every
    /// binding resolves. States are registered in configuration order and
    /// replace same-named entries. The initial state name is applied only to
    /// a machine that has not been activated yet.
    pub fn configure<R>(
        &mut self,
        machine: MachineId,
        config: &MachineConfig,
        mut resolve: R,
    ) -> Result<Vec<StateId>, ConfigureError>
    where
        R: FnMut(&BindingConfig) -> Option<BehaviorHandle>,
    {
        if self.machine(machine).is_none() {
            return Err(SceneError::UnknownMachine(machine).into());
        }

        let mut checks = config.checks();
        let mut resolved = Vec::with_capacity(config.states.len());
        for state in &config.states {
            let mut bindings = Vec::with_capacity(state.bindings.len());
            for binding in &state.bindings {
                match resolve(binding) {
                    Some(handle) => bindings.push(BehaviorBinding::new(
                        binding.entity,
                        binding.kind.clone(),
                        handle,
                    )),
                    None => checks.push(Validation::fail(ConfigError::UnresolvedBehavior {
                        state: state.name.clone(),
                        entity: binding.entity,
                        kind: binding.kind.clone(),
                    })),
                }
            }
            resolved.push((state.name.clone(), bindings));
        }

        if let Validation::Failure(errors) = Validation::all_vec(checks).map(|_| ()) {
            let errors: Vec<ConfigError> = errors.iter().cloned().collect();
            warn!(%machine, violations = errors.len(), "configuration rejected");
            return Err(ConfigureError::Invalid(errors));
        }

        let mut ids = Vec::with_capacity(resolved.len());
        for (name, bindings) in resolved {
            let mut state = State::new();
            for binding in bindings {
                state.bind(binding);
            }
            ids.push(self.add_state(machine, name, state)?);
        }

        if let Some(target) = self.machine_mut(machine) {
            if !target.is_active() {
                target.current = config.initial_state.clone();
            }
        }
        debug!(%machine, states = ids.len(), initial = %config.initial_state, "machine configured");
        Ok(ids)
    }
}
