//! Configuration error types.

use crate::core::{BehaviorKind, EntityId};
use crate::scene::SceneError;
use thiserror::Error;

/// A single problem found in a [`MachineConfig`](super::MachineConfig).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Initial state name is empty")]
    EmptyInitialState,

    #[error("State at position {index} has an empty name")]
    EmptyStateName { index: usize },

    #[error("State '{name}' is defined more than once")]
    DuplicateState { name: String },

    #[error("Binding {index} of state '{state}' has an empty kind")]
    EmptyKind { state: String, index: usize },

    #[error("No behavior of kind '{kind}' on {entity} (state '{state}')")]
    UnresolvedBehavior {
        state: String,
        entity: EntityId,
        kind: BehaviorKind,
    },
}

/// Failure to apply a configuration to a scene.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Configuration rejected with {} violation(s)", .0.len())]
    Invalid(Vec<ConfigError>),
}
