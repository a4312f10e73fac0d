//! Scene error types.

use super::MachineId;
use crate::core::EntityId;
use thiserror::Error;

/// Errors raised while wiring entities and machines into a scene.
///
/// Runtime transitions never produce these: `set_state` reports an unknown
/// state name by returning `false`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("Entity {0} is already part of the scene")]
    DuplicateEntity(EntityId),

    #[error("Unknown machine {0}")]
    UnknownMachine(MachineId),

    #[error("Entity {entity} already has machine {machine}")]
    MachineAlreadyAttached { entity: EntityId, machine: MachineId },

    #[error("Parenting {entity} under {parent} would create a cycle")]
    CycleDetected { entity: EntityId, parent: EntityId },
}
