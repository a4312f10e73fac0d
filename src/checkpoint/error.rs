//! Checkpoint error types.

use crate::core::{EntityId, StateId};
use crate::scene::MachineId;
use thiserror::Error;

/// Errors raised while encoding, decoding or restoring a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Encoding checkpoint failed: {0}")]
    Encode(String),

    #[error("Decoding checkpoint failed: {0}")]
    Decode(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Checkpoint names {0}, which is not in the scene")]
    UnknownMachine(MachineId),

    #[error("Checkpoint expects {machine} on {expected}, scene has it on {found}")]
    EntityMismatch {
        machine: MachineId,
        expected: EntityId,
        found: EntityId,
    },

    #[error("Checkpoint names {0}, which is not in the scene's arena")]
    UnknownState(StateId),
}
