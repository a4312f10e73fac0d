//! Save and restore the runtime state of a scene.
//!
//! A checkpoint records what the machines have done, not how they are
//! configured: current and previous state names, transition history, and the
//! behavior kinds each state has accumulated. Bindings and callbacks are
//! host objects and are not captured. Restoring expects a scene wired the
//! same way (same machines on the same entities, same states in the arena).

use crate::core::{BehaviorKind, EntityId, StateId, TransitionLog};
use crate::scene::{MachineId, Scene};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Runtime state of one machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineCheckpoint {
    pub machine: MachineId,
    pub entity: EntityId,
    pub current_state: String,
    pub previous_state: Option<String>,
    pub history: TransitionLog,
}

/// Accumulated behavior kinds of one state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    pub state: StateId,
    pub known_kinds: Vec<BehaviorKind>,
}

/// Serializable snapshot of a scene's runtime state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub machines: Vec<MachineCheckpoint>,

    /// Only states that have accumulated at least one kind
    pub states: Vec<StateCheckpoint>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}

impl Scene {
    /// Capture the runtime state of every live machine and every state.
    pub fn checkpoint(&self) -> Checkpoint {
        let machines = self
            .machine_ids()
            .into_iter()
            .filter_map(|id| {
                let machine = self.machine(id)?;
                Some(MachineCheckpoint {
                    machine: id,
                    entity: machine.entity(),
                    current_state: machine.current_state_name().to_string(),
                    previous_state: machine.previous_state_name().map(str::to_string),
                    history: machine.history().clone(),
                })
            })
            .collect();

        let states = self
            .arena()
            .iter()
            .filter(|(_, state)| !state.known_kinds().is_empty())
            .map(|(id, state)| StateCheckpoint {
                state: id,
                known_kinds: state.known_kinds().iter().cloned().collect(),
            })
            .collect();

        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machines,
            states,
        }
    }

    /// Restore runtime state from `checkpoint`.
    ///
    /// The whole checkpoint is checked against the scene before anything
    /// changes. Active states are re-resolved from the restored names without
    /// firing callbacks; behavior flags settle on the next tick. Known kinds
    /// are merged into the existing sets, which only grow.
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        for saved in &checkpoint.machines {
            let machine = self
                .machine(saved.machine)
                .ok_or(CheckpointError::UnknownMachine(saved.machine))?;
            if machine.entity() != saved.entity {
                return Err(CheckpointError::EntityMismatch {
                    machine: saved.machine,
                    expected: saved.entity,
                    found: machine.entity(),
                });
            }
        }
        if let Some(missing) = checkpoint
            .states
            .iter()
            .find(|saved| self.state(saved.state).is_none())
        {
            return Err(CheckpointError::UnknownState(missing.state));
        }

        for saved in &checkpoint.machines {
            if let Some(machine) = self.machine_mut(saved.machine) {
                machine.current = saved.current_state.clone();
                machine.previous = saved.previous_state.clone();
                machine.history = saved.history.clone();
                machine.active = machine.registry.get(&machine.current);
            }
        }
        for saved in &checkpoint.states {
            if let Some(state) = self.state_mut(saved.state) {
                state.restore_kinds(saved.known_kinds.iter().cloned());
            }
        }

        debug!(
            checkpoint = %checkpoint.id,
            machines = checkpoint.machines.len(),
            states = checkpoint.states.len(),
            "checkpoint restored"
        );
        Ok(())
    }
}
