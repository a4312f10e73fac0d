//! Core data types of the state machine.
//!
//! - Host-facing behavior handles and bindings
//! - State definitions and their lifecycle callbacks
//! - The state arena and per-machine registries
//! - Transition history

mod behavior;
mod callback;
mod history;
mod registry;
mod state;

pub use behavior::{Behavior, BehaviorBinding, BehaviorHandle, BehaviorKind, EntityId, Toggle};
pub use callback::{Callback, Callbacks, ChangeListener, StateChanged};
pub use history::{TransitionLog, TransitionRecord, DEFAULT_HISTORY_LEN};
pub use registry::{StateArena, StateId, StateRegistry};
pub use state::State;
