//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders for states and machines plus the
//! [`behavior_kinds!`](crate::behavior_kinds) macro for declaring kind tags.

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;

use crate::core::{BehaviorHandle, BehaviorKind, EntityId, State};

/// Create a state binding a single behavior.
///
/// # Example
///
/// ```
/// use posture::builder::single_behavior;
/// use posture::core::{EntityId, Toggle};
///
/// let state = single_behavior(EntityId(1), "Patrol", Toggle::shared(false));
/// assert_eq!(state.bindings().len(), 1);
/// ```
pub fn single_behavior(
    entity: EntityId,
    kind: impl Into<BehaviorKind>,
    behavior: BehaviorHandle,
) -> State {
    StateBuilder::new().bind(entity, kind, behavior).build()
}
