//! Builder for state definitions.

use crate::core::{BehaviorBinding, BehaviorHandle, BehaviorKind, EntityId, State};
use crate::scene::{MachineId, Scene};

/// Fluent construction of a [`State`].
///
/// # Example
///
/// ```rust
/// use posture::builder::StateBuilder;
/// use posture::core::{EntityId, Toggle};
///
/// let state = StateBuilder::new()
///     .bind(EntityId(1), "Attack", Toggle::shared(false))
///     .on_enter(|_, _| println!("engaging"))
///     .build();
///
/// assert_eq!(state.bindings().len(), 1);
/// assert_eq!(state.on_enter.len(), 1);
/// ```
#[derive(Default)]
pub struct StateBuilder {
    state: State,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a behavior on `entity`, tagged with `kind`.
    pub fn bind(
        mut self,
        entity: EntityId,
        kind: impl Into<BehaviorKind>,
        behavior: BehaviorHandle,
    ) -> Self {
        self.state.bind(BehaviorBinding::new(entity, kind, behavior));
        self
    }

    pub fn binding(mut self, binding: BehaviorBinding) -> Self {
        self.state.bind(binding);
        self
    }

    pub fn on_enter<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Scene, MachineId) + 'static,
    {
        self.state.on_enter.add(handler);
        self
    }

    pub fn on_update<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Scene, MachineId) + 'static,
    {
        self.state.on_update.add(handler);
        self
    }

    pub fn on_exit<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Scene, MachineId) + 'static,
    {
        self.state.on_exit.add(handler);
        self
    }

    pub fn build(self) -> State {
        self.state
    }
}

impl From<StateBuilder> for State {
    fn from(builder: StateBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Toggle;

    #[test]
    fn builder_collects_bindings_in_order() {
        let state = StateBuilder::new()
            .bind(EntityId(1), "Move", Toggle::shared(false))
            .binding(BehaviorBinding::new(EntityId(2), "Look", Toggle::shared(true)))
            .build();

        let kinds: Vec<_> = state.bindings().iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Move", "Look"]);
    }

    #[test]
    fn builder_registers_each_callback_slot() {
        let state = StateBuilder::new()
            .on_enter(|_, _| {})
            .on_enter(|_, _| {})
            .on_update(|_, _| {})
            .on_exit(|_, _| {})
            .build();

        assert_eq!(state.on_enter.len(), 2);
        assert_eq!(state.on_update.len(), 1);
        assert_eq!(state.on_exit.len(), 1);
    }

    #[test]
    fn empty_builder_yields_empty_state() {
        let state = StateBuilder::new().build();
        assert!(state.bindings().is_empty());
        assert!(state.known_kinds().is_empty());
        assert!(state.on_enter.is_empty());
    }
}
