//! State definitions: behavior bindings plus lifecycle callbacks.

use super::behavior::{BehaviorBinding, BehaviorKind, EntityId};
use super::callback::Callbacks;
use std::collections::BTreeSet;

/// A named bundle of behavior bindings and lifecycle callbacks.
///
/// The name lives in the registry that points at the state, not in the state
/// itself: after propagation one `State` can be reachable from several
/// machines.
///
/// `known_kinds` is a growing record of behavior kinds this state has
/// enabled while it was current. Ticks only ever add to it, so kinds stay
/// known even after the binding that introduced them is removed.
///
/// # Example
///
/// ```rust
/// use posture::core::{BehaviorBinding, EntityId, State, Toggle};
///
/// let mut idle = State::new();
/// idle.bind(BehaviorBinding::new(EntityId(1), "Wander", Toggle::shared(false)));
/// idle.on_enter.add(|_, _| println!("idle"));
///
/// assert_eq!(idle.bindings().len(), 1);
/// assert!(!idle.knows_kind(&"Wander".into()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct State {
    bindings: Vec<BehaviorBinding>,
    known_kinds: BTreeSet<BehaviorKind>,
    pub on_enter: Callbacks,
    pub on_update: Callbacks,
    pub on_exit: Callbacks,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[BehaviorBinding] {
        &self.bindings
    }

    pub fn bind(&mut self, binding: BehaviorBinding) {
        self.bindings.push(binding);
    }

    /// Remove and return the binding at `index`, if any.
    pub fn unbind(&mut self, index: usize) -> Option<BehaviorBinding> {
        (index < self.bindings.len()).then(|| self.bindings.remove(index))
    }

    /// Remove every binding living on `entity`, returning how many were dropped.
    pub fn unbind_entity(&mut self, entity: EntityId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.entity != entity);
        before - self.bindings.len()
    }

    pub fn known_kinds(&self) -> &BTreeSet<BehaviorKind> {
        &self.known_kinds
    }

    pub fn knows_kind(&self, kind: &BehaviorKind) -> bool {
        self.known_kinds.contains(kind)
    }

    /// Record `kind` as known. Returns `true` if it was new.
    pub(crate) fn record_kind(&mut self, kind: &BehaviorKind) -> bool {
        if self.known_kinds.contains(kind) {
            return false;
        }
        self.known_kinds.insert(kind.clone())
    }

    pub(crate) fn restore_kinds(&mut self, kinds: impl IntoIterator<Item = BehaviorKind>) {
        self.known_kinds.extend(kinds);
    }

    /// Force every bound behavior to `enabled`.
    pub fn set_all_enabled(&self, enabled: bool) {
        for binding in &self.bindings {
            binding.set_enabled(enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Behavior, Toggle};

    #[test]
    fn set_all_enabled_reaches_every_binding() {
        let a = Toggle::shared(false);
        let b = Toggle::shared(false);
        let mut state = State::new();
        state.bind(BehaviorBinding::new(EntityId(1), "Move", a.clone()));
        state.bind(BehaviorBinding::new(EntityId(2), "Attack", b.clone()));

        state.set_all_enabled(true);
        assert!(a.is_enabled() && b.is_enabled());

        state.set_all_enabled(false);
        assert!(!a.is_enabled() && !b.is_enabled());
    }

    #[test]
    fn record_kind_only_grows() {
        let mut state = State::new();
        let kind = BehaviorKind::new("Move");

        assert!(state.record_kind(&kind));
        assert!(!state.record_kind(&kind));
        assert!(state.knows_kind(&kind));
        assert_eq!(state.known_kinds().len(), 1);
    }

    #[test]
    fn known_kinds_survive_unbinding() {
        let mut state = State::new();
        state.bind(BehaviorBinding::new(EntityId(1), "Dash", Toggle::shared(false)));
        state.record_kind(&BehaviorKind::new("Dash"));

        assert!(state.unbind(0).is_some());
        assert!(state.bindings().is_empty());
        assert!(state.knows_kind(&BehaviorKind::new("Dash")));
    }

    #[test]
    fn unbind_out_of_range_is_none() {
        let mut state = State::new();
        assert!(state.unbind(3).is_none());
    }

    #[test]
    fn unbind_entity_drops_matching_bindings() {
        let mut state = State::new();
        state.bind(BehaviorBinding::new(EntityId(1), "Move", Toggle::shared(false)));
        state.bind(BehaviorBinding::new(EntityId(2), "Move", Toggle::shared(false)));
        state.bind(BehaviorBinding::new(EntityId(1), "Look", Toggle::shared(false)));

        assert_eq!(state.unbind_entity(EntityId(1)), 2);
        assert_eq!(state.bindings().len(), 1);
        assert_eq!(state.bindings()[0].entity, EntityId(2));
    }
}
