//! Host-supplied behaviors and the bindings that attach them to states.
//!
//! The crate never creates or destroys behaviors. It only flips their
//! `enabled` flag, so a behavior is modelled as a capability handed in by the
//! host through the [`Behavior`] trait.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Identifier of an entity in the host's scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Explicit tag naming the kind of a behavior.
///
/// Two behaviors with the same kind are treated alike by the enable rule,
/// regardless of identity: if the current state knows the kind, every
/// behavior of that kind is enabled.
///
/// # Example
///
/// ```rust
/// use posture::core::BehaviorKind;
///
/// let kind = BehaviorKind::new("Move");
/// assert_eq!(kind.as_str(), "Move");
/// assert_eq!(kind, BehaviorKind::from("Move"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorKind(String);

impl BehaviorKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BehaviorKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BehaviorKind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A togglable unit of behavior owned by the host.
///
/// Setters take `&self`: the host keeps its own handle to the behavior while
/// the state machine holds a shared one, so implementations use interior
/// mutability.
pub trait Behavior {
    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);
}

/// Shared handle to a host behavior.
pub type BehaviorHandle = Rc<dyn Behavior>;

/// Minimal [`Behavior`] backed by a `Cell<bool>`.
///
/// Useful for hosts whose behaviors only need a flag, and for tests.
///
/// # Example
///
/// ```rust
/// use posture::core::{Behavior, Toggle};
///
/// let toggle = Toggle::shared(false);
/// toggle.set_enabled(true);
/// assert!(toggle.is_enabled());
/// ```
#[derive(Debug, Default)]
pub struct Toggle {
    enabled: Cell<bool>,
}

impl Toggle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Cell::new(enabled),
        }
    }

    pub fn shared(enabled: bool) -> Rc<Self> {
        Rc::new(Self::new(enabled))
    }
}

impl Behavior for Toggle {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

/// A behavior attached to a state: which entity it lives on, its kind tag,
/// and the handle used to toggle it.
#[derive(Clone)]
pub struct BehaviorBinding {
    pub entity: EntityId,
    pub kind: BehaviorKind,
    pub behavior: BehaviorHandle,
}

impl BehaviorBinding {
    pub fn new(entity: EntityId, kind: impl Into<BehaviorKind>, behavior: BehaviorHandle) -> Self {
        Self {
            entity,
            kind: kind.into(),
            behavior,
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.behavior.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.behavior.is_enabled()
    }
}

impl fmt::Debug for BehaviorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorBinding")
            .field("entity", &self.entity)
            .field("kind", &self.kind)
            .field("enabled", &self.behavior.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_starts_with_given_flag() {
        assert!(Toggle::new(true).is_enabled());
        assert!(!Toggle::new(false).is_enabled());
        assert!(!Toggle::default().is_enabled());
    }

    #[test]
    fn binding_toggles_shared_behavior() {
        let toggle = Toggle::shared(false);
        let binding = BehaviorBinding::new(EntityId(1), "Move", toggle.clone());

        binding.set_enabled(true);
        assert!(toggle.is_enabled());
        assert!(binding.is_enabled());

        binding.set_enabled(false);
        assert!(!toggle.is_enabled());
    }

    #[test]
    fn kinds_compare_by_name() {
        assert_eq!(BehaviorKind::new("Move"), BehaviorKind::from("Move".to_string()));
        assert_ne!(BehaviorKind::new("Move"), BehaviorKind::new("Attack"));
    }

    #[test]
    fn kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&BehaviorKind::new("Attack")).unwrap();
        assert_eq!(json, "\"Attack\"");
        let kind: BehaviorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind.as_str(), "Attack");
    }

    #[test]
    fn binding_debug_shows_enabled_flag() {
        let binding = BehaviorBinding::new(EntityId(7), "Move", Toggle::shared(true));
        let rendered = format!("{binding:?}");
        assert!(rendered.contains("enabled: true"));
        assert!(rendered.contains("Move"));
    }
}
