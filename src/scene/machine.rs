//! Per-entity state machine data.

use super::MachineId;
use crate::core::{ChangeListener, EntityId, StateId, StateRegistry, TransitionLog};
use std::fmt;

/// Name of the state a machine starts in unless configured otherwise.
pub const DEFAULT_STATE: &str = "Default";

/// Whether a machine has captured its place in the hierarchy yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Attached but not ticked yet; parent and children are not captured.
    Uninitialized,
    /// Hierarchy captured; the machine stays active until its entity is removed.
    Active,
}

/// Hierarchy links captured at activation or on re-scan.
///
/// Links are weak: they name machines by id and a removed machine is simply
/// skipped when the scene resolves it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Links {
    pub(crate) parent: Option<MachineId>,
    pub(crate) children: Vec<MachineId>,
}

/// State machine owned by one entity.
///
/// All mutation goes through [`Scene`](super::Scene), which owns the state
/// arena and the other machines a transition may cascade to.
pub struct StateMachine {
    pub(crate) entity: EntityId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) current: String,
    pub(crate) previous: Option<String>,
    pub(crate) active: Option<StateId>,
    pub(crate) registry: StateRegistry,
    pub(crate) links: Links,
    pub(crate) listeners: Vec<ChangeListener>,
    pub(crate) history: TransitionLog,
}

impl StateMachine {
    pub(crate) fn new(entity: EntityId, initial: impl Into<String>) -> Self {
        Self {
            entity,
            lifecycle: Lifecycle::Uninitialized,
            current: initial.into(),
            previous: None,
            active: None,
            registry: StateRegistry::new(),
            links: Links::default(),
            listeners: Vec::new(),
            history: TransitionLog::new(),
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn current_state_name(&self) -> &str {
        &self.current
    }

    pub fn previous_state_name(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// The active state, if it still matches the registry entry for the
    /// current name.
    ///
    /// A handle whose entry was removed or replaced after it became active is
    /// reported as absent.
    pub fn active_state(&self) -> Option<StateId> {
        self.active
            .filter(|active| self.registry.get(&self.current) == Some(*active))
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn parent(&self) -> Option<MachineId> {
        self.links.parent
    }

    pub fn children(&self) -> &[MachineId] {
        &self.links.children
    }

    pub fn history(&self) -> &TransitionLog {
        &self.history
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("entity", &self.entity)
            .field("lifecycle", &self.lifecycle)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("active", &self.active)
            .field("registry", &self.registry)
            .field("links", &self.links)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
