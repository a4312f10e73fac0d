//! State storage: the arena that owns every [`State`] and the per-machine
//! registries that name them.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a [`State`] stored in a [`StateArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

/// Owner of every state in a scene.
///
/// Registries hold [`StateId`]s, so a state inserted into several registries
/// is one object with several referents. States are never freed while the
/// arena lives.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<State>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: State) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId(index), state))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    state: StateId,
}

/// Insertion-ordered mapping from state name to [`StateId`].
///
/// Cardinalities are small (states are authored by hand), so lookups scan a
/// vector and iteration order is always the order names were added.
///
/// # Example
///
/// ```rust
/// use posture::core::{State, StateArena, StateRegistry};
///
/// let mut arena = StateArena::new();
/// let idle = arena.insert(State::new());
///
/// let mut registry = StateRegistry::new();
/// assert!(registry.insert_if_absent("Idle", idle));
/// assert!(!registry.insert_if_absent("Idle", idle));
/// assert_eq!(registry.get("Idle"), Some(idle));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateRegistry {
    entries: Vec<Entry>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<StateId> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.state)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace the state under `name`, returning the replaced handle.
    ///
    /// Replacing keeps the entry's position.
    pub fn insert(&mut self, name: impl Into<String>, state: StateId) -> Option<StateId> {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => Some(std::mem::replace(&mut entry.state, state)),
            None => {
                self.entries.push(Entry { name, state });
                None
            }
        }
    }

    /// Insert only when `name` is missing. Returns `true` if inserted.
    pub fn insert_if_absent(&mut self, name: &str, state: StateId) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push(Entry {
            name: name.to_string(),
            state,
        });
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<StateId> {
        let position = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(position).state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StateId)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.state))
    }
}
