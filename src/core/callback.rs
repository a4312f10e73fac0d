//! Multicast lifecycle callbacks and state-change notifications.
//!
//! Callbacks receive the scene mutably together with the id of the machine
//! that fired them, so a callback may itself call
//! [`Scene::set_state`](crate::scene::Scene::set_state). Such calls nest: the
//! inner transition completes before the outer one resumes, and the outer one
//! then finishes with the values it captured before the callback ran.

use crate::scene::{MachineId, Scene};
use std::fmt;
use std::rc::Rc;

/// A single lifecycle handler.
pub type Callback = Rc<dyn Fn(&mut Scene, MachineId)>;

/// Handler invoked after a machine changes state.
pub type ChangeListener = Rc<dyn Fn(&mut Scene, &StateChanged)>;

/// Event published after a successful transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateChanged {
    pub machine: MachineId,
    pub state: String,
    pub previous: Option<String>,
}

/// An ordered list of handlers fired together.
#[derive(Clone, Default)]
pub struct Callbacks {
    handlers: Vec<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, handler: F)
    where
        F: Fn(&mut Scene, MachineId) + 'static,
    {
        self.handlers.push(Rc::new(handler));
    }

    pub fn push(&mut self, handler: Callback) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Fire every handler in registration order.
    ///
    /// Callers clone the list out of the scene first, which keeps the scene
    /// free to be borrowed mutably by the handlers.
    pub fn invoke(&self, scene: &mut Scene, machine: MachineId) {
        for handler in &self.handlers {
            handler(scene, machine);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
