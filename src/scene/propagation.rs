//! Sharing of state definitions between related machines.
//!
//! Propagation only fills gaps: a name a machine already has is never
//! overwritten, so a descendant that customizes a shared name keeps its own
//! definition. Entries are handles into the arena, so an inherited state is
//! the parent's object, not a copy.
//!
//! One pass moves entries one step (parent to machine, machine to its
//! descendants). Entries introduced far away reach distant relatives over
//! several ticks.

use super::{MachineId, Scene};
use crate::core::StateId;
use tracing::trace;

impl Scene {
    /// Run one propagation pass for `machine`.
    ///
    /// 1. Names the parent has and this machine lacks are inherited.
    /// 2. Names this machine has and a descendant lacks are handed down.
    ///
    /// Returns how many registry entries were inserted across all machines.
    pub fn propagate(&mut self, machine: MachineId) -> usize {
        let Some(target) = self.machine(machine) else {
            return 0;
        };
        let parent = target.parent().filter(|parent| *parent != machine);
        let children = target.children().to_vec();
        let mut inserted = 0;

        if let Some(parent) = parent {
            let inherited = self.entries_of(parent);
            if let Some(target) = self.machine_mut(machine) {
                for (name, state) in &inherited {
                    if target.registry.insert_if_absent(name, *state) {
                        trace!(%machine, from = %parent, state = %name, "state inherited");
                        inserted += 1;
                    }
                }
            }
        }

        let offered = self.entries_of(machine);
        for child in children.into_iter().filter(|child| *child != machine) {
            let Some(descendant) = self.machine_mut(child) else {
                continue;
            };
            for (name, state) in &offered {
                if descendant.registry.insert_if_absent(name, *state) {
                    trace!(%machine, to = %child, state = %name, "state handed down");
                    inserted += 1;
                }
            }
        }

        inserted
    }

    fn entries_of(&self, machine: MachineId) -> Vec<(String, StateId)> {
        self.machine(machine)
            .map(|m| {
                m.registry
                    .iter()
                    .map(|(name, state)| (name.to_string(), state))
                    .collect()
            })
            .unwrap_or_default()
    }
}
