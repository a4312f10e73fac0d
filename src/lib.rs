//! Posture: hierarchical state machines that toggle entity behaviors
//!
//! A machine is attached to an entity in a scene tree. Each named state holds
//! behavior bindings; entering a state enables its behaviors and the per-frame
//! tick keeps every other state's behaviors disabled, except those whose kind
//! the current state has learned to share. Machines on ancestor and
//! descendant entities form a hierarchy: a state change cascades to all of
//! them, and registered states flow from parent to child each tick.
//!
//! # Core Concepts
//!
//! - **Behavior**: Host-owned component with an enabled flag
//! - **State**: Bindings plus `on_enter`, `on_update` and `on_exit` callbacks
//! - **Scene**: Owner of the entity tree, the state arena and every machine
//! - **Propagation**: Parent states are shared into child registries
//!
//! # Example
//!
//! ```rust
//! use posture::builder::{MachineBuilder, StateBuilder};
//! use posture::core::{Behavior, EntityId, Toggle};
//! use posture::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let squad = EntityId(1);
//! let guard = EntityId(2);
//! scene.insert_entity(squad, None).unwrap();
//! scene.insert_entity(guard, Some(squad)).unwrap();
//!
//! let attack = Toggle::shared(false);
//! let leader = MachineBuilder::new()
//!     .entity(squad)
//!     .state("Combat", StateBuilder::new().bind(guard, "Attack", attack.clone()))
//!     .build(&mut scene)
//!     .unwrap();
//! let follower = scene.attach_machine(guard).unwrap();
//!
//! scene.tick();
//! assert!(scene.state_id(follower, "Combat").is_some());
//!
//! scene.set_state(leader, "Combat");
//! assert!(attack.is_enabled());
//! assert_eq!(scene.current_state_name(follower), Some("Combat"));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod scene;

// Re-export commonly used types
pub use builder::{MachineBuilder, StateBuilder};
pub use checkpoint::Checkpoint;
pub use config::MachineConfig;
pub use core::{Behavior, BehaviorBinding, BehaviorKind, EntityId, State, Toggle};
pub use scene::{MachineId, Scene, SceneError};
