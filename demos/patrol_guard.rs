//! Patrol Guard
//!
//! This example drives a squad leader and two guards through a patrol,
//! an alarm and a retreat back to patrol.
//!
//! Key concepts:
//! - States bind behaviors and enable only their own each tick
//! - The leader's states are handed down to the guards
//! - A state change on the leader cascades to every guard
//! - Reverting returns to the state before the last change
//!
//! Run with: cargo run --example patrol_guard

use posture::builder::{MachineBuilder, StateBuilder};
use posture::core::{Behavior, EntityId, Toggle};
use posture::scene::{MachineId, Scene};
use posture::behavior_kinds;
use std::rc::Rc;

behavior_kinds! {
    enum GuardKind {
        Patrol,
        Attack,
    }
}

struct Guard {
    name: &'static str,
    patrol: Rc<Toggle>,
    attack: Rc<Toggle>,
}

fn report(scene: &Scene, machines: &[(&str, MachineId)], guards: &[Guard]) {
    for (name, machine) in machines {
        println!(
            "  {:<8} state: {}",
            name,
            scene.current_state_name(*machine).unwrap_or("<none>")
        );
    }
    for guard in guards {
        println!(
            "  {:<8} patrol: {:<5} attack: {}",
            guard.name,
            guard.patrol.is_enabled(),
            guard.attack.is_enabled()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Patrol Guard Example ===\n");

    let leader_entity = EntityId(1);
    let mut scene = Scene::new();
    scene.insert_entity(leader_entity, None)?;

    let guards: Vec<Guard> = ["north", "south"]
        .into_iter()
        .map(|name| Guard {
            name,
            patrol: Toggle::shared(false),
            attack: Toggle::shared(false),
        })
        .collect();

    let mut patrol = StateBuilder::new().on_enter(|_, machine| {
        println!("  [{machine}] patrol route resumed");
    });
    let mut alarm = StateBuilder::new().on_enter(|_, machine| {
        println!("  [{machine}] alarm raised");
    });
    for (index, guard) in guards.iter().enumerate() {
        let entity = EntityId(index as u64 + 2);
        scene.insert_entity(entity, Some(leader_entity))?;
        patrol = patrol.bind(entity, GuardKind::Patrol, guard.patrol.clone());
        alarm = alarm.bind(entity, GuardKind::Attack, guard.attack.clone());
    }

    let leader = MachineBuilder::new()
        .entity(leader_entity)
        .initial("Patrol")
        .state("Patrol", patrol)
        .state("Alarm", alarm)
        .on_change(|_, event| {
            println!(
                "  leader changed: {} -> {}",
                event.previous.as_deref().unwrap_or("<none>"),
                event.state
            );
        })
        .build(&mut scene)?;

    let mut machines = vec![("leader", leader)];
    for (index, guard) in guards.iter().enumerate() {
        let machine = scene.attach_machine(EntityId(index as u64 + 2))?;
        machines.push((guard.name, machine));
    }

    println!("First tick:");
    scene.tick();
    report(&scene, &machines, &guards);

    println!("\nIntruder spotted:");
    scene.set_state(leader, "Alarm");
    scene.tick();
    report(&scene, &machines, &guards);

    println!("\nFalse alarm, reverting:");
    scene.revert_state(leader);
    scene.tick();
    report(&scene, &machines, &guards);

    let history = scene
        .machine(leader)
        .map(|machine| machine.history().path().join(" -> "))
        .unwrap_or_default();
    println!("\nLeader history: {history}");

    println!("\n=== Example Complete ===");
    Ok(())
}
