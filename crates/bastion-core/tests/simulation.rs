//! End-to-end runs of the simulation driver: commands through the kernel,
//! time through the tick hooks.

#![allow(clippy::unwrap_used)]

use bastion_core::config::SessionConfig;
use bastion_core::{ScriptedCommandSource, Simulation, SimulationConfig};
use bastion_kernel::RulesConfig;
use bastion_kernel::commands::{Entrench, GatherResource, PlaceBuilding, Retreat, SendReinforcement, TrainUnits};
use bastion_types::{BuildingState, BuildingType, Hex, ResourceType, Rotation, UnitType};
use bastion_world::{Composition, VillagerTask, WorldBuilder, create_starting_world};

#[test]
fn placed_barracks_is_built_then_trains() {
    let mut b = WorldBuilder::grass(12, 12).unwrap();
    let p = b.player("A");
    b.resource(p, ResourceType::Wood, 400).resource(p, ResourceType::Food, 200);
    let group = b.villagers(Some(p), Hex::new(3, 4), 5);
    let mut sim = Simulation::new(b.build().unwrap(), RulesConfig::default());

    let place = PlaceBuilding {
        player: p,
        building_type: BuildingType::Barracks,
        position: Hex::new(4, 4),
        rotation: Rotation::East,
        builder: None,
    };
    let placed = sim.submit(&place.into()).unwrap();
    assert_eq!(placed.count_kind("ConstructionStarted"), 1);
    let barracks = sim.state().buildings().next().unwrap().id;

    // 50 build ticks shared by 5 builders.
    let built = sim.advance(10).unwrap();
    assert_eq!(built.count_kind("BuildingCompleted"), 1);
    assert_eq!(sim.state().building(barracks).unwrap().state, BuildingState::Completed);
    assert_eq!(sim.state().villager_group(group).unwrap().task, VillagerTask::Idle);

    let train = TrainUnits {
        player: p,
        building: barracks,
        unit: UnitType::Spearman,
        count: 2,
    };
    sim.submit(&train.into()).unwrap();
    let trained = sim.advance(36).unwrap();
    assert_eq!(trained.kinds(), vec!["TrainingCompleted", "GarrisonChanged"]);

    let building = sim.state().building(barracks).unwrap();
    assert_eq!(building.garrison.get(&UnitType::Spearman), Some(&2));
    assert_eq!(sim.state().player(p).unwrap().balance(ResourceType::Wood), 200);
    assert_eq!(sim.receipts().len(), 2);
    assert_eq!(sim.receipts().last().unwrap().sequence, 2);
}

#[test]
fn reinforcement_merges_when_it_arrives() {
    let mut b = WorldBuilder::grass(12, 12).unwrap();
    let p = b.player("A");
    let fort = b.building(Some(p), BuildingType::Fort, Hex::new(1, 1));
    b.garrison(fort, &[(UnitType::Spearman, 10)], 0);
    let army = b.army(Some(p), Hex::new(8, 2), &[(UnitType::Swordsman, 3)]);
    let mut sim = Simulation::new(b.build().unwrap(), RulesConfig::default());

    let send = SendReinforcement {
        player: p,
        building: fort,
        army,
        units: Composition::from([(UnitType::Spearman, 4)]),
    };
    sim.submit(&send.into()).unwrap();
    let arrives_at = sim
        .state()
        .army(army)
        .unwrap()
        .pending_reinforcements
        .values()
        .next()
        .unwrap()
        .arrives_at;

    let before = sim.advance(arrives_at.saturating_sub(1)).unwrap();
    assert_eq!(before.count_kind("ReinforcementArrived"), 0);
    let arrived = sim.advance(1).unwrap();
    assert_eq!(arrived.kinds(), vec!["ReinforcementArrived"]);

    let a = sim.state().army(army).unwrap();
    assert_eq!(a.size(), 7);
    assert!(a.pending_reinforcements.is_empty());
    assert_eq!(sim.state().building(fort).unwrap().garrison_total(), 6);
}

#[test]
fn retreat_ends_next_to_the_home_base() {
    let mut b = WorldBuilder::grass(14, 14).unwrap();
    let p = b.player("A");
    let fort = b.building(Some(p), BuildingType::Fort, Hex::new(2, 2));
    let army = b.army(Some(p), Hex::new(9, 8), &[(UnitType::Spearman, 6)]);
    b.entrenched(army, 0).home_base(army, fort);
    let mut sim = Simulation::new(b.build().unwrap(), RulesConfig::default());

    let started = sim.submit(&Retreat { player: p, army }.into()).unwrap();
    assert_eq!(started.kinds(), vec!["EntrenchmentCancelled", "RetreatStarted"]);
    let steps = sim.state().army(army).unwrap().path.as_ref().unwrap().len();
    let travel = sim.rules().travel_ticks(steps);

    let walked = sim.advance(travel).unwrap();
    assert_eq!(walked.kinds(), vec!["ArmyArrived"]);
    let a = sim.state().army(army).unwrap();
    assert!(!a.retreating);
    assert!(a.retreat_target.is_none());
    assert!(a.is_idle());
    assert!(sim.state().building(fort).unwrap().distance_to(a.position) <= 1);
}

#[test]
fn scripted_session_on_the_starting_world() {
    let config = SimulationConfig::default();
    let (state, ids) = create_starting_world(24, 24, 7, &["Red", "Blue"]).unwrap();
    let red = ids.players.first().unwrap().clone();
    let blue = ids.players.get(1).unwrap().clone();

    let mut script = ScriptedCommandSource::new();
    script
        .schedule(0, GatherResource {
            player: red.player,
            group: red.villagers,
            resource: red.grove,
        })
        .schedule(0, Entrench {
            player: red.player,
            army: red.army,
        })
        .schedule(5, Entrench {
            player: blue.player,
            army: blue.army,
        });

    let mut sim = Simulation::from_config(state, &config);
    let session = SessionConfig {
        max_steps: 10,
        ticks_per_step: 5,
    };
    let summary = sim.run(&mut script, &session).unwrap();

    assert_eq!(summary.steps, 10);
    assert_eq!(summary.final_tick, 50);
    assert_eq!((summary.accepted, summary.rejected), (3, 0));
    assert!(script.is_exhausted());

    let villagers = sim.state().villager_group(red.villagers).unwrap();
    assert_eq!(villagers.task, VillagerTask::Gathering(red.grove));
    assert!(villagers.path.is_none());
    assert!(sim.state().army(red.army).unwrap().is_entrenched());
    assert!(sim.state().army(blue.army).unwrap().is_entrenched());

    let receipt = serde_json::to_value(sim.receipts().first().unwrap()).unwrap();
    assert_eq!(receipt["sequence"], 1);
    assert_eq!(receipt["command"]["command"], "GatherResource");
}
