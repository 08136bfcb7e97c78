//! Reactive command source driving the engine's session.
//!
//! Every step the planner looks at each player's starting entities and
//! proposes at most one order per concern: put a barracks down, keep the
//! villagers gathering, train spearmen, and keep the army dug in. The
//! first player additionally sends its army against the second player's
//! once [`ATTACK_AFTER_TICKS`] have passed. Proposals that would be
//! rejected are dropped before they reach the simulation.

use std::collections::{BTreeMap, BTreeSet};

use bastion_core::{CommandSource, CommandSourceError};
use bastion_kernel::commands::{AttackTarget, Entrench, GatherResource, PlaceBuilding, TrainUnits};
use bastion_kernel::{GameCommand, RulesConfig, ValidationContext};
use bastion_types::{ArmyId, BuildingState, BuildingType, PlayerId, Rotation, UnitType};
use bastion_world::{Building, HexPathfinder, StartingIds, StartingPlayer, WorldState};
use tracing::debug;

/// Tick after which the first player attacks.
pub const ATTACK_AFTER_TICKS: u64 = 60;

/// Spearmen a barracks trains before the planner stops queueing.
const SPEARMEN_WANTED: u32 = 6;

/// Largest training batch tried.
const TRAIN_BATCH: u32 = 3;

/// Rings around the town center searched for a barracks site.
const SITE_RINGS: std::ops::RangeInclusive<u32> = 2..=4;

/// Plans orders for the players of a starting world.
#[derive(Debug, Clone)]
pub struct Planner {
    rules: RulesConfig,
    pathfinder: HexPathfinder,
    players: BTreeMap<PlayerId, StartingPlayer>,
    rivals: BTreeMap<PlayerId, ArmyId>,
    attacked: BTreeSet<PlayerId>,
}

impl Planner {
    /// Plan for every player in `ids`. The first player's rival is the
    /// second player's army.
    pub fn new(ids: &StartingIds, rules: RulesConfig) -> Self {
        let players = ids.players.iter().map(|p| (p.player, p.clone())).collect();
        let mut rivals = BTreeMap::new();
        if let (Some(first), Some(second)) = (ids.players.first(), ids.players.get(1)) {
            rivals.insert(first.player, second.army);
        }
        Self {
            rules,
            pathfinder: HexPathfinder,
            players,
            rivals,
            attacked: BTreeSet::new(),
        }
    }

    fn admissible(&self, state: &WorldState, command: &GameCommand) -> bool {
        let ctx = ValidationContext::new(&self.pathfinder, &self.rules);
        match command.validate(state, &ctx) {
            Ok(()) => true,
            Err(failure) => {
                debug!(command = command.name(), %failure, "Planner dropped order");
                false
            }
        }
    }

    fn place_barracks(&self, state: &WorldState, me: &StartingPlayer) -> Option<GameCommand> {
        let town = state.building(me.town_center)?;
        SITE_RINGS
            .flat_map(|ring| {
                town.position
                    .within(ring)
                    .into_iter()
                    .filter(move |hex| hex.distance(town.position) == ring)
            })
            .map(|position| {
                GameCommand::from(PlaceBuilding {
                    player: me.player,
                    building_type: BuildingType::Barracks,
                    position,
                    rotation: Rotation::East,
                    builder: Some(me.villagers),
                })
            })
            .find(|command| self.admissible(state, command))
    }

    fn gather(&self, state: &WorldState, me: &StartingPlayer) -> Option<GameCommand> {
        let group = state.villager_group(me.villagers)?;
        if !group.task.is_idle() || group.path.is_some() {
            return None;
        }
        let command = GameCommand::from(GatherResource {
            player: me.player,
            group: me.villagers,
            resource: me.grove,
        });
        self.admissible(state, &command).then_some(command)
    }

    fn train(&self, state: &WorldState, me: &StartingPlayer, barracks: &Building) -> Option<GameCommand> {
        let trained = barracks.garrison.get(&UnitType::Spearman).copied().unwrap_or(0);
        if barracks.state != BuildingState::Completed
            || !barracks.training_queue.is_empty()
            || trained >= SPEARMEN_WANTED
        {
            return None;
        }
        (1..=TRAIN_BATCH)
            .rev()
            .map(|count| {
                GameCommand::from(TrainUnits {
                    player: me.player,
                    building: barracks.id,
                    unit: UnitType::Spearman,
                    count,
                })
            })
            .find(|command| self.admissible(state, command))
    }

    fn army_order(&mut self, state: &WorldState, me: &StartingPlayer) -> Option<GameCommand> {
        let army = state.army(me.army)?;
        let rival = self
            .rivals
            .get(&me.player)
            .and_then(|id| state.army(*id))
            .filter(|rival| rival.is_alive());

        let due = state.current_time >= ATTACK_AFTER_TICKS && !self.attacked.contains(&me.player);
        if let Some(rival) = rival.filter(|_| due) {
            let command = GameCommand::from(AttackTarget {
                player: me.player,
                army: me.army,
                target: rival.position,
            });
            if self.admissible(state, &command) {
                self.attacked.insert(me.player);
                return Some(command);
            }
        }

        if !army.is_idle() {
            return None;
        }
        let command = GameCommand::from(Entrench {
            player: me.player,
            army: me.army,
        });
        self.admissible(state, &command).then_some(command)
    }
}

/// The player's barracks, if one stands or is going up.
fn own_barracks(state: &WorldState, player: PlayerId) -> Option<&Building> {
    state.buildings().find(|b| {
        b.is_owned_by(player) && b.building_type == BuildingType::Barracks && b.state != BuildingState::Destroyed
    })
}

impl CommandSource for Planner {
    fn next_commands(
        &mut self,
        player: PlayerId,
        state: &WorldState,
    ) -> Result<Vec<GameCommand>, CommandSourceError> {
        let Some(me) = self.players.get(&player).cloned() else {
            return Ok(Vec::new());
        };

        let mut orders = Vec::new();
        match own_barracks(state, player) {
            None => orders.extend(self.place_barracks(state, &me)),
            Some(barracks) => {
                orders.extend(self.gather(state, &me));
                orders.extend(self.train(state, &me, barracks));
            }
        }
        orders.extend(self.army_order(state, &me));
        Ok(orders)
    }
}
