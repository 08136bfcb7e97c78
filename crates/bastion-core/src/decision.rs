//! Command source trait and its stock implementations.
//!
//! Each step the simulation asks a [`CommandSource`] what every player
//! wants to do. The source may be an AI planner, a human front end, a
//! network peer or a test script; the simulation does not care and runs
//! every returned [`GameCommand`] through the same validate-then-execute
//! path.

use std::collections::{BTreeMap, VecDeque};

use bastion_kernel::GameCommand;
use bastion_types::PlayerId;
use bastion_world::WorldState;

/// Errors that can occur while collecting commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandSourceError {
    /// The player did not answer in time.
    #[error("player {player} timed out (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The player that timed out.
        player: PlayerId,
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// An internal error in the command source.
    #[error("command source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of player commands.
pub trait CommandSource {
    /// Commands `player` issues against the current world. An empty list
    /// means the player passes this step.
    ///
    /// # Errors
    ///
    /// Returns [`CommandSourceError`] if the source fails outright. A
    /// player that merely has nothing to do returns an empty list.
    fn next_commands(
        &mut self,
        player: PlayerId,
        state: &WorldState,
    ) -> Result<Vec<GameCommand>, CommandSourceError>;
}

/// A source whose players never issue anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleCommandSource;

impl IdleCommandSource {
    /// Create an idle source.
    pub const fn new() -> Self {
        Self
    }
}

impl CommandSource for IdleCommandSource {
    fn next_commands(
        &mut self,
        _player: PlayerId,
        _state: &WorldState,
    ) -> Result<Vec<GameCommand>, CommandSourceError> {
        Ok(Vec::new())
    }
}

/// One queued command and the earliest tick it may be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    at: u64,
    command: GameCommand,
}

/// Replays a fixed per-player queue of commands.
///
/// Commands are released once the world clock reaches their scheduled
/// tick. Commands scheduled for the same tick keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommandSource {
    queues: BTreeMap<PlayerId, VecDeque<Scheduled>>,
}

impl ScriptedCommandSource {
    /// Create an empty script.
    pub const fn new() -> Self {
        Self {
            queues: BTreeMap::new(),
        }
    }

    /// Queue `command` for its issuer, to be released at tick `at` or later.
    pub fn schedule(&mut self, at: u64, command: impl Into<GameCommand>) -> &mut Self {
        let command = command.into();
        let queue = self.queues.entry(command.issuer()).or_default();
        let index = queue.partition_point(|s| s.at <= at);
        queue.insert(index, Scheduled { at, command });
        self
    }

    /// Commands not yet released, over all players.
    pub fn pending(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Whether every scripted command has been released.
    pub fn is_exhausted(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }
}

impl CommandSource for ScriptedCommandSource {
    fn next_commands(
        &mut self,
        player: PlayerId,
        state: &WorldState,
    ) -> Result<Vec<GameCommand>, CommandSourceError> {
        let Some(queue) = self.queues.get_mut(&player) else {
            return Ok(Vec::new());
        };
        let due = queue.partition_point(|s| s.at <= state.current_time);
        Ok(queue.drain(..due).map(|s| s.command).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_kernel::commands::{CancelEntrenchment, Entrench};
    use bastion_types::ArmyId;
    use bastion_world::WorldBuilder;

    use super::*;

    fn world_at(tick: u64) -> WorldState {
        let mut b = WorldBuilder::grass(4, 4).unwrap();
        b.time(tick);
        b.build().unwrap()
    }

    fn entrench(player: PlayerId, army: ArmyId) -> Entrench {
        Entrench { player, army }
    }

    #[test]
    fn idle_source_passes() {
        let mut source = IdleCommandSource::new();
        let commands = source.next_commands(PlayerId::new(), &world_at(0)).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn script_releases_commands_when_due() {
        let (p, army) = (PlayerId::new(), ArmyId::new());
        let mut script = ScriptedCommandSource::new();
        script
            .schedule(10, CancelEntrenchment { player: p, army })
            .schedule(0, entrench(p, army));
        assert_eq!(script.pending(), 2);

        let first = script.next_commands(p, &world_at(5)).unwrap();
        assert_eq!(first, vec![GameCommand::from(entrench(p, army))]);
        assert!(script.next_commands(p, &world_at(9)).unwrap().is_empty());

        let second = script.next_commands(p, &world_at(12)).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.first().map(GameCommand::name), Some("CancelEntrenchment"));
        assert!(script.is_exhausted());
    }

    #[test]
    fn same_tick_commands_keep_their_order() {
        let p = PlayerId::new();
        let armies = [ArmyId::new(), ArmyId::new(), ArmyId::new()];
        let mut script = ScriptedCommandSource::new();
        for army in armies {
            script.schedule(3, entrench(p, army));
        }
        let released = script.next_commands(p, &world_at(3)).unwrap();
        let expected: Vec<GameCommand> = armies.iter().map(|a| entrench(p, *a).into()).collect();
        assert_eq!(released, expected);
    }

    #[test]
    fn players_have_separate_queues() {
        let (a, b) = (PlayerId::new(), PlayerId::new());
        let mut script = ScriptedCommandSource::new();
        script.schedule(0, entrench(a, ArmyId::new()));
        assert!(script.next_commands(b, &world_at(0)).unwrap().is_empty());
        assert_eq!(script.next_commands(a, &world_at(0)).unwrap().len(), 1);
    }
}
