//! Engine binary for the Bastion simulation.
//!
//! Wires configuration, structured logging, the starting world, and the
//! planner together and runs one bounded session.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$BASTION_CONFIG` (default `bastion-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting world for the configured players
//! 4. Run the planner session for the configured number of steps
//! 5. Log the result

mod error;
mod planner;

use std::path::PathBuf;

use bastion_core::config::LoggingConfig;
use bastion_core::{RunSummary, Simulation, SimulationConfig};
use bastion_types::ResourceType;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::planner::Planner;

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "BASTION_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "bastion-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the config cannot be parsed, the starting world
/// cannot be built, or the session stops early.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("bastion-engine starting");
    let source = loaded_from
        .as_deref()
        .map_or_else(|| "defaults".to_owned(), |path| path.display().to_string());
    info!(source = %source, "Configuration loaded");
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        players = config.world.players.len(),
        "World configuration"
    );

    // 3. Create the starting world.
    let names: Vec<&str> = config.world.players.iter().map(String::as_str).collect();
    let (state, ids) =
        bastion_world::create_starting_world(config.world.width, config.world.height, config.world.seed, &names)?;
    info!(
        players = ids.players.len(),
        buildings = state.buildings().count(),
        armies = state.armies().count(),
        "Starting world created"
    );

    // 4. Run the session.
    let mut planner = Planner::new(&ids, config.rules.clone());
    let mut simulation = Simulation::from_config(state, &config);
    let summary = simulation.run(&mut planner, &config.simulation)?;

    // 5. Log results.
    log_summary(&simulation, &summary);
    info!("bastion-engine shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. JSON output is used when
/// the config asks for it.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}

/// Load the simulation configuration.
///
/// Reads the file named by `BASTION_CONFIG`, or `bastion-config.yaml` in
/// the working directory. A missing file means defaults; the returned
/// path is `None` in that case.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulationConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, None))
    }
}

/// Log the run totals and each player's closing treasury.
fn log_summary(simulation: &Simulation, summary: &RunSummary) {
    info!(
        steps = summary.steps,
        final_tick = summary.final_tick,
        accepted = summary.accepted,
        rejected = summary.rejected,
        receipts = simulation.receipts().len(),
        active_battles = simulation.combat().len(),
        "Session complete"
    );
    for player in simulation.state().players() {
        info!(
            player = player.name,
            food = player.balance(ResourceType::Food),
            wood = player.balance(ResourceType::Wood),
            stone = player.balance(ResourceType::Stone),
            gold = player.balance(ResourceType::Gold),
            population = player.population_used,
            population_cap = player.population_cap,
            "Player summary"
        );
    }
}
