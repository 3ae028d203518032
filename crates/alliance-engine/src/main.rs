//! Simulation binary for the alliance-formation model.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `alliance-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing) from the `logging` section
//! 3. Validate the configuration
//! 4. Run every replicate with a tracing observer
//! 5. Log each run summary and the cross-run averages

mod error;
mod tracing_observer;

use std::path::Path;

use alliance_core::config::LoggingConfig;
use alliance_core::{LogFormat, RunSummary, SimulationConfig, run_replicate};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::tracing_observer::TracingObserver;

/// File the engine reads its configuration from, relative to the working
/// directory.
const CONFIG_FILE: &str = "alliance-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a replicate fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging depends on the config, so load it first and report the
    // source once the subscriber is installed.
    let (config, from_file) = load_config()?;
    init_tracing(&config.logging);

    info!("alliance-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    config.validate()?;
    info!(
        seed = config.run.seed,
        runs = config.run.runs,
        cycles = config.run.cycles,
        initial_agents = config.run.initial_agents,
        sigma_mode = ?config.learning.sigma_mode,
        breakthroughs = config.population.breakthroughs_enabled,
        entry = config.population.entry_enabled,
        exit = config.population.exit_enabled,
        "Configuration loaded"
    );

    let summaries = run_replicates(&config)?;
    log_averages(&summaries);

    info!("alliance-engine finished");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load `alliance-config.yaml` from the working directory. The flag is
/// false when the file is absent and defaults are used.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Run every replicate in order, logging each summary as JSON.
fn run_replicates(config: &SimulationConfig) -> Result<Vec<RunSummary>, EngineError> {
    let mut observer = TracingObserver::new();
    let mut summaries = Vec::new();
    for run in 1..=config.run.runs {
        observer.start_run(run);
        let summary = run_replicate(config, run, &mut observer)?;
        // Exits, breakthroughs and entries of the last cycle happen after
        // its aggregate was reported.
        let trailing = observer.pending();
        info!(
            run,
            entries = trailing.entries,
            exits = trailing.exits,
            breakthroughs = trailing.breakthroughs,
            "Events after the final aggregate"
        );
        info!(run, summary = %serde_json::to_string(&summary)?, "Run summary");
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Log the mean of the final aggregates over all replicates.
fn log_averages(summaries: &[RunSummary]) {
    let Ok(runs) = u32::try_from(summaries.len()) else {
        return;
    };
    if runs == 0 {
        return;
    }
    let runs_f = f64::from(runs);
    let total_knowledge: f64 = summaries.iter().map(|s| s.final_stats.total_knowledge).sum();
    let average_knowledge: f64 = summaries
        .iter()
        .map(|s| s.final_stats.average_knowledge)
        .sum();
    let active: f64 = summaries
        .iter()
        .map(|s| f64::from(s.final_stats.active_agents))
        .sum();
    info!(
        runs,
        mean_total_knowledge = total_knowledge / runs_f,
        mean_average_knowledge = average_knowledge / runs_f,
        mean_active_agents = active / runs_f,
        "All runs complete"
    );
}
