//! Cycle driver: runs every replicate of a simulation.
//!
//! Each replicate builds a fresh [`Network`] from its own seeded RNG and
//! then, for every cycle:
//!
//! 1. runs the matching cycle (which first clears per-cycle agent state),
//! 2. applies exits (if enabled),
//! 3. samples a Poisson count and relocates that many agents (if
//!    breakthroughs are enabled),
//! 4. admits that many new agents (if entry is enabled).
//!
//! Replicate `r` (1-based) seeds its RNG with `seed + r`, so a fixed seed
//! reproduces every replicate exactly.

use alliance_agents::{QuadrantSigma, SigmaSource, UniformSigma};
use alliance_types::NetworkStats;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, SigmaMode, SimulationConfig};
use crate::network::{Network, NetworkError, NetworkParams};
use crate::observer::CycleObserver;

/// Errors that can occur during a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A replicate failed mid-run.
    #[error("run {run} failed at cycle {cycle}: {source}")]
    Network {
        /// The failing replicate (1-based).
        run: u32,
        /// The cycle in progress.
        cycle: u64,
        /// The underlying network error.
        source: NetworkError,
    },
}

/// Outcome of one replicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Replicate number (1-based).
    pub run: u32,
    /// Seed the replicate's RNG started from.
    pub seed: u64,
    /// Cycles executed.
    pub cycles: u64,
    /// Aggregates after the last cycle.
    pub final_stats: NetworkStats,
    /// Alliances formed over the whole replicate.
    pub alliances: u64,
    /// Breakthrough relocations.
    pub breakthroughs: u64,
    /// Agents admitted after the initial population.
    pub entries: u64,
    /// Agents that exited.
    pub exits: u64,
}

/// Draw from a Poisson distribution with rate `lambda` by multiplying
/// uniforms until the product drops below `e^-lambda`.
///
/// Returns 0 for a non-positive or NaN `lambda`.
pub fn sample_poisson(rng: &mut dyn RngCore, lambda: f64) -> usize {
    if lambda.is_nan() || lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut product: f64 = rng.random();
    let mut count: usize = 0;
    while product > limit {
        count = count.saturating_add(1);
        product *= rng.random::<f64>();
    }
    count
}

/// The coefficient supplier selected by the configuration.
pub fn sigma_source(config: &SimulationConfig, params: &NetworkParams) -> Box<dyn SigmaSource> {
    let bounds = params.curve.sigma_bounds();
    match config.learning.sigma_mode {
        SigmaMode::Uniform => Box::new(UniformSigma::new(bounds)),
        SigmaMode::Quadrant => Box::new(QuadrantSigma::new(bounds)),
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Run replicate `run` of `config`, reporting to `observer`.
///
/// # Errors
///
/// Returns [`RunnerError`] if the configuration is invalid or a cycle
/// fails. A failed replicate is abandoned.
pub fn run_replicate(
    config: &SimulationConfig,
    run: u32,
    observer: &mut dyn CycleObserver,
) -> Result<RunSummary, RunnerError> {
    let params = config.network_params()?;
    let seed = config.run.seed.wrapping_add(u64::from(run));
    let mut rng = StdRng::seed_from_u64(seed);
    let population = &config.population;
    let fail = |cycle: u64| move |source: NetworkError| RunnerError::Network { run, cycle, source };

    info!(
        run,
        seed,
        cycles = config.run.cycles,
        initial_agents = config.run.initial_agents,
        "Run starting"
    );

    let sigmas = sigma_source(config, &params);
    let initial = usize::try_from(config.run.initial_agents).unwrap_or(usize::MAX);
    let mut network =
        Network::new(initial, params, sigmas, &mut rng, observer).map_err(fail(0))?;

    let mut summary = RunSummary {
        run,
        seed,
        cycles: 0,
        final_stats: network.stats(),
        alliances: 0,
        breakthroughs: 0,
        entries: 0,
        exits: 0,
    };

    for cycle in 1..=config.run.cycles {
        let report = network.run_cycle(observer).map_err(fail(cycle))?;
        summary.alliances = summary.alliances.saturating_add(count(report.alliances.len()));

        if population.exit_enabled {
            let exited = network.manage_exit(observer);
            summary.exits = summary.exits.saturating_add(count(exited.len()));
        }

        let events = sample_poisson(&mut rng, population.entry_rate);
        if population.breakthroughs_enabled {
            let moved = network
                .manage_breakthrough(events, &mut rng, observer)
                .map_err(fail(cycle))?;
            summary.breakthroughs = summary.breakthroughs.saturating_add(count(moved.len()));
        }
        if population.entry_enabled {
            let entered = network
                .manage_entry(events, &mut rng, observer)
                .map_err(fail(cycle))?;
            summary.entries = summary.entries.saturating_add(count(entered.len()));
        }

        summary.cycles = cycle;
        summary.final_stats = report.stats;

        if report.stats.active_agents == 0 {
            warn!(run, cycle, "No active agents left");
        }
    }

    info!(
        run,
        cycles = summary.cycles,
        alliances = summary.alliances,
        breakthroughs = summary.breakthroughs,
        entries = summary.entries,
        exits = summary.exits,
        total_knowledge = summary.final_stats.total_knowledge,
        average_knowledge = summary.final_stats.average_knowledge,
        "Run complete"
    );
    Ok(summary)
}

/// Validate `config` and run every replicate in order.
///
/// # Errors
///
/// Returns [`RunnerError`] on invalid configuration or the first failed
/// replicate.
pub fn run_all(
    config: &SimulationConfig,
    observer: &mut dyn CycleObserver,
) -> Result<Vec<RunSummary>, RunnerError> {
    config.validate()?;
    let mut summaries = Vec::new();
    for run in 1..=config.run.runs {
        summaries.push(run_replicate(config, run, observer)?);
    }
    Ok(summaries)
}
