//! Alliance matching engine and cycle driver for the alliance-formation simulation.
//!
//! This crate owns the per-cycle algorithm: scoring every ordered pair of
//! active agents, greedily matching the best pairs into alliances, moving
//! allied agents toward each other, and crediting the learning they
//! realize. It also loads configuration and drives whole replicates.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `alliance-config.yaml` into
//!   strongly-typed structs.
//! - [`matching`] -- Greedy global-maximum matching with the fairness and
//!   learning-margin acceptance test.
//! - [`matrix`] -- The square [`ScoreMatrix`] indexed by agent id.
//! - [`network`] -- The [`Network`]: one population and its cycle engine.
//! - [`observer`] -- [`CycleObserver`] and its stock implementations.
//! - [`runner`] -- Replicate driver, Poisson event sampling, run summaries.
//! - [`scoring`] -- Expected and congestion-adjusted score matrices.
//!
//! [`ScoreMatrix`]: matrix::ScoreMatrix
//! [`Network`]: network::Network
//! [`CycleObserver`]: observer::CycleObserver

pub mod config;
pub mod matching;
pub mod matrix;
pub mod network;
pub mod observer;
pub mod runner;
pub mod scoring;

pub use config::{ConfigError, LogFormat, SigmaMode, SimulationConfig};
pub use network::{CycleReport, Network, NetworkError, NetworkParams};
pub use observer::{CycleObserver, NoOpObserver, RecordingObserver};
pub use runner::{RunSummary, RunnerError, run_all, run_replicate};
