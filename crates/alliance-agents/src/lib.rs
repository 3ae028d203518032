//! Agent state, lifecycle, and coefficient suppliers for the alliance simulation.
//!
//! This crate contains the logic layer for agents -- everything that
//! operates on a single agent or on the population registry without
//! scoring or matching. It sits between `alliance-geometry` (pure
//! functions) and `alliance-core` (the per-cycle matching engine).
//!
//! # Modules
//!
//! - [`agent`] -- The [`Agent`] entity and its per-cycle state transitions
//! - [`config`] -- Parameters for agent creation and the learning-margin gate
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`registry`] -- The population ([`AgentRegistry`]): id allocation,
//!   spawning, and mutual alliance references
//! - [`sigma`] -- Per-agent coefficient suppliers ([`SigmaSource`])

pub mod agent;
pub mod config;
pub mod error;
pub mod registry;
pub mod sigma;

// Re-export primary types at crate root for convenience.
pub use agent::Agent;
pub use config::AgentConfig;
pub use error::AgentError;
pub use registry::{AgentRegistry, random_position};
pub use sigma::{FixedSigma, QuadrantSigma, SigmaSource, UniformSigma};
