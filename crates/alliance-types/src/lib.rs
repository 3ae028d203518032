//! Shared type definitions for the alliance-formation simulation.
//!
//! This crate is the single source of truth for the plain-data types that
//! flow between the geometry, agent, and network crates and out to cycle
//! observers.
//!
//! # Modules
//!
//! - [`ids`] -- The integer agent identifier used as a registry handle
//! - [`structs`] -- Positions, coefficient pairs, and per-cycle records

pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::AgentId;
pub use structs::{
    AgentCycleRecord, AgentEntry, AllianceRecord, BreakthroughRecord, MapPoint, NetworkStats,
    Position, SigmaPair,
};
