//! Core value types shared across the workspace.
//!
//! Positions live on a torus whose two axes are the market axis and the
//! knowledge axis. Everything here is plain data: validation happens in
//! the crates that consume these values.

use serde::{Deserialize, Serialize};

use crate::ids::AgentId;

// ---------------------------------------------------------------------------
// Map coordinates
// ---------------------------------------------------------------------------

/// A point on the market x knowledge map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Coordinate on the market axis.
    pub market: f64,
    /// Coordinate on the knowledge axis.
    pub knowledge: f64,
}

impl Position {
    /// Create a position from its two coordinates.
    pub const fn new(market: f64, knowledge: f64) -> Self {
        Self { market, knowledge }
    }
}

/// Per-agent learning sensitivity along each axis.
///
/// Larger values shift the agent's most productive partner distance
/// further away ("explorer"); smaller values keep it close ("exploiter").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaPair {
    /// Sensitivity on the market axis.
    pub market: f64,
    /// Sensitivity on the knowledge axis.
    pub knowledge: f64,
}

impl SigmaPair {
    /// Create a coefficient pair.
    pub const fn new(market: f64, knowledge: f64) -> Self {
        Self { market, knowledge }
    }
}

// ---------------------------------------------------------------------------
// Observer records
// ---------------------------------------------------------------------------

/// Fixed data for an agent, reported once when it enters the population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    /// The agent's identifier.
    pub id: AgentId,
    /// Cycle at which the agent entered.
    pub entry_cycle: u64,
    /// The agent's learning sensitivity coefficients.
    pub sigma: SigmaPair,
}

/// Per-agent state at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentCycleRecord {
    /// The cycle being reported.
    pub cycle: u64,
    /// The agent.
    pub id: AgentId,
    /// Map position after any alliance move.
    pub position: Position,
    /// Knowledge accumulated so far.
    pub accumulated_knowledge: f64,
    /// Learning realized during this cycle.
    pub realized_learning: f64,
}

/// An accepted alliance between two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceRecord {
    /// The cycle in which the alliance was formed.
    pub cycle: u64,
    /// The agent whose score cell was accepted.
    pub first: AgentId,
    /// Its partner.
    pub second: AgentId,
}

/// An exogenous relocation of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakthroughRecord {
    /// The cycle in which the breakthrough happened.
    pub cycle: u64,
    /// The relocated agent.
    pub id: AgentId,
    /// Position before the breakthrough.
    pub from: Position,
    /// Position after the breakthrough.
    pub to: Position,
}

/// Population-level aggregates for one cycle.
///
/// Knowledge figures cover active agents only. When no agent is active
/// every figure is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkStats {
    /// The cycle being reported (0 for the initial population).
    pub cycle: u64,
    /// Number of active agents.
    pub active_agents: u32,
    /// Sum of accumulated knowledge.
    pub total_knowledge: f64,
    /// Mean accumulated knowledge.
    pub average_knowledge: f64,
    /// Smallest accumulated knowledge.
    pub min_knowledge: f64,
    /// Largest accumulated knowledge.
    pub max_knowledge: f64,
    /// Sum of learning realized this cycle.
    pub total_realized_learning: f64,
    /// Mean learning realized this cycle.
    pub average_realized_learning: f64,
}

/// One active agent as handed to a map visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Market coordinate.
    pub market: f64,
    /// Knowledge coordinate.
    pub knowledge: f64,
    /// Accumulated knowledge (drives the marker size).
    pub accumulated_knowledge: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_stats_serialize_with_field_names() {
        let stats = NetworkStats {
            cycle: 3,
            active_agents: 2,
            ..NetworkStats::default()
        };
        let json = serde_json::to_value(stats);
        assert!(json.is_ok());
        if let Ok(json) = json {
            assert_eq!(json.get("cycle").and_then(serde_json::Value::as_u64), Some(3));
            assert_eq!(
                json.get("active_agents").and_then(serde_json::Value::as_u64),
                Some(2)
            );
        }
    }

    #[test]
    fn alliance_record_deserializes() {
        let parsed: Result<AllianceRecord, _> =
            serde_json::from_str(r#"{"cycle":1,"first":4,"second":9}"#);
        assert!(parsed.is_ok());
        if let Ok(record) = parsed {
            assert_eq!(record.first, AgentId(4));
            assert_eq!(record.second, AgentId(9));
        }
    }
}
