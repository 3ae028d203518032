//! Cycle observers.
//!
//! The network reports what happens during a run through a
//! [`CycleObserver`]: agents entering, per-agent end-of-cycle state,
//! accepted alliances, population aggregates, exits, and breakthroughs.
//! Storage and rendering live behind this trait; the network never
//! depends on them.

use alliance_types::{
    AgentCycleRecord, AgentEntry, AgentId, AllianceRecord, BreakthroughRecord, NetworkStats,
};

/// Receives simulation events as they happen.
///
/// Every method has an empty default so implementations only override
/// what they need.
pub trait CycleObserver {
    /// An agent joined the population (initial or by entry).
    fn on_agent_entered(&mut self, _entry: &AgentEntry) {}

    /// An active agent's state at the end of a cycle.
    fn on_agent_cycle(&mut self, _record: &AgentCycleRecord) {}

    /// An alliance was accepted.
    fn on_alliance(&mut self, _record: &AllianceRecord) {}

    /// Population aggregates for a cycle (cycle 0 is the initial state).
    fn on_network(&mut self, _stats: &NetworkStats) {}

    /// An agent left the population.
    fn on_exit(&mut self, _cycle: u64, _agent: AgentId) {}

    /// An agent was relocated by a breakthrough.
    fn on_breakthrough(&mut self, _record: &BreakthroughRecord) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl CycleObserver for NoOpObserver {}

/// An observer that keeps every event in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingObserver {
    /// Agents that entered, in order.
    pub entries: Vec<AgentEntry>,
    /// Per-agent end-of-cycle records, in order.
    pub agent_cycles: Vec<AgentCycleRecord>,
    /// Accepted alliances, in order.
    pub alliances: Vec<AllianceRecord>,
    /// Per-cycle aggregates, in order.
    pub stats: Vec<NetworkStats>,
    /// Exits as `(cycle, agent)`.
    pub exits: Vec<(u64, AgentId)>,
    /// Breakthrough relocations, in order.
    pub breakthroughs: Vec<BreakthroughRecord>,
}

impl RecordingObserver {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CycleObserver for RecordingObserver {
    fn on_agent_entered(&mut self, entry: &AgentEntry) {
        self.entries.push(*entry);
    }

    fn on_agent_cycle(&mut self, record: &AgentCycleRecord) {
        self.agent_cycles.push(*record);
    }

    fn on_alliance(&mut self, record: &AllianceRecord) {
        self.alliances.push(*record);
    }

    fn on_network(&mut self, stats: &NetworkStats) {
        self.stats.push(*stats);
    }

    fn on_exit(&mut self, cycle: u64, agent: AgentId) {
        self.exits.push((cycle, agent));
    }

    fn on_breakthrough(&mut self, record: &BreakthroughRecord) {
        self.breakthroughs.push(*record);
    }
}
