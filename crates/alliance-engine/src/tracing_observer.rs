//! Cycle observer that reports simulation events through `tracing`.
//!
//! Individual events (entries, alliances, exits, breakthroughs) go out at
//! `trace`/`debug`; each cycle aggregate goes out at `debug` tagged with
//! the replicate number and the event counts accumulated since the
//! previous aggregate.

use alliance_core::CycleObserver;
use alliance_types::{
    AgentCycleRecord, AgentEntry, AgentId, AllianceRecord, BreakthroughRecord, NetworkStats,
};
use tracing::{debug, trace};

/// Event counts between two cycle aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounts {
    /// Agents admitted.
    pub entries: u64,
    /// Alliances formed.
    pub alliances: u64,
    /// Agents that exited.
    pub exits: u64,
    /// Breakthrough relocations.
    pub breakthroughs: u64,
}

/// Observer that logs every event with the current replicate number.
#[derive(Debug, Default)]
pub struct TracingObserver {
    run: u32,
    pending: CycleCounts,
}

impl TracingObserver {
    /// Create an observer for replicate 0; call [`Self::start_run`] first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin reporting for replicate `run`.
    pub fn start_run(&mut self, run: u32) {
        self.run = run;
        self.pending = CycleCounts::default();
    }

    /// Events seen since the last aggregate.
    pub const fn pending(&self) -> CycleCounts {
        self.pending
    }
}

impl CycleObserver for TracingObserver {
    fn on_agent_entered(&mut self, entry: &AgentEntry) {
        self.pending.entries = self.pending.entries.saturating_add(1);
        trace!(
            run = self.run,
            agent = %entry.id,
            entry_cycle = entry.entry_cycle,
            sigma_market = entry.sigma.market,
            sigma_knowledge = entry.sigma.knowledge,
            "Agent entered"
        );
    }

    fn on_agent_cycle(&mut self, record: &AgentCycleRecord) {
        trace!(
            run = self.run,
            cycle = record.cycle,
            agent = %record.id,
            market = record.position.market,
            knowledge = record.position.knowledge,
            accumulated_knowledge = record.accumulated_knowledge,
            realized_learning = record.realized_learning,
            "Agent state"
        );
    }

    fn on_alliance(&mut self, record: &AllianceRecord) {
        self.pending.alliances = self.pending.alliances.saturating_add(1);
        trace!(
            run = self.run,
            cycle = record.cycle,
            first = %record.first,
            second = %record.second,
            "Alliance"
        );
    }

    fn on_network(&mut self, stats: &NetworkStats) {
        let counts = std::mem::take(&mut self.pending);
        debug!(
            run = self.run,
            cycle = stats.cycle,
            active_agents = stats.active_agents,
            entries = counts.entries,
            alliances = counts.alliances,
            exits = counts.exits,
            breakthroughs = counts.breakthroughs,
            min_knowledge = stats.min_knowledge,
            max_knowledge = stats.max_knowledge,
            average_realized_learning = stats.average_realized_learning,
            "Cycle aggregate"
        );
    }

    fn on_exit(&mut self, cycle: u64, agent: AgentId) {
        self.pending.exits = self.pending.exits.saturating_add(1);
        debug!(run = self.run, cycle, agent = %agent, "Agent left the network");
    }

    fn on_breakthrough(&mut self, record: &BreakthroughRecord) {
        self.pending.breakthroughs = self.pending.breakthroughs.saturating_add(1);
        trace!(
            run = self.run,
            cycle = record.cycle,
            agent = %record.id,
            from_market = record.from.market,
            from_knowledge = record.from.knowledge,
            to_market = record.to.market,
            to_knowledge = record.to.knowledge,
            "Breakthrough"
        );
    }
}

#[cfg(test)]
mod tests {
    use alliance_types::{Position, SigmaPair};

    use super::*;

    fn stats(cycle: u64) -> NetworkStats {
        NetworkStats {
            cycle,
            active_agents: 2,
            total_knowledge: 4.0,
            average_knowledge: 2.0,
            min_knowledge: 1.0,
            max_knowledge: 3.0,
            total_realized_learning: 0.0,
            average_realized_learning: 0.0,
        }
    }

    #[test]
    fn counts_events_between_aggregates() {
        let mut observer = TracingObserver::new();
        observer.start_run(3);
        observer.on_agent_entered(&AgentEntry {
            id: AgentId(0),
            entry_cycle: 0,
            sigma: SigmaPair::new(1.0, 2.0),
        });
        observer.on_alliance(&AllianceRecord {
            cycle: 1,
            first: AgentId(0),
            second: AgentId(1),
        });
        observer.on_exit(1, AgentId(1));
        observer.on_breakthrough(&BreakthroughRecord {
            cycle: 1,
            id: AgentId(0),
            from: Position::new(1.0, 1.0),
            to: Position::new(2.0, 2.0),
        });
        assert_eq!(
            observer.pending(),
            CycleCounts {
                entries: 1,
                alliances: 1,
                exits: 1,
                breakthroughs: 1,
            }
        );

        observer.on_network(&stats(1));
        assert_eq!(observer.pending(), CycleCounts::default());
    }

    #[test]
    fn start_run_clears_state() {
        let mut observer = TracingObserver::new();
        observer.start_run(1);
        observer.on_network(&stats(4));
        observer.on_exit(4, AgentId(0));
        assert_eq!(observer.pending().exits, 1);
        observer.start_run(2);
        assert_eq!(observer.pending(), CycleCounts::default());
    }
}
