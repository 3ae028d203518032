//! The agent entity and its state transitions.
//!
//! An [`Agent`] owns its map position, accumulated knowledge, sensitivity
//! coefficients, and the transient state of the current cycle (alliance
//! partner, realized learning, pending next position). Partners are held
//! as [`AgentId`] handles into the [`AgentRegistry`]; the registry is the
//! only place that sets them, so both sides of an alliance always change
//! together.
//!
//! Agents are never removed. [`Agent::exit`] marks an agent inactive and
//! it is skipped by scoring and matching from then on.
//!
//! [`AgentRegistry`]: crate::registry::AgentRegistry

use alliance_types::{AgentCycleRecord, AgentEntry, AgentId, MapPoint, Position, SigmaPair};

use crate::error::AgentError;

/// A firm on the market x knowledge map.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Stable identifier and registry index.
    id: AgentId,
    /// Cycle at which the agent entered the population.
    entry_cycle: u64,
    /// Learning sensitivity per axis, fixed at creation.
    sigma: SigmaPair,
    /// Current map position.
    position: Position,
    /// Knowledge accumulated so far. Never decreases.
    accumulated_knowledge: f64,
    /// Learning realized during the current cycle.
    realized_learning: f64,
    /// Current alliance partner, if any.
    alliance: Option<AgentId>,
    /// Position computed for the current alliance but not yet committed.
    next_position: Option<Position>,
    /// Whether the agent still takes part in scoring and matching.
    active: bool,
}

impl Agent {
    /// Create an active agent with no alliance.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NegativeLearning`] if the initial knowledge is
    /// negative.
    pub fn new(
        id: AgentId,
        entry_cycle: u64,
        sigma: SigmaPair,
        position: Position,
        accumulated_knowledge: f64,
    ) -> Result<Self, AgentError> {
        if accumulated_knowledge.is_nan() || accumulated_knowledge < 0.0 {
            return Err(AgentError::NegativeLearning {
                agent: id,
                value: accumulated_knowledge,
            });
        }
        Ok(Self {
            id,
            entry_cycle,
            sigma,
            position,
            accumulated_knowledge,
            realized_learning: 0.0,
            alliance: None,
            next_position: None,
            active: true,
        })
    }

    /// The agent's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Cycle at which the agent entered.
    pub const fn entry_cycle(&self) -> u64 {
        self.entry_cycle
    }

    /// Sensitivity coefficients.
    pub const fn sigma(&self) -> SigmaPair {
        self.sigma
    }

    /// Current map position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Knowledge accumulated so far.
    pub const fn accumulated_knowledge(&self) -> f64 {
        self.accumulated_knowledge
    }

    /// Learning realized during the current cycle.
    pub const fn realized_learning(&self) -> f64 {
        self.realized_learning
    }

    /// Current alliance partner.
    pub const fn alliance(&self) -> Option<AgentId> {
        self.alliance
    }

    /// Position computed for the current alliance, not yet committed.
    pub const fn pending_position(&self) -> Option<Position> {
        self.next_position
    }

    /// Whether the agent takes part in scoring and matching.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Clear the per-cycle state: realized learning, alliance, and pending
    /// position. Called once per cycle before scoring.
    pub const fn reset(&mut self) {
        self.realized_learning = 0.0;
        self.alliance = None;
        self.next_position = None;
    }

    /// Leave the population. Idempotent.
    pub const fn exit(&mut self) {
        self.active = false;
    }

    /// Proportional-benefit gate: whether `expected` is at least
    /// `margin` times the agent's accumulated knowledge.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NegativeExpectedLearning`] if `expected < 0`.
    pub fn passes_learning_margin(&self, expected: f64, margin: f64) -> Result<bool, AgentError> {
        if expected.is_nan() || expected < 0.0 {
            return Err(AgentError::NegativeExpectedLearning {
                agent: self.id,
                value: expected,
            });
        }
        Ok(expected >= self.accumulated_knowledge * margin)
    }

    /// Record the alliance partner. Only the registry calls this, always
    /// for both sides at once.
    pub(crate) const fn set_alliance(&mut self, partner: AgentId) {
        self.alliance = Some(partner);
    }

    /// Store the position the agent will move to for its alliance.
    pub const fn set_pending_position(&mut self, position: Position) {
        self.next_position = Some(position);
    }

    /// Move to the pending position, if one was computed, and clear it.
    /// Without a pending position this is a no-op.
    pub const fn commit_next_position(&mut self) {
        if let Some(next) = self.next_position.take() {
            self.position = next;
        }
    }

    /// Relocate the agent without an alliance (a breakthrough). Any
    /// pending position is discarded.
    pub const fn relocate(&mut self, position: Position) {
        self.position = position;
        self.next_position = None;
    }

    /// Add this cycle's realized learning to the accumulated knowledge.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NegativeLearning`] if `amount < 0`, which
    /// would break the monotonicity of accumulated knowledge.
    pub fn realize_learning(&mut self, amount: f64) -> Result<(), AgentError> {
        if amount.is_nan() || amount < 0.0 {
            return Err(AgentError::NegativeLearning {
                agent: self.id,
                value: amount,
            });
        }
        self.realized_learning = amount;
        self.accumulated_knowledge += amount;
        Ok(())
    }

    /// Fixed creation data, as reported to observers.
    pub const fn entry(&self) -> AgentEntry {
        AgentEntry {
            id: self.id,
            entry_cycle: self.entry_cycle,
            sigma: self.sigma,
        }
    }

    /// End-of-cycle state for `cycle`, as reported to observers.
    pub const fn cycle_record(&self, cycle: u64) -> AgentCycleRecord {
        AgentCycleRecord {
            cycle,
            id: self.id,
            position: self.position,
            accumulated_knowledge: self.accumulated_knowledge,
            realized_learning: self.realized_learning,
        }
    }

    /// The agent as a visualizer point.
    pub const fn map_point(&self) -> MapPoint {
        MapPoint {
            market: self.position.market,
            knowledge: self.position.knowledge,
            accumulated_knowledge: self.accumulated_knowledge,
        }
    }
}
