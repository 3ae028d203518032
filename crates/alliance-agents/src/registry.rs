//! The agent population.
//!
//! [`AgentRegistry`] owns every agent ever created, active or not, in id
//! order: an agent's [`AgentId`] is its index in the registry and is never
//! reused. Alliance partners are stored as ids and set through
//! [`AgentRegistry::propose_alliance`], which updates both sides at once.

use alliance_geometry::{SigmaBounds, TorusMap};
use alliance_types::{AgentId, Position};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::sigma::SigmaSource;

/// All agents of one simulation run, indexed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    /// An empty population.
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Number of agents ever created, inactive ones included.
    pub const fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent was ever created.
    pub const fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of active agents.
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_active()).count()
    }

    /// The id the next created agent will receive.
    pub const fn next_id(&self) -> AgentId {
        AgentId(self.agents.len())
    }

    /// Iterate over every agent in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Iterate mutably over every agent in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Look up an agent.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Look up an agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// Look up an agent that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] for an unknown id.
    pub fn agent(&self, id: AgentId) -> Result<&Agent, AgentError> {
        self.get(id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Mutable variant of [`AgentRegistry::agent`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] for an unknown id.
    pub fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, AgentError> {
        self.get_mut(id).ok_or(AgentError::AgentNotFound(id))
    }

    /// Append an agent built by the caller. Its id must be the next one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidParameters`] if the id is out of
    /// sequence.
    pub fn add(&mut self, agent: Agent) -> Result<AgentId, AgentError> {
        let expected = self.next_id();
        if agent.id() != expected {
            return Err(AgentError::InvalidParameters {
                reason: format!("agent id {} out of sequence, expected {expected}", agent.id()),
            });
        }
        self.agents.push(agent);
        Ok(expected)
    }

    /// Create an agent with a uniform random position on `map`, uniform
    /// initial knowledge from `config`, and coefficients from `sigmas`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidSigma`] if the supplier hands out a
    /// coefficient outside `bounds`, or [`AgentError::InvalidParameters`]
    /// if `config` is invalid.
    pub fn spawn(
        &mut self,
        entry_cycle: u64,
        sigmas: &mut dyn SigmaSource,
        rng: &mut dyn RngCore,
        map: &TorusMap,
        config: &AgentConfig,
        bounds: &SigmaBounds,
    ) -> Result<AgentId, AgentError> {
        config.validate()?;
        let id = self.next_id();

        let sigma = sigmas.next_sigma(rng);
        bounds
            .require_pair(sigma)
            .map_err(|source| AgentError::InvalidSigma { agent: id, source })?;

        let position = random_position(rng, map);
        let knowledge =
            rng.random_range(config.min_initial_knowledge..=config.max_initial_knowledge);

        let agent = Agent::new(id, entry_cycle, sigma, position, knowledge)?;
        debug!(
            agent = %id,
            entry_cycle,
            market = position.market,
            knowledge_position = position.knowledge,
            accumulated_knowledge = knowledge,
            "Agent created"
        );
        self.add(agent)
    }

    /// Ally `a` with `b`, setting both references at once.
    ///
    /// A no-op if the two are already allied with each other.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::SelfAlliance`] if `a == b`,
    /// [`AgentError::AgentNotFound`] for an unknown id, or
    /// [`AgentError::AlreadyAllied`] if either side has another partner.
    pub fn propose_alliance(&mut self, a: AgentId, b: AgentId) -> Result<(), AgentError> {
        if a == b {
            return Err(AgentError::SelfAlliance(a));
        }
        let current_a = self.agent(a)?.alliance();
        let current_b = self.agent(b)?.alliance();
        if current_a == Some(b) && current_b == Some(a) {
            return Ok(());
        }
        if let Some(partner) = current_a {
            return Err(AgentError::AlreadyAllied { agent: a, partner });
        }
        if let Some(partner) = current_b {
            return Err(AgentError::AlreadyAllied { agent: b, partner });
        }

        self.agent_mut(a)?.set_alliance(b);
        self.agent_mut(b)?.set_alliance(a);
        Ok(())
    }

    /// Clear the per-cycle state of every agent, inactive ones included,
    /// so an agent that left while allied holds no partner reference.
    pub fn reset_cycle_state(&mut self) {
        for agent in &mut self.agents {
            agent.reset();
        }
    }
}

/// A uniform random position in `[0, size)` on each axis.
pub fn random_position(rng: &mut dyn RngCore, map: &TorusMap) -> Position {
    Position::new(
        rng.random_range(0.0..map.market_size),
        rng.random_range(0.0..map.knowledge_size),
    )
}
