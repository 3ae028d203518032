//! The alliance network: one population and its per-cycle engine.
//!
//! A cycle starts by clearing every agent's per-cycle state (alliance,
//! realized learning, pending move) and then runs in four phases:
//!
//! 1. **Score** -- build the expected and congestion-adjusted matrices over
//!    the active agents ([`crate::scoring`]).
//! 2. **Match** -- greedy global-maximum matching on the adjusted matrix,
//!    committing alliances and moves as they are accepted
//!    ([`crate::matching`]).
//! 3. **Realize** -- each allied agent learns what its partner offers from
//!    the agents' final positions, discounted by the congestion around its
//!    final position.
//! 4. **Aggregate** -- report per-agent records and population statistics
//!    to the observer.
//!
//! Between cycles the driver applies exits, breakthroughs, and entries
//! through the `manage_*` methods.

use alliance_agents::{AgentConfig, AgentError, AgentRegistry, SigmaSource, random_position};
use alliance_geometry::{GeometryError, LearningCurve, Mobility, TorusMap};
use alliance_types::{AgentId, AllianceRecord, BreakthroughRecord, MapPoint, NetworkStats};
use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::matching;
use crate::matrix::{MatrixError, ScoreMatrix};
use crate::observer::CycleObserver;
use crate::scoring;

/// Errors that can occur while running the network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// A geometry precondition failed.
    #[error("geometry error: {source}")]
    Geometry {
        /// The underlying geometry error.
        #[from]
        source: GeometryError,
    },

    /// An agent operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A score matrix was accessed out of bounds or had the wrong shape.
    #[error("matrix error: {source}")]
    Matrix {
        /// The underlying matrix error.
        #[from]
        source: MatrixError,
    },

    /// The network parameters are inconsistent.
    #[error("invalid network parameters: {reason}")]
    InvalidParams {
        /// Description of the offending value.
        reason: String,
    },
}

/// Everything the network needs to score, match, and realize a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParams {
    /// Learning potential curve and sigma bounds.
    pub curve: LearningCurve,
    /// Map dimensions.
    pub map: TorusMap,
    /// Movement coefficients.
    pub mobility: Mobility,
    /// Interaction radius for congestion.
    pub radius: f64,
    /// Fraction of learning lost per neighbor inside the radius.
    pub loss_fraction: f64,
    /// Largest accepted score difference, in percent.
    pub fairness_margin_percent: f64,
    /// Agents below this percentage of the average knowledge exit.
    pub exit_margin_percent: f64,
    /// Agent creation parameters and learning margin.
    pub agents: AgentConfig,
}

impl NetworkParams {
    /// Check the scalar parameters not already guarded by their types.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParams`] for a negative radius, a
    /// loss fraction outside `[0, 1]`, a margin outside `[0, 100]`, or
    /// invalid agent parameters, and [`NetworkError::Geometry`] when a
    /// movement coefficient would carry an agent past its partner.
    pub fn validate(&self) -> Result<(), NetworkError> {
        self.curve.require_bounded_step(self.mobility)?;
        if self.radius.is_nan() || self.radius < 0.0 {
            return Err(NetworkError::InvalidParams {
                reason: format!("radius must be non-negative, got {}", self.radius),
            });
        }
        if !(0.0..=1.0).contains(&self.loss_fraction) {
            return Err(NetworkError::InvalidParams {
                reason: format!("loss fraction must be within [0, 1], got {}", self.loss_fraction),
            });
        }
        for (name, value) in [
            ("fairness margin", self.fairness_margin_percent),
            ("exit margin", self.exit_margin_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(NetworkError::InvalidParams {
                    reason: format!("{name} must be within [0, 100], got {value}"),
                });
            }
        }
        self.agents.validate()?;
        Ok(())
    }
}

/// Result of one matching cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// The cycle that ran.
    pub cycle: u64,
    /// Alliances accepted, in the order they were formed.
    pub alliances: Vec<AllianceRecord>,
    /// Aggregates after realization.
    pub stats: NetworkStats,
}

/// A population of agents and the engine that matches them.
pub struct Network {
    registry: AgentRegistry,
    params: NetworkParams,
    sigmas: Box<dyn SigmaSource>,
    cycle: u64,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("agents", &self.registry.len())
            .field("active", &self.registry.active_count())
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl Network {
    /// Create a network of `initial_agents` agents with ids `0..n` and
    /// entry cycle 0, and report them and the cycle-0 aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the parameters are invalid or an agent
    /// cannot be created.
    pub fn new(
        initial_agents: usize,
        params: NetworkParams,
        sigmas: Box<dyn SigmaSource>,
        rng: &mut dyn RngCore,
        observer: &mut dyn CycleObserver,
    ) -> Result<Self, NetworkError> {
        let mut network = Self::from_registry(AgentRegistry::new(), params, sigmas)?;
        network.spawn_agents(initial_agents, rng, observer)?;
        let stats = network.stats();
        observer.on_network(&stats);
        Ok(network)
    }

    /// Wrap an existing population. The cycle counter starts at 0 and no
    /// events are reported.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParams`] if the parameters are invalid.
    pub fn from_registry(
        registry: AgentRegistry,
        params: NetworkParams,
        sigmas: Box<dyn SigmaSource>,
    ) -> Result<Self, NetworkError> {
        params.validate()?;
        Ok(Self {
            registry,
            params,
            sigmas,
            cycle: 0,
        })
    }

    /// The population.
    pub const fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Mutable access to the population.
    pub const fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    /// The network parameters.
    pub const fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// The last cycle run (0 before the first).
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Expected and congestion-adjusted matrices for the current positions.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] on invalid agent state.
    pub fn score(&self) -> Result<(ScoreMatrix, ScoreMatrix), NetworkError> {
        let expected = scoring::expected_matrix(&self.registry, &self.params)?;
        let adjusted = scoring::adjusted_matrix(&self.registry, &self.params, &expected)?;
        Ok((expected, adjusted))
    }

    /// Run one full cycle: reset, score, match, realize, aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] on any failure. The population should be
    /// discarded afterwards.
    pub fn run_cycle(
        &mut self,
        observer: &mut dyn CycleObserver,
    ) -> Result<CycleReport, NetworkError> {
        self.registry.reset_cycle_state();
        self.cycle = self.cycle.saturating_add(1);
        let cycle = self.cycle;

        let (_, mut adjusted) = self.score()?;
        let alliances =
            matching::greedy_match(&mut self.registry, &self.params, &mut adjusted, cycle)?;
        for record in &alliances {
            observer.on_alliance(record);
        }

        self.realize()?;

        for agent in self.registry.iter().filter(|a| a.is_active()) {
            observer.on_agent_cycle(&agent.cycle_record(cycle));
        }
        let stats = self.stats();
        observer.on_network(&stats);
        info!(
            cycle,
            active_agents = stats.active_agents,
            alliances = alliances.len(),
            total_knowledge = stats.total_knowledge,
            average_knowledge = stats.average_knowledge,
            total_realized_learning = stats.total_realized_learning,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle,
            alliances,
            stats,
        })
    }

    /// Credit every allied active agent with what its partner offers at
    /// their final positions, after congestion at the agent's own final
    /// position.
    fn realize(&mut self) -> Result<(), NetworkError> {
        let mut gains = Vec::new();
        for agent in self.registry.iter().filter(|a| a.is_active()) {
            let Some(partner_id) = agent.alliance() else {
                continue;
            };
            let partner = self.registry.agent(partner_id)?;
            let expected = self.params.curve.expected_learning(
                agent.sigma(),
                agent.position(),
                partner.position(),
                &self.params.map,
            )?;
            let factor = scoring::congestion_factor(
                &self.registry,
                &self.params,
                agent.position(),
                agent.id(),
                partner_id,
            )?;
            gains.push((agent.id(), expected * factor));
        }
        for (id, gain) in gains {
            self.registry.agent_mut(id)?.realize_learning(gain)?;
        }
        Ok(())
    }

    /// Aggregates over the active agents, labelled with the current cycle.
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            cycle: self.cycle,
            ..NetworkStats::default()
        };
        let mut count: u32 = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for agent in self.registry.iter().filter(|a| a.is_active()) {
            let knowledge = agent.accumulated_knowledge();
            count = count.saturating_add(1);
            stats.total_knowledge += knowledge;
            stats.total_realized_learning += agent.realized_learning();
            min = min.min(knowledge);
            max = max.max(knowledge);
        }
        if count > 0 {
            let n = f64::from(count);
            stats.active_agents = count;
            stats.average_knowledge = stats.total_knowledge / n;
            stats.average_realized_learning = stats.total_realized_learning / n;
            stats.min_knowledge = min;
            stats.max_knowledge = max;
        }
        stats
    }

    /// Active agents as `(market, knowledge, accumulated_knowledge)` points.
    pub fn map_points(&self) -> Vec<MapPoint> {
        self.registry
            .iter()
            .filter(|a| a.is_active())
            .map(alliance_agents::Agent::map_point)
            .collect()
    }

    /// Mark inactive every active agent whose knowledge is below
    /// `exit_margin_percent` of the current active average. Returns the
    /// agents that left.
    pub fn manage_exit(&mut self, observer: &mut dyn CycleObserver) -> Vec<AgentId> {
        let threshold = self.stats().average_knowledge * self.params.exit_margin_percent / 100.0;
        let cycle = self.cycle;
        let mut exited = Vec::new();
        for agent in self.registry.iter_mut().filter(|a| a.is_active()) {
            if agent.accumulated_knowledge() < threshold {
                agent.exit();
                debug!(cycle, agent = %agent.id(), threshold, "Agent exited");
                observer.on_exit(cycle, agent.id());
                exited.push(agent.id());
            }
        }
        exited
    }

    /// Admit `count` new agents with the next sequential ids and the
    /// current cycle as entry cycle.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Agent`] if an agent cannot be created.
    pub fn manage_entry(
        &mut self,
        count: usize,
        rng: &mut dyn RngCore,
        observer: &mut dyn CycleObserver,
    ) -> Result<Vec<AgentId>, NetworkError> {
        self.spawn_agents(count, rng, observer)
    }

    /// Relocate `count` agents, each chosen uniformly from the whole
    /// population, to fresh uniform positions.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParams`] if the population is empty
    /// while `count > 0`.
    pub fn manage_breakthrough(
        &mut self,
        count: usize,
        rng: &mut dyn RngCore,
        observer: &mut dyn CycleObserver,
    ) -> Result<Vec<BreakthroughRecord>, NetworkError> {
        let mut records = Vec::with_capacity(count);
        if count == 0 {
            return Ok(records);
        }
        let population = self.registry.len();
        if population == 0 {
            return Err(NetworkError::InvalidParams {
                reason: "breakthrough requested on an empty population".to_owned(),
            });
        }
        for _ in 0..count {
            let id = AgentId(rng.random_range(0..population));
            let to = random_position(rng, &self.params.map);
            let agent = self.registry.agent_mut(id)?;
            let from = agent.position();
            agent.relocate(to);
            let record = BreakthroughRecord {
                cycle: self.cycle,
                id,
                from,
                to,
            };
            debug!(
                cycle = self.cycle,
                agent = %id,
                from_market = from.market,
                from_knowledge = from.knowledge,
                to_market = to.market,
                to_knowledge = to.knowledge,
                "Breakthrough"
            );
            observer.on_breakthrough(&record);
            records.push(record);
        }
        Ok(records)
    }

    fn spawn_agents(
        &mut self,
        count: usize,
        rng: &mut dyn RngCore,
        observer: &mut dyn CycleObserver,
    ) -> Result<Vec<AgentId>, NetworkError> {
        let bounds = self.params.curve.sigma_bounds();
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.registry.spawn(
                self.cycle,
                self.sigmas.as_mut(),
                rng,
                &self.params.map,
                &self.params.agents,
                &bounds,
            )?;
            let agent = self.registry.agent(id)?;
            observer.on_agent_entered(&agent.entry());
            observer.on_agent_cycle(&agent.cycle_record(self.cycle));
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use alliance_agents::{Agent, FixedSigma, UniformSigma};
    use alliance_geometry::SigmaBounds;
    use alliance_types::{Position, SigmaPair};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::observer::{NoOpObserver, RecordingObserver};

    fn params() -> NetworkParams {
        let bounds = SigmaBounds::new(0.0, 3.0).unwrap();
        NetworkParams {
            curve: LearningCurve::new(6.0, 9.0, bounds).unwrap(),
            map: TorusMap::square(20.0).unwrap(),
            mobility: Mobility::new(0.05, 0.05).unwrap(),
            radius: 1.0,
            loss_fraction: 0.1,
            fairness_margin_percent: 100.0,
            exit_margin_percent: 50.0,
            agents: AgentConfig::default(),
        }
    }

    fn sigmas() -> Box<dyn SigmaSource> {
        Box::new(FixedSigma(SigmaPair::new(2.0, 2.0)))
    }

    fn placed(agents: &[((f64, f64), f64)]) -> Network {
        placed_with(params(), agents)
    }

    fn placed_with(params: NetworkParams, agents: &[((f64, f64), f64)]) -> Network {
        let mut registry = AgentRegistry::new();
        for (index, &((market, knowledge), accumulated)) in agents.iter().enumerate() {
            let agent = Agent::new(
                AgentId(index),
                0,
                SigmaPair::new(2.0, 2.0),
                Position::new(market, knowledge),
                accumulated,
            )
            .unwrap();
            registry.add(agent).unwrap();
        }
        Network::from_registry(registry, params, sigmas()).unwrap()
    }

    #[test]
    fn new_reports_initial_population() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut recorder = RecordingObserver::new();
        let network = Network::new(
            10,
            params(),
            Box::new(UniformSigma::new(SigmaBounds::new(0.0, 3.0).unwrap())),
            &mut rng,
            &mut recorder,
        )
        .unwrap();
        assert_eq!(network.registry().len(), 10);
        assert_eq!(network.cycle(), 0);
        assert_eq!(recorder.entries.len(), 10);
        assert_eq!(recorder.agent_cycles.len(), 10);
        assert_eq!(recorder.stats.len(), 1);
        assert_eq!(recorder.stats[0].cycle, 0);
        assert_eq!(recorder.stats[0].active_agents, 10);
    }

    #[test]
    fn invalid_params_rejected() {
        let mut bad = params();
        bad.loss_fraction = 1.5;
        assert!(Network::from_registry(AgentRegistry::new(), bad, sigmas()).is_err());
    }

    #[test]
    fn overshooting_mobility_rejected() {
        let mut bad = params();
        bad.mobility = Mobility::new(5.0, 5.0).unwrap();
        assert!(matches!(
            bad.validate(),
            Err(NetworkError::Geometry {
                source: GeometryError::Overshoot { .. }
            })
        ));
        assert!(Network::from_registry(AgentRegistry::new(), bad, sigmas()).is_err());
    }

    #[test]
    fn pair_allies_and_both_learn() {
        let mut network = placed(&[((1.0, 1.0), 1.0), ((4.0, 4.0), 1.0)]);
        let mut recorder = RecordingObserver::new();
        let report = network.run_cycle(&mut recorder).unwrap();

        assert_eq!(report.cycle, 1);
        assert_eq!(report.alliances.len(), 1);
        assert_eq!(recorder.alliances.len(), 1);
        assert_eq!(recorder.agent_cycles.len(), 2);

        // Both moved 0.0833 closer on each axis: distance 2.8333, offset
        // 0.8333, potential 0.8333 * 5.1667 per axis, no neighbors.
        let offset = 3.0 - 2.0 * (3.0 * 0.05 * 5.0 / 9.0) - 2.0;
        let expected = 2.0 * offset * (6.0 - offset);
        for agent in network.registry().iter() {
            assert!((agent.realized_learning() - expected).abs() < 1e-9);
            assert!((agent.accumulated_knowledge() - (1.0 + expected)).abs() < 1e-9);
        }
        assert!((report.stats.total_realized_learning - 2.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn realization_applies_congestion_at_final_position() {
        // With alpha 0.2 each partner moves 1/3 per axis. Agent 2 is
        // 1.06 from agent 0's start (outside the radius) but 0.59 from its
        // final position (1.33, 1.33), and far from agent 1 throughout.
        let mut p = params();
        p.mobility = Mobility::new(0.2, 0.2).unwrap();
        let mut network = placed_with(
            p,
            &[((1.0, 1.0), 1.0), ((4.0, 4.0), 1.0), ((1.75, 1.75), 1.0)],
        );
        let report = network.run_cycle(&mut NoOpObserver).unwrap();
        assert_eq!(report.alliances.len(), 1);

        let first = network.registry().agent(AgentId(0)).unwrap();
        let second = network.registry().agent(AgentId(1)).unwrap();
        assert_eq!(first.alliance(), Some(AgentId(1)));
        assert_eq!(second.alliance(), Some(AgentId(0)));
        assert!(network.registry().agent(AgentId(2)).unwrap().alliance().is_none());

        // Final distance 7/3 per axis: offset 1/3, potential 1/3 * 17/3.
        let offset = 3.0 - 2.0 / 3.0 - 2.0;
        let expected = 2.0 * offset * (6.0 - offset);
        assert!((second.realized_learning() - expected).abs() < 1e-9);
        assert!((first.realized_learning() - expected * 0.9).abs() < 1e-9);
    }

    #[test]
    fn consecutive_cycles_need_no_manual_reset() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut p = params();
        p.map = TorusMap::square(10.0).unwrap();
        let mut network = Network::new(
            40,
            p,
            Box::new(UniformSigma::new(SigmaBounds::new(0.0, 3.0).unwrap())),
            &mut rng,
            &mut NoOpObserver,
        )
        .unwrap();
        let mut formed = 0;
        for cycle in 1..=5_u64 {
            let report = network.run_cycle(&mut NoOpObserver).unwrap();
            assert_eq!(report.cycle, cycle);
            formed += report.alliances.len();
        }
        assert!(formed > 0);
    }

    #[test]
    fn cycle_clears_alliance_left_by_exited_agent() {
        let mut network = placed(&[((1.0, 1.0), 1.0), ((4.0, 4.0), 1.0)]);
        network.run_cycle(&mut NoOpObserver).unwrap();
        assert_eq!(
            network.registry().agent(AgentId(0)).unwrap().alliance(),
            Some(AgentId(1))
        );
        network.registry_mut().get_mut(AgentId(0)).unwrap().exit();

        network.run_cycle(&mut NoOpObserver).unwrap();
        let exited = network.registry().agent(AgentId(0)).unwrap();
        assert!(exited.alliance().is_none());
        assert!(exited.realized_learning().abs() < f64::EPSILON);
        assert!(network.registry().agent(AgentId(1)).unwrap().alliance().is_none());
    }

    #[test]
    fn unallied_agents_keep_their_knowledge() {
        let mut network = placed(&[((1.0, 1.0), 2.0), ((9.0, 9.0), 3.0)]);
        let report = network.run_cycle(&mut NoOpObserver).unwrap();
        assert!(report.alliances.is_empty());
        let knowledge: Vec<f64> = network
            .registry()
            .iter()
            .map(Agent::accumulated_knowledge)
            .collect();
        assert!((knowledge[0] - 2.0).abs() < f64::EPSILON);
        assert!((knowledge[1] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_cover_active_agents_only() {
        let mut network = placed(&[((1.0, 1.0), 2.0), ((9.0, 9.0), 4.0), ((15.0, 3.0), 9.0)]);
        network.registry_mut().get_mut(AgentId(2)).unwrap().exit();
        let stats = network.stats();
        assert_eq!(stats.active_agents, 2);
        assert!((stats.total_knowledge - 6.0).abs() < 1e-12);
        assert!((stats.average_knowledge - 3.0).abs() < 1e-12);
        assert!((stats.min_knowledge - 2.0).abs() < 1e-12);
        assert!((stats.max_knowledge - 4.0).abs() < 1e-12);
    }

    #[test]
    fn stats_of_empty_population_are_zero() {
        let network = placed(&[]);
        assert_eq!(network.stats(), NetworkStats::default());
        assert!(network.map_points().is_empty());
    }

    #[test]
    fn exit_removes_agents_below_margin() {
        // Average 4, margin 50 %: threshold 2.
        let mut network = placed(&[((1.0, 1.0), 1.0), ((9.0, 9.0), 5.0), ((15.0, 3.0), 6.0)]);
        let mut recorder = RecordingObserver::new();
        let exited = network.manage_exit(&mut recorder);
        assert_eq!(exited, vec![AgentId(0)]);
        assert_eq!(recorder.exits, vec![(0, AgentId(0))]);
        assert_eq!(network.registry().active_count(), 2);
        assert_eq!(network.map_points().len(), 2);
    }

    #[test]
    fn entry_appends_sequential_ids() {
        let mut network = placed(&[((1.0, 1.0), 1.0), ((9.0, 9.0), 5.0)]);
        let mut rng = StdRng::seed_from_u64(5);
        network.run_cycle(&mut NoOpObserver).unwrap();
        let ids = network.manage_entry(3, &mut rng, &mut NoOpObserver).unwrap();
        assert_eq!(ids, vec![AgentId(2), AgentId(3), AgentId(4)]);
        for id in ids {
            assert_eq!(network.registry().agent(id).unwrap().entry_cycle(), 1);
        }
    }

    #[test]
    fn breakthrough_relocates_and_reports() {
        let mut network = placed(&[((1.0, 1.0), 1.0), ((9.0, 9.0), 5.0)]);
        let mut rng = StdRng::seed_from_u64(8);
        let mut recorder = RecordingObserver::new();
        let records = network.manage_breakthrough(4, &mut rng, &mut recorder).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(recorder.breakthroughs, records);
        for record in &records {
            assert!(network.params().map.contains(record.to));
        }
        let last = records.last().unwrap();
        assert_eq!(network.registry().agent(last.id).unwrap().position(), last.to);
    }

    #[test]
    fn breakthrough_on_empty_population_fails() {
        let mut network = placed(&[]);
        let mut rng = StdRng::seed_from_u64(8);
        assert!(network.manage_breakthrough(0, &mut rng, &mut NoOpObserver).is_ok());
        assert!(network.manage_breakthrough(1, &mut rng, &mut NoOpObserver).is_err());
    }
}
