//! Multi-cycle behavior of the alliance network.
//!
//! These tests drive seeded populations through many cycles and check the
//! invariants that must hold after every matching phase: alliances are
//! mutual and exclusive, knowledge never decreases, inactive agents never
//! score, and a fixed seed reproduces a run.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeSet;

use alliance_agents::{SigmaSource, UniformSigma};
use alliance_core::{
    Network, NetworkParams, NoOpObserver, RecordingObserver, SimulationConfig, run_replicate,
};
use alliance_types::AgentId;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn params() -> NetworkParams {
    let mut config = SimulationConfig::default();
    // A denser map than the default so alliances and congestion both occur.
    config.map.market_size = 10.0;
    config.map.knowledge_size = 10.0;
    config.network_params().unwrap()
}

fn network(agents: usize, seed: u64) -> (Network, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let p = params();
    let sigmas: Box<dyn SigmaSource> = Box::new(UniformSigma::new(p.curve.sigma_bounds()));
    let network = Network::new(agents, p, sigmas, &mut rng, &mut NoOpObserver).unwrap();
    (network, rng)
}

#[test]
fn alliances_are_mutual_and_exclusive_every_cycle() {
    let (mut network, mut rng) = network(40, 3);
    let mut total = 0;
    for cycle in 1..=30_u64 {
        let mut recorder = RecordingObserver::new();
        let report = network.run_cycle(&mut recorder).unwrap();
        assert_eq!(report.cycle, cycle);

        let mut seen = BTreeSet::new();
        for alliance in &report.alliances {
            assert_ne!(alliance.first, alliance.second);
            assert!(seen.insert(alliance.first), "{} matched twice", alliance.first);
            assert!(seen.insert(alliance.second), "{} matched twice", alliance.second);
        }

        for agent in network.registry().iter() {
            match agent.alliance() {
                Some(partner) => {
                    let back = network.registry().agent(partner).unwrap().alliance();
                    assert_eq!(back, Some(agent.id()));
                    assert!(seen.contains(&agent.id()));
                }
                None => assert!(!seen.contains(&agent.id())),
            }
        }
        total += report.alliances.len();

        network.manage_breakthrough(1, &mut rng, &mut NoOpObserver).unwrap();
    }
    assert!(total > 0, "no alliance formed in 30 cycles");
}

#[test]
fn knowledge_never_decreases() {
    let (mut network, mut rng) = network(30, 11);
    let mut previous: Vec<f64> = network
        .registry()
        .iter()
        .map(|a| a.accumulated_knowledge())
        .collect();

    for _ in 0..25 {
        network.run_cycle(&mut NoOpObserver).unwrap();
        for (agent, before) in network.registry().iter().zip(&previous) {
            assert!(agent.accumulated_knowledge() >= *before);
            assert!(agent.realized_learning() >= 0.0);
            if agent.alliance().is_none() {
                assert!(agent.realized_learning().abs() < f64::EPSILON);
            }
        }
        previous = network
            .registry()
            .iter()
            .map(|a| a.accumulated_knowledge())
            .collect();
        network.manage_breakthrough(2, &mut rng, &mut NoOpObserver).unwrap();
    }
}

#[test]
fn inactive_agent_never_scores() {
    let (mut network, _) = network(6, 5);
    let inactive = AgentId(3);
    network.registry_mut().get_mut(inactive).unwrap().exit();

    let (expected, adjusted) = network.score().unwrap();
    assert_eq!(expected.size(), 6);
    assert_eq!(adjusted.size(), 6);
    for other in (0..6).map(AgentId) {
        assert!(expected.get(inactive, other).unwrap().abs() < f64::EPSILON);
        assert!(expected.get(other, inactive).unwrap().abs() < f64::EPSILON);
        assert!(adjusted.get(inactive, other).unwrap().abs() < f64::EPSILON);
        assert!(adjusted.get(other, inactive).unwrap().abs() < f64::EPSILON);
        assert!(expected.get(other, other).unwrap().abs() < f64::EPSILON);
        assert!(adjusted.get(other, other).unwrap().abs() < f64::EPSILON);
    }

    let report = network.run_cycle(&mut NoOpObserver).unwrap();
    assert!(
        report
            .alliances
            .iter()
            .all(|a| a.first != inactive && a.second != inactive)
    );
    assert_eq!(report.stats.active_agents, 5);
}

#[test]
fn inactive_agents_keep_their_ids() {
    let (mut network, mut rng) = network(4, 9);
    network.registry_mut().get_mut(AgentId(0)).unwrap().exit();
    let ids = network.manage_entry(2, &mut rng, &mut NoOpObserver).unwrap();
    assert_eq!(ids, vec![AgentId(4), AgentId(5)]);
    assert_eq!(network.registry().len(), 6);
    assert_eq!(network.registry().active_count(), 5);
}

#[test]
fn fixed_seed_reproduces_every_event() {
    let mut config = SimulationConfig::default();
    config.run.cycles = 8;
    config.run.initial_agents = 20;
    config.population.entry_enabled = true;
    config.population.entry_rate = 1.0;

    let mut first = RecordingObserver::new();
    let mut second = RecordingObserver::new();
    let a = run_replicate(&config, 1, &mut first).unwrap();
    let b = run_replicate(&config, 1, &mut second).unwrap();
    assert_eq!(a, b);
    assert_eq!(first, second);

    let mut other = RecordingObserver::new();
    run_replicate(&config, 2, &mut other).unwrap();
    assert_ne!(first.entries, other.entries);
}

#[test]
fn per_agent_records_cover_active_agents() {
    let (mut network, _) = network(10, 21);
    network.registry_mut().get_mut(AgentId(7)).unwrap().exit();
    let mut recorder = RecordingObserver::new();
    network.run_cycle(&mut recorder).unwrap();
    assert_eq!(recorder.agent_cycles.len(), 9);
    assert!(recorder.agent_cycles.iter().all(|r| r.id != AgentId(7) && r.cycle == 1));
    assert_eq!(network.map_points().len(), 9);
}
