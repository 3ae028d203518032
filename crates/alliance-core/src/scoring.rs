//! Score matrices for one cycle.
//!
//! [`expected_matrix`] holds the raw learning every active agent expects
//! from every other active agent. [`adjusted_matrix`] discounts each cell
//! by the congestion around the position the agent would move to if the
//! alliance were formed; matching runs on the adjusted matrix.
//!
//! Both matrices are rebuilt from scratch every cycle and never mutate an
//! agent.

use alliance_agents::{Agent, AgentRegistry};
use alliance_types::{AgentId, Position};

use crate::matrix::ScoreMatrix;
use crate::network::{NetworkError, NetworkParams};

/// Multiplier left after congestion at `at`: `(1 - loss)` compounded once
/// for every active agent within the interaction radius, ignoring
/// `agent` and `partner`.
///
/// # Errors
///
/// Returns [`NetworkError::Geometry`] for an off-map position.
pub fn congestion_factor(
    registry: &AgentRegistry,
    params: &NetworkParams,
    at: Position,
    agent: AgentId,
    partner: AgentId,
) -> Result<f64, NetworkError> {
    let keep = 1.0 - params.loss_fraction;
    let mut factor = 1.0;
    for neighbor in registry.iter().filter(|a| a.is_active()) {
        if neighbor.id() == agent || neighbor.id() == partner {
            continue;
        }
        if params.map.within_radius(at, neighbor.position(), params.radius)? {
            factor *= keep;
        }
    }
    Ok(factor)
}

/// Both agents of an ordered pair, if they are distinct and active.
fn active_pair<'a>(
    registry: &'a AgentRegistry,
    row: AgentId,
    column: AgentId,
) -> Option<(&'a Agent, &'a Agent)> {
    if row == column {
        return None;
    }
    let agent = registry.get(row).filter(|a| a.is_active())?;
    let partner = registry.get(column).filter(|a| a.is_active())?;
    Some((agent, partner))
}

/// Raw expected learning for every ordered pair of distinct active agents.
///
/// # Errors
///
/// Returns [`NetworkError::Geometry`] if an agent has an invalid position
/// or coefficient.
pub fn expected_matrix(
    registry: &AgentRegistry,
    params: &NetworkParams,
) -> Result<ScoreMatrix, NetworkError> {
    let size = registry.len();
    let mut expected = ScoreMatrix::zeros(size);
    for row in (0..size).map(AgentId) {
        for column in (0..size).map(AgentId) {
            let Some((agent, partner)) = active_pair(registry, row, column) else {
                continue;
            };
            let value = params.curve.expected_learning(
                agent.sigma(),
                agent.position(),
                partner.position(),
                &params.map,
            )?;
            expected.set(row, column, value)?;
        }
    }
    Ok(expected)
}

/// Expected learning discounted by the congestion around the position
/// the agent would move to after allying with the column agent.
///
/// # Errors
///
/// Returns [`NetworkError::Matrix`] if `expected` does not span the
/// population, or [`NetworkError::Geometry`] on invalid agent state.
pub fn adjusted_matrix(
    registry: &AgentRegistry,
    params: &NetworkParams,
    expected: &ScoreMatrix,
) -> Result<ScoreMatrix, NetworkError> {
    let size = registry.len();
    expected.require_size(size)?;
    let mut adjusted = ScoreMatrix::zeros(size);
    for (row, column, value) in expected.iter() {
        if value <= 0.0 {
            continue;
        }
        let Some((agent, partner)) = active_pair(registry, row, column) else {
            continue;
        };
        let target = params.curve.next_position(
            agent.position(),
            partner.position(),
            agent.sigma(),
            &params.map,
            params.mobility,
        )?;
        let factor = congestion_factor(registry, params, target, row, column)?;
        adjusted.set(row, column, value * factor)?;
    }
    Ok(adjusted)
}
