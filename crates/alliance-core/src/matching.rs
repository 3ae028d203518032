//! Greedy global-maximum alliance matching.
//!
//! Repeatedly take the largest remaining cell of the adjusted matrix and
//! try every cell tied at that value in row-major order. An accepted cell
//! allies its row and column agents, clears both agents' rows and columns
//! so neither is considered again this cycle, and moves both agents
//! toward each other. A rejected cell is zeroed alone. Matching stops when
//! the matrix holds nothing above zero.
//!
//! Every pass zeroes at least one positive cell, so the loop terminates
//! after at most `n^2` passes.

use alliance_agents::AgentRegistry;
use alliance_geometry::difference_percentage;
use alliance_types::{AgentId, AllianceRecord};
use tracing::{debug, trace};

use crate::matrix::ScoreMatrix;
use crate::network::{NetworkError, NetworkParams};

/// Outcome of testing one candidate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both sides score zero; there is no candidate.
    NoCandidate,
    /// The two scores differ by more than the fairness margin.
    Unfair,
    /// One side does not gain enough relative to its knowledge.
    BelowLearningMargin,
    /// The alliance can be formed.
    Accept,
}

/// Decide whether `row` and `column` may ally given their adjusted scores
/// for each other.
///
/// # Errors
///
/// Returns [`NetworkError`] for an unknown agent or a negative score.
pub fn evaluate(
    registry: &AgentRegistry,
    params: &NetworkParams,
    row: AgentId,
    column: AgentId,
    forward: f64,
    backward: f64,
) -> Result<Verdict, NetworkError> {
    if forward <= 0.0 && backward <= 0.0 {
        return Ok(Verdict::NoCandidate);
    }
    if difference_percentage(forward, backward)? > params.fairness_margin_percent {
        return Ok(Verdict::Unfair);
    }
    let margin = params.agents.learning_margin;
    let row_passes = registry.agent(row)?.passes_learning_margin(forward, margin)?;
    let column_passes = registry.agent(column)?.passes_learning_margin(backward, margin)?;
    if row_passes && column_passes {
        Ok(Verdict::Accept)
    } else {
        Ok(Verdict::BelowLearningMargin)
    }
}

/// Commit an accepted alliance: set both references, clear both agents
/// from the matrix, and move each toward the other from their current
/// positions.
fn form_alliance(
    registry: &mut AgentRegistry,
    params: &NetworkParams,
    adjusted: &mut ScoreMatrix,
    row: AgentId,
    column: AgentId,
) -> Result<(), NetworkError> {
    registry.propose_alliance(row, column)?;
    adjusted.clear_agent(row)?;
    adjusted.clear_agent(column)?;

    let first = registry.agent(row)?;
    let second = registry.agent(column)?;
    let first_target = params.curve.next_position(
        first.position(),
        second.position(),
        first.sigma(),
        &params.map,
        params.mobility,
    )?;
    let second_target = params.curve.next_position(
        second.position(),
        first.position(),
        second.sigma(),
        &params.map,
        params.mobility,
    )?;

    for (id, target) in [(row, first_target), (column, second_target)] {
        let agent = registry.agent_mut(id)?;
        agent.set_pending_position(target);
        agent.commit_next_position();
    }
    Ok(())
}

/// Test one cell and either form the alliance or zero the cell.
fn try_alliance(
    registry: &mut AgentRegistry,
    params: &NetworkParams,
    adjusted: &mut ScoreMatrix,
    row: AgentId,
    column: AgentId,
) -> Result<bool, NetworkError> {
    let forward = adjusted.get(row, column)?;
    let backward = adjusted.get(column, row)?;
    let verdict = evaluate(registry, params, row, column, forward, backward)?;
    if verdict == Verdict::Accept {
        form_alliance(registry, params, adjusted, row, column)?;
        Ok(true)
    } else {
        trace!(%row, %column, forward, backward, ?verdict, "Candidate rejected");
        adjusted.set(row, column, 0.0)?;
        Ok(false)
    }
}

/// Run greedy matching over `adjusted` for `cycle`, committing alliances
/// and moves into `registry`. Returns the accepted alliances in the
/// order they were formed.
///
/// `adjusted` is consumed as scratch space and is all zero on return.
///
/// # Errors
///
/// Returns [`NetworkError`] if the matrix does not span the population or
/// an agent update fails.
pub fn greedy_match(
    registry: &mut AgentRegistry,
    params: &NetworkParams,
    adjusted: &mut ScoreMatrix,
    cycle: u64,
) -> Result<Vec<AllianceRecord>, NetworkError> {
    adjusted.require_size(registry.len())?;
    let mut alliances = Vec::new();

    loop {
        let best = adjusted.max();
        if best <= 0.0 {
            break;
        }
        for (row, column) in adjusted.cells_equal_to(best) {
            // An earlier acceptance in this pass may have cleared the cell.
            if adjusted.get(row, column)?.total_cmp(&best).is_ne() {
                continue;
            }
            if try_alliance(registry, params, adjusted, row, column)? {
                debug!(cycle, first = %row, second = %column, score = best, "Alliance formed");
                alliances.push(AllianceRecord {
                    cycle,
                    first: row,
                    second: column,
                });
            }
        }
    }
    Ok(alliances)
}
