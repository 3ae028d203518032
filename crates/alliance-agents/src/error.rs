//! Error types for the alliance-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Every variant indicates a caller or configuration bug; there is no
//! transient failure in agent state handling.

use alliance_geometry::GeometryError;
use alliance_types::AgentId;

/// Errors that can occur during agent state operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// An agent was asked to ally with itself.
    #[error("agent {0} cannot ally with itself")]
    SelfAlliance(AgentId),

    /// An agent already allied with someone else was offered a new partner.
    #[error("agent {agent} is already allied with {partner}")]
    AlreadyAllied {
        /// The agent being re-allied.
        agent: AgentId,
        /// Its current partner.
        partner: AgentId,
    },

    /// Agent with the given ID is not in the registry.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The learning-margin gate was given a negative expected learning.
    #[error("agent {agent}: expected learning must be non-negative, got {value}")]
    NegativeExpectedLearning {
        /// The agent being checked.
        agent: AgentId,
        /// The rejected value.
        value: f64,
    },

    /// Realized learning would decrease accumulated knowledge.
    #[error("agent {agent}: realized learning must be non-negative, got {value}")]
    NegativeLearning {
        /// The agent receiving the learning.
        agent: AgentId,
        /// The rejected value.
        value: f64,
    },

    /// A coefficient supplier produced a sigma outside the configured bounds.
    #[error("agent {agent}: invalid sensitivity coefficients: {source}")]
    InvalidSigma {
        /// The agent being created.
        agent: AgentId,
        /// The underlying bounds violation.
        source: GeometryError,
    },

    /// A position or coefficient failed a geometry check.
    #[error("geometry error: {source}")]
    Geometry {
        /// The underlying geometry error.
        #[from]
        source: GeometryError,
    },

    /// Creation parameters are inconsistent.
    #[error("invalid agent parameters: {reason}")]
    InvalidParameters {
        /// Description of what is wrong.
        reason: String,
    },
}
