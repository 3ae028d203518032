//! Integer agent identifiers.
//!
//! Agents are never destroyed, only marked inactive, so an identifier is
//! also the agent's stable index into the population registry. Ids are
//! handed out sequentially starting from zero and are never reused.

use serde::{Deserialize, Serialize};

/// Unique identifier for an agent in the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub usize);

impl AgentId {
    /// Return the registry index this identifier refers to.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for AgentId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}
