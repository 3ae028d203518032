//! Configuration for agent creation and the learning-margin gate.
//!
//! These values correspond to the `population` and `alliance` sections of
//! `alliance-config.yaml`. The [`AgentConfig`] struct bundles them so the
//! network and tests can override defaults without touching the loader.

use crate::error::AgentError;

/// Parameters for creating agents and gating their alliances.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Lower bound of the uniform initial knowledge draw (default: 0.0).
    pub min_initial_knowledge: f64,

    /// Upper bound of the uniform initial knowledge draw (default: 5.0).
    pub max_initial_knowledge: f64,

    /// Fraction of accumulated knowledge an alliance must offer to pass the
    /// learning-margin gate (default: 0.0, every offer passes).
    pub learning_margin: f64,
}

impl AgentConfig {
    /// Check that the knowledge bounds and margin are usable.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidParameters`] if the initial knowledge
    /// bounds are negative or inverted, or the margin is negative.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.min_initial_knowledge.is_nan() || self.min_initial_knowledge < 0.0 {
            return Err(AgentError::InvalidParameters {
                reason: format!(
                    "min_initial_knowledge must be non-negative, got {}",
                    self.min_initial_knowledge
                ),
            });
        }
        if self.max_initial_knowledge.is_nan()
            || self.max_initial_knowledge < self.min_initial_knowledge
        {
            return Err(AgentError::InvalidParameters {
                reason: format!(
                    "max_initial_knowledge ({}) is below min_initial_knowledge ({})",
                    self.max_initial_knowledge, self.min_initial_knowledge
                ),
            });
        }
        if self.learning_margin.is_nan() || self.learning_margin < 0.0 {
            return Err(AgentError::InvalidParameters {
                reason: format!(
                    "learning_margin must be non-negative, got {}",
                    self.learning_margin
                ),
            });
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            min_initial_knowledge: 0.0,
            max_initial_knowledge: 5.0,
            learning_margin: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let config = AgentConfig {
            min_initial_knowledge: 3.0,
            max_initial_knowledge: 1.0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_margin_rejected() {
        let config = AgentConfig {
            learning_margin: -0.1,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
