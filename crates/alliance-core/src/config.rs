//! Configuration loading and typed config structures for the alliance simulation.
//!
//! The canonical configuration lives in `alliance-config.yaml` at the
//! project root. The structs here mirror its sections; every field has a
//! default so a partial (or empty) document is valid.
//! [`SimulationConfig::validate`] checks cross-field constraints after
//! parsing, and [`SimulationConfig::network_params`] turns the numeric
//! sections into the validated parameter bundle the network runs on.

use std::path::Path;

use alliance_agents::AgentConfig;
use alliance_geometry::{LearningCurve, Mobility, SigmaBounds, TorusMap, peak_potential};
use serde::Deserialize;
use tracing::warn;

use crate::network::NetworkParams;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but a value is unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Description of the offending value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `alliance-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Replicate count, cycle count, seed, and initial population.
    #[serde(default)]
    pub run: RunConfig,

    /// Map dimensions.
    #[serde(default)]
    pub map: MapConfig,

    /// Learning curve and movement parameters.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Interaction radius and loss per neighbor.
    #[serde(default)]
    pub congestion: CongestionConfig,

    /// Alliance acceptance margins.
    #[serde(default)]
    pub alliance: AllianceConfig,

    /// Initial knowledge and exogenous population events.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every value the simulation depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.runs == 0 {
            return Err(invalid("run.runs must be at least 1"));
        }
        if self.run.cycles == 0 {
            return Err(invalid("run.cycles must be at least 1"));
        }
        if self.run.initial_agents % 2 != 0 {
            return Err(invalid(format!(
                "run.initial_agents must be even, got {}",
                self.run.initial_agents
            )));
        }
        require_range(
            "congestion.loss_percent",
            self.congestion.loss_percent,
            0.0,
            100.0,
        )?;
        require_range(
            "alliance.fairness_margin_percent",
            self.alliance.fairness_margin_percent,
            0.0,
            100.0,
        )?;
        require_range(
            "population.exit_margin_percent",
            self.population.exit_margin_percent,
            0.0,
            100.0,
        )?;
        if self.population.entry_rate.is_nan() || self.population.entry_rate < 0.0 {
            return Err(invalid(format!(
                "population.entry_rate must be non-negative, got {}",
                self.population.entry_rate
            )));
        }
        // Building the parameter bundle runs the remaining geometry and
        // agent checks.
        self.network_params().map(|_| ())
    }

    /// The validated parameter bundle for [`Network`](crate::network::Network).
    ///
    /// Logs a warning when `max_tip` differs from the peak of the curve
    /// for `beta`; the configured value is still used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for non-positive map sizes, alphas,
    /// `beta` or `max_tip`, an alpha large enough for a move to pass the
    /// partner (`alpha * beta^2/4 / max_tip > 1`), an empty sigma interval,
    /// a negative radius, or invalid agent parameters.
    pub fn network_params(&self) -> Result<NetworkParams, ConfigError> {
        let learning = &self.learning;
        let map = TorusMap::new(self.map.market_size, self.map.knowledge_size)
            .map_err(|e| invalid(format!("map: {e}")))?;
        let bounds = SigmaBounds::new(learning.min_sigma, learning.max_sigma)
            .map_err(|e| invalid(format!("learning sigma bounds: {e}")))?;
        let curve = LearningCurve::new(learning.beta, learning.max_tip, bounds)
            .map_err(|e| invalid(format!("learning curve: {e}")))?;
        let mobility = Mobility::new(learning.alpha_market, learning.alpha_knowledge)
            .map_err(|e| invalid(format!("learning alphas: {e}")))?;

        let peak = peak_potential(learning.beta);
        if (peak - learning.max_tip).abs() > 1e-9 {
            warn!(
                beta = learning.beta,
                max_tip = learning.max_tip,
                expected = peak,
                "max_tip differs from beta^2/4; movement steps are scaled by the configured value"
            );
        }

        let params = NetworkParams {
            curve,
            map,
            mobility,
            radius: self.congestion.radius,
            loss_fraction: self.congestion.loss_percent / 100.0,
            fairness_margin_percent: self.alliance.fairness_margin_percent,
            exit_margin_percent: self.population.exit_margin_percent,
            agents: self.agent_config(),
        };
        params
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(params)
    }

    /// Agent creation parameters from the `population` and `alliance`
    /// sections.
    pub const fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            min_initial_knowledge: self.population.min_initial_knowledge,
            max_initial_knowledge: self.population.max_initial_knowledge,
            learning_margin: self.alliance.learning_margin,
        }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

fn require_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [{min}, {max}], got {value}")))
    }
}

/// Replicate and population-size settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Base random seed; replicate `r` uses `seed + r`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of independent replicates.
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Cycles per replicate.
    #[serde(default = "default_cycles")]
    pub cycles: u64,

    /// Agents created at the start of each replicate. Must be even.
    #[serde(default = "default_initial_agents")]
    pub initial_agents: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            runs: default_runs(),
            cycles: default_cycles(),
            initial_agents: default_initial_agents(),
        }
    }
}

/// Map dimensions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Circumference of the market axis.
    #[serde(default = "default_map_size")]
    pub market_size: f64,

    /// Circumference of the knowledge axis.
    #[serde(default = "default_map_size")]
    pub knowledge_size: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            market_size: default_map_size(),
            knowledge_size: default_map_size(),
        }
    }
}

/// How new agents receive their sensitivity coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigmaMode {
    /// Both coefficients uniform over the whole interval.
    #[default]
    Uniform,
    /// Agents rotate through the four quadrants of the sigma square.
    Quadrant,
}

/// Learning curve and movement parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LearningConfig {
    /// Shape constant of the potential parabola.
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Peak of the potential parabola, normally `beta^2 / 4`.
    #[serde(default = "default_max_tip")]
    pub max_tip: f64,

    /// Movement coefficient on the market axis.
    #[serde(default = "default_alpha")]
    pub alpha_market: f64,

    /// Movement coefficient on the knowledge axis.
    #[serde(default = "default_alpha")]
    pub alpha_knowledge: f64,

    /// Exclusive lower bound of the sensitivity coefficients.
    #[serde(default = "default_min_sigma")]
    pub min_sigma: f64,

    /// Exclusive upper bound of the sensitivity coefficients.
    #[serde(default = "default_max_sigma")]
    pub max_sigma: f64,

    /// Coefficient supplier for new agents.
    #[serde(default)]
    pub sigma_mode: SigmaMode,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            beta: default_beta(),
            max_tip: default_max_tip(),
            alpha_market: default_alpha(),
            alpha_knowledge: default_alpha(),
            min_sigma: default_min_sigma(),
            max_sigma: default_max_sigma(),
            sigma_mode: SigmaMode::default(),
        }
    }
}

/// Congestion loss parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CongestionConfig {
    /// Interaction radius around a position.
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Percentage of learning lost per neighbor inside the radius.
    #[serde(default = "default_loss_percent")]
    pub loss_percent: f64,
}

impl Default for CongestionConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            loss_percent: default_loss_percent(),
        }
    }
}

/// Alliance acceptance margins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AllianceConfig {
    /// Largest accepted difference between the two sides' scores, in
    /// percent of the larger one. 100 disables the check.
    #[serde(default = "default_fairness_margin_percent")]
    pub fairness_margin_percent: f64,

    /// Fraction of accumulated knowledge an alliance must offer each side.
    #[serde(default)]
    pub learning_margin: f64,
}

impl Default for AllianceConfig {
    fn default() -> Self {
        Self {
            fairness_margin_percent: default_fairness_margin_percent(),
            learning_margin: 0.0,
        }
    }
}

/// Initial knowledge and exogenous population events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Lower bound of the initial knowledge draw.
    #[serde(default)]
    pub min_initial_knowledge: f64,

    /// Upper bound of the initial knowledge draw.
    #[serde(default = "default_max_initial_knowledge")]
    pub max_initial_knowledge: f64,

    /// Poisson rate of breakthroughs and entries per cycle.
    #[serde(default = "default_entry_rate")]
    pub entry_rate: f64,

    /// Whether agents are relocated by breakthroughs.
    #[serde(default = "default_true")]
    pub breakthroughs_enabled: bool,

    /// Whether new agents enter after each cycle.
    #[serde(default)]
    pub entry_enabled: bool,

    /// Whether low-knowledge agents leave after each cycle.
    #[serde(default)]
    pub exit_enabled: bool,

    /// Agents below this percentage of the average knowledge exit.
    #[serde(default)]
    pub exit_margin_percent: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            min_initial_knowledge: 0.0,
            max_initial_knowledge: default_max_initial_knowledge(),
            entry_rate: default_entry_rate(),
            breakthroughs_enabled: true,
            entry_enabled: false,
            exit_enabled: false,
            exit_margin_percent: 0.0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_runs() -> u32 {
    5
}

const fn default_cycles() -> u64 {
    500
}

const fn default_initial_agents() -> u32 {
    100
}

const fn default_map_size() -> f64 {
    20.0
}

const fn default_beta() -> f64 {
    4.0
}

const fn default_max_tip() -> f64 {
    4.0
}

const fn default_alpha() -> f64 {
    0.2
}

const fn default_min_sigma() -> f64 {
    0.0
}

const fn default_max_sigma() -> f64 {
    3.0
}

const fn default_radius() -> f64 {
    1.0
}

const fn default_loss_percent() -> f64 {
    10.0
}

const fn default_fairness_margin_percent() -> f64 {
    100.0
}

const fn default_max_initial_knowledge() -> f64 {
    5.0
}

const fn default_entry_rate() -> f64 {
    0.1
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}
