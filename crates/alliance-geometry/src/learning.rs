//! The learning-potential curve and the scores built on top of it.
//!
//! # Potential
//!
//! For a partner at axis distance `d`, an agent with sensitivity `sigma`
//! has learning potential
//!
//! ```text
//! potential(d, sigma) = max(0, beta * (d - sigma) - (d - sigma)^2)
//! ```
//!
//! a downward parabola in `d - sigma`, zero at `d = sigma` and at
//! `d = sigma + beta`, peaking at `beta^2 / 4` halfway between. Partners
//! that are too similar or too different teach nothing.
//!
//! # Expected learning
//!
//! Expected learning from a partner is the sum of the potentials along the
//! market and knowledge axes, each evaluated with the caller's own sigma
//! for that axis. It is therefore asymmetric: what `i` expects from `j`
//! uses `i`'s coefficients.
//!
//! # Movement
//!
//! After an alliance each agent moves toward its partner on each axis by
//! `distance * alpha * potential / max_tip`, where `max_tip` is the
//! configured peak of the curve. Movement is largest at the most
//! productive distance and vanishes where the potential is zero.

use alliance_types::{Position, SigmaPair};

use crate::error::GeometryError;
use crate::torus::{TorusMap, require_positive, step_toward, torus_distance};

/// Peak value of the potential curve for a given `beta`, i.e. `beta^2 / 4`.
///
/// Configuration stores this as `max_tip`; this helper exists to check a
/// configured value against its `beta`.
pub const fn peak_potential(beta: f64) -> f64 {
    beta * beta / 4.0
}

/// Percentage by which the larger of two non-negative values exceeds the
/// smaller, relative to the larger: `|a - b| / max(a, b) * 100`.
///
/// Returns `0` when both values are zero.
///
/// # Errors
///
/// Returns [`GeometryError::Negative`] if either value is negative.
pub fn difference_percentage(a: f64, b: f64) -> Result<f64, GeometryError> {
    if a.is_nan() || a < 0.0 {
        return Err(GeometryError::Negative { name: "a", value: a });
    }
    if b.is_nan() || b < 0.0 {
        return Err(GeometryError::Negative { name: "b", value: b });
    }
    let higher = a.max(b);
    if higher > 0.0 {
        Ok((a - b).abs() / higher * 100.0)
    } else {
        Ok(0.0)
    }
}

/// Exclusive bounds on an agent's sensitivity coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaBounds {
    /// Exclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl SigmaBounds {
    /// Create bounds for the open interval `(min, max)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositive`] if the interval is empty.
    pub fn new(min: f64, max: f64) -> Result<Self, GeometryError> {
        require_positive("sigma interval width", max - min)?;
        Ok(Self { min, max })
    }

    /// Whether `sigma` lies strictly inside the bounds.
    pub const fn contains(&self, sigma: f64) -> bool {
        sigma > self.min && sigma < self.max
    }

    /// Check that `sigma` lies strictly inside the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::SigmaOutOfBounds`] otherwise.
    pub fn require(&self, sigma: f64) -> Result<(), GeometryError> {
        if self.contains(sigma) {
            Ok(())
        } else {
            Err(GeometryError::SigmaOutOfBounds {
                sigma,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Check both coefficients of a pair.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::SigmaOutOfBounds`] for the first coefficient
    /// out of range.
    pub fn require_pair(&self, sigma: SigmaPair) -> Result<(), GeometryError> {
        self.require(sigma.market)?;
        self.require(sigma.knowledge)
    }
}

/// Movement coefficients per axis (`alpha`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mobility {
    /// Movement coefficient on the market axis.
    pub market: f64,
    /// Movement coefficient on the knowledge axis.
    pub knowledge: f64,
}

impl Mobility {
    /// Create movement coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositive`] if either coefficient is not
    /// strictly positive.
    pub fn new(market: f64, knowledge: f64) -> Result<Self, GeometryError> {
        require_positive("alpha_market", market)?;
        require_positive("alpha_knowledge", knowledge)?;
        Ok(Self { market, knowledge })
    }
}

/// The parabolic learning curve with its fixed shape constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningCurve {
    beta: f64,
    max_tip: f64,
    sigma: SigmaBounds,
}

impl LearningCurve {
    /// Create a curve with shape `beta`, precomputed peak `max_tip`, and
    /// the accepted sigma interval.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositive`] if `beta` or `max_tip` is not
    /// strictly positive.
    pub fn new(beta: f64, max_tip: f64, sigma: SigmaBounds) -> Result<Self, GeometryError> {
        require_positive("beta", beta)?;
        require_positive("max_tip", max_tip)?;
        Ok(Self {
            beta,
            max_tip,
            sigma,
        })
    }

    /// The shape constant.
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// The configured peak of the curve.
    pub const fn max_tip(&self) -> f64 {
        self.max_tip
    }

    /// The accepted sigma interval.
    pub const fn sigma_bounds(&self) -> SigmaBounds {
        self.sigma
    }

    /// Largest fraction of the partner distance one move can cover on an
    /// axis with movement coefficient `alpha`: `alpha * peak / max_tip`.
    pub const fn step_fraction(&self, alpha: f64) -> f64 {
        alpha * peak_potential(self.beta) / self.max_tip
    }

    /// Check that no move on either axis can carry an agent past its
    /// partner.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Overshoot`] if [`Self::step_fraction`]
    /// exceeds 1 on either axis.
    pub fn require_bounded_step(&self, mobility: Mobility) -> Result<(), GeometryError> {
        for (name, alpha) in [
            ("alpha_market", mobility.market),
            ("alpha_knowledge", mobility.knowledge),
        ] {
            let fraction = self.step_fraction(alpha);
            if fraction > 1.0 {
                return Err(GeometryError::Overshoot { name, fraction });
            }
        }
        Ok(())
    }

    /// Learning potential at axis distance `distance` for sensitivity `sigma`.
    ///
    /// Never negative.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Negative`] for a negative distance or
    /// [`GeometryError::SigmaOutOfBounds`] for a sigma outside the bounds.
    pub fn potential(&self, distance: f64, sigma: f64) -> Result<f64, GeometryError> {
        if distance.is_nan() || distance < 0.0 {
            return Err(GeometryError::Negative {
                name: "distance",
                value: distance,
            });
        }
        self.sigma.require(sigma)?;
        let offset = distance - sigma;
        Ok((offset * (self.beta - offset)).max(0.0))
    }

    /// Learning an agent with coefficients `sigma` at `own` expects from a
    /// partner at `partner`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if a sigma is out of bounds or a position
    /// is off the map.
    pub fn expected_learning(
        &self,
        sigma: SigmaPair,
        own: Position,
        partner: Position,
        map: &TorusMap,
    ) -> Result<f64, GeometryError> {
        self.sigma.require_pair(sigma)?;
        let (market_distance, knowledge_distance) = map.axis_distances(own, partner)?;
        Ok(self.potential(market_distance, sigma.market)?
            + self.potential(knowledge_distance, sigma.knowledge)?)
    }

    /// Next coordinate on one axis for an agent at `own` allied with a
    /// partner at `partner`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if `range` or `alpha` is not positive, a
    /// coordinate is outside `[0, range]`, or `sigma` is out of bounds.
    pub fn next_coordinate(
        &self,
        own: f64,
        partner: f64,
        range: f64,
        alpha: f64,
        sigma: f64,
    ) -> Result<f64, GeometryError> {
        require_positive("alpha", alpha)?;
        let distance = torus_distance(own, partner, range)?;
        let ratio = self.potential(distance, sigma)? / self.max_tip;
        step_toward(own, partner, range, distance * alpha * ratio)
    }

    /// Position an agent at `own` moves to after allying with a partner at
    /// `partner`, with each axis moved independently.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] on any invalid coordinate or coefficient.
    pub fn next_position(
        &self,
        own: Position,
        partner: Position,
        sigma: SigmaPair,
        map: &TorusMap,
        mobility: Mobility,
    ) -> Result<Position, GeometryError> {
        Ok(Position {
            market: self.next_coordinate(
                own.market,
                partner.market,
                map.market_size,
                mobility.market,
                sigma.market,
            )?,
            knowledge: self.next_coordinate(
                own.knowledge,
                partner.knowledge,
                map.knowledge_size,
                mobility.knowledge,
                sigma.knowledge,
            )?,
        })
    }
}
