//! Error types for the `alliance-geometry` crate.
//!
//! Every variant is an invalid-argument condition: the caller passed a
//! value outside the domain of the function. None of them are transient.

/// Errors raised when a geometry or scoring precondition is violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A coordinate lies outside `[0, range]`.
    #[error("invalid argument: {name} = {value} is outside [0, {range}]")]
    OutOfRange {
        /// Which argument was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Upper bound of the axis.
        range: f64,
    },

    /// A value that must be strictly positive was zero, negative, or NaN.
    #[error("invalid argument: {name} must be positive, got {value}")]
    NonPositive {
        /// Which argument was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A value that must be non-negative was negative or NaN.
    #[error("invalid argument: {name} must be non-negative, got {value}")]
    Negative {
        /// Which argument was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A movement coefficient lets one step cover more than the whole
    /// distance to the partner, so the agent would pass it.
    #[error("invalid argument: {name} allows a step of {fraction} times the partner distance")]
    Overshoot {
        /// Which coefficient was rejected.
        name: &'static str,
        /// Largest fraction of the distance one step can cover.
        fraction: f64,
    },

    /// A sensitivity coefficient lies outside the open interval `(min, max)`.
    #[error("invalid argument: sigma {sigma} is outside ({min}, {max})")]
    SigmaOutOfBounds {
        /// The rejected coefficient.
        sigma: f64,
        /// Exclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },
}
