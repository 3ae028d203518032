//! Torus geometry and learning-potential scoring for the alliance simulation.
//!
//! Everything in this crate is a pure function of its inputs: no state is
//! kept between calls and no agent is mutated. The matching engine in
//! `alliance-core` builds its score matrices on top of these functions.
//!
//! # Modules
//!
//! - [`error`] -- Error types for invalid numeric arguments.
//! - [`torus`] -- Shortest-arc distance on a periodic axis, the radius test
//!   used for congestion, and wrap-around stepping.
//! - [`learning`] -- The parabolic learning-potential curve, expected mutual
//!   learning, the post-alliance repositioning target, and the difference
//!   percentage used by the fairness test.

pub mod error;
pub mod learning;
pub mod torus;

// Re-export primary types at crate root.
pub use error::GeometryError;
pub use learning::{LearningCurve, Mobility, SigmaBounds, difference_percentage, peak_potential};
pub use torus::{TorusMap, step_toward, torus_distance, within_radius};
