//! Per-agent sensitivity coefficient suppliers.
//!
//! Every new agent asks a [`SigmaSource`] for its `(sigma_market,
//! sigma_knowledge)` pair. All randomness comes from the caller's RNG so
//! a seeded run is reproducible.

use alliance_geometry::SigmaBounds;
use alliance_types::SigmaPair;
use rand::{Rng, RngCore};

/// Supplies sensitivity coefficients to newly created agents.
pub trait SigmaSource {
    /// The coefficients for the next agent.
    fn next_sigma(&mut self, rng: &mut dyn RngCore) -> SigmaPair;
}

/// Draw uniformly from the open interval `(low, high)`.
///
/// `random_range` is half-open, so a draw landing exactly on `low` is
/// repeated.
fn open_uniform(rng: &mut dyn RngCore, low: f64, high: f64) -> f64 {
    loop {
        let value = rng.random_range(low..high);
        if value > low {
            return value;
        }
    }
}

// ---------------------------------------------------------------------------
// UniformSigma
// ---------------------------------------------------------------------------

/// Each coefficient sampled independently and uniformly within the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSigma {
    bounds: SigmaBounds,
}

impl UniformSigma {
    /// Sample within `bounds`.
    pub const fn new(bounds: SigmaBounds) -> Self {
        Self { bounds }
    }
}

impl SigmaSource for UniformSigma {
    fn next_sigma(&mut self, rng: &mut dyn RngCore) -> SigmaPair {
        SigmaPair::new(
            open_uniform(rng, self.bounds.min, self.bounds.max),
            open_uniform(rng, self.bounds.min, self.bounds.max),
        )
    }
}

// ---------------------------------------------------------------------------
// QuadrantSigma
// ---------------------------------------------------------------------------

/// One quarter of the sigma square, named `(market, knowledge)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    LowLow,
    LowHigh,
    HighHigh,
    HighLow,
}

impl Quadrant {
    const fn next(self) -> Self {
        match self {
            Self::LowLow => Self::LowHigh,
            Self::LowHigh => Self::HighHigh,
            Self::HighHigh => Self::HighLow,
            Self::HighLow => Self::LowLow,
        }
    }

    const fn halves(self) -> (bool, bool) {
        match self {
            Self::LowLow => (false, false),
            Self::LowHigh => (false, true),
            Self::HighHigh => (true, true),
            Self::HighLow => (true, false),
        }
    }
}

/// Spreads agents evenly over the four quadrants of the sigma square.
///
/// Successive agents are drawn from low/low, low/high, high/high and
/// high/low in turn, uniformly within each quadrant, so every block of
/// four agents covers the explorer/exploiter combinations once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadrantSigma {
    bounds: SigmaBounds,
    quadrant: Quadrant,
}

impl QuadrantSigma {
    /// Start at the low/low quadrant.
    pub const fn new(bounds: SigmaBounds) -> Self {
        Self {
            bounds,
            quadrant: Quadrant::LowLow,
        }
    }

    fn sample_half(&self, rng: &mut dyn RngCore, high: bool) -> f64 {
        let mid = self.bounds.min + (self.bounds.max - self.bounds.min) / 2.0;
        if high {
            open_uniform(rng, mid, self.bounds.max)
        } else {
            open_uniform(rng, self.bounds.min, mid)
        }
    }
}

impl SigmaSource for QuadrantSigma {
    fn next_sigma(&mut self, rng: &mut dyn RngCore) -> SigmaPair {
        let (market_high, knowledge_high) = self.quadrant.halves();
        self.quadrant = self.quadrant.next();
        SigmaPair::new(
            self.sample_half(rng, market_high),
            self.sample_half(rng, knowledge_high),
        )
    }
}

// ---------------------------------------------------------------------------
// FixedSigma
// ---------------------------------------------------------------------------

/// The same pair for every agent. Used for controlled experiments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSigma(pub SigmaPair);

impl SigmaSource for FixedSigma {
    fn next_sigma(&mut self, _rng: &mut dyn RngCore) -> SigmaPair {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn bounds() -> SigmaBounds {
        SigmaBounds { min: 0.0, max: 3.0 }
    }

    #[test]
    fn uniform_stays_inside_open_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut source = UniformSigma::new(bounds());
        for _ in 0..1000 {
            let sigma = source.next_sigma(&mut rng);
            assert!(bounds().contains(sigma.market));
            assert!(bounds().contains(sigma.knowledge));
        }
    }

    #[test]
    fn uniform_is_reproducible_for_a_seed() {
        let mut source = UniformSigma::new(bounds());
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(source.next_sigma(&mut a), source.next_sigma(&mut b));
        }
    }

    #[test]
    fn quadrants_cycle_in_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut source = QuadrantSigma::new(bounds());
        let low = |v: f64| v > 0.0 && v < 1.5;
        let high = |v: f64| v > 1.5 && v < 3.0;

        for _ in 0..3 {
            let s = source.next_sigma(&mut rng);
            assert!(low(s.market) && low(s.knowledge));
            let s = source.next_sigma(&mut rng);
            assert!(low(s.market) && high(s.knowledge));
            let s = source.next_sigma(&mut rng);
            assert!(high(s.market) && high(s.knowledge));
            let s = source.next_sigma(&mut rng);
            assert!(high(s.market) && low(s.knowledge));
        }
    }

    #[test]
    fn fresh_quadrant_source_starts_at_low_low() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut used = QuadrantSigma::new(bounds());
        let _ = used.next_sigma(&mut rng);
        let mut fresh = QuadrantSigma::new(bounds());
        let s = fresh.next_sigma(&mut rng);
        assert!(s.market < 1.5 && s.knowledge < 1.5);
    }

    #[test]
    fn fixed_returns_the_same_pair() {
        let mut rng = StdRng::seed_from_u64(0);
        let pair = SigmaPair::new(1.25, 2.5);
        let mut source = FixedSigma(pair);
        assert_eq!(source.next_sigma(&mut rng), pair);
        assert_eq!(source.next_sigma(&mut rng), pair);
    }
}
