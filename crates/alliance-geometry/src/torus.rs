//! Distances and movement on the toroidal market x knowledge map.
//!
//! Each axis is a periodic interval `[0, range]` whose two ends are the
//! same point, so the distance between two coordinates is the shorter of
//! the direct arc and the arc that wraps around the edge. Both ends of the
//! interval are accepted as input; `range` and `0` are the same point.

use alliance_types::Position;
use serde::Deserialize;

use crate::error::GeometryError;

/// Reject a non-positive (or NaN) axis length.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_nan() || value <= 0.0 {
        return Err(GeometryError::NonPositive { name, value });
    }
    Ok(())
}

/// Reject a coordinate outside `[0, range]` (NaN included).
pub(crate) fn require_on_axis(
    name: &'static str,
    value: f64,
    range: f64,
) -> Result<(), GeometryError> {
    if (0.0..=range).contains(&value) {
        Ok(())
    } else {
        Err(GeometryError::OutOfRange { name, value, range })
    }
}

/// Shortest-path distance between `a` and `b` on a periodic axis of
/// circumference `range`.
///
/// The result is symmetric in `a` and `b` and never exceeds `range / 2`.
///
/// # Errors
///
/// Returns [`GeometryError::NonPositive`] if `range <= 0`, or
/// [`GeometryError::OutOfRange`] if either coordinate is outside `[0, range]`.
pub fn torus_distance(a: f64, b: f64, range: f64) -> Result<f64, GeometryError> {
    require_positive("range", range)?;
    require_on_axis("a", a, range)?;
    require_on_axis("b", b, range)?;

    let direct = (a - b).abs();
    if direct > range / 2.0 {
        Ok(range - direct)
    } else {
        Ok(direct)
    }
}

/// Whether `other` lies within `radius` of `own`, measuring each axis
/// along its shorter arc and combining the two axes as a Euclidean norm.
///
/// The boundary is inclusive: a point exactly `radius` away is inside.
///
/// # Errors
///
/// Returns [`GeometryError`] if either range is non-positive, the radius
/// is negative, or a coordinate is outside its axis.
pub fn within_radius(
    own: Position,
    other: Position,
    radius: f64,
    market_range: f64,
    knowledge_range: f64,
) -> Result<bool, GeometryError> {
    if radius.is_nan() || radius < 0.0 {
        return Err(GeometryError::Negative {
            name: "radius",
            value: radius,
        });
    }
    let dx = torus_distance(own.market, other.market, market_range)?;
    let dy = torus_distance(own.knowledge, other.knowledge, knowledge_range)?;
    Ok(dx.hypot(dy) <= radius)
}

/// Move `own` by `step` toward `partner` along the shorter arc, wrapping
/// the result back into `[0, range]`.
///
/// When `own` is above `partner` by less than half the axis, or below it
/// by more than half, the shorter arc runs downward; otherwise upward.
/// A coordinate exactly half an axis away moves upward.
///
/// # Errors
///
/// Returns [`GeometryError`] if `range` is non-positive, `step` is
/// negative, or a coordinate is outside `[0, range]`.
pub fn step_toward(own: f64, partner: f64, range: f64, step: f64) -> Result<f64, GeometryError> {
    require_positive("range", range)?;
    require_on_axis("own", own, range)?;
    require_on_axis("partner", partner, range)?;
    if step.is_nan() || step < 0.0 {
        return Err(GeometryError::Negative {
            name: "step",
            value: step,
        });
    }

    let half = range / 2.0;
    let difference = own - partner;
    let downward =
        (difference > 0.0 && difference < half) || (difference < 0.0 && difference.abs() > half);

    let next = if downward { own - step } else { own + step };
    if next < 0.0 {
        Ok(next + range)
    } else if next > range {
        Ok(next - range)
    } else {
        Ok(next)
    }
}

/// Dimensions of the toroidal map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TorusMap {
    /// Circumference of the market axis.
    pub market_size: f64,
    /// Circumference of the knowledge axis.
    pub knowledge_size: f64,
}

impl TorusMap {
    /// Create a map with the given axis lengths.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositive`] if either length is not
    /// strictly positive.
    pub fn new(market_size: f64, knowledge_size: f64) -> Result<Self, GeometryError> {
        require_positive("market_size", market_size)?;
        require_positive("knowledge_size", knowledge_size)?;
        Ok(Self {
            market_size,
            knowledge_size,
        })
    }

    /// A square map with both axes of length `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositive`] if `size` is not positive.
    pub fn square(size: f64) -> Result<Self, GeometryError> {
        Self::new(size, size)
    }

    /// Whether `position` lies on the map (both ends of each axis included).
    pub fn contains(&self, position: Position) -> bool {
        (0.0..=self.market_size).contains(&position.market)
            && (0.0..=self.knowledge_size).contains(&position.knowledge)
    }

    /// Check that `position` lies on the map.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OutOfRange`] naming the offending axis.
    pub fn require_contains(&self, position: Position) -> Result<(), GeometryError> {
        require_on_axis("market", position.market, self.market_size)?;
        require_on_axis("knowledge", position.knowledge, self.knowledge_size)
    }

    /// Per-axis shortest distances between two positions as
    /// `(market, knowledge)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OutOfRange`] if either position is off the map.
    pub fn axis_distances(&self, a: Position, b: Position) -> Result<(f64, f64), GeometryError> {
        Ok((
            torus_distance(a.market, b.market, self.market_size)?,
            torus_distance(a.knowledge, b.knowledge, self.knowledge_size)?,
        ))
    }

    /// Interaction-radius test on this map. See [`within_radius`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] on a negative radius or off-map position.
    pub fn within_radius(
        &self,
        own: Position,
        other: Position,
        radius: f64,
    ) -> Result<bool, GeometryError> {
        within_radius(own, other, radius, self.market_size, self.knowledge_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn distance(a: f64, b: f64, range: f64) -> f64 {
        torus_distance(a, b, range).unwrap_or(f64::NAN)
    }

    #[test]
    fn direct_arc_when_shorter() {
        assert!(close(distance(2.0, 5.0, 10.0), 3.0));
        assert!(close(distance(8.0, 2.0, 10.0), 4.0));
        assert!(close(distance(0.0, 5.0, 10.0), 5.0));
        assert!(close(distance(1.0, 6.0, 10.0), 5.0));
    }

    #[test]
    fn wraps_around_the_edge() {
        assert!(close(distance(2.0, 19.0, 20.0), 3.0));
        assert!(close(distance(19.0, 2.0, 20.0), 3.0));
    }

    #[test]
    fn both_ends_of_an_axis_coincide() {
        assert!(close(distance(10.0, 10.0, 10.0), 0.0));
        assert!(close(distance(10.0, 0.0, 10.0), 0.0));
    }

    #[test]
    fn symmetric_and_bounded_by_half_range() {
        let range = 20.0;
        let samples = [0.0, 0.5, 3.25, 9.99, 10.0, 10.01, 17.0, 19.5, 20.0];
        for &a in &samples {
            assert!(close(distance(a, a, range), 0.0));
            for &b in &samples {
                let d = distance(a, b, range);
                assert!(close(d, distance(b, a, range)));
                assert!(d <= range / 2.0);
                assert!(d >= 0.0);
            }
        }
    }

    #[test]
    fn distance_rejects_bad_arguments() {
        assert!(torus_distance(-1.0, 2.0, 5.0).is_err());
        assert!(torus_distance(6.0, 2.0, 5.0).is_err());
        assert!(torus_distance(1.0, -2.0, 5.0).is_err());
        assert!(torus_distance(1.0, 7.0, 5.0).is_err());
        assert!(torus_distance(0.0, 0.0, 0.0).is_err());
        assert!(torus_distance(0.0, 0.0, -5.0).is_err());
        assert!(torus_distance(f64::NAN, 0.0, 5.0).is_err());
    }

    #[test]
    fn radius_test_matches_plane_for_nearby_points() {
        let own = Position::new(2.0, 5.0);
        let other = Position::new(4.0, 3.0);
        assert_eq!(within_radius(own, other, 4.0, 10.0, 10.0), Ok(true));
        assert_eq!(within_radius(own, other, 2.0, 10.0, 10.0), Ok(false));

        let own = Position::new(2.0, 0.0);
        let other = Position::new(2.0, 1.0);
        assert_eq!(within_radius(own, other, 1.0, 10.0, 10.0), Ok(true));
        assert_eq!(within_radius(own, other, 0.0, 10.0, 10.0), Ok(false));
    }

    #[test]
    fn radius_test_wraps_on_torus() {
        let map = TorusMap::square(10.0);
        assert!(map.is_ok());
        if let Ok(map) = map {
            let r = |a: (f64, f64), b: (f64, f64), radius: f64| {
                map.within_radius(Position::new(a.0, a.1), Position::new(b.0, b.1), radius)
            };
            assert_eq!(r((1.0, 1.0), (10.0, 1.0), 2.0), Ok(true));
            assert_eq!(r((1.0, 10.0), (10.0, 1.0), 2.0), Ok(true));
            assert_eq!(r((0.0, 10.0), (10.0, 0.0), 2.0), Ok(true));
            assert_eq!(r((3.0, 10.0), (3.0, 1.0), 2.0), Ok(true));
        }
    }

    #[test]
    fn radius_test_rejects_bad_arguments() {
        let ok = Position::new(1.0, 1.0);
        assert!(within_radius(Position::new(-1.0, 2.0), ok, 2.0, 4.0, 3.0).is_err());
        assert!(within_radius(ok, Position::new(1.0, 4.0), 1.0, 4.0, 3.0).is_err());
        assert!(within_radius(ok, ok, -3.0, 6.0, 9.0).is_err());
        assert!(within_radius(ok, ok, 1.0, -6.0, 9.0).is_err());
        assert!(within_radius(ok, ok, 1.0, 6.0, -9.0).is_err());
    }

    #[test]
    fn step_takes_the_shorter_arc() {
        // 1 -> 4 on a 20-wide axis moves up.
        assert_eq!(step_toward(1.0, 4.0, 20.0, 0.5), Ok(1.5));
        // 4 -> 1 moves down.
        assert_eq!(step_toward(4.0, 1.0, 20.0, 0.5), Ok(3.5));
        // 2 -> 19 is shorter across the zero edge, so it moves down and wraps.
        let wrapped = step_toward(2.0, 19.0, 20.0, 2.5).unwrap_or(f64::NAN);
        assert!(close(wrapped, 19.5));
        // 19 -> 2 is shorter across the top edge.
        let wrapped = step_toward(19.0, 2.0, 20.0, 2.0).unwrap_or(f64::NAN);
        assert!(close(wrapped, 1.0));
    }

    #[test]
    fn zero_step_is_identity() {
        assert_eq!(step_toward(7.0, 13.0, 20.0, 0.0), Ok(7.0));
    }

    #[test]
    fn step_rejects_bad_arguments() {
        assert!(step_toward(-3.0, 7.0, 20.0, 1.0).is_err());
        assert!(step_toward(3.0, -7.0, 20.0, 1.0).is_err());
        assert!(step_toward(21.0, 7.0, 20.0, 1.0).is_err());
        assert!(step_toward(3.0, 23.0, 20.0, 1.0).is_err());
        assert!(step_toward(3.0, 7.0, 0.0, 1.0).is_err());
        assert!(step_toward(3.0, 7.0, 20.0, -1.0).is_err());
    }

    #[test]
    fn map_rejects_degenerate_axes() {
        assert!(TorusMap::new(0.0, 10.0).is_err());
        assert!(TorusMap::new(10.0, -1.0).is_err());
        assert!(TorusMap::new(10.0, 20.0).is_ok());
    }

    #[test]
    fn map_contains_both_edges() {
        let map = TorusMap::square(20.0);
        assert!(map.is_ok());
        if let Ok(map) = map {
            assert!(map.contains(Position::new(0.0, 20.0)));
            assert!(!map.contains(Position::new(20.5, 3.0)));
            assert!(map.require_contains(Position::new(3.0, -0.1)).is_err());
        }
    }
}
