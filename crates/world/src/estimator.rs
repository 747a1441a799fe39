//! Death-position estimation from scattered clues.
//!
//! Each clue is a weighted point: dropped items, experience orbs and looted
//! mob equipment near the death site. The estimate is the weighted centroid,
//! refined by repeatedly discarding points that sit far outside the spread
//! of the rest (items knocked down a slope, orbs carried by water).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A world position in `(x, z, y)` order: horizontal plane first, the
/// vertical axis last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub z: f64,
    /// Altitude.
    pub y: f64,
}

impl Position {
    /// Create a position from all three axes.
    pub fn new(x: f64, z: f64, y: f64) -> Self {
        Self { x, z, y }
    }

    /// Create a position on the horizontal plane (`y = 0`).
    pub fn from_xz(x: f64, z: f64) -> Self {
        Self::new(x, z, 0.0)
    }

    /// Distance to another position over the x/z plane only.
    ///
    /// The vertical axis is ignored for spread: falls scatter items
    /// vertically without indicating horizontal displacement.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:6.1}, {:6.1}, {:5.1})", self.x, self.z, self.y)
    }
}

/// A located clue: position, importance weight, and an opaque payload the
/// caller threads through (e.g. a description for the clue report).
#[derive(Debug, Clone)]
pub struct WeightedPoint<T> {
    /// Where the clue was found.
    pub pos: Position,
    /// Importance weight, strictly positive.
    pub weight: f64,
    /// Caller data carried alongside the point.
    pub payload: T,
}

impl<T> WeightedPoint<T> {
    /// Create a weighted point.
    pub fn new(pos: Position, weight: f64, payload: T) -> Self {
        Self {
            pos,
            weight,
            payload,
        }
    }
}

/// Tuning knobs for [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Spread below which the current center is accepted.
    pub sd_goal: f64,
    /// Points with `distance / sd >= sd_filter` are discarded per round.
    pub sd_filter: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            sd_goal: 10.0,
            sd_filter: 1.0,
        }
    }
}

/// Estimation failure modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    /// The caller supplied no points at all.
    #[error("cannot estimate a position from an empty point set")]
    EmptyPointSet,
}

/// Estimate the death position from a non-empty set of clues.
///
/// Computes the weighted mean over all three axes, then the unweighted
/// population standard deviation of the planar distances to it. While the
/// spread exceeds `sd_goal`, points at or beyond `sd_filter` standard
/// deviations are dropped and the centroid recomputed over the survivors.
/// Terminates when the spread is acceptable, a round removes nothing, or a
/// single point remains (`sd == 0`); a round that would remove every point
/// keeps the current center. The working set strictly shrinks, so the loop
/// always terminates.
pub fn estimate<T>(
    points: &[WeightedPoint<T>],
    params: &EstimatorParams,
) -> Result<Position, EstimateError> {
    if points.is_empty() {
        return Err(EstimateError::EmptyPointSet);
    }

    let mut working: Vec<&WeightedPoint<T>> = points.iter().collect();
    loop {
        let center = weighted_center(&working);
        let distances: Vec<f64> = working
            .iter()
            .map(|p| center.planar_distance(&p.pos))
            .collect();
        // Population standard deviation; the spread stays unweighted even
        // though the center is weighted.
        let sd =
            (distances.iter().map(|d| d * d).sum::<f64>() / working.len() as f64).sqrt();

        tracing::debug!(points = working.len(), center = %center, sd, "centroid round");

        if sd <= params.sd_goal {
            return Ok(center);
        }

        let kept: Vec<&WeightedPoint<T>> = working
            .iter()
            .zip(&distances)
            .filter(|(_, d)| **d / sd < params.sd_filter)
            .map(|(p, _)| *p)
            .collect();

        if kept.is_empty() || kept.len() == working.len() {
            return Ok(center);
        }
        working = kept;
    }
}

fn weighted_center<T>(points: &[&WeightedPoint<T>]) -> Position {
    let total: f64 = points.iter().map(|p| p.weight).sum();
    let mut center = Position::new(0.0, 0.0, 0.0);
    for p in points {
        center.x += p.pos.x * p.weight;
        center.z += p.pos.z * p.weight;
        center.y += p.pos.y * p.weight;
    }
    center.x /= total;
    center.z /= total;
    center.y /= total;
    center
}
