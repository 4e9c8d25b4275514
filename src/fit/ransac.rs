//! RANSAC hypothesis search.
//!
//! Given:
//! - canonical point positions
//! - a primitive kind and inlier threshold `τ`
//! - an iteration budget and a seeded random source
//!
//! we draw minimal samples sequentially (so the hypothesis list depends only
//! on the seed), score every hypothesis in parallel, and pick the winner with
//! a deterministic rule: most inliers, then smallest inlier SSE, then earliest
//! draw.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::seq::index;
use rayon::prelude::*;

use crate::domain::PrimitiveKind;
use crate::error::FitError;
use crate::models::Primitive;

/// Support of a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub inliers: usize,
    /// Sum of squared inlier distances.
    pub sse: f64,
}

impl Score {
    fn beats(&self, other: &Score) -> bool {
        self.inliers > other.inliers || (self.inliers == other.inliers && self.sse < other.sse)
    }
}

/// Winner of the search.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacOutcome {
    pub primitive: Primitive,
    pub inliers: Vec<usize>,
    /// Hypotheses scored.
    pub iterations: usize,
}

/// Draw up to `budget` non-degenerate hypotheses, in draw order.
///
/// Degenerate draws are retried for free until `budget` of them have been
/// seen; past that retry cap each degenerate draw uses up a slot, so the loop
/// always terminates.
pub fn draw_hypotheses(points: &[Vector3<f64>], kind: PrimitiveKind, budget: usize, rng: &mut StdRng) -> Vec<Primitive> {
    let m = kind.minimal_sample_size();
    let n = points.len();
    if n < m {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(budget);
    let mut slots_used = 0usize;
    let mut degenerate = 0usize;
    let mut sample = Vec::with_capacity(m);

    while slots_used < budget {
        sample.clear();
        sample.extend(index::sample(rng, n, m).iter().map(|i| points[i]));

        match Primitive::from_minimal_sample(kind, &sample) {
            Some(primitive) => {
                out.push(primitive);
                slots_used += 1;
            }
            None => {
                degenerate += 1;
                if degenerate > budget {
                    slots_used += 1;
                }
            }
        }
    }
    out
}

/// Count inliers and their SSE for one primitive.
pub fn score(primitive: &Primitive, points: &[Vector3<f64>], threshold: f64) -> Score {
    let mut inliers = 0usize;
    let mut sse = 0.0;
    for p in points {
        let d = primitive.distance(p);
        if d <= threshold {
            inliers += 1;
            sse += d * d;
        }
    }
    Score { inliers, sse }
}

/// Run the full search and return the best-supported hypothesis.
pub fn ransac_search(
    points: &[Vector3<f64>],
    kind: PrimitiveKind,
    threshold: f64,
    budget: usize,
    rng: &mut StdRng,
) -> Result<RansacOutcome, FitError> {
    let hypotheses = draw_hypotheses(points, kind, budget, rng);
    if hypotheses.is_empty() {
        return Err(FitError::DegenerateGeometry(format!(
            "no non-degenerate {} sample could be drawn",
            kind.display_name()
        )));
    }

    let scores: Vec<Score> = hypotheses
        .par_iter()
        .map(|h| score(h, points, threshold))
        .collect();

    // `scores` is in draw order, so a strict comparison keeps the earliest on ties.
    let mut best = 0usize;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if s.beats(&scores[best]) {
            best = i;
        }
    }

    let winner = hypotheses[best];
    let inliers = points
        .iter()
        .enumerate()
        .filter(|(_, p)| winner.distance(p) <= threshold)
        .map(|(i, _)| i)
        .collect();

    Ok(RansacOutcome {
        primitive: winner,
        inliers,
        iterations: hypotheses.len(),
    })
}
