//! High-dimensional affinities for t-SNE.
//!
//! Each row gets its own Gaussian precision, found by bisection so the
//! row's Shannon entropy matches `ln(perplexity)`. Rows are then
//! symmetrised into a joint distribution.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::shared::constants::{
    ENTROPY_MAX_SEARCH_STEPS, ENTROPY_PROBABILITY_FLOOR, PROBABILITY_FLOOR,
};

/// Outcome of one row's precision search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntropySearch {
    /// Precision (β) that produced the final row.
    pub precision: f64,
    pub entropy: f64,
    pub iterations: usize,
}

/// Pairwise squared Euclidean distances. Each pair is computed once and
/// mirrored, so the result is exactly symmetric with a zero diagonal.
pub fn squared_distances(data: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut distances = Array2::zeros((n, n));
    for i in 0..n {
        let a = data.row(i);
        for j in (i + 1)..n {
            let b = data.row(j);
            let dist: f64 = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum();
            distances[[i, j]] = dist;
            distances[[j, i]] = dist;
        }
    }
    distances
}

/// Conditional distribution of row `i` into `row`, searching the precision
/// until the entropy is within `tolerance` of `target_entropy` or the step
/// limit is hit.
pub fn search_row(
    distances: ArrayView1<'_, f64>,
    i: usize,
    target_entropy: f64,
    tolerance: f64,
    row: &mut [f64],
) -> EntropySearch {
    let n = distances.len();
    let mut precision = 1.0;
    let mut lower = f64::NEG_INFINITY;
    let mut upper = f64::INFINITY;
    let mut iterations = 0;

    loop {
        let used = precision;

        let mut sum = 0.0;
        for j in 0..n {
            let p = if j == i {
                0.0
            } else {
                (-distances[j] * used).exp()
            };
            row[j] = p;
            sum += p;
        }

        let mut entropy = 0.0;
        for p in row.iter_mut().take(n) {
            *p = if sum == 0.0 { 0.0 } else { *p / sum };
            if *p > ENTROPY_PROBABILITY_FLOOR {
                entropy -= *p * p.ln();
            }
        }

        if entropy > target_entropy {
            // too flat: sharpen
            lower = used;
            precision = if upper == f64::INFINITY {
                used * 2.0
            } else {
                (used + upper) / 2.0
            };
        } else {
            upper = used;
            precision = if lower == f64::NEG_INFINITY {
                used / 2.0
            } else {
                (used + lower) / 2.0
            };
        }

        iterations += 1;
        if (entropy - target_entropy).abs() < tolerance || iterations >= ENTROPY_MAX_SEARCH_STEPS {
            return EntropySearch {
                precision: used,
                entropy,
                iterations,
            };
        }
    }
}

/// Symmetric joint affinities `(p_j|i + p_i|j) / 2n`, floored at 1e-100.
pub fn joint_affinities(distances: ArrayView2<'_, f64>, perplexity: f64, tolerance: f64) -> Array2<f64> {
    let n = distances.nrows();
    let target_entropy = perplexity.ln();

    let mut conditional = Array2::<f64>::zeros((n, n));
    let mut row = vec![0.0; n];
    for i in 0..n {
        search_row(distances.row(i), i, target_entropy, tolerance, &mut row);
        for (j, &p) in row.iter().enumerate() {
            conditional[[i, j]] = p;
        }
    }

    let denom = (2 * n) as f64;
    let mut joint = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let p = (conditional[[i, j]] + conditional[[j, i]]) / denom;
            joint[[i, j]] = p.max(PROBABILITY_FLOOR);
        }
    }
    joint
}
