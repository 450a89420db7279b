use crate::clustering::domain::pair_evaluator::PairEvaluator;
use crate::clustering::domain::paired_distance::{
    evaluate_pair, pair_count, threshold_squared, ClusterPoint, PairedDistance,
};

/// Sequential reference implementation of the pairing pass.
pub struct CpuPairEvaluator;

impl CpuPairEvaluator {
    pub fn evaluate_pairs(points: &[ClusterPoint], threshold: f64) -> Vec<PairedDistance> {
        let n = points.len();
        let threshold_sq = threshold_squared(threshold);
        let mut pairs = Vec::with_capacity(pair_count(n));
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push(PairedDistance {
                    first: i as u32,
                    second: j as u32,
                    paired: evaluate_pair(&points[i], &points[j], threshold_sq),
                });
            }
        }
        pairs
    }
}

impl PairEvaluator for CpuPairEvaluator {
    fn evaluate(
        &self,
        points: &[ClusterPoint],
        threshold: f64,
    ) -> Result<Vec<PairedDistance>, Box<dyn std::error::Error>> {
        Ok(Self::evaluate_pairs(points, threshold))
    }

    fn backend(&self) -> &'static str {
        "CPU"
    }
}
