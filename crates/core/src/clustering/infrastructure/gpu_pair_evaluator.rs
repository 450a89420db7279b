use std::sync::Arc;

use crate::clustering::domain::pair_evaluator::PairEvaluator;
use crate::clustering::domain::paired_distance::{
    pair_count, threshold_squared, ClusterPoint, PairedDistance,
};

use super::gpu_context::GpuContext;

/// GPU pairing pass using a wgpu compute shader.
///
/// Each invocation decides one `(i, j)` pair into its own output slot, so
/// there is no synchronisation between workers.
pub struct GpuPairEvaluator {
    ctx: Arc<GpuContext>,
}

impl GpuPairEvaluator {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx }
    }
}

impl PairEvaluator for GpuPairEvaluator {
    fn evaluate(
        &self,
        points: &[ClusterPoint],
        threshold: f64,
    ) -> Result<Vec<PairedDistance>, Box<dyn std::error::Error>> {
        let n = points.len();
        let flags = self.ctx.pair_flags(points, threshold_squared(threshold))?;

        let mut pairs = Vec::with_capacity(pair_count(n));
        let mut slot = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push(PairedDistance {
                    first: i as u32,
                    second: j as u32,
                    paired: flags[slot] != 0,
                });
                slot += 1;
            }
        }
        Ok(pairs)
    }

    fn backend(&self) -> &'static str {
        "GPU"
    }
}
