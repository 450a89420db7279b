use std::sync::Arc;

use crate::clustering::domain::pair_evaluator::PairEvaluator;
use crate::clustering::domain::paired_distance::{ClusterPoint, PairedDistance};

use super::cpu_pair_evaluator::CpuPairEvaluator;
use super::gpu_context::GpuContext;
use super::gpu_pair_evaluator::GpuPairEvaluator;

/// Which backend the pairing pass should run on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComputeBackend {
    /// GPU when an adapter is present, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    /// GPU explicitly requested. Still runs on the CPU when no adapter
    /// exists, but warns about it.
    Gpu,
}

/// Wraps an accelerated evaluator and reruns on the CPU when it fails.
///
/// Oversized buffers, lost devices and failed mappings all end up here;
/// the caller only ever sees CPU-equivalent results.
pub struct FallbackPairEvaluator {
    primary: Box<dyn PairEvaluator>,
}

impl FallbackPairEvaluator {
    pub fn new(primary: Box<dyn PairEvaluator>) -> Self {
        Self { primary }
    }
}

impl PairEvaluator for FallbackPairEvaluator {
    fn evaluate(
        &self,
        points: &[ClusterPoint],
        threshold: f64,
    ) -> Result<Vec<PairedDistance>, Box<dyn std::error::Error>> {
        match self.primary.evaluate(points, threshold) {
            Ok(pairs) => Ok(pairs),
            Err(e) => {
                log::warn!(
                    "{} pairing failed ({e}), falling back to CPU for {} faces",
                    self.primary.backend(),
                    points.len()
                );
                CpuPairEvaluator.evaluate(points, threshold)
            }
        }
    }

    fn backend(&self) -> &'static str {
        self.primary.backend()
    }
}

/// Creates the best available pair evaluator for the requested backend.
///
/// Probes for a wgpu adapter unless the CPU is requested explicitly. Logs
/// which backend is selected.
pub fn create_pair_evaluator(backend: ComputeBackend) -> Box<dyn PairEvaluator> {
    if backend == ComputeBackend::Cpu {
        log::info!("Using CPU backend for face pairing (requested)");
        return Box::new(CpuPairEvaluator);
    }

    if let Some(ctx) = GpuContext::new() {
        log::info!("Using GPU backend for face pairing");
        Box::new(FallbackPairEvaluator::new(Box::new(GpuPairEvaluator::new(
            Arc::new(ctx),
        ))))
    } else if backend == ComputeBackend::Gpu {
        log::warn!("GPU backend requested but no adapter found, using CPU for face pairing");
        Box::new(CpuPairEvaluator)
    } else {
        log::info!("No GPU available, using CPU backend for face pairing");
        Box::new(CpuPairEvaluator)
    }
}

/// Returns true if a GPU adapter is available for compute shaders.
pub fn gpu_available() -> bool {
    GpuContext::new().is_some()
}
