use super::paired_distance::{ClusterPoint, PairedDistance};

/// Domain interface for the data-parallel pairing pass.
///
/// Returns one decision per unordered pair `(i, j)`, `i < j`, ordered by `i`
/// then `j`. Every implementation must agree with the CPU reference bit for bit.
pub trait PairEvaluator: Send {
    fn evaluate(
        &self,
        points: &[ClusterPoint],
        threshold: f64,
    ) -> Result<Vec<PairedDistance>, Box<dyn std::error::Error>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
