use crate::shared::point::Point2;

/// Snapshot of one entity as seen by the pairing pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterPoint {
    pub position: Point2,
    pub disabled: bool,
}

impl ClusterPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            disabled: false,
        }
    }

    pub const fn disabled(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            disabled: true,
        }
    }

    /// Single-precision coordinates shared by every pairing backend.
    pub fn coords_f32(&self) -> [f32; 2] {
        [self.position.x as f32, self.position.y as f32]
    }
}

/// Anything that can hand the clusterer positions and disabled flags.
pub trait PositionProvider {
    fn count(&self) -> usize;
    fn position(&self, index: usize) -> Point2;
    fn is_disabled(&self, index: usize) -> bool;

    fn cluster_points(&self) -> Vec<ClusterPoint> {
        (0..self.count())
            .map(|i| ClusterPoint {
                position: self.position(i),
                disabled: self.is_disabled(i),
            })
            .collect()
    }
}

impl PositionProvider for [ClusterPoint] {
    fn count(&self) -> usize {
        self.len()
    }

    fn position(&self, index: usize) -> Point2 {
        self[index].position
    }

    fn is_disabled(&self, index: usize) -> bool {
        self[index].disabled
    }
}

/// Pairing decision for the unordered pair `(first, second)`, `first < second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairedDistance {
    pub first: u32,
    pub second: u32,
    pub paired: bool,
}

/// Number of unordered pairs among `n` entities.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Slot of pair `(i, j)`, `i < j`, in row-major upper-triangle order.
pub fn pair_slot(i: usize, j: usize, n: usize) -> usize {
    i * n - i * (i + 1) / 2 + (j - i - 1)
}

/// Squared threshold in the precision every backend compares in.
///
/// A threshold that is not positive (or NaN) maps to 0, which no squared
/// distance is below.
pub fn threshold_squared(threshold: f64) -> f32 {
    if threshold.is_nan() || threshold <= 0.0 {
        return 0.0;
    }
    let t = threshold as f32;
    t * t
}

/// The pairing rule. Everything is `f32` and squared so the GPU kernel can
/// reproduce the exact decision.
pub fn within_threshold(a: [f32; 2], b: [f32; 2], threshold_sq: f32) -> bool {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dist_sq = dx * dx + dy * dy;
    dist_sq < threshold_sq
}

/// Full pair decision including the disabled exclusion.
pub fn evaluate_pair(a: &ClusterPoint, b: &ClusterPoint, threshold_sq: f32) -> bool {
    if a.disabled || b.disabled {
        return false;
    }
    within_threshold(a.coords_f32(), b.coords_f32(), threshold_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, 0)]
    #[case::one(1, 0)]
    #[case::two(2, 1)]
    #[case::five(5, 10)]
    fn test_pair_count(#[case] n: usize, #[case] expected: usize) {
        assert_eq!(pair_count(n), expected);
    }

    #[test]
    fn test_pair_slot_is_dense_row_major() {
        let n = 6;
        let mut expected = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                assert_eq!(pair_slot(i, j, n), expected);
                expected += 1;
            }
        }
        assert_eq!(expected, pair_count(n));
    }

    #[test]
    fn test_threshold_is_strict() {
        let t = threshold_squared(1.0);
        assert!(!within_threshold([0.0, 0.0], [1.0, 0.0], t));
        assert!(within_threshold([0.0, 0.0], [0.99, 0.0], t));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    fn test_non_positive_threshold_never_pairs(#[case] threshold: f64) {
        let t = threshold_squared(threshold);
        assert_eq!(t, 0.0);
        assert!(!within_threshold([0.0, 0.0], [0.0, 0.0], t));
        assert!(!within_threshold([0.0, 0.0], [0.5, 0.0], t));
    }

    #[test]
    fn test_identical_points_pair() {
        let t = threshold_squared(0.01);
        assert!(within_threshold([2.0, 3.0], [2.0, 3.0], t));
    }

    #[test]
    fn test_disabled_never_pairs() {
        let t = threshold_squared(10.0);
        let a = ClusterPoint::new(0.0, 0.0);
        let b = ClusterPoint::disabled(0.0, 0.0);
        assert!(!evaluate_pair(&a, &b, t));
        assert!(!evaluate_pair(&b, &a, t));
        assert!(evaluate_pair(&a, &a, t));
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let a = ClusterPoint::new(0.0, 0.0);
        let b = ClusterPoint::new(0.3, 0.4);
        let mut was_paired = false;
        for step in 0..100 {
            let paired = evaluate_pair(&a, &b, threshold_squared(step as f64 * 0.01));
            assert!(paired || !was_paired);
            was_paired = paired;
        }
        assert!(was_paired);
    }

    #[test]
    fn test_slice_position_provider() {
        let points = [ClusterPoint::new(1.0, 2.0), ClusterPoint::disabled(3.0, 4.0)];
        let provider: &[ClusterPoint] = &points;
        assert_eq!(provider.count(), 2);
        assert_eq!(provider.position(1), Point2::new(3.0, 4.0));
        assert!(provider.is_disabled(1));
        assert_eq!(provider.cluster_points(), points.to_vec());
    }
}
