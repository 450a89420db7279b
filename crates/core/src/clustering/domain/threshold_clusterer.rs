//! Threshold clustering with single-pass minimum-index union.
//!
//! Pairs are visited in order of their first index. Each paired `(i, j)`
//! sets both labels to `min(label(i), label(j))`, where an unset label
//! defaults to the entity's own index. There is no path compression and no
//! second pass: a chain whose links are discovered out of order can end up
//! split (see `test_late_chain_under_merges`). That is the established
//! behaviour and downstream cluster names depend on it.

use std::collections::BTreeMap;

use thiserror::Error;

use super::pair_evaluator::PairEvaluator;
use super::paired_distance::{evaluate_pair, threshold_squared, ClusterPoint, PairedDistance};
use crate::shared::progress::{report, ProgressCallback};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("clustering cancelled")]
    Cancelled,
}

/// A group of at least two entities sharing a merge label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterGroup {
    pub label: usize,
    /// Entity indices, ascending.
    pub members: Vec<usize>,
}

impl ClusterGroup {
    /// Auto-generated cluster key, `#<label>`.
    pub fn name(&self) -> String {
        format!("#{}", self.label)
    }
}

/// Partitions entities whose pairwise distance is below a threshold.
pub struct ThresholdClusterer {
    evaluator: Box<dyn PairEvaluator>,
    threshold: f64,
    on_progress: Option<ProgressCallback>,
}

impl ThresholdClusterer {
    pub fn new(evaluator: Box<dyn PairEvaluator>, threshold: f64) -> Self {
        Self {
            evaluator,
            threshold,
            on_progress: None,
        }
    }

    /// Reports `(rows merged, total rows)`; returning `false` cancels.
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Computes the partition. Does not touch the entities themselves.
    pub fn cluster(
        &self,
        points: &[ClusterPoint],
    ) -> Result<Vec<ClusterGroup>, Box<dyn std::error::Error>> {
        let n = points.len();
        if n < 2 {
            return Ok(Vec::new());
        }

        if n == 2 {
            let paired = evaluate_pair(&points[0], &points[1], threshold_squared(self.threshold));
            let groups = if paired {
                vec![ClusterGroup {
                    label: 0,
                    members: vec![0, 1],
                }]
            } else {
                Vec::new()
            };
            report(self.on_progress.as_ref(), 1, 1);
            return Ok(groups);
        }

        let mut pairs = self.evaluator.evaluate(points, self.threshold)?;
        log::debug!(
            "{} backend evaluated {} pairs ({} paired)",
            self.evaluator.backend(),
            pairs.len(),
            pairs.iter().filter(|p| p.paired).count()
        );
        pairs.sort_by_key(|p| p.first);

        let labels = merge_pairs(&pairs, points, self.on_progress.as_ref())?;
        Ok(group_labels(&labels))
    }
}

/// Runs the single-pass union over `pairs` (already ordered by first index).
///
/// Returns the final label per entity; `None` means never paired.
pub fn merge_pairs(
    pairs: &[PairedDistance],
    points: &[ClusterPoint],
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<Option<usize>>, ClusterError> {
    let n = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut row = 0usize;

    for pair in pairs {
        let i = pair.first as usize;
        let j = pair.second as usize;

        if i != row {
            row = i;
            if !report(on_progress, row, n) {
                return Err(ClusterError::Cancelled);
            }
        }

        if !pair.paired || points[i].disabled || points[j].disabled {
            continue;
        }

        let li = labels[i].unwrap_or(i);
        let lj = labels[j].unwrap_or(j);
        let merged = li.min(lj);
        labels[i] = Some(merged);
        labels[j] = Some(merged);
    }

    if !report(on_progress, n, n) {
        return Err(ClusterError::Cancelled);
    }
    Ok(labels)
}

/// Collects labels into groups of two or more, ordered by label.
pub fn group_labels(labels: &[Option<usize>]) -> Vec<ClusterGroup> {
    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            by_label.entry(*label).or_default().push(idx);
        }
    }
    by_label
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(label, members)| ClusterGroup { label, members })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::infrastructure::cpu_pair_evaluator::CpuPairEvaluator;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn clusterer(threshold: f64) -> ThresholdClusterer {
        ThresholdClusterer::new(Box::new(CpuPairEvaluator), threshold)
    }

    fn pts(raw: &[(f64, f64)]) -> Vec<ClusterPoint> {
        raw.iter().map(|&(x, y)| ClusterPoint::new(x, y)).collect()
    }

    fn pair(first: u32, second: u32, paired: bool) -> PairedDistance {
        PairedDistance {
            first,
            second,
            paired,
        }
    }

    #[test]
    fn test_empty_and_single_are_noops() {
        assert!(clusterer(1.0).cluster(&[]).unwrap().is_empty());
        assert!(clusterer(1.0).cluster(&pts(&[(0.0, 0.0)])).unwrap().is_empty());
    }

    #[test]
    fn test_unit_square_forms_one_cluster() {
        let points = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let groups = clusterer(1.5).cluster(&points).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1, 2, 3]);
        assert_eq!(groups[0].name(), "#0");
    }

    #[test]
    fn test_far_points_form_no_clusters() {
        let points = pts(&[(0.0, 0.0), (100.0, 100.0), (200.0, 200.0)]);
        assert!(clusterer(5.0).cluster(&points).unwrap().is_empty());
    }

    #[test]
    fn test_two_points_fast_path() {
        let points = pts(&[(0.0, 0.0), (0.5, 0.0)]);
        let groups = clusterer(1.0).cluster(&points).unwrap();
        assert_eq!(
            groups,
            vec![ClusterGroup {
                label: 0,
                members: vec![0, 1]
            }]
        );
    }

    #[test]
    fn test_two_points_fast_path_outside_threshold() {
        let points = pts(&[(0.0, 0.0), (2.0, 0.0)]);
        assert!(clusterer(1.0).cluster(&points).unwrap().is_empty());
    }

    #[test]
    fn test_two_points_fast_path_respects_disabled() {
        let points = vec![ClusterPoint::new(0.0, 0.0), ClusterPoint::disabled(0.1, 0.0)];
        assert!(clusterer(1.0).cluster(&points).unwrap().is_empty());
    }

    #[rstest]
    #[case::negative(-1.0)]
    #[case::zero(0.0)]
    fn test_non_positive_threshold_forms_no_clusters(#[case] threshold: f64) {
        let general = pts(&[(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)]);
        assert!(clusterer(threshold).cluster(&general).unwrap().is_empty());

        let fast_path = pts(&[(0.0, 0.0), (0.5, 0.0)]);
        assert!(clusterer(threshold).cluster(&fast_path).unwrap().is_empty());
    }

    #[test]
    fn test_disabled_entity_left_out() {
        let points = vec![
            ClusterPoint::new(0.0, 0.0),
            ClusterPoint::disabled(0.1, 0.0),
            ClusterPoint::new(0.2, 0.0),
        ];
        let groups = clusterer(0.5).cluster(&points).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 2]);
    }

    #[test]
    fn test_two_separate_groups_named_by_min_index() {
        let points = pts(&[(0.0, 0.0), (10.0, 10.0), (0.1, 0.0), (10.1, 10.0), (50.0, 50.0)]);
        let groups = clusterer(0.5).cluster(&points).unwrap();
        let names: Vec<String> = groups.iter().map(ClusterGroup::name).collect();
        assert_eq!(names, vec!["#0", "#1"]);
        assert_eq!(groups[0].members, vec![0, 2]);
        assert_eq!(groups[1].members, vec![1, 3]);
    }

    #[test]
    fn test_clustering_is_idempotent() {
        let points = pts(&[(0.0, 0.0), (0.3, 0.1), (5.0, 5.0), (5.2, 5.1), (0.1, 0.4), (9.0, 0.0)]);
        let c = clusterer(0.6);
        assert_eq!(c.cluster(&points).unwrap(), c.cluster(&points).unwrap());
    }

    #[test]
    fn test_larger_threshold_keeps_pair_together() {
        let points = pts(&[(0.0, 0.0), (0.4, 0.0), (3.0, 0.0)]);
        for t in [0.5, 1.0, 2.0, 2.9] {
            let groups = clusterer(t).cluster(&points).unwrap();
            assert!(groups
                .iter()
                .any(|g| g.members.contains(&0) && g.members.contains(&1)));
        }
    }

    #[test]
    fn test_merge_takes_minimum_label() {
        let points = pts(&[(0.0, 0.0); 4]);
        let pairs = vec![pair(0, 3, true), pair(1, 3, true), pair(2, 3, true)];
        let labels = merge_pairs(&pairs, &points, None).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_late_chain_under_merges() {
        // 0–3, 1–2, 2–3: entity 1 took label 1 before 2 was relabelled to 0.
        let points = pts(&[(0.0, 0.0); 4]);
        let pairs = vec![pair(0, 3, true), pair(1, 2, true), pair(2, 3, true)];
        let labels = merge_pairs(&pairs, &points, None).unwrap();
        assert_eq!(labels, vec![Some(0), Some(1), Some(0), Some(0)]);

        let groups = group_labels(&labels);
        assert_eq!(
            groups,
            vec![ClusterGroup {
                label: 0,
                members: vec![0, 2, 3]
            }]
        );
    }

    #[test]
    fn test_unpaired_pairs_leave_labels_unset() {
        let points = pts(&[(0.0, 0.0); 3]);
        let pairs = vec![pair(0, 1, false), pair(0, 2, false), pair(1, 2, true)];
        let labels = merge_pairs(&pairs, &points, None).unwrap();
        assert_eq!(labels, vec![None, Some(1), Some(1)]);
    }

    #[test]
    fn test_merge_skips_disabled_even_if_marked_paired() {
        let points = vec![ClusterPoint::new(0.0, 0.0), ClusterPoint::disabled(0.0, 0.0)];
        let labels = merge_pairs(&[pair(0, 1, true)], &points, None).unwrap();
        assert_eq!(labels, vec![None, None]);
    }

    #[test]
    fn test_group_labels_drops_singletons() {
        let labels = vec![Some(0), Some(1), Some(0), None, Some(4)];
        let groups = group_labels(&labels);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 2]);
    }

    #[test]
    fn test_progress_reaches_total() {
        let last = Arc::new(AtomicUsize::new(0));
        let last_cb = Arc::clone(&last);
        let c = clusterer(1.0).with_progress(Box::new(move |current, total| {
            assert!(current <= total);
            last_cb.store(current, Ordering::SeqCst);
            true
        }));
        c.cluster(&pts(&[(0.0, 0.0), (0.5, 0.0), (0.9, 0.0), (4.0, 0.0)]))
            .unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_cancel_returns_error() {
        let c = clusterer(1.0).with_progress(Box::new(|_, _| false));
        let err = c
            .cluster(&pts(&[(0.0, 0.0), (0.5, 0.0), (0.9, 0.0)]))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ClusterError>(), Some(&ClusterError::Cancelled));
    }
}
