pub mod pair_evaluator;
pub mod paired_distance;
pub mod threshold_clusterer;
