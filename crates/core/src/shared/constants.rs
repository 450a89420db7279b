/// Perplexity used when embedding a face attribute.
pub const DEFAULT_PERPLEXITY: f64 = 30.0;
pub const DEFAULT_LEARNING_RATE: f64 = 10.0;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Entropy-matching tolerance for the per-row precision search.
pub const ENTROPY_TOLERANCE: f64 = 1e-4;
pub const ENTROPY_MAX_SEARCH_STEPS: usize = 50;

/// Probabilities below this are left out of the entropy sum.
pub const ENTROPY_PROBABILITY_FLOOR: f64 = 1e-7;
/// Floor applied to joint probabilities so logarithms stay finite.
pub const PROBABILITY_FLOOR: f64 = 1e-100;

pub const EARLY_EXAGGERATION: f64 = 4.0;
/// Iterations (1-based) strictly below this use early exaggeration.
pub const EXAGGERATION_ITERATIONS: usize = 100;

pub const INITIAL_MOMENTUM: f64 = 0.5;
pub const FINAL_MOMENTUM: f64 = 0.8;
pub const MOMENTUM_SWITCH_ITERATION: usize = 250;

pub const GAIN_DECAY: f64 = 0.8;
pub const GAIN_INCREMENT: f64 = 0.2;
pub const MIN_GAIN: f64 = 0.01;

/// Standard deviation of the Gaussian used to seed the embedding.
pub const INITIAL_EMBEDDING_STD: f64 = 0.1;

/// Default pairing distance in display units.
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 0.1;

/// Attribute that drives display positions unless the user picks another.
pub const DEFAULT_LAYOUT_KEY: &str = "Position";
