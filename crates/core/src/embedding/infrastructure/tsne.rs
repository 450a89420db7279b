//! Exact (O(n²) per iteration) t-SNE.
//!
//! Affinities are computed once in [`Tsne::new`]; every [`Tsne::transform`]
//! starts from a fresh random state and runs a fixed number of gradient
//! steps with early exaggeration, two-phase momentum and adaptive gains.

use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::affinity::{joint_affinities, squared_distances};
use super::gaussian::GaussianSampler;
use crate::embedding::domain::dimension_reducer::{DimensionReducer, EmbeddingError};
use crate::shared::constants::{
    DEFAULT_LEARNING_RATE, DEFAULT_MAX_ITERATIONS, DEFAULT_PERPLEXITY, EARLY_EXAGGERATION,
    ENTROPY_TOLERANCE, EXAGGERATION_ITERATIONS, FINAL_MOMENTUM, GAIN_DECAY, GAIN_INCREMENT,
    INITIAL_EMBEDDING_STD, INITIAL_MOMENTUM, MIN_GAIN, MOMENTUM_SWITCH_ITERATION,
    PROBABILITY_FLOOR,
};
use crate::shared::progress::{report, ProgressCallback};

/// Optimiser settings for one embedding run.
#[derive(Clone, Debug, PartialEq)]
pub struct TsneConfig {
    pub perplexity: f64,
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Fixed seed for the initial layout; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity: DEFAULT_PERPLEXITY,
            learning_rate: DEFAULT_LEARNING_RATE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }
}

/// Mutable optimiser state. Lives for a single `transform` call.
#[derive(Clone, Debug)]
pub struct EmbeddingState {
    positions: Array2<f64>,
    gains: Array2<f64>,
    steps: Array2<f64>,
    iteration: usize,
}

impl EmbeddingState {
    pub fn positions(&self) -> &Array2<f64> {
        &self.positions
    }

    pub fn gains(&self) -> &Array2<f64> {
        &self.gains
    }

    pub fn steps(&self) -> &Array2<f64> {
        &self.steps
    }

    /// Number of steps taken so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn into_positions(self) -> Array2<f64> {
        self.positions
    }
}

pub struct Tsne {
    affinities: Array2<f64>,
    seed: Option<u64>,
}

impl Tsne {
    /// Builds the joint affinity matrix for `data` (`n × d`).
    pub fn new(data: ArrayView2<'_, f64>, perplexity: f64) -> Result<Self, EmbeddingError> {
        let (n, d) = data.dim();
        if n < 2 {
            return Err(EmbeddingError::NotEnoughSamples(n));
        }
        if d < 2 {
            return Err(EmbeddingError::NotEnoughDimensions(d));
        }
        if !(perplexity.is_finite() && perplexity > 0.0) {
            return Err(EmbeddingError::InvalidPerplexity(perplexity));
        }

        let distances = squared_distances(data);
        let affinities = joint_affinities(distances.view(), perplexity, ENTROPY_TOLERANCE);
        log::debug!("Computed t-SNE affinities for {n} samples of {d} dimensions");

        Ok(Self {
            affinities,
            seed: None,
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn affinities(&self) -> &Array2<f64> {
        &self.affinities
    }

    pub fn len(&self) -> usize {
        self.affinities.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn transform(
        &self,
        target_dimensions: usize,
        learning_rate: f64,
        max_iterations: usize,
    ) -> Result<Array2<f64>, EmbeddingError> {
        self.transform_with_progress(target_dimensions, learning_rate, max_iterations, None)
    }

    /// Runs exactly `max_iterations` steps, reporting `(iteration, max)`
    /// after each. A callback returning `false` aborts with `Cancelled`.
    pub fn transform_with_progress(
        &self,
        target_dimensions: usize,
        learning_rate: f64,
        max_iterations: usize,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Array2<f64>, EmbeddingError> {
        if target_dimensions == 0 {
            return Err(EmbeddingError::InvalidTargetDimensions(target_dimensions));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut state = self.initial_state(&mut rng, target_dimensions);

        for iteration in 1..=max_iterations {
            let cost = self.step(&mut state, learning_rate);
            if iteration % 100 == 0 {
                log::debug!("t-SNE iteration {iteration}/{max_iterations}, cost {cost:.6}");
            }
            if !report(on_progress, iteration, max_iterations) {
                log::info!("t-SNE cancelled at iteration {iteration}/{max_iterations}");
                return Err(EmbeddingError::Cancelled);
            }
        }

        log::info!(
            "t-SNE finished: {} samples to {target_dimensions}D in {max_iterations} iterations",
            self.len()
        );
        Ok(state.into_positions())
    }

    /// Gaussian layout (std 0.1), unit gains, zero steps.
    pub fn initial_state<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        target_dimensions: usize,
    ) -> EmbeddingState {
        let n = self.len();
        let mut sampler = GaussianSampler::new(0.0, INITIAL_EMBEDDING_STD);
        let positions = Array2::from_shape_fn((n, target_dimensions), |_| sampler.sample(rng));

        EmbeddingState {
            positions,
            gains: Array2::ones((n, target_dimensions)),
            steps: Array2::zeros((n, target_dimensions)),
            iteration: 0,
        }
    }

    /// One gradient step. Returns the cross-entropy cost `-Σ P·ln Q`
    /// measured before the update.
    pub fn step(&self, state: &mut EmbeddingState, learning_rate: f64) -> f64 {
        state.iteration += 1;
        let n = self.len();
        let k = state.positions.ncols();
        let y = &state.positions;

        // Student-t kernel, unnormalised
        let mut kernel = Array2::<f64>::zeros((n, n));
        let mut kernel_sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dist: f64 = (0..k).map(|d| (y[[i, d]] - y[[j, d]]).powi(2)).sum();
                let q = 1.0 / (1.0 + dist);
                kernel[[i, j]] = q;
                kernel[[j, i]] = q;
                kernel_sum += 2.0 * q;
            }
        }

        let exaggeration = if state.iteration < EXAGGERATION_ITERATIONS {
            EARLY_EXAGGERATION
        } else {
            1.0
        };
        let momentum = if state.iteration < MOMENTUM_SWITCH_ITERATION {
            INITIAL_MOMENTUM
        } else {
            FINAL_MOMENTUM
        };

        let mut cost = 0.0;
        let mut gradient = Array2::<f64>::zeros((n, k));
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let q = (kernel[[i, j]] / kernel_sum).max(PROBABILITY_FLOOR);
                let p = self.affinities[[i, j]];
                cost -= p * q.ln();

                let scale = 4.0 * (exaggeration * p - q) * kernel[[i, j]];
                for d in 0..k {
                    gradient[[i, d]] += scale * (y[[i, d]] - y[[j, d]]);
                }
            }
        }

        for ((gain, step), (position, &grad)) in state
            .gains
            .iter_mut()
            .zip(state.steps.iter_mut())
            .zip(state.positions.iter_mut().zip(gradient.iter()))
        {
            *gain = if sign(grad) == sign(*step) {
                *gain * GAIN_DECAY
            } else {
                *gain + GAIN_INCREMENT
            };
            *gain = gain.max(MIN_GAIN);

            *step = momentum * *step - learning_rate * *gain * grad;
            *position += *step;
        }

        if let Some(mean) = state.positions.mean_axis(Axis(0)) {
            state.positions -= &mean;
        }
        cost
    }
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// [`DimensionReducer`] backed by [`Tsne`].
pub struct TsneReducer {
    config: TsneConfig,
    on_progress: Option<ProgressCallback>,
}

impl TsneReducer {
    pub fn new(config: TsneConfig) -> Self {
        Self {
            config,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn config(&self) -> &TsneConfig {
        &self.config
    }
}

impl Default for TsneReducer {
    fn default() -> Self {
        Self::new(TsneConfig::default())
    }
}

impl DimensionReducer for TsneReducer {
    fn reduce(
        &self,
        data: ArrayView2<'_, f64>,
        target_dimensions: usize,
    ) -> Result<Array2<f64>, EmbeddingError> {
        let tsne = Tsne::new(data, self.config.perplexity)?.with_seed(self.config.seed);
        tsne.transform_with_progress(
            target_dimensions,
            self.config.learning_rate,
            self.config.max_iterations,
            self.on_progress.as_ref(),
        )
    }
}
