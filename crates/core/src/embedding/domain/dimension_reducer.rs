use ndarray::{Array2, ArrayView2};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("not enough data samples to perform dimension reduction (got {0}, need at least 2)")]
    NotEnoughSamples(usize),
    #[error("input vectors must have more than 1 dimension for dimension reduction (got {0})")]
    NotEnoughDimensions(usize),
    #[error("target dimensions must be at least 1 (got {0})")]
    InvalidTargetDimensions(usize),
    #[error("perplexity must be a positive finite number (got {0})")]
    InvalidPerplexity(f64),
    #[error("embedding cancelled")]
    Cancelled,
}

/// Domain interface for reducing an `n × d` feature matrix to `n × k`.
pub trait DimensionReducer: Send {
    fn reduce(
        &self,
        data: ArrayView2<'_, f64>,
        target_dimensions: usize,
    ) -> Result<Array2<f64>, EmbeddingError>;
}
