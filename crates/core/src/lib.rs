pub mod clustering;
pub mod embedding;
pub mod faces;
pub mod geometry;
pub mod pipeline;
pub mod shared;
