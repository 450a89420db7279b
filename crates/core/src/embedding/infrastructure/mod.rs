pub mod affinity;
mod gaussian;
pub mod tsne;
