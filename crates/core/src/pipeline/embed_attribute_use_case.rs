use crate::embedding::domain::dimension_reducer::DimensionReducer;
use crate::faces::domain::face::Face;
use crate::faces::domain::face_attribute::{AttributeKind, FaceAttribute};
use crate::faces::domain::face_network::FaceNetwork;
use crate::faces::domain::project_store::ProjectStore;

/// What an embedding run wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingReport {
    /// Attribute the result was stored under.
    pub key: String,
    pub rows: usize,
    /// Faces left out because their input value was unusable.
    pub corrupted: usize,
}

/// Reduces a vector attribute and stores the result as a new attribute:
/// extract → reduce → write back → persist.
pub struct EmbedAttributeUseCase {
    reducer: Box<dyn DimensionReducer>,
    store: Box<dyn ProjectStore>,
}

impl EmbedAttributeUseCase {
    pub fn new(reducer: Box<dyn DimensionReducer>, store: Box<dyn ProjectStore>) -> Self {
        Self { reducer, store }
    }

    /// Embeds `attribute` into `target_dimensions` and stores it under
    /// `<attribute>_<k>D` (suffixed if taken). The network is only touched
    /// once the reduction has succeeded.
    pub fn execute(
        &mut self,
        network: &mut FaceNetwork,
        attribute: &str,
        target_dimensions: usize,
    ) -> Result<EmbeddingReport, Box<dyn std::error::Error>> {
        let matrix = network.attribute_matrix(attribute)?;
        let embedded = self.reducer.reduce(matrix.data.view(), target_dimensions)?;

        let key = network.unique_key_name(&format!("{attribute}_{target_dimensions}D"));
        let dimensions = (target_dimensions > 2).then_some(target_dimensions);
        network.force_append_attribute(
            key.clone(),
            AttributeKind::for_embedding(target_dimensions),
            dimensions,
        );
        for (row, &face_index) in matrix.rows.iter().enumerate() {
            let values = embedded.row(row).to_vec();
            network.set_face_attribute(face_index, &key, FaceAttribute::from_embedding(&values));
        }

        let touched: Vec<_> = matrix
            .rows
            .iter()
            .filter_map(|&idx| network.face(idx))
            .map(Face::to_record)
            .collect();
        self.store.save_faces(&touched)?;
        self.store.save_schema(network.schema())?;

        log::info!(
            "Embedded {attribute:?} into {key:?}: {} faces, {} skipped",
            matrix.rows.len(),
            matrix.corrupted
        );
        Ok(EmbeddingReport {
            key,
            rows: matrix.rows.len(),
            corrupted: matrix.corrupted,
        })
    }
}
