use super::face::FaceRecord;
use super::face_attribute::AttributeSchema;
use super::face_cluster::ClusterRecord;

/// Port to the project store that owns faces on disk.
///
/// The analysis core only calls these; layout and file format belong to
/// the implementation.
pub trait ProjectStore: Send {
    fn load_faces(&self) -> Result<Vec<FaceRecord>, Box<dyn std::error::Error>>;

    fn load_schema(&self) -> Result<Vec<AttributeSchema>, Box<dyn std::error::Error>>;

    /// Upserts the given faces by id.
    fn save_faces(&mut self, faces: &[FaceRecord]) -> Result<(), Box<dyn std::error::Error>>;

    fn save_schema(&mut self, schema: &[AttributeSchema])
        -> Result<(), Box<dyn std::error::Error>>;

    /// Replaces the whole cluster index.
    fn save_clusters(&mut self, clusters: &[ClusterRecord])
        -> Result<(), Box<dyn std::error::Error>>;
}
