use crate::faces::domain::face::FaceRecord;
use crate::faces::domain::face_attribute::AttributeSchema;
use crate::faces::domain::face_cluster::ClusterRecord;
use crate::faces::domain::project_store::ProjectStore;

/// Project store held entirely in memory. Useful for previews and tests.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    faces: Vec<FaceRecord>,
    schema: Vec<AttributeSchema>,
    clusters: Vec<ClusterRecord>,
    face_writes: usize,
}

impl InMemoryProjectStore {
    pub fn new(faces: Vec<FaceRecord>) -> Self {
        Self {
            faces,
            ..Self::default()
        }
    }

    pub fn faces(&self) -> &[FaceRecord] {
        &self.faces
    }

    pub fn schema(&self) -> &[AttributeSchema] {
        &self.schema
    }

    pub fn clusters(&self) -> &[ClusterRecord] {
        &self.clusters
    }

    /// Number of face records written since creation.
    pub fn face_writes(&self) -> usize {
        self.face_writes
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn load_faces(&self) -> Result<Vec<FaceRecord>, Box<dyn std::error::Error>> {
        Ok(self.faces.clone())
    }

    fn load_schema(&self) -> Result<Vec<AttributeSchema>, Box<dyn std::error::Error>> {
        Ok(self.schema.clone())
    }

    fn save_faces(&mut self, faces: &[FaceRecord]) -> Result<(), Box<dyn std::error::Error>> {
        for record in faces {
            match self.faces.iter_mut().find(|f| f.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => self.faces.push(record.clone()),
            }
        }
        self.face_writes += faces.len();
        Ok(())
    }

    fn save_schema(
        &mut self,
        schema: &[AttributeSchema],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.schema = schema.to_vec();
        Ok(())
    }

    fn save_clusters(
        &mut self,
        clusters: &[ClusterRecord],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.clusters = clusters.to_vec();
        Ok(())
    }
}
