use ndarray::Array2;

use super::face::{Face, FaceRecord};
use super::face_attribute::{AttributeError, AttributeKind, AttributeSchema, FaceAttribute};
use super::face_cluster::{ClusterRecord, FaceCluster};
use super::project_store::ProjectStore;
use crate::clustering::domain::paired_distance::PositionProvider;
use crate::clustering::domain::threshold_clusterer::ClusterGroup;
use crate::shared::constants::DEFAULT_LAYOUT_KEY;
use crate::shared::point::Point2;

/// Rows of a vector attribute ready for embedding.
#[derive(Clone, Debug)]
pub struct AttributeMatrix {
    /// One row per usable face.
    pub data: Array2<f64>,
    /// Face index of each row.
    pub rows: Vec<usize>,
    /// Faces skipped because their value was missing or malformed.
    pub corrupted: usize,
}

/// The face population of one project: faces, attribute declarations and
/// the current clustering.
///
/// Owns its faces. Clusters refer to faces by index and faces carry the
/// name of their cluster; both sides are only changed together.
#[derive(Clone, Debug)]
pub struct FaceNetwork {
    faces: Vec<Face>,
    schema: Vec<AttributeSchema>,
    clusters: Vec<FaceCluster>,
    layout_key: String,
    /// Seconds between sampled frames, spreads the default layout.
    interval: f64,
}

impl FaceNetwork {
    pub fn new(faces: Vec<Face>) -> Self {
        let mut network = Self {
            faces,
            schema: Vec::new(),
            clusters: Vec::new(),
            layout_key: DEFAULT_LAYOUT_KEY.to_string(),
            interval: 1.0,
        };
        network.assign_indices();
        network
    }

    /// Loads faces and declarations, rebuilding clusters from the faces'
    /// stored cluster names.
    pub fn load(store: &dyn ProjectStore) -> Result<Self, Box<dyn std::error::Error>> {
        let faces: Vec<Face> = store
            .load_faces()?
            .into_iter()
            .map(Face::from_record)
            .collect();
        let mut network = Self::new(faces);
        network.schema = store.load_schema()?;

        let mut clusters: Vec<FaceCluster> = Vec::new();
        for (idx, face) in network.faces.iter().enumerate() {
            let Some(name) = face.cluster_name() else {
                continue;
            };
            match clusters.iter_mut().find(|c| c.name() == name) {
                Some(cluster) => cluster.members_mut().push(idx),
                None => clusters.push(FaceCluster::new(name, vec![idx])),
            }
        }
        network.clusters = clusters;
        Ok(network)
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, index: usize) -> Option<&Face> {
        self.faces.get(index)
    }

    pub fn face_mut(&mut self, index: usize) -> Option<&mut Face> {
        self.faces.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Gives every face its current position in the collection.
    pub fn assign_indices(&mut self) {
        for (idx, face) in self.faces.iter_mut().enumerate() {
            face.set_index(idx);
        }
    }

    // ── Attribute declarations ──────────────────────────────────────

    pub fn schema(&self) -> &[AttributeSchema] {
        &self.schema
    }

    pub fn attribute_schema(&self, name: &str) -> Option<&AttributeSchema> {
        self.schema.iter().find(|s| s.name == name)
    }

    /// Declares an attribute, replacing any declaration with the same name.
    pub fn force_append_attribute(
        &mut self,
        name: impl Into<String>,
        kind: AttributeKind,
        dimensions: Option<usize>,
    ) {
        let name = name.into();
        self.schema.retain(|s| s.name != name);
        self.schema.push(AttributeSchema {
            name,
            kind,
            dimensions,
        });
    }

    /// `base` if no attribute uses it yet, otherwise `base_1`, `base_2`, ...
    pub fn unique_key_name(&self, base: &str) -> String {
        if self.attribute_schema(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.attribute_schema(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Stacks a declared vector attribute into an `n × d` matrix.
    ///
    /// Faces whose value is missing, non-numeric or of the wrong length are
    /// skipped and counted in `corrupted`. If no face matches the declared
    /// length the declaration itself is wrong and `DimensionMismatch` is
    /// returned.
    pub fn attribute_matrix(&self, name: &str) -> Result<AttributeMatrix, AttributeError> {
        let schema = self
            .attribute_schema(name)
            .ok_or_else(|| AttributeError::NotDeclared {
                key: name.to_string(),
            })?;
        if !matches!(schema.kind, AttributeKind::Vector | AttributeKind::IntVector) {
            return Err(AttributeError::TypeMismatch {
                key: name.to_string(),
                expected: AttributeKind::Vector,
                found: schema.kind,
            });
        }

        let vectors: Vec<(usize, Result<Vec<f64>, AttributeError>)> = self
            .faces
            .iter()
            .enumerate()
            .map(|(idx, face)| (idx, face.vector_attribute(name)))
            .collect();

        let dimensions = schema.dimensions.or_else(|| {
            vectors
                .iter()
                .find_map(|(_, v)| v.as_ref().ok().map(Vec::len))
        });
        let Some(dimensions) = dimensions else {
            return Ok(AttributeMatrix {
                data: Array2::zeros((0, 0)),
                rows: Vec::new(),
                corrupted: self.faces.len(),
            });
        };

        let mut rows = Vec::with_capacity(vectors.len());
        let mut corrupted = 0;
        for (idx, value) in &vectors {
            match value {
                Ok(v) if v.len() == dimensions => rows.push(*idx),
                _ => corrupted += 1,
            }
        }

        if rows.is_empty() {
            let found = vectors
                .iter()
                .find_map(|(_, v)| v.as_ref().ok().map(Vec::len));
            if let Some(found) = found {
                return Err(AttributeError::DimensionMismatch {
                    key: name.to_string(),
                    expected: dimensions,
                    found,
                });
            }
        }

        let mut data = Array2::zeros((rows.len(), dimensions));
        for (r, &idx) in rows.iter().enumerate() {
            if let (_, Ok(v)) = &vectors[idx] {
                for (c, &x) in v.iter().enumerate() {
                    data[[r, c]] = x;
                }
            }
        }

        if corrupted > 0 {
            log::warn!("{corrupted} faces with malformed {name:?} values skipped");
        }
        Ok(AttributeMatrix {
            data,
            rows,
            corrupted,
        })
    }

    // ── Layout ──────────────────────────────────────────────────────

    pub fn layout_key(&self) -> &str {
        &self.layout_key
    }

    /// Moves every face to the value of `key`. Faces without a usable value
    /// keep their position. Returns how many faces moved.
    pub fn apply_layout(&mut self, key: &str) -> usize {
        self.layout_key = key.to_string();
        let mut applied = 0;
        for face in &mut self.faces {
            if let Ok(p) = face.point_attribute(key) {
                face.set_position(p);
                applied += 1;
            }
        }
        applied
    }

    /// Writes the spiral default layout into the `Position` attribute.
    pub fn generate_default_positions(&mut self) {
        let interval = self.interval;
        for (idx, face) in self.faces.iter_mut().enumerate() {
            face.generate_default_position(idx, interval);
        }
        self.force_append_attribute(DEFAULT_LAYOUT_KEY, AttributeKind::Point, None);
    }

    // ── Clusters ────────────────────────────────────────────────────

    pub fn clusters(&self) -> &[FaceCluster] {
        &self.clusters
    }

    pub fn cluster(&self, name: &str) -> Option<&FaceCluster> {
        self.clusters.iter().find(|c| c.name() == name)
    }

    pub fn cluster_of(&self, face_index: usize) -> Option<&FaceCluster> {
        let name = self.faces.get(face_index)?.cluster_name()?;
        self.cluster(name)
    }

    /// Stable integer tag used to colour a cluster when rendering.
    pub fn render_index(&self, name: &str) -> Option<usize> {
        self.clusters.iter().position(|c| c.name() == name)
    }

    /// Replaces the whole clustering with freshly computed groups.
    pub fn apply_clusters(&mut self, groups: &[ClusterGroup]) {
        for face in &mut self.faces {
            face.set_cluster_name(None);
        }
        self.clusters = groups
            .iter()
            .map(|g| FaceCluster::new(g.name(), g.members.clone()))
            .collect();
        for cluster in &self.clusters {
            for &idx in cluster.members() {
                if let Some(face) = self.faces.get_mut(idx) {
                    face.set_cluster_name(Some(cluster.name().to_string()));
                }
            }
        }
    }

    /// Renames a cluster and every member's back-reference.
    ///
    /// Fails without changing anything if `old` does not exist or `new` is
    /// taken by another cluster.
    pub fn rename_cluster(&mut self, old: &str, new: &str) -> bool {
        let Some(pos) = self.render_index(old) else {
            return false;
        };
        if old == new {
            return true;
        }
        if self.cluster(new).is_some() {
            return false;
        }

        self.clusters[pos].set_name(new.to_string());
        for &idx in self.clusters[pos].members() {
            if let Some(face) = self.faces.get_mut(idx) {
                face.set_cluster_name(Some(new.to_string()));
            }
        }
        true
    }

    // ── Records ─────────────────────────────────────────────────────

    pub fn face_records(&self) -> Vec<FaceRecord> {
        self.faces.iter().map(Face::to_record).collect()
    }

    pub fn cluster_records(&self) -> Vec<ClusterRecord> {
        self.clusters
            .iter()
            .map(|c| ClusterRecord {
                name: c.name().to_string(),
                members: c
                    .members()
                    .iter()
                    .filter_map(|&idx| self.faces.get(idx))
                    .map(|f| f.id().to_string())
                    .collect(),
            })
            .collect()
    }

    /// Writes an embedding row into a face attribute.
    pub(crate) fn set_face_attribute(&mut self, index: usize, key: &str, value: FaceAttribute) {
        if let Some(face) = self.faces.get_mut(index) {
            face.set_attribute(key, value);
        }
    }
}

impl PositionProvider for FaceNetwork {
    fn count(&self) -> usize {
        self.faces.len()
    }

    fn position(&self, index: usize) -> Point2 {
        self.faces[index].position()
    }

    fn is_disabled(&self, index: usize) -> bool {
        self.faces[index].is_disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faces::infrastructure::in_memory_project_store::InMemoryProjectStore;

    fn network(points: &[(f64, f64)]) -> FaceNetwork {
        let faces = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Face::at(format!("f{i}"), x, y))
            .collect();
        FaceNetwork::new(faces)
    }

    fn group(label: usize, members: &[usize]) -> ClusterGroup {
        ClusterGroup {
            label,
            members: members.to_vec(),
        }
    }

    #[test]
    fn test_new_assigns_indices() {
        let net = network(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let indices: Vec<usize> = net.faces().iter().map(Face::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_apply_clusters_sets_back_references() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        net.apply_clusters(&[group(0, &[0, 2])]);
        assert_eq!(net.face(0).unwrap().cluster_name(), Some("#0"));
        assert_eq!(net.face(1).unwrap().cluster_name(), None);
        assert_eq!(net.cluster_of(2).unwrap().members(), &[0, 2]);
    }

    #[test]
    fn test_apply_clusters_discards_previous_names() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        net.apply_clusters(&[group(0, &[0, 1])]);
        assert!(net.rename_cluster("#0", "Alice"));
        net.apply_clusters(&[group(1, &[1, 2])]);
        assert!(net.cluster("Alice").is_none());
        assert_eq!(net.face(0).unwrap().cluster_name(), None);
        assert_eq!(net.face(1).unwrap().cluster_name(), Some("#1"));
    }

    #[test]
    fn test_rename_cluster_updates_members() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.apply_clusters(&[group(0, &[0, 1])]);
        assert!(net.rename_cluster("#0", "Bob"));
        assert!(net.cluster("#0").is_none());
        assert_eq!(net.cluster("Bob").unwrap().len(), 2);
        assert!(net.faces().iter().all(|f| f.cluster_name() == Some("Bob")));
    }

    #[test]
    fn test_rename_to_existing_name_fails_without_change() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (5.0, 5.0), (6.0, 6.0)]);
        net.apply_clusters(&[group(0, &[0, 1]), group(2, &[2, 3])]);
        assert!(!net.rename_cluster("#0", "#2"));
        assert_eq!(net.face(0).unwrap().cluster_name(), Some("#0"));
        assert_eq!(net.cluster("#2").unwrap().members(), &[2, 3]);
    }

    #[test]
    fn test_rename_missing_cluster_fails() {
        let mut net = network(&[(0.0, 0.0)]);
        assert!(!net.rename_cluster("#9", "x"));
    }

    #[test]
    fn test_rename_to_same_name_succeeds() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.apply_clusters(&[group(0, &[0, 1])]);
        assert!(net.rename_cluster("#0", "#0"));
    }

    #[test]
    fn test_render_index_follows_cluster_order() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (5.0, 5.0), (6.0, 6.0)]);
        net.apply_clusters(&[group(0, &[0, 1]), group(2, &[2, 3])]);
        assert_eq!(net.render_index("#0"), Some(0));
        assert_eq!(net.render_index("#2"), Some(1));
        assert_eq!(net.render_index("#5"), None);
    }

    #[test]
    fn test_unique_key_name_appends_suffix() {
        let mut net = network(&[]);
        assert_eq!(net.unique_key_name("emb_2D"), "emb_2D");
        net.force_append_attribute("emb_2D", AttributeKind::Point, None);
        assert_eq!(net.unique_key_name("emb_2D"), "emb_2D_1");
        net.force_append_attribute("emb_2D_1", AttributeKind::Point, None);
        assert_eq!(net.unique_key_name("emb_2D"), "emb_2D_2");
    }

    #[test]
    fn test_force_append_replaces_declaration() {
        let mut net = network(&[]);
        net.force_append_attribute("x", AttributeKind::Vector, Some(3));
        net.force_append_attribute("x", AttributeKind::Vector, Some(4));
        assert_eq!(net.schema().len(), 1);
        assert_eq!(net.attribute_schema("x").unwrap().dimensions, Some(4));
    }

    #[test]
    fn test_attribute_matrix_skips_corrupted() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        net.force_append_attribute("emb", AttributeKind::Vector, Some(3));
        net.face_mut(0)
            .unwrap()
            .set_attribute("emb", FaceAttribute::Vector(vec![1.0, 2.0, 3.0]));
        net.face_mut(1)
            .unwrap()
            .set_attribute("emb", FaceAttribute::Vector(vec![1.0, 2.0]));
        net.face_mut(2)
            .unwrap()
            .set_attribute("emb", FaceAttribute::IntVector(vec![4, 5, 6]));

        let matrix = net.attribute_matrix("emb").unwrap();
        assert_eq!(matrix.rows, vec![0, 2]);
        assert_eq!(matrix.corrupted, 2);
        assert_eq!(matrix.data.shape(), &[2, 3]);
        assert_eq!(matrix.data[[1, 2]], 6.0);
    }

    #[test]
    fn test_attribute_matrix_declared_length_matches_no_face() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.force_append_attribute("emb", AttributeKind::Vector, Some(5));
        for i in 0..2 {
            net.face_mut(i)
                .unwrap()
                .set_attribute("emb", FaceAttribute::Vector(vec![1.0, 2.0, 3.0]));
        }
        assert_eq!(
            net.attribute_matrix("emb").unwrap_err(),
            AttributeError::DimensionMismatch {
                key: "emb".into(),
                expected: 5,
                found: 3,
            }
        );
    }

    #[test]
    fn test_attribute_matrix_all_missing_is_empty() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.force_append_attribute("emb", AttributeKind::Vector, Some(3));
        let matrix = net.attribute_matrix("emb").unwrap();
        assert!(matrix.rows.is_empty());
        assert_eq!(matrix.corrupted, 2);
    }

    #[test]
    fn test_attribute_matrix_requires_declaration() {
        let net = network(&[(0.0, 0.0)]);
        assert_eq!(
            net.attribute_matrix("emb").unwrap_err(),
            AttributeError::NotDeclared { key: "emb".into() }
        );
    }

    #[test]
    fn test_attribute_matrix_rejects_non_vector() {
        let mut net = network(&[(0.0, 0.0)]);
        net.force_append_attribute("name", AttributeKind::Text, None);
        assert!(matches!(
            net.attribute_matrix("name"),
            Err(AttributeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_attribute_matrix_infers_dimensions() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.force_append_attribute("emb", AttributeKind::Vector, None);
        for i in 0..2 {
            net.face_mut(i)
                .unwrap()
                .set_attribute("emb", FaceAttribute::Vector(vec![i as f64; 4]));
        }
        let matrix = net.attribute_matrix("emb").unwrap();
        assert_eq!(matrix.data.shape(), &[2, 4]);
    }

    #[test]
    fn test_apply_layout_moves_faces_with_value() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0)]);
        net.face_mut(1)
            .unwrap()
            .set_attribute("tsne", FaceAttribute::Point(Point2::new(7.0, 8.0)));
        assert_eq!(net.apply_layout("tsne"), 1);
        assert_eq!(net.layout_key(), "tsne");
        assert_eq!(net.face(0).unwrap().position(), Point2::new(0.0, 0.0));
        assert_eq!(net.face(1).unwrap().position(), Point2::new(7.0, 8.0));
    }

    #[test]
    fn test_default_positions_then_layout() {
        let mut net = network(&[(9.0, 9.0), (9.0, 9.0), (9.0, 9.0)]).with_interval(0.5);
        net.generate_default_positions();
        assert_eq!(net.apply_layout(DEFAULT_LAYOUT_KEY), 3);
        assert_eq!(
            net.attribute_schema(DEFAULT_LAYOUT_KEY).unwrap().kind,
            AttributeKind::Point
        );
        assert_ne!(net.face(1).unwrap().position(), net.face(2).unwrap().position());
    }

    #[test]
    fn test_position_provider_reads_faces() {
        let mut net = network(&[(1.0, 2.0), (3.0, 4.0)]);
        net.face_mut(1).unwrap().set_disabled(true);
        let points = net.cluster_points();
        assert_eq!(points[0].position, Point2::new(1.0, 2.0));
        assert!(points[1].disabled);
    }

    #[test]
    fn test_load_rebuilds_clusters_from_records() {
        let mut net = network(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        net.apply_clusters(&[group(0, &[0, 2])]);
        assert!(net.rename_cluster("#0", "Carol"));
        let store = InMemoryProjectStore::new(net.face_records());

        let loaded = FaceNetwork::load(&store).unwrap();
        assert_eq!(loaded.cluster("Carol").unwrap().members(), &[0, 2]);
        assert_eq!(loaded.cluster_records(), net.cluster_records());
    }
}
