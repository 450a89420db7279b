use crate::clustering::domain::pair_evaluator::PairEvaluator;
use crate::clustering::domain::paired_distance::PositionProvider;
use crate::clustering::domain::threshold_clusterer::ThresholdClusterer;
use crate::clustering::infrastructure::evaluator_factory::{create_pair_evaluator, ComputeBackend};
use crate::faces::domain::face_network::FaceNetwork;
use crate::faces::domain::project_store::ProjectStore;
use crate::geometry::convex_hull::graham_scan;
use crate::geometry::triangulation::{fan_triangles, mesh_edges, MeshTopology, RenderVertex};
use crate::shared::constants::DEFAULT_CLUSTER_THRESHOLD;
use crate::shared::point::Point2;
use crate::shared::progress::ProgressCallback;

/// How clusters are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Filled convex hull per cluster.
    #[default]
    Polygon,
    /// Every member connected to every other member.
    Edges,
}

impl RenderMode {
    pub fn topology(self) -> MeshTopology {
        match self {
            RenderMode::Polygon => MeshTopology::TriangleList,
            RenderMode::Edges => MeshTopology::LineList,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterConfig {
    /// Pairing distance in display units.
    pub threshold: f64,
    pub backend: ComputeBackend,
    pub render_mode: RenderMode,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CLUSTER_THRESHOLD,
            backend: ComputeBackend::default(),
            render_mode: RenderMode::default(),
        }
    }
}

/// Render-ready vertices for every cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterMesh {
    pub topology: MeshTopology,
    pub vertices: Vec<RenderVertex>,
}

impl ClusterMesh {
    /// Vertex bytes for a GPU vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Clustering pipeline: pair → merge → apply → mesh → persist.
pub struct ClusterFacesUseCase {
    clusterer: ThresholdClusterer,
    render_mode: RenderMode,
    store: Box<dyn ProjectStore>,
}

impl ClusterFacesUseCase {
    /// Picks the pair evaluator for `config.backend`.
    pub fn new(config: &ClusterConfig, store: Box<dyn ProjectStore>) -> Self {
        Self::with_evaluator(create_pair_evaluator(config.backend), config, store)
    }

    pub fn with_evaluator(
        evaluator: Box<dyn PairEvaluator>,
        config: &ClusterConfig,
        store: Box<dyn ProjectStore>,
    ) -> Self {
        Self {
            clusterer: ThresholdClusterer::new(evaluator, config.threshold),
            render_mode: config.render_mode,
            store,
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.clusterer = self.clusterer.with_progress(on_progress);
        self
    }

    /// Reclusters the whole network. On error (including cancellation) the
    /// previous clustering is left in place.
    pub fn execute(
        &mut self,
        network: &mut FaceNetwork,
    ) -> Result<ClusterMesh, Box<dyn std::error::Error>> {
        let points = network.cluster_points();
        let groups = self.clusterer.cluster(&points)?;

        network.apply_clusters(&groups);
        network.assign_indices();
        let mesh = build_mesh(network, self.render_mode);

        self.store.save_clusters(&network.cluster_records())?;
        self.store.save_faces(&network.face_records())?;

        log::info!(
            "Clustered {} faces into {} clusters at threshold {}",
            network.len(),
            groups.len(),
            self.clusterer.threshold()
        );
        Ok(mesh)
    }
}

/// Builds the render mesh for the network's current clusters, tagging each
/// vertex with the cluster's render index.
pub fn build_mesh(network: &FaceNetwork, mode: RenderMode) -> ClusterMesh {
    let mut vertices = Vec::new();
    for (render_index, cluster) in network.clusters().iter().enumerate() {
        let members: Vec<u32> = cluster.members().iter().map(|&m| m as u32).collect();
        let render_index = render_index as u32;
        match mode {
            RenderMode::Polygon => {
                let positions: Vec<Point2> = cluster
                    .members()
                    .iter()
                    .filter_map(|&m| network.face(m))
                    .map(|f| f.position())
                    .collect();
                let hull: Vec<u32> = graham_scan(&positions)
                    .into_iter()
                    .map(|local| members[local])
                    .collect();
                vertices.extend(fan_triangles(&hull, render_index));
            }
            RenderMode::Edges => vertices.extend(mesh_edges(&members, render_index)),
        }
    }
    ClusterMesh {
        topology: mode.topology(),
        vertices,
    }
}
