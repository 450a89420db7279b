use bytemuck::{Pod, Zeroable};

/// Vertex handed to the renderer: which face supplies the position and
/// which cluster supplies the colour.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RenderVertex {
    pub face_index: u32,
    pub cluster_index: u32,
}

impl RenderVertex {
    pub const fn new(face_index: u32, cluster_index: u32) -> Self {
        Self {
            face_index,
            cluster_index,
        }
    }
}

/// Primitive layout of a vertex list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshTopology {
    /// Three vertices per triangle.
    TriangleList,
    /// Two vertices per segment.
    LineList,
}

impl MeshTopology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            MeshTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            MeshTopology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Fan-triangulates a convex polygon given as face indices.
///
/// Emits `(hull[0], hull[i-1], hull[i])` for `i` in `2..len`. Polygons with
/// fewer than three vertices produce nothing.
pub fn fan_triangles(polygon: &[u32], cluster_index: u32) -> Vec<RenderVertex> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((polygon.len() - 2) * 3);
    for i in 2..polygon.len() {
        out.push(RenderVertex::new(polygon[0], cluster_index));
        out.push(RenderVertex::new(polygon[i - 1], cluster_index));
        out.push(RenderVertex::new(polygon[i], cluster_index));
    }
    out
}

/// Every unordered pair of members as a line segment.
pub fn mesh_edges(members: &[u32], cluster_index: u32) -> Vec<RenderVertex> {
    if members.len() < 2 {
        return Vec::new();
    }
    let n = members.len();
    let mut out = Vec::with_capacity(n * (n - 1));
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(RenderVertex::new(members[i], cluster_index));
            out.push(RenderVertex::new(members[j], cluster_index));
        }
    }
    out
}
