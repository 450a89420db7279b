use serde::{Deserialize, Serialize};

/// A named group of faces. Members are indices into the owning network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCluster {
    name: String,
    members: Vec<usize>,
}

/// Plain persistence record for a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    /// Face ids, in member order.
    pub members: Vec<String>,
}

impl FaceCluster {
    pub fn new(name: impl Into<String>, members: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut Vec<usize> {
        &mut self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, face_index: usize) -> bool {
        self.members.contains(&face_index)
    }
}
