use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::face_attribute::{AttributeError, FaceAttribute};
use crate::shared::constants::DEFAULT_LAYOUT_KEY;
use crate::shared::point::Point2;

/// Read-only output of the detection collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub frame: usize,
    /// Normalised `[x, y, width, height]` in frame coordinates.
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub landmarks: Vec<Point2>,
}

/// Plain persistence record for a face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub id: String,
    pub detected: DetectedFace,
    pub position: Point2,
    pub disabled: bool,
    pub cluster: Option<String>,
    pub attributes: BTreeMap<String, FaceAttribute>,
}

/// A detected face and everything the analysis attaches to it.
#[derive(Clone, Debug)]
pub struct Face {
    id: String,
    detected: DetectedFace,
    attributes: BTreeMap<String, FaceAttribute>,
    position: Point2,
    disabled: bool,
    cluster_name: Option<String>,
    index: usize,
}

impl Face {
    pub fn new(id: impl Into<String>, detected: DetectedFace) -> Self {
        Self {
            id: id.into(),
            detected,
            attributes: BTreeMap::new(),
            position: Point2::default(),
            disabled: false,
            cluster_name: None,
            index: 0,
        }
    }

    /// Convenience constructor for a face with only a display position.
    pub fn at(id: impl Into<String>, x: f64, y: f64) -> Self {
        let mut face = Self::new(id, DetectedFace::default());
        face.position = Point2::new(x, y);
        face
    }

    pub fn from_record(record: FaceRecord) -> Self {
        Self {
            id: record.id,
            detected: record.detected,
            attributes: record.attributes,
            position: record.position,
            disabled: record.disabled,
            cluster_name: record.cluster,
            index: 0,
        }
    }

    pub fn to_record(&self) -> FaceRecord {
        FaceRecord {
            id: self.id.clone(),
            detected: self.detected.clone(),
            position: self.position,
            disabled: self.disabled,
            cluster: self.cluster_name.clone(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn detected(&self) -> &DetectedFace {
        &self.detected
    }

    pub fn position(&self) -> Point2 {
        self.position
    }

    pub fn set_position(&mut self, position: Point2) {
        self.position = position;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    pub(crate) fn set_cluster_name(&mut self, name: Option<String>) {
        self.cluster_name = name;
    }

    /// Position within the network, refreshed by [`FaceNetwork::assign_indices`].
    ///
    /// [`FaceNetwork::assign_indices`]: super::face_network::FaceNetwork::assign_indices
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn attributes(&self) -> &BTreeMap<String, FaceAttribute> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&FaceAttribute> {
        self.attributes.get(key)
    }

    /// Inserts or replaces an attribute regardless of its previous kind.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: FaceAttribute) {
        self.attributes.insert(key.into(), value);
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<FaceAttribute> {
        self.attributes.remove(key)
    }

    pub fn vector_attribute(&self, key: &str) -> Result<Vec<f64>, AttributeError> {
        self.attributes
            .get(key)
            .ok_or_else(|| AttributeError::Missing {
                key: key.to_string(),
            })?
            .as_vector(key)
    }

    pub fn point_attribute(&self, key: &str) -> Result<Point2, AttributeError> {
        self.attributes
            .get(key)
            .ok_or_else(|| AttributeError::Missing {
                key: key.to_string(),
            })?
            .as_point(key)
    }

    /// Spiral placement used before any layout attribute exists.
    ///
    /// Faces spread outward by `interval` per index, offset by the detection
    /// box origin so faces from the same frame stay near each other.
    pub fn generate_default_position(&mut self, index: usize, interval: f64) {
        let radius = interval * index as f64;
        let angle = index as f64 * PI / 6.0;
        let x = (angle.cos() * radius + self.detected.bbox[0] - 0.5) * 0.5;
        let y = (angle.sin() * radius + self.detected.bbox[1] - 0.5) * 0.5;
        self.set_attribute(DEFAULT_LAYOUT_KEY, FaceAttribute::Point(Point2::new(x, y)));
    }
}
