pub mod face;
pub mod face_attribute;
pub mod face_cluster;
pub mod face_network;
pub mod project_store;
