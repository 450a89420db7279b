pub mod cluster_faces_use_case;
pub mod embed_attribute_use_case;
