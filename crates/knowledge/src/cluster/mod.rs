//! Topic clustering of chunk embeddings.

pub mod kmeans;
pub mod label;

pub use kmeans::{euclidean_distance, kmeans, KMeansResult, Lcg};
pub use label::{generate_cluster_label, UNCATEGORIZED};
