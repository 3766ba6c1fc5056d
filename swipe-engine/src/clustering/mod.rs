//! Density-based clustering of content embeddings

pub mod dbscan;

pub use dbscan::{ClusteringOutcome, ClusteringStats, DbscanClusterer, DbscanConfig, DistanceMetric};
