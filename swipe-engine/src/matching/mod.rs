//! Cluster matching against user signals

pub mod cluster_matcher;

pub use cluster_matcher::{ClusterMatcher, MatchResult, MatcherConfig};
