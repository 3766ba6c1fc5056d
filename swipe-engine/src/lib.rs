//! SwipeEngine - Personalized Content Recommendation Pipeline
//!
//! Given a user id and optional context, produces an ordered list of content
//! ids ranked by predicted relevance: content embeddings are clustered with
//! DBSCAN, clusters are matched against the user's embedding, profile, and
//! context, candidates are pulled from the matched clusters with seen-item
//! exclusion, and a multi-factor ranker scores and diversifies the result.

pub mod clustering;
pub mod config;
pub mod embedding;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod matching;
pub mod metrics;
pub mod params;
pub mod personalization;
pub mod scorers;
pub mod selection;
pub mod util;

// Re-exports for convenience
pub use config::EngineConfig;
pub use engine::{
    Recommendation, RecommendationEngine, RecommendationReason, RecommendationRequest,
};
pub use error::EngineError;
