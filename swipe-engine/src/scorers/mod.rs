//! Scorers for ranking candidates

pub mod hybrid_ranker;
pub mod ranker;

pub use hybrid_ranker::{HybridConfig, HybridRanker, RankableItem, RankedItem};
pub use ranker::{RankedCandidate, Ranker, RankingOptions, SubScores};
