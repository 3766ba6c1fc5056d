// Copyright 2026 X.AI Corp.
// Engine configuration

use crate::clustering::DbscanConfig;
use crate::matching::MatcherConfig;
use crate::params;
use serde::{Deserialize, Serialize};

/// Full engine configuration. Component configs validate themselves at
/// construction; this struct only gathers the tunables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub clustering: DbscanConfig,
    pub selection: SelectionConfig,
    pub ranking: RankingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Interaction look-back window for the exclusion set, in hours.
    pub time_window_hours: u32,
    /// Cluster matches below this score contribute no candidates.
    pub min_cluster_score: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            time_window_hours: 168,
            min_cluster_score: 0.2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Engine-wide novelty level; `None` keeps the base weights.
    pub novelty_level: Option<f64>,
    /// Engine-wide diversity level; values above 0 also enable MMR.
    pub diversity_level: Option<f64>,
    /// Recommendations returned when the request does not say.
    pub default_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            novelty_level: None,
            diversity_level: None,
            default_limit: params::DEFAULT_RESULT_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            matcher: MatcherConfig {
                max_clusters: env_usize("SWIPE_MAX_CLUSTERS", 10),
                min_match_threshold: env_f32("SWIPE_MIN_MATCH_THRESHOLD", 0.25),
                fallback_seed: std::env::var("SWIPE_FALLBACK_SEED")
                    .ok()
                    .and_then(|v| v.parse().ok()),
                ..Default::default()
            },
            clustering: DbscanConfig {
                epsilon: env_f32("SWIPE_DBSCAN_EPSILON", 0.3),
                min_points: env_usize("SWIPE_DBSCAN_MIN_POINTS", 4),
                ..Default::default()
            },
            selection: SelectionConfig {
                time_window_hours: env_u32("SWIPE_TIME_WINDOW_HOURS", 168),
                min_cluster_score: env_f32("SWIPE_MIN_CLUSTER_SCORE", 0.2),
            },
            ranking: RankingConfig {
                novelty_level: env_opt_f64("SWIPE_NOVELTY_LEVEL"),
                diversity_level: env_opt_f64("SWIPE_DIVERSITY_LEVEL"),
                default_limit: env_usize("SWIPE_DEFAULT_LIMIT", params::DEFAULT_RESULT_SIZE),
            },
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_opt_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
