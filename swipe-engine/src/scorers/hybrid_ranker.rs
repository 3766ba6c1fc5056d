//! Hybrid content / engagement / recency ranking
//!
//! A stateless ranking surface over pre-hydrated items: no store access, no
//! clock, no randomness. Identical inputs produce identical outputs.

use crate::engagement::EngagementVector;
use crate::error::EngineError;
use crate::util::vector_ops;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swipe_store::ContentId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HybridConfig {
    pub content_weight: f64,
    pub engagement_weight: f64,
    pub recency_weight: f64,
    /// Items below this cosine similarity are dropped.
    pub min_similarity: f32,
    /// e-folding time of the recency score, in days.
    pub recency_decay_days: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.5,
            engagement_weight: 0.3,
            recency_weight: 0.2,
            min_similarity: 0.1,
            recency_decay_days: 7.0,
        }
    }
}

/// A pre-hydrated item ready for hybrid ranking.
#[derive(Clone, Debug)]
pub struct RankableItem {
    pub content_id: ContentId,
    pub content_vector: Vec<f32>,
    pub engagement: Option<EngagementVector>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedItem {
    pub content_id: ContentId,
    pub score: f64,
    pub similarity: f32,
    pub engagement_score: f64,
    pub recency_score: f64,
}

// Engagement blend shares
const QUALITY_SHARE: f64 = 0.4;
const VIRALITY_SHARE: f64 = 0.3;
const LIKE_SHARE: f64 = 0.15;
const COMMENT_SHARE: f64 = 0.15;

pub struct HybridRanker {
    config: HybridConfig,
}

impl HybridRanker {
    /// Weights are renormalized to sum to 1 here and on every
    /// `update_config`.
    pub fn new(config: HybridConfig) -> Result<Self, EngineError> {
        Ok(Self {
            config: Self::validate(config)?,
        })
    }

    pub fn update_config(&mut self, config: HybridConfig) -> Result<(), EngineError> {
        self.config = Self::validate(config)?;
        Ok(())
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    fn validate(mut config: HybridConfig) -> Result<HybridConfig, EngineError> {
        for (name, weight) in [
            ("content_weight", config.content_weight),
            ("engagement_weight", config.engagement_weight),
            ("recency_weight", config.recency_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be non-negative, got {weight}"
                )));
            }
        }
        let sum = config.content_weight + config.engagement_weight + config.recency_weight;
        if sum <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "hybrid weights must sum to a positive value".to_string(),
            ));
        }
        if (sum - 1.0).abs() > 1e-5 {
            log::warn!("hybrid weights sum to {sum}, renormalizing to 1");
        }
        config.content_weight /= sum;
        config.engagement_weight /= sum;
        config.recency_weight /= sum;

        if config.recency_decay_days <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "recency_decay_days must be positive, got {}",
                config.recency_decay_days
            )));
        }
        Ok(config)
    }

    /// Rank items against the query vector as of the given instant.
    ///
    /// Fails fast on a dimension mismatch; that is a programming error, not
    /// bad data.
    pub fn rank(
        &self,
        query_vector: &[f32],
        items: &[RankableItem],
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedItem>, EngineError> {
        let mut ranked = Vec::with_capacity(items.len());
        for item in items {
            let similarity = vector_ops::cosine_similarity(query_vector, &item.content_vector)?;
            if similarity < self.config.min_similarity {
                continue;
            }
            let engagement_score = Self::engagement_score(item.engagement.as_ref());
            let recency_score = Self::recency_score(item.created_at, now, self.config.recency_decay_days);

            let score = self.config.content_weight * f64::from(similarity)
                + self.config.engagement_weight * engagement_score
                + self.config.recency_weight * recency_score;

            ranked.push(RankedItem {
                content_id: item.content_id,
                score,
                similarity,
                engagement_score,
                recency_score,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        Ok(ranked)
    }

    fn engagement_score(engagement: Option<&EngagementVector>) -> f64 {
        match engagement {
            Some(features) => (QUALITY_SHARE * f64::from(features.quality_score)
                + VIRALITY_SHARE * f64::from(features.virality_score)
                + LIKE_SHARE * f64::from(features.like_rate)
                + COMMENT_SHARE * f64::from(features.comment_rate))
            .clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>, decay_days: f64) -> f64 {
        let age_days = (now - created_at).num_seconds().max(0) as f64 / 86_400.0;
        (-age_days / decay_days).exp().clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::calculate_engagement;
    use chrono::Duration;
    use swipe_store::EngagementMetrics;

    fn item(content_id: ContentId, vector: Vec<f32>, created_at: DateTime<Utc>) -> RankableItem {
        RankableItem {
            content_id,
            content_vector: vector,
            engagement: None,
            created_at,
        }
    }

    #[test]
    fn test_rank_orders_by_similarity_and_recency() {
        let now = Utc::now();
        let items = vec![
            item(1, vec![0.9, 0.1, 0.0], now),
            item(2, vec![0.1, 0.9, 0.0], now - Duration::days(1)),
        ];
        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();

        let ranked = ranker.rank(&[1.0, 0.0, 0.0], &items, now).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content_id, 1);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_rank_is_pure() {
        let now = Utc::now();
        let items = vec![
            item(1, vec![0.9, 0.1, 0.0], now),
            item(2, vec![0.1, 0.9, 0.0], now - Duration::days(1)),
        ];
        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();

        let first = ranker.rank(&[1.0, 0.0, 0.0], &items, now).unwrap();
        let second = ranker.rank(&[1.0, 0.0, 0.0], &items, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_min_similarity_filter() {
        let now = Utc::now();
        let items = vec![
            item(1, vec![1.0, 0.0, 0.0], now),
            item(2, vec![0.0, 1.0, 0.0], now),
        ];
        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();

        let ranked = ranker.rank(&[1.0, 0.0, 0.0], &items, now).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].content_id, 1);
    }

    #[test]
    fn test_engagement_contributes() {
        let now = Utc::now();
        let engaged = RankableItem {
            engagement: Some(calculate_engagement(
                &EngagementMetrics {
                    views: 1000,
                    likes: 300,
                    comments: 100,
                    shares: 100,
                    saves: 50,
                    avg_watch_time: 20.0,
                    completion_rate: 0.9,
                    ..Default::default()
                },
                30.0,
            )),
            ..item(1, vec![1.0, 0.0], now)
        };
        let cold = item(2, vec![1.0, 0.0], now);

        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();
        let ranked = ranker.rank(&[1.0, 0.0], &[cold, engaged], now).unwrap();

        assert_eq!(ranked[0].content_id, 1);
        assert!(ranked[0].engagement_score > 0.0);
        assert_eq!(ranked[1].engagement_score, 0.0);
    }

    #[test]
    fn test_recency_decay() {
        let now = Utc::now();
        let fresh = item(1, vec![1.0, 0.0], now);
        let stale = item(2, vec![1.0, 0.0], now - Duration::days(30));

        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();
        let ranked = ranker.rank(&[1.0, 0.0], &[stale, fresh], now).unwrap();

        assert_eq!(ranked[0].content_id, 1);
        assert!(ranked[0].recency_score > 0.99);
        assert!(ranked[1].recency_score < 0.02);
    }

    #[test]
    fn test_weights_renormalized_on_construction_and_update() {
        let config = HybridConfig {
            content_weight: 5.0,
            engagement_weight: 3.0,
            recency_weight: 2.0,
            ..Default::default()
        };
        let mut ranker = HybridRanker::new(config).unwrap();
        let sum = ranker.config.content_weight
            + ranker.config.engagement_weight
            + ranker.config.recency_weight;
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((ranker.config.content_weight - 0.5).abs() < 1e-9);

        ranker
            .update_config(HybridConfig {
                content_weight: 1.0,
                engagement_weight: 1.0,
                recency_weight: 2.0,
                ..Default::default()
            })
            .unwrap();
        let sum = ranker.config.content_weight
            + ranker.config.engagement_weight
            + ranker.config.recency_weight;
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((ranker.config.recency_weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let negative = HybridConfig {
            content_weight: -1.0,
            ..Default::default()
        };
        assert!(HybridRanker::new(negative).is_err());

        let zero_sum = HybridConfig {
            content_weight: 0.0,
            engagement_weight: 0.0,
            recency_weight: 0.0,
            ..Default::default()
        };
        assert!(HybridRanker::new(zero_sum).is_err());

        let bad_decay = HybridConfig {
            recency_decay_days: 0.0,
            ..Default::default()
        };
        assert!(HybridRanker::new(bad_decay).is_err());
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let now = Utc::now();
        let items = vec![item(1, vec![1.0, 0.0, 0.0], now)];
        let ranker = HybridRanker::new(HybridConfig::default()).unwrap();
        assert!(ranker.rank(&[1.0, 0.0], &items, now).is_err());
    }
}
