// Copyright 2026 X.AI Corp.
// Multi-factor candidate ranking with MMR-style diversification

use crate::error::EngineError;
use crate::params as p;
use crate::personalization::RecommendationContext;
use crate::selection::Candidate;
use crate::util::vector_ops;
use chrono::{DateTime, Utc, Weekday};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swipe_store::{ContentEmbedding, ContentEmbeddingRepo, ContentId, EngagementMetrics};

/// Per-request ranking knobs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RankingOptions {
    /// Preference for fresh content in [0, 1]; shifts weight from relevance
    /// and engagement into novelty.
    pub novelty_level: Option<f64>,
    /// Preference for variety in [0, 1]; shifts weight from relevance into
    /// diversity and, when positive, enables MMR re-selection with this
    /// lambda.
    pub diversity_level: Option<f64>,
    pub user_interests: Vec<String>,
    pub context: Option<RecommendationContext>,
    /// Diversification stops after this many picks; defaults to all.
    pub target_size: Option<usize>,
}

/// The five sub-scores, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub relevance: f64,
    pub engagement: f64,
    pub novelty: f64,
    pub diversity: f64,
    pub context: f64,
}

impl SubScores {
    /// The fallback when a candidate cannot be scored.
    pub fn neutral() -> Self {
        Self {
            relevance: p::NEUTRAL_SCORE,
            engagement: p::NEUTRAL_SCORE,
            novelty: p::NEUTRAL_SCORE,
            diversity: p::NEUTRAL_SCORE,
            context: p::NEUTRAL_SCORE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub scores: SubScores,
    pub final_score: f64,
}

struct RankWeights([f64; 5]);

impl RankWeights {
    /// Base weights shifted by the requested novelty / diversity levels,
    /// then renormalized to sum to 1.
    fn adjusted(options: &RankingOptions) -> Self {
        let mut weights = [
            p::RELEVANCE_WEIGHT,
            p::ENGAGEMENT_WEIGHT,
            p::NOVELTY_WEIGHT,
            p::DIVERSITY_WEIGHT,
            p::CONTEXT_WEIGHT,
        ];
        if let Some(level) = options.novelty_level {
            let delta = level - p::NOVELTY_BASELINE;
            weights[2] += delta;
            weights[0] -= delta / 2.0;
            weights[1] -= delta / 2.0;
        }
        if let Some(level) = options.diversity_level {
            let delta = level - p::DIVERSITY_BASELINE;
            weights[3] += delta;
            weights[0] -= delta;
        }
        for weight in weights.iter_mut() {
            *weight = weight.max(0.0);
        }
        let sum: f64 = weights.iter().sum();
        if sum > 0.0 {
            for weight in weights.iter_mut() {
                *weight /= sum;
            }
        } else {
            weights = [
                p::RELEVANCE_WEIGHT,
                p::ENGAGEMENT_WEIGHT,
                p::NOVELTY_WEIGHT,
                p::DIVERSITY_WEIGHT,
                p::CONTEXT_WEIGHT,
            ];
        }
        Self(weights)
    }

    fn combine(&self, scores: &SubScores) -> f64 {
        (self.0[0] * scores.relevance
            + self.0[1] * scores.engagement
            + self.0[2] * scores.novelty
            + self.0[3] * scores.diversity
            + self.0[4] * scores.context)
            .clamp(0.0, 1.0)
    }
}

/// Transforms candidates into a ranked list ordered by final score.
///
/// Content embeddings are pulled through a TTL cache so repeated requests
/// reuse hot vectors instead of hitting the store.
pub struct Ranker {
    content_repo: Arc<dyn ContentEmbeddingRepo>,
    embedding_cache: Cache<ContentId, Arc<ContentEmbedding>>,
}

impl Ranker {
    pub fn new(content_repo: Arc<dyn ContentEmbeddingRepo>) -> Self {
        Self {
            content_repo,
            embedding_cache: Cache::builder()
                .max_capacity(p::RANKER_CACHE_CAPACITY)
                .time_to_live(Duration::from_secs(p::RANKER_CACHE_TTL_SECS))
                .build(),
        }
    }

    /// Rank the candidates. One bad candidate never fails the batch: it
    /// falls back to neutral sub-scores and stays in the output.
    pub async fn rank_candidates(
        &self,
        mut candidates: Vec<Candidate>,
        user_vector: Option<&[f32]>,
        options: &RankingOptions,
    ) -> Vec<RankedCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let embeddings = self.hydrate(&mut candidates).await;
        let weights = RankWeights::adjusted(options);
        let now = Utc::now();

        let mut ranked: Vec<RankedCandidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let content_vector = embeddings
                .get(&candidate.content_id)
                .map(|e| e.vector.as_slice());
            let scores =
                match score_candidate(&candidate, content_vector, user_vector, options, &ranked, now)
                {
                    Ok(scores) => scores,
                    Err(error) => {
                        log::warn!(
                            "scoring candidate {} failed ({error}); using neutral scores",
                            candidate.content_id
                        );
                        SubScores::neutral()
                    }
                };
            let final_score = weights.combine(&scores);
            ranked.push(RankedCandidate {
                candidate,
                scores,
                final_score,
            });
        }

        ranked.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.candidate.content_id.cmp(&b.candidate.content_id))
        });

        if let Some(lambda) = options.diversity_level.filter(|l| *l > 0.0) {
            let target = options.target_size.unwrap_or(ranked.len());
            ranked = diversify(ranked, lambda, target);
        }
        ranked
    }

    /// Fetch content embeddings (cache first, one batched store read for the
    /// misses) and backfill candidate metadata from them. A store failure
    /// here is logged and ranking proceeds on cluster signals alone.
    async fn hydrate(
        &self,
        candidates: &mut [Candidate],
    ) -> HashMap<ContentId, Arc<ContentEmbedding>> {
        let mut hydrated: HashMap<ContentId, Arc<ContentEmbedding>> = HashMap::new();
        let mut missing: Vec<ContentId> = Vec::new();
        for candidate in candidates.iter() {
            match self.embedding_cache.get(&candidate.content_id) {
                Some(embedding) => {
                    hydrated.insert(candidate.content_id, embedding);
                }
                None => missing.push(candidate.content_id),
            }
        }

        if !missing.is_empty() {
            match self.content_repo.find_by_ids(&missing).await {
                Ok(rows) => {
                    for row in rows {
                        let embedding = Arc::new(row);
                        self.embedding_cache
                            .insert(embedding.content_id, Arc::clone(&embedding));
                        hydrated.insert(embedding.content_id, embedding);
                    }
                }
                Err(error) => {
                    log::error!("content hydration failed, ranking without vectors: {error}");
                }
            }
        }

        for candidate in candidates.iter_mut() {
            if let Some(embedding) = hydrated.get(&candidate.content_id) {
                let meta = &embedding.metadata;
                if candidate.metadata.topics.is_empty() {
                    candidate.metadata.topics = meta.topics.clone();
                }
                if candidate.metadata.created_at.is_none() {
                    candidate.metadata.created_at = meta.created_at;
                }
                if candidate.metadata.engagement.is_none() {
                    candidate.metadata.engagement = meta.engagement.clone();
                }
                if candidate.metadata.location.is_none() {
                    candidate.metadata.location = meta.location.clone();
                }
            }
        }
        hydrated
    }
}

fn score_candidate(
    candidate: &Candidate,
    content_vector: Option<&[f32]>,
    user_vector: Option<&[f32]>,
    options: &RankingOptions,
    previous: &[RankedCandidate],
    now: DateTime<Utc>,
) -> Result<SubScores, EngineError> {
    Ok(SubScores {
        relevance: relevance_score(candidate, content_vector, user_vector)?,
        engagement: engagement_score(candidate),
        novelty: novelty_score(candidate, &options.user_interests, now),
        diversity: diversity_score(candidate, previous),
        context: context_score(candidate, options.context.as_ref()),
    })
}

/// Cluster provenance, sharpened by embedding similarity when both vectors
/// are at hand. Without a user vector there is no relevance signal at all
/// and the neutral default applies.
fn relevance_score(
    candidate: &Candidate,
    content_vector: Option<&[f32]>,
    user_vector: Option<&[f32]>,
) -> Result<f64, EngineError> {
    let Some(user_vector) = user_vector else {
        return Ok(p::NEUTRAL_SCORE);
    };
    let mut score = candidate.cluster_score * 0.5;
    if let Some(content_vector) = content_vector {
        let similarity = vector_ops::cosine_similarity(user_vector, content_vector)?;
        score += f64::from((similarity + 1.0) / 2.0) * 0.5;
    }
    Ok(score.clamp(0.0, 1.0))
}

fn engagement_score(candidate: &Candidate) -> f64 {
    match &candidate.metadata.engagement {
        Some(metrics) => {
            let weighted = metrics.likes as f64
                + p::ENGAGEMENT_COMMENT_WEIGHT * metrics.comments as f64
                + p::ENGAGEMENT_SHARE_WEIGHT * metrics.shares as f64
                + p::ENGAGEMENT_VIEW_WEIGHT * metrics.views as f64;
            (weighted / p::ENGAGEMENT_CALIBRATION).min(1.0)
        }
        None => p::NEUTRAL_SCORE,
    }
}

fn novelty_score(candidate: &Candidate, interests: &[String], now: DateTime<Utc>) -> f64 {
    let Some(created_at) = candidate.metadata.created_at else {
        return p::NEUTRAL_SCORE;
    };
    let age_hours = (now - created_at).num_seconds().max(0) as f64 / 3600.0;
    let recency = (-age_hours / p::RECENCY_DECAY_HOURS).exp();
    if candidate.metadata.topics.is_empty() {
        return recency;
    }
    let topic_novelty = 1.0 - overlap_ratio(&candidate.metadata.topics, interests);
    p::NOVELTY_RECENCY_SHARE * recency + p::NOVELTY_TOPIC_SHARE * topic_novelty
}

/// Topic separation from the most recently ranked candidates. Candidates
/// with no topics fall back to the shape of their engagement (Shannon
/// entropy over like/comment/share proportions), then to neutral.
fn diversity_score(candidate: &Candidate, previous: &[RankedCandidate]) -> f64 {
    if previous.is_empty() {
        return 1.0;
    }
    if !candidate.metadata.topics.is_empty() {
        let window = &previous[previous.len().saturating_sub(p::DIVERSITY_LOOKBACK)..];
        let mean_overlap: f64 = window
            .iter()
            .map(|prior| {
                overlap_ratio(&candidate.metadata.topics, &prior.candidate.metadata.topics)
            })
            .sum::<f64>()
            / window.len() as f64;
        return (1.0 - mean_overlap).clamp(0.0, 1.0);
    }
    match &candidate.metadata.engagement {
        Some(metrics) => engagement_entropy(metrics),
        None => p::NEUTRAL_SCORE,
    }
}

fn engagement_entropy(metrics: &EngagementMetrics) -> f64 {
    let total = (metrics.likes + metrics.comments + metrics.shares) as f64;
    if total == 0.0 {
        return p::NEUTRAL_SCORE;
    }
    let mut entropy = 0.0f64;
    for count in [metrics.likes, metrics.comments, metrics.shares] {
        if count == 0 {
            continue;
        }
        let proportion = count as f64 / total;
        entropy -= proportion * proportion.log2();
    }
    (entropy / 3f64.log2()).clamp(0.0, 1.0)
}

fn context_score(candidate: &Candidate, context: Option<&RecommendationContext>) -> f64 {
    let Some(context) = context else {
        return p::NEUTRAL_SCORE;
    };
    let mut signals: Vec<f64> = Vec::with_capacity(3);
    if let Some(hour) = context.time_of_day {
        signals.push(time_of_day_score(hour));
    }
    if let Some(day) = context.weekday {
        signals.push(day_of_week_score(day));
    }
    if let (Some(requested), Some(location)) = (&context.location, &candidate.metadata.location) {
        signals.push(location_score(requested, location));
    }
    if signals.is_empty() {
        return p::NEUTRAL_SCORE;
    }
    signals.iter().sum::<f64>() / signals.len() as f64
}

fn time_of_day_score(hour: u8) -> f64 {
    let within = |range: (u8, u8)| hour >= range.0 && hour <= range.1;
    if within(p::MORNING_PEAK) || within(p::EVENING_PEAK) {
        return (p::NEUTRAL_SCORE + p::PEAK_HOURS_WEIGHT).min(1.0);
    }
    if within(p::LOW_ENGAGEMENT_HOURS) {
        return (p::NEUTRAL_SCORE - p::LOW_ENGAGEMENT_WEIGHT).max(0.0);
    }
    let distance = hours_to_nearest_peak(hour) as f64;
    (p::NEUTRAL_SCORE + p::PEAK_HOURS_WEIGHT * (-distance / p::OFF_PEAK_DECAY_HOURS).exp())
        .min(1.0)
}

fn hours_to_nearest_peak(hour: u8) -> u32 {
    let mut best = 24u32;
    for peak in [p::MORNING_PEAK, p::EVENING_PEAK] {
        for peak_hour in peak.0..=peak.1 {
            let diff = (hour as i32 - peak_hour as i32).unsigned_abs();
            best = best.min(diff.min(24 - diff));
        }
    }
    best
}

fn day_of_week_score(day: Weekday) -> f64 {
    let bonus = match day {
        Weekday::Sat | Weekday::Sun => p::WEEKEND_WEIGHT,
        Weekday::Tue | Weekday::Wed | Weekday::Thu => p::MID_WEEK_WEIGHT,
        Weekday::Mon | Weekday::Fri => p::WEEK_START_END_WEIGHT,
    };
    (p::NEUTRAL_SCORE + bonus).min(1.0)
}

fn location_score(requested: &str, location: &str) -> f64 {
    if requested == location {
        return (p::NEUTRAL_SCORE + p::SAME_LOCATION_WEIGHT).min(1.0);
    }
    let same_country = RecommendationContext::country_of(requested)
        == RecommendationContext::country_of(location);
    if same_country {
        let bonus = (p::SAME_LOCATION_WEIGHT + p::DIFFERENT_LOCATION_WEIGHT) / 2.0;
        return (p::NEUTRAL_SCORE + bonus).min(1.0);
    }
    (p::NEUTRAL_SCORE - p::DIFFERENT_LOCATION_WEIGHT).max(0.0)
}

/// Shared topics over the candidate's own topic count.
fn overlap_ratio(topics: &[String], other: &[String]) -> f64 {
    let shared = topics.iter().filter(|topic| other.contains(topic)).count();
    shared as f64 / topics.len().max(1) as f64
}

/// Greedy MMR: always keep the top pick, then repeatedly take the candidate
/// maximizing `(1 - lambda) * final_score + lambda * min_diversity` against
/// everything selected so far.
fn diversify(ranked: Vec<RankedCandidate>, lambda: f64, target: usize) -> Vec<RankedCandidate> {
    if ranked.len() <= 1 || target == 0 {
        return ranked;
    }
    let mut remaining = ranked;
    let mut selected: Vec<RankedCandidate> = Vec::with_capacity(target.min(remaining.len()));
    selected.push(remaining.remove(0));

    while selected.len() < target && !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (index, entry) in remaining.iter().enumerate() {
            let min_diversity = selected
                .iter()
                .map(|prior| {
                    1.0 - overlap_ratio(
                        &entry.candidate.metadata.topics,
                        &prior.candidate.metadata.topics,
                    )
                })
                .fold(1.0f64, f64::min);
            let mmr = (1.0 - lambda) * entry.final_score + lambda * min_diversity;
            if mmr > best_score {
                best_score = mmr;
                best_index = index;
            }
        }
        selected.push(remaining.remove(best_index));
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::CandidateMeta;
    use chrono::Duration as ChronoDuration;
    use swipe_store::memory::InMemoryContentEmbeddingRepo;
    use swipe_store::ContentMeta;

    fn candidate(content_id: ContentId, cluster_score: f64) -> Candidate {
        Candidate {
            content_id,
            cluster_id: 1,
            cluster_score,
            metadata: CandidateMeta::default(),
        }
    }

    fn with_topics(mut c: Candidate, topics: &[&str]) -> Candidate {
        c.metadata.topics = topics.iter().map(|t| t.to_string()).collect();
        c
    }

    async fn ranker() -> Ranker {
        Ranker::new(Arc::new(InMemoryContentEmbeddingRepo::new()))
    }

    #[tokio::test]
    async fn test_no_user_vector_defaults_relevance_and_recency_wins() {
        let now = Utc::now();
        let mut newest = candidate(1, 0.9);
        newest.metadata.created_at = Some(now - ChronoDuration::hours(1));
        let mut mid = candidate(2, 0.9);
        mid.metadata.created_at = Some(now - ChronoDuration::hours(25));
        let mut oldest = candidate(3, 0.9);
        oldest.metadata.created_at = Some(now - ChronoDuration::hours(49));

        let ranked = ranker()
            .await
            .rank_candidates(
                vec![newest, mid, oldest],
                None,
                &RankingOptions::default(),
            )
            .await;

        assert_eq!(ranked.len(), 3);
        for entry in &ranked {
            assert!((entry.scores.relevance - 0.5).abs() < 1e-9);
        }
        assert_eq!(ranked[0].candidate.content_id, 1);
        assert_eq!(ranked[1].candidate.content_id, 2);
        assert_eq!(ranked[2].candidate.content_id, 3);
    }

    #[tokio::test]
    async fn test_scores_bounded_and_sorted() {
        let now = Utc::now();
        let candidates: Vec<Candidate> = (0..10)
            .map(|i| {
                let mut c = candidate(i, (i as f64) / 10.0);
                c.metadata.created_at = Some(now - ChronoDuration::hours(i * 7));
                c.metadata.engagement = Some(EngagementMetrics {
                    views: 100 * i as u64,
                    likes: 10 * i as u64,
                    comments: i as u64,
                    shares: i as u64 / 2,
                    ..Default::default()
                });
                c
            })
            .collect();

        let ranked = ranker()
            .await
            .rank_candidates(candidates, None, &RankingOptions::default())
            .await;

        for entry in &ranked {
            for score in [
                entry.scores.relevance,
                entry.scores.engagement,
                entry.scores.novelty,
                entry.scores.diversity,
                entry.scores.context,
                entry.final_score,
            ] {
                assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
            }
        }
        assert!(ranked
            .windows(2)
            .all(|w| w[0].final_score >= w[1].final_score));
    }

    #[tokio::test]
    async fn test_relevance_uses_cached_content_vector() {
        let repo = Arc::new(InMemoryContentEmbeddingRepo::new());
        repo.save(ContentEmbedding {
            content_id: 1,
            vector: vec![1.0, 0.0],
            updated_at: Utc::now(),
            metadata: ContentMeta::default(),
        })
        .await
        .unwrap();
        repo.save(ContentEmbedding {
            content_id: 2,
            vector: vec![0.0, 1.0],
            updated_at: Utc::now(),
            metadata: ContentMeta::default(),
        })
        .await
        .unwrap();

        let ranker = Ranker::new(repo);
        let ranked = ranker
            .rank_candidates(
                vec![candidate(1, 0.5), candidate(2, 0.5)],
                Some(&[1.0, 0.0]),
                &RankingOptions::default(),
            )
            .await;

        assert_eq!(ranked[0].candidate.content_id, 1);
        // cluster 0.5 * 0.5 + shifted cosine 1.0 * 0.5
        assert!((ranked[0].scores.relevance - 0.75).abs() < 1e-6);
        // orthogonal vector shifts to 0.5, halved
        assert!((ranked[1].scores.relevance - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_falls_back_to_neutral() {
        let repo = Arc::new(InMemoryContentEmbeddingRepo::new());
        repo.save(ContentEmbedding {
            content_id: 1,
            vector: vec![1.0, 0.0, 0.0],
            updated_at: Utc::now(),
            metadata: ContentMeta::default(),
        })
        .await
        .unwrap();

        let ranker = Ranker::new(repo);
        let ranked = ranker
            .rank_candidates(
                vec![candidate(1, 0.9)],
                Some(&[1.0, 0.0]),
                &RankingOptions::default(),
            )
            .await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].scores, SubScores::neutral());
        assert!((ranked[0].final_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_hydration_backfills_metadata() {
        let repo = Arc::new(InMemoryContentEmbeddingRepo::new());
        let created = Utc::now() - ChronoDuration::hours(2);
        repo.save(ContentEmbedding {
            content_id: 1,
            vector: vec![1.0, 0.0],
            updated_at: Utc::now(),
            metadata: ContentMeta {
                topics: vec!["music".to_string()],
                created_at: Some(created),
                ..Default::default()
            },
        })
        .await
        .unwrap();

        let ranker = Ranker::new(repo);
        let ranked = ranker
            .rank_candidates(vec![candidate(1, 0.9)], None, &RankingOptions::default())
            .await;

        assert_eq!(ranked[0].candidate.metadata.topics, vec!["music"]);
        assert_eq!(ranked[0].candidate.metadata.created_at, Some(created));
    }

    #[test]
    fn test_weight_adjustment_novelty() {
        let options = RankingOptions {
            novelty_level: Some(0.8),
            ..Default::default()
        };
        let weights = RankWeights::adjusted(&options);
        // delta = 0.5: novelty 0.15 + 0.5, relevance 0.40 - 0.25, engagement 0.25 - 0.25
        let expected_raw = [0.15, 0.0, 0.65, 0.10, 0.10];
        let expected_sum: f64 = expected_raw.iter().sum();
        for (weight, expected) in weights.0.iter().zip(expected_raw.iter()) {
            assert!((weight - expected / expected_sum).abs() < 1e-9);
        }
        assert!((weights.0.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_adjustment_diversity() {
        let options = RankingOptions {
            diversity_level: Some(0.9),
            ..Default::default()
        };
        let weights = RankWeights::adjusted(&options);
        assert!((weights.0.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // diversity outranks relevance after the full shift
        assert!(weights.0[3] > weights.0[0]);
    }

    #[test]
    fn test_time_of_day_scores() {
        assert!((time_of_day_score(8) - 0.8).abs() < 1e-9);
        assert!((time_of_day_score(19) - 0.8).abs() < 1e-9);
        assert!((time_of_day_score(3) - 0.3).abs() < 1e-9);
        // Off-peak decays smoothly from the nearest peak
        let near = time_of_day_score(10);
        let far = time_of_day_score(14);
        assert!(near > far);
        assert!(far > 0.5);
    }

    #[test]
    fn test_day_of_week_scores() {
        assert!((day_of_week_score(Weekday::Sun) - 0.7).abs() < 1e-9);
        assert!((day_of_week_score(Weekday::Wed) - 0.6).abs() < 1e-9);
        assert!((day_of_week_score(Weekday::Mon) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_location_scores() {
        assert!((location_score("US-CA", "US-CA") - 0.8).abs() < 1e-9);
        assert!((location_score("US-CA", "US-NY") - 0.75).abs() < 1e-9);
        assert!((location_score("US-CA", "BR-SP") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_entropy_range() {
        let even = EngagementMetrics {
            likes: 10,
            comments: 10,
            shares: 10,
            ..Default::default()
        };
        assert!((engagement_entropy(&even) - 1.0).abs() < 1e-9);

        let skewed = EngagementMetrics {
            likes: 100,
            ..Default::default()
        };
        assert_eq!(engagement_entropy(&skewed), 0.0);
    }

    #[tokio::test]
    async fn test_mmr_full_diversity_avoids_topic_repeats() {
        let now = Utc::now();
        let mut candidates = vec![
            with_topics(candidate(1, 0.95), &["music"]),
            with_topics(candidate(2, 0.94), &["music"]),
            with_topics(candidate(3, 0.5), &["sports"]),
        ];
        for c in candidates.iter_mut() {
            c.metadata.created_at = Some(now);
        }

        let options = RankingOptions {
            diversity_level: Some(1.0),
            ..Default::default()
        };
        let ranked = ranker().await.rank_candidates(candidates, None, &options).await;

        // With lambda = 1 a disjoint-topic alternative must interleave
        assert_eq!(ranked[0].candidate.metadata.topics, vec!["music"]);
        assert_eq!(ranked[1].candidate.metadata.topics, vec!["sports"]);
        assert_eq!(ranked[2].candidate.metadata.topics, vec!["music"]);
    }

    #[tokio::test]
    async fn test_stable_output_for_identical_inputs() {
        let now = Utc::now();
        let build = |_: ()| -> Vec<Candidate> {
            (0..8)
                .map(|i| {
                    let mut c = candidate(i, 0.5 + (i as f64) * 0.01);
                    c.metadata.created_at = Some(now - ChronoDuration::hours(i));
                    c
                })
                .collect()
        };
        let ranker = ranker().await;
        let first = ranker
            .rank_candidates(build(()), None, &RankingOptions::default())
            .await;
        let second = ranker
            .rank_candidates(build(()), None, &RankingOptions::default())
            .await;
        let first_ids: Vec<ContentId> = first.iter().map(|r| r.candidate.content_id).collect();
        let second_ids: Vec<ContentId> = second.iter().map(|r| r.candidate.content_id).collect();
        assert_eq!(first_ids, second_ids);
    }
}
