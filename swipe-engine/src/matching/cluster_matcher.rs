// Copyright 2026 X.AI Corp.
// Multi-factor cluster matching for personalization

use crate::error::EngineError;
use crate::params as p;
use crate::personalization::{RecommendationContext, UserProfile};
use crate::util::vector_ops;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use swipe_store::{Cluster, ClusterId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Share of the match driven by embedding similarity.
    pub embedding_weight: f32,
    /// Share driven by interest overlap.
    pub interest_weight: f32,
    /// Share driven by contextual boost.
    pub context_weight: f32,
    /// Maximum matches returned.
    pub max_clusters: usize,
    /// Matches below this similarity are dropped.
    pub min_match_threshold: f32,
    /// Seed for the cold-start fallback jitter; `None` draws from entropy.
    pub fallback_seed: Option<u64>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            embedding_weight: 0.6,
            interest_weight: 0.2,
            context_weight: 0.2,
            max_clusters: 10,
            min_match_threshold: 0.25,
            fallback_seed: None,
        }
    }
}

/// A cluster judged relevant to the requesting user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub cluster_id: ClusterId,
    /// Match strength, comparable across clusters.
    pub similarity: f32,
    /// Ranking key. Equal to `similarity` except on the cold-start fallback
    /// path, where a small uniform random term is added to the score only.
    pub score: f32,
}

pub struct ClusterMatcher {
    config: MatcherConfig,
}

impl ClusterMatcher {
    /// Weights are stored normalized to sum to 1. Unnormalized weights are
    /// accepted with a warning.
    pub fn new(mut config: MatcherConfig) -> Result<Self, EngineError> {
        let sum = config.embedding_weight + config.interest_weight + config.context_weight;
        if !sum.is_finite() || sum <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "matcher weights must sum to a positive value, got {sum}"
            )));
        }
        if (sum - 1.0).abs() > 1e-5 {
            log::warn!("matcher weights sum to {sum}, renormalizing to 1");
            config.embedding_weight /= sum;
            config.interest_weight /= sum;
            config.context_weight /= sum;
        }
        if config.max_clusters == 0 {
            return Err(EngineError::InvalidConfig(
                "max_clusters must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Score the clusters against whatever user signal is available and
    /// return the best matches, strongest first.
    ///
    /// Branches, in order of preference: embedding similarity (optionally
    /// blended with contextual boost), interest overlap, and the diversified
    /// cold-start fallback when no user signal exists at all.
    pub fn find_relevant_clusters(
        &self,
        clusters: &[Cluster],
        user_vector: Option<&[f32]>,
        profile: Option<&UserProfile>,
        context: Option<&RecommendationContext>,
    ) -> Vec<MatchResult> {
        if clusters.is_empty() {
            return Vec::new();
        }

        let mut matches = match (user_vector, profile) {
            (Some(vector), _) => self.match_by_embedding(clusters, vector, profile, context),
            (None, Some(profile)) => self.match_by_interests(clusters, profile, context),
            (None, None) => self.default_matches(clusters),
        };

        matches.retain(|m| m.similarity >= self.config.min_match_threshold);
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cluster_id.cmp(&b.cluster_id))
        });
        matches.truncate(self.config.max_clusters);
        matches
    }

    fn match_by_embedding(
        &self,
        clusters: &[Cluster],
        user_vector: &[f32],
        profile: Option<&UserProfile>,
        context: Option<&RecommendationContext>,
    ) -> Vec<MatchResult> {
        let user_vector = vector_ops::normalize_l2(user_vector);
        clusters
            .iter()
            .filter_map(|cluster| {
                let centroid = vector_ops::normalize_l2(&cluster.centroid);
                let base = match vector_ops::cosine_similarity(&user_vector, &centroid) {
                    Ok(similarity) => similarity,
                    Err(error) => {
                        log::warn!(
                            "skipping cluster {}: centroid dimension mismatch ({error})",
                            cluster.id
                        );
                        return None;
                    }
                };
                let similarity = match (profile, context) {
                    (Some(profile), Some(context)) => {
                        let boost = Self::contextual_boost(profile, context, cluster);
                        (1.0 - self.config.context_weight) * base
                            + self.config.context_weight * boost
                    }
                    _ => base,
                };
                Some(MatchResult {
                    cluster_id: cluster.id,
                    similarity,
                    score: similarity,
                })
            })
            .collect()
    }

    fn match_by_interests(
        &self,
        clusters: &[Cluster],
        profile: &UserProfile,
        context: Option<&RecommendationContext>,
    ) -> Vec<MatchResult> {
        clusters
            .iter()
            .map(|cluster| {
                let shared = shared_topic_count(&profile.interests, &cluster.topics);
                let mut similarity = p::PROFILE_BASE_SIMILARITY
                    + (p::PROFILE_INTEREST_STEP * shared as f32).min(p::PROFILE_INTEREST_CAP);
                if let Some(context) = context {
                    similarity += self.config.context_weight
                        * Self::contextual_boost(profile, context, cluster);
                }
                let similarity = similarity.min(1.0);
                MatchResult {
                    cluster_id: cluster.id,
                    similarity,
                    score: similarity,
                }
            })
            .collect()
    }

    /// Cold start: no embedding and no profile. Serve a diversified slate
    /// dominated by large clusters, with medium and small ones mixed in so
    /// early sessions still explore.
    fn default_matches(&self, clusters: &[Cluster]) -> Vec<MatchResult> {
        let mut rng: StdRng = match self.config.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mean_size =
            clusters.iter().map(|c| c.size).sum::<usize>() as f32 / clusters.len() as f32;
        let max_size = clusters.iter().map(|c| c.size).max().unwrap_or(1).max(1) as f32;
        let max_density = clusters
            .iter()
            .map(|c| c.density)
            .fold(0.0f32, f32::max)
            .max(f32::MIN_POSITIVE);

        let mut large: Vec<&Cluster> = Vec::new();
        let mut medium: Vec<&Cluster> = Vec::new();
        let mut small: Vec<&Cluster> = Vec::new();
        for cluster in clusters {
            let size = cluster.size as f32;
            if size >= mean_size * p::FALLBACK_LARGE_FACTOR {
                large.push(cluster);
            } else if size < mean_size * p::FALLBACK_SMALL_FACTOR {
                small.push(cluster);
            } else {
                medium.push(cluster);
            }
        }
        for bucket in [&mut large, &mut medium, &mut small] {
            bucket.sort_by(|a, b| {
                b.density
                    .partial_cmp(&a.density)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.size.cmp(&a.size))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        let target = self.config.max_clusters;
        let large_quota = ((target as f64) * p::FALLBACK_LARGE_SHARE).round() as usize;
        let medium_quota = ((target as f64) * p::FALLBACK_MEDIUM_SHARE).round() as usize;

        let mut picked: Vec<&Cluster> = Vec::with_capacity(target);
        picked.extend(large.iter().take(large_quota).copied());
        picked.extend(medium.iter().take(medium_quota).copied());
        let small_quota = target.saturating_sub(picked.len());
        picked.extend(small.iter().take(small_quota).copied());
        // Backfill from whatever is left when a bucket ran short
        for cluster in large
            .iter()
            .skip(large_quota)
            .chain(medium.iter().skip(medium_quota))
            .chain(small.iter().skip(small_quota))
        {
            if picked.len() >= target {
                break;
            }
            picked.push(*cluster);
        }

        picked
            .into_iter()
            .map(|cluster| {
                let size_score = cluster.size as f32 / max_size;
                let similarity = p::FALLBACK_SIZE_WEIGHT * size_score
                    + p::FALLBACK_DENSITY_WEIGHT * (cluster.density / max_density);
                let jitter = rng.gen_range(0.0..p::FALLBACK_JITTER) as f32;
                MatchResult {
                    cluster_id: cluster.id,
                    similarity,
                    score: similarity + jitter,
                }
            })
            .collect()
    }

    /// Context alignment in [0, 1], summed from active-hours, interest
    /// overlap, geography, and language components.
    fn contextual_boost(
        profile: &UserProfile,
        context: &RecommendationContext,
        cluster: &Cluster,
    ) -> f32 {
        let mut boost = 0.0f32;

        if let Some(hour) = context.time_of_day {
            if cluster.active_during(hour) {
                boost += p::BOOST_ACTIVE_HOURS;
            }
        }

        let shared = shared_topic_count(&profile.interests, &cluster.topics);
        boost += (p::BOOST_INTEREST_STEP * shared as f32).min(p::BOOST_INTEREST_CAP);

        if let (Some(location), Some(focus)) = (&context.location, &cluster.geo_focus) {
            if location == focus {
                boost += p::BOOST_GEO_MATCH;
            }
        }

        if let Some(language) = &profile.demographics.language {
            if cluster.languages.iter().any(|l| l == language) {
                boost += p::BOOST_LANGUAGE_MATCH;
            }
        }

        boost.min(1.0)
    }
}

fn shared_topic_count(interests: &[String], topics: &[String]) -> usize {
    topics
        .iter()
        .filter(|topic| interests.contains(topic))
        .count()
}
