// Copyright 2026 X.AI Corp.
// Recommendation engine orchestration

use crate::clustering::DbscanClusterer;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::matching::ClusterMatcher;
use crate::metrics::EngineMetrics;
use crate::params;
use crate::personalization::{Demographics, RecommendationContext, UserProfile};
use crate::scorers::{RankedCandidate, Ranker, RankingOptions, SubScores};
use crate::selection::{CandidateSelector, SelectorOptions};
use futures::future::try_join_all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use swipe_store::{
    Cluster, ClusterAssignment, ClusterId, ClusterRepo, ContentEmbedding, ContentEmbeddingRepo,
    ContentId, InteractionRepo, UserEmbeddingRepo, UserId,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A recommendation request.
#[derive(Clone, Debug, Default)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    /// Results wanted; 0 falls back to the configured default.
    pub limit: usize,
    /// Content the caller wants suppressed regardless of score.
    pub exclude_ids: Vec<ContentId>,
    pub context: Option<RecommendationContext>,
    /// Cooperative cancellation; once observed the engine returns an empty
    /// list, never a partial one.
    pub cancel: Option<CancellationToken>,
}

impl RecommendationRequest {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationReason {
    HighlyRelevant,
    FreshContent,
    PopularWithOthers,
    RecommendedForYou,
}

impl RecommendationReason {
    fn for_scores(scores: &SubScores) -> Self {
        if scores.relevance > 0.7 {
            RecommendationReason::HighlyRelevant
        } else if scores.novelty > 0.7 {
            RecommendationReason::FreshContent
        } else if scores.engagement > 0.7 {
            RecommendationReason::PopularWithOthers
        } else {
            RecommendationReason::RecommendedForYou
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationReason::HighlyRelevant => "Highly relevant",
            RecommendationReason::FreshContent => "Fresh content",
            RecommendationReason::PopularWithOthers => "Popular with others",
            RecommendationReason::RecommendedForYou => "Recommended for you",
        }
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recommended content item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub content_id: ContentId,
    pub score: f64,
    pub reason: RecommendationReason,
    pub cluster_id: ClusterId,
    pub scores: SubScores,
}

impl Recommendation {
    fn from_ranked(entry: RankedCandidate) -> Self {
        Self {
            content_id: entry.candidate.content_id,
            score: entry.final_score,
            reason: RecommendationReason::for_scores(&entry.scores),
            cluster_id: entry.candidate.cluster_id,
            scores: entry.scores,
        }
    }
}

/// Orchestrates the full pipeline: user signals, clusters, matching,
/// selection, ranking, trimming.
pub struct RecommendationEngine {
    user_repo: Arc<dyn UserEmbeddingRepo>,
    content_repo: Arc<dyn ContentEmbeddingRepo>,
    cluster_repo: Arc<dyn ClusterRepo>,
    interaction_repo: Arc<dyn InteractionRepo>,
    matcher: ClusterMatcher,
    selector: CandidateSelector,
    ranker: Ranker,
    clusterer: DbscanClusterer,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
    recluster_pending: AtomicBool,
    recluster_lock: Mutex<()>,
}

impl RecommendationEngine {
    pub fn new(
        config: EngineConfig,
        user_repo: Arc<dyn UserEmbeddingRepo>,
        content_repo: Arc<dyn ContentEmbeddingRepo>,
        cluster_repo: Arc<dyn ClusterRepo>,
        interaction_repo: Arc<dyn InteractionRepo>,
    ) -> Result<Self, EngineError> {
        let matcher = ClusterMatcher::new(config.matcher.clone())?;
        let clusterer = DbscanClusterer::new(config.clustering.clone())?;
        let selector =
            CandidateSelector::new(Arc::clone(&cluster_repo), Arc::clone(&interaction_repo));
        let ranker = Ranker::new(Arc::clone(&content_repo));
        Ok(Self {
            user_repo,
            content_repo,
            cluster_repo,
            interaction_repo,
            matcher,
            selector,
            ranker,
            clusterer,
            config,
            metrics: EngineMetrics::new(),
            recluster_pending: AtomicBool::new(false),
            recluster_lock: Mutex::new(()),
        })
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Produce ranked recommendations for the user. Never fails: any
    /// unrecoverable error degrades to an empty list.
    pub async fn get_recommendations(&self, request: RecommendationRequest) -> Vec<Recommendation> {
        let started = Instant::now();
        let recommendations = match self.run_pipeline(&request).await {
            Ok(recommendations) => recommendations,
            Err(error) => {
                log::error!(
                    "recommendation pipeline failed for user {}: {error}",
                    request.user_id
                );
                Vec::new()
            }
        };
        self.metrics
            .record_request(started.elapsed().as_millis() as u64, recommendations.len());
        recommendations
    }

    async fn run_pipeline(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let cancel = request.cancel.as_ref();
        let user_id = request.user_id;
        let limit = if request.limit == 0 {
            self.config.ranking.default_limit
        } else {
            request.limit
        };

        // User embedding and recent history fetch in parallel
        let fetches = with_cancel(
            cancel,
            futures::future::join(
                self.user_repo.find_by_user_id(user_id),
                self.interaction_repo
                    .find_by_user_id(user_id, params::PROFILE_INTERACTION_WINDOW, 0),
            ),
        )
        .await;
        let Some((embedding_result, interactions_result)) = fetches else {
            return Ok(cancelled(user_id));
        };

        let user_embedding = match embedding_result {
            Ok(row) => row,
            Err(error) => {
                log::warn!("user embedding fetch failed for {user_id}: {error}");
                None
            }
        };
        let interactions = match interactions_result {
            Ok(rows) => rows,
            Err(error) => {
                log::warn!("interaction fetch failed for {user_id}: {error}");
                Vec::new()
            }
        };

        let demographics = Demographics {
            language: user_embedding
                .as_ref()
                .and_then(|e| e.metadata.language.clone()),
        };
        let profile = UserProfile::from_interactions(user_id, &interactions, demographics.clone())
            .or_else(|| {
                let embedding = user_embedding.as_ref()?;
                if embedding.metadata.interests.is_empty() {
                    return None;
                }
                Some(UserProfile {
                    user_id,
                    interests: embedding.metadata.interests.clone(),
                    demographics,
                })
            });

        let mut clusters = match with_cancel(cancel, self.cluster_repo.find_all()).await {
            None => return Ok(cancelled(user_id)),
            Some(result) => result?,
        };
        if clusters.is_empty() {
            log::info!("no clusters available, triggering recluster");
            if let Err(error) = self.recluster_moments().await {
                log::warn!("recluster failed: {error}");
            }
            clusters = match with_cancel(cancel, self.cluster_repo.find_all()).await {
                None => return Ok(cancelled(user_id)),
                Some(result) => result?,
            };
        }

        if user_embedding.is_none() && profile.is_none() && clusters.is_empty() {
            log::warn!("no embedding, profile, or clusters for user {user_id}; returning nothing");
            return Ok(Vec::new());
        }

        let user_vector = user_embedding.as_ref().map(|e| e.vector.as_slice());
        let matches = self.matcher.find_relevant_clusters(
            &clusters,
            user_vector,
            profile.as_ref(),
            request.context.as_ref(),
        );

        let selector_options = SelectorOptions {
            user_id,
            limit: limit * params::CANDIDATE_HEADROOM,
            time_window_hours: self.config.selection.time_window_hours,
            min_cluster_score: self.config.selection.min_cluster_score,
        };
        let candidates = match with_cancel(
            cancel,
            self.selector
                .select_candidates(&matches, &clusters, &selector_options),
        )
        .await
        {
            None => return Ok(cancelled(user_id)),
            Some(candidates) => candidates,
        };

        let ranking_options = RankingOptions {
            novelty_level: self.config.ranking.novelty_level,
            diversity_level: self.config.ranking.diversity_level,
            user_interests: profile
                .as_ref()
                .map(|p| p.interests.clone())
                .unwrap_or_default(),
            context: request.context.clone(),
            target_size: None,
        };
        let ranked = match with_cancel(
            cancel,
            self.ranker
                .rank_candidates(candidates, user_vector, &ranking_options),
        )
        .await
        {
            None => return Ok(cancelled(user_id)),
            Some(ranked) => ranked,
        };
        self.metrics.record_ranked(ranked.len());

        let excluded: HashSet<ContentId> = request.exclude_ids.iter().copied().collect();
        Ok(ranked
            .into_iter()
            .filter(|entry| !excluded.contains(&entry.candidate.content_id))
            .take(limit)
            .map(Recommendation::from_ranked)
            .collect())
    }

    /// Rebuild the cluster set from the current content embeddings.
    ///
    /// At most one run executes at a time; triggers that arrive while a run
    /// is in flight coalesce into a single follow-up run.
    pub async fn recluster_moments(&self) -> Result<(), EngineError> {
        self.recluster_pending.store(true, Ordering::SeqCst);
        let _guard = self.recluster_lock.lock().await;
        while self.recluster_pending.swap(false, Ordering::SeqCst) {
            self.run_recluster().await?;
        }
        Ok(())
    }

    async fn run_recluster(&self) -> Result<(), EngineError> {
        let embeddings = self
            .content_repo
            .find_all(params::MAX_CLUSTER_INPUT_POINTS, 0)
            .await?;
        let points: Vec<(ContentId, Vec<f32>)> = embeddings
            .iter()
            .map(|e| (e.content_id, e.vector.clone()))
            .collect();

        let outcome = self.clusterer.run(&points)?;
        let clusters = enrich_topics(outcome.clusters, &outcome.assignments, &embeddings);

        // Replace the previous cluster set and the assignments of every
        // clustered input item
        let existing = self.cluster_repo.find_all().await?;
        try_join_all(
            existing
                .iter()
                .map(|cluster| self.cluster_repo.delete(cluster.id)),
        )
        .await?;
        try_join_all(points.iter().map(|(content_id, _)| {
            self.cluster_repo
                .delete_assignments_by_content_id(*content_id)
        }))
        .await?;

        self.cluster_repo.save_many(clusters).await?;
        try_join_all(
            outcome
                .assignments
                .into_iter()
                .map(|assignment| self.cluster_repo.save_assignment(assignment)),
        )
        .await?;

        self.metrics.record_recluster();
        log::info!(
            "reclustered {} embeddings into {} clusters ({} noise, quality {:.3}, {} ms)",
            outcome.stats.total_points,
            outcome.stats.clusters_found,
            outcome.stats.noise_points,
            outcome.quality,
            outcome.stats.elapsed_ms
        );
        Ok(())
    }
}

/// Race a pipeline step against cooperative cancellation. `None` means the
/// request was cancelled and the engine must respond with an empty list.
async fn with_cancel<T>(
    cancel: Option<&CancellationToken>,
    step: impl Future<Output = T>,
) -> Option<T> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            value = step => Some(value),
        },
        None => Some(step.await),
    }
}

fn cancelled(user_id: UserId) -> Vec<Recommendation> {
    log::info!("request cancelled for user {user_id}, returning nothing");
    Vec::new()
}

/// Label each cluster with the most frequent topics of its members.
fn enrich_topics(
    mut clusters: Vec<Cluster>,
    assignments: &[ClusterAssignment],
    embeddings: &[ContentEmbedding],
) -> Vec<Cluster> {
    let topics_by_content: HashMap<ContentId, &Vec<String>> = embeddings
        .iter()
        .map(|e| (e.content_id, &e.metadata.topics))
        .collect();
    let mut members: HashMap<ClusterId, Vec<ContentId>> = HashMap::new();
    for assignment in assignments {
        members
            .entry(assignment.cluster_id)
            .or_default()
            .push(assignment.content_id);
    }

    for cluster in clusters.iter_mut() {
        let Some(member_ids) = members.get(&cluster.id) else {
            continue;
        };
        cluster.topics = member_ids
            .iter()
            .filter_map(|id| topics_by_content.get(id))
            .flat_map(|topics| topics.iter())
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(params::CLUSTER_MAX_TOPICS)
            .map(|(topic, _)| topic.clone())
            .collect();
    }
    clusters
}
