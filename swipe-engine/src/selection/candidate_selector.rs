// Copyright 2026 X.AI Corp.
// Candidate selection with seen-content exclusion

use crate::error::EngineError;
use crate::matching::MatchResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use swipe_store::{
    Cluster, ClusterId, ClusterRepo, ContentId, EngagementMetrics, InteractionRepo, UserId,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorOptions {
    pub user_id: UserId,
    /// Maximum candidates returned.
    pub limit: usize,
    /// Interaction look-back window for the exclusion set. 0 means unbounded.
    pub time_window_hours: u32,
    /// Matches below this score are ignored.
    pub min_cluster_score: f32,
}

impl SelectorOptions {
    pub fn new(user_id: UserId, limit: usize) -> Self {
        Self {
            user_id,
            limit,
            time_window_hours: 168,
            min_cluster_score: 0.2,
        }
    }
}

/// A content item proposed for ranking, with its cluster provenance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content_id: ContentId,
    pub cluster_id: ClusterId,
    /// Score of the cluster match that produced this candidate, in [0, 1].
    pub cluster_score: f64,
    pub metadata: CandidateMeta,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandidateMeta {
    /// Assignment similarity of the content to its cluster centroid.
    pub similarity: f32,
    pub cluster_size: usize,
    pub cluster_density: f32,
    pub created_at: Option<DateTime<Utc>>,
    pub engagement: Option<EngagementMetrics>,
    pub topics: Vec<String>,
    pub location: Option<String>,
}

pub struct CandidateSelector {
    cluster_repo: Arc<dyn ClusterRepo>,
    interaction_repo: Arc<dyn InteractionRepo>,
}

impl CandidateSelector {
    pub fn new(cluster_repo: Arc<dyn ClusterRepo>, interaction_repo: Arc<dyn InteractionRepo>) -> Self {
        Self {
            cluster_repo,
            interaction_repo,
        }
    }

    /// Pull content from the matched clusters, drop everything the user has
    /// already interacted with, deduplicate across clusters keeping the
    /// strongest provenance, and trim to the limit.
    ///
    /// A repository failure is logged and yields an empty list; candidate
    /// selection never fails the surrounding request.
    pub async fn select_candidates(
        &self,
        matches: &[MatchResult],
        clusters: &[Cluster],
        options: &SelectorOptions,
    ) -> Vec<Candidate> {
        match self.try_select(matches, clusters, options).await {
            Ok(candidates) => candidates,
            Err(error) => {
                log::error!(
                    "candidate selection failed for user {}: {error}",
                    options.user_id
                );
                Vec::new()
            }
        }
    }

    async fn try_select(
        &self,
        matches: &[MatchResult],
        clusters: &[Cluster],
        options: &SelectorOptions,
    ) -> Result<Vec<Candidate>, EngineError> {
        let retained: Vec<&MatchResult> = matches
            .iter()
            .filter(|m| m.score >= options.min_cluster_score)
            .collect();
        if retained.is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }

        let since = if options.time_window_hours > 0 {
            Some(Utc::now() - Duration::hours(options.time_window_hours as i64))
        } else {
            None
        };
        let excluded = self
            .interaction_repo
            .find_interacted_content_ids(options.user_id, None, since)
            .await?;

        let by_id: HashMap<ClusterId, &Cluster> = clusters.iter().map(|c| (c.id, c)).collect();
        let per_cluster = options.limit.div_ceil(retained.len()) * 2;

        let mut best: HashMap<ContentId, Candidate> = HashMap::new();
        for matched in retained {
            let member_ids = self
                .cluster_repo
                .find_content_ids_by_cluster_id(matched.cluster_id, per_cluster)
                .await?;

            for content_id in member_ids {
                if excluded.contains(&content_id) {
                    continue;
                }
                let cluster_score = f64::from(matched.score);
                if let Some(existing) = best.get(&content_id) {
                    if existing.cluster_score >= cluster_score {
                        continue;
                    }
                }

                let assignments = self
                    .cluster_repo
                    .find_assignments_by_content_id(content_id)
                    .await?;
                let similarity = assignments
                    .iter()
                    .find(|a| a.cluster_id == matched.cluster_id)
                    .map(|a| a.similarity)
                    .unwrap_or(matched.similarity);

                let (cluster_size, cluster_density) = by_id
                    .get(&matched.cluster_id)
                    .map(|c| (c.size, c.density))
                    .unwrap_or((0, 0.0));

                best.insert(
                    content_id,
                    Candidate {
                        content_id,
                        cluster_id: matched.cluster_id,
                        cluster_score,
                        metadata: CandidateMeta {
                            similarity,
                            cluster_size,
                            cluster_density,
                            ..Default::default()
                        },
                    },
                );
            }
        }

        let mut candidates: Vec<Candidate> = best.into_values().collect();
        candidates.sort_by(|a, b| {
            b.cluster_score
                .partial_cmp(&a.cluster_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        candidates.truncate(options.limit);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use swipe_store::memory::{InMemoryClusterRepo, InMemoryInteractionRepo};
    use swipe_store::{
        ClusterAssignment, InteractionMeta, InteractionType, RepositoryError, UserInteraction,
    };

    fn cluster(id: ClusterId, size: usize) -> Cluster {
        Cluster {
            id,
            centroid: vec![1.0, 0.0],
            size,
            density: 2.0,
            coherence: 0.8,
            topics: Vec::new(),
            active_hours: None,
            geo_focus: None,
            languages: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn matched(cluster_id: ClusterId, score: f32) -> MatchResult {
        MatchResult {
            cluster_id,
            similarity: score,
            score,
        }
    }

    async fn seed_assignment(repo: &InMemoryClusterRepo, content_id: ContentId, cluster_id: ClusterId, similarity: f32) {
        repo.save_assignment(ClusterAssignment {
            content_id,
            cluster_id,
            similarity,
            assigned_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_selects_and_sorts_by_cluster_score() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        let interaction_repo = Arc::new(InMemoryInteractionRepo::new());
        seed_assignment(&cluster_repo, 1, 10, 0.9).await;
        seed_assignment(&cluster_repo, 2, 10, 0.8).await;
        seed_assignment(&cluster_repo, 3, 20, 0.7).await;

        let selector = CandidateSelector::new(cluster_repo, interaction_repo);
        let clusters = vec![cluster(10, 5), cluster(20, 3)];
        let matches = vec![matched(10, 0.9), matched(20, 0.6)];
        let candidates = selector
            .select_candidates(&matches, &clusters, &SelectorOptions::new(1, 10))
            .await;

        assert_eq!(candidates.len(), 3);
        assert!(candidates.windows(2).all(|w| w[0].cluster_score >= w[1].cluster_score));
        assert_eq!(candidates[0].cluster_id, 10);
        assert_eq!(candidates[0].metadata.cluster_size, 5);
    }

    #[tokio::test]
    async fn test_excludes_interacted_content() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        let interaction_repo = Arc::new(InMemoryInteractionRepo::new());
        seed_assignment(&cluster_repo, 1, 10, 0.9).await;
        seed_assignment(&cluster_repo, 2, 10, 0.8).await;
        interaction_repo
            .save(UserInteraction {
                user_id: 1,
                content_id: 1,
                kind: InteractionType::View,
                timestamp: Utc::now(),
                metadata: InteractionMeta::default(),
            })
            .await
            .unwrap();

        let excluded = interaction_repo
            .find_interacted_content_ids(1, None, None)
            .await
            .unwrap();

        let selector = CandidateSelector::new(cluster_repo, interaction_repo);
        let candidates = selector
            .select_candidates(
                &[matched(10, 0.9)],
                &[cluster(10, 5)],
                &SelectorOptions::new(1, 10),
            )
            .await;

        let returned: HashSet<ContentId> = candidates.iter().map(|c| c.content_id).collect();
        assert!(returned.is_disjoint(&excluded));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].content_id, 2);
    }

    #[tokio::test]
    async fn test_dedup_keeps_highest_cluster_score() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        let interaction_repo = Arc::new(InMemoryInteractionRepo::new());
        // Content 7 belongs to both clusters
        seed_assignment(&cluster_repo, 7, 10, 0.9).await;
        seed_assignment(&cluster_repo, 7, 20, 0.95).await;

        let selector = CandidateSelector::new(cluster_repo, interaction_repo);
        let clusters = vec![cluster(10, 5), cluster(20, 3)];
        let matches = vec![matched(10, 0.5), matched(20, 0.8)];
        let candidates = selector
            .select_candidates(&matches, &clusters, &SelectorOptions::new(1, 10))
            .await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].cluster_id, 20);
        assert!((candidates[0].cluster_score - 0.8).abs() < 1e-6);
        assert!((candidates[0].metadata.similarity - 0.95).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_low_scoring_matches_dropped() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        let interaction_repo = Arc::new(InMemoryInteractionRepo::new());
        seed_assignment(&cluster_repo, 1, 10, 0.9).await;

        let selector = CandidateSelector::new(cluster_repo, interaction_repo);
        let candidates = selector
            .select_candidates(
                &[matched(10, 0.1)],
                &[cluster(10, 5)],
                &SelectorOptions::new(1, 10),
            )
            .await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_limit_trim() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        let interaction_repo = Arc::new(InMemoryInteractionRepo::new());
        for id in 0..30 {
            seed_assignment(&cluster_repo, id, 10, 0.9).await;
        }

        let selector = CandidateSelector::new(cluster_repo, interaction_repo);
        let candidates = selector
            .select_candidates(
                &[matched(10, 0.9)],
                &[cluster(10, 30)],
                &SelectorOptions::new(1, 6),
            )
            .await;
        assert_eq!(candidates.len(), 6);
    }

    struct FailingInteractionRepo;

    #[async_trait]
    impl swipe_store::InteractionRepo for FailingInteractionRepo {
        async fn save(&self, _: UserInteraction) -> Result<(), RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn find_by_user_id(
            &self,
            _: UserId,
            _: usize,
            _: usize,
        ) -> Result<Vec<UserInteraction>, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn find_recent_by_user_id(
            &self,
            _: UserId,
            _: u32,
            _: usize,
        ) -> Result<Vec<UserInteraction>, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn find_by_user_id_and_type(
            &self,
            _: UserId,
            _: InteractionType,
            _: usize,
        ) -> Result<Vec<UserInteraction>, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn has_interacted(&self, _: UserId, _: ContentId) -> Result<bool, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn find_interacted_content_ids(
            &self,
            _: UserId,
            _: Option<&[InteractionType]>,
            _: Option<DateTime<Utc>>,
        ) -> Result<HashSet<ContentId>, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn count_by_user_id(&self, _: UserId) -> Result<usize, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn find_by_content_id(
            &self,
            _: ContentId,
            _: usize,
        ) -> Result<Vec<UserInteraction>, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
        async fn delete_older_than(&self, _: DateTime<Utc>) -> Result<usize, RepositoryError> {
            Err(RepositoryError::Storage("injected".into()))
        }
    }

    #[tokio::test]
    async fn test_repository_failure_degrades_to_empty() {
        let cluster_repo = Arc::new(InMemoryClusterRepo::new());
        seed_assignment(&cluster_repo, 1, 10, 0.9).await;

        let selector = CandidateSelector::new(cluster_repo, Arc::new(FailingInteractionRepo));
        let candidates = selector
            .select_candidates(
                &[matched(10, 0.9)],
                &[cluster(10, 5)],
                &SelectorOptions::new(1, 10),
            )
            .await;
        assert!(candidates.is_empty());
    }
}
