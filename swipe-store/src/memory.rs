//! In-memory repository implementations for testing and local development
//!
//! These cover the full contracts, including similarity search, so the
//! pipeline can run end-to-end without a backing service.

use crate::error::RepositoryError;
use crate::model::{
    Cluster, ClusterAssignment, ClusterId, ContentEmbedding, ContentId, InteractionType, UserEmbedding,
    UserId, UserInteraction,
};
use crate::repository::{ClusterRepo, ContentEmbeddingRepo, InteractionRepo, UserEmbeddingRepo};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Default)]
pub struct InMemoryUserEmbeddingRepo {
    rows: RwLock<HashMap<UserId, UserEmbedding>>,
}

impl InMemoryUserEmbeddingRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserEmbeddingRepo for InMemoryUserEmbeddingRepo {
    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserEmbedding>, RepositoryError> {
        Ok(self.rows.read().get(&user_id).cloned())
    }

    async fn save(&self, embedding: UserEmbedding) -> Result<(), RepositoryError> {
        self.rows.write().insert(embedding.user_id, embedding);
        Ok(())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.rows.read().len())
    }
}

#[derive(Default)]
pub struct InMemoryContentEmbeddingRepo {
    rows: RwLock<HashMap<ContentId, ContentEmbedding>>,
}

impl InMemoryContentEmbeddingRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentEmbeddingRepo for InMemoryContentEmbeddingRepo {
    async fn find_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ContentEmbedding>, RepositoryError> {
        Ok(self.rows.read().get(&content_id).cloned())
    }

    async fn find_by_ids(
        &self,
        content_ids: &[ContentId],
    ) -> Result<Vec<ContentEmbedding>, RepositoryError> {
        let rows = self.rows.read();
        Ok(content_ids
            .iter()
            .filter_map(|id| rows.get(id).cloned())
            .collect())
    }

    async fn find_all(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ContentEmbedding>, RepositoryError> {
        let rows = self.rows.read();
        let mut all: Vec<ContentEmbedding> = rows.values().cloned().collect();
        all.sort_by_key(|e| e.content_id);
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_similar(
        &self,
        vector: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<(ContentId, f32)>, RepositoryError> {
        let rows = self.rows.read();
        let mut scored: Vec<(ContentId, f32)> = rows
            .values()
            .map(|e| (e.content_id, cosine(vector, &e.vector)))
            .filter(|(_, sim)| *sim >= min_similarity)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn save(&self, embedding: ContentEmbedding) -> Result<(), RepositoryError> {
        self.rows.write().insert(embedding.content_id, embedding);
        Ok(())
    }

    async fn delete(&self, content_id: ContentId) -> Result<(), RepositoryError> {
        self.rows.write().remove(&content_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryClusterRepo {
    clusters: RwLock<HashMap<ClusterId, Cluster>>,
    /// Keyed on (content, cluster); one assignment per pair.
    assignments: RwLock<HashMap<(ContentId, ClusterId), ClusterAssignment>>,
}

impl InMemoryClusterRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterRepo for InMemoryClusterRepo {
    async fn save(&self, cluster: Cluster) -> Result<(), RepositoryError> {
        self.clusters.write().insert(cluster.id, cluster);
        Ok(())
    }

    async fn save_many(&self, clusters: Vec<Cluster>) -> Result<(), RepositoryError> {
        let mut rows = self.clusters.write();
        for cluster in clusters {
            rows.insert(cluster.id, cluster);
        }
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Cluster>, RepositoryError> {
        let mut all: Vec<Cluster> = self.clusters.read().values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn find_by_ids(&self, ids: &[ClusterId]) -> Result<Vec<Cluster>, RepositoryError> {
        let rows = self.clusters.read();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn delete(&self, id: ClusterId) -> Result<(), RepositoryError> {
        self.clusters.write().remove(&id);
        self.assignments
            .write()
            .retain(|(_, cluster_id), _| *cluster_id != id);
        Ok(())
    }

    async fn save_assignment(&self, assignment: ClusterAssignment) -> Result<(), RepositoryError> {
        self.assignments
            .write()
            .insert((assignment.content_id, assignment.cluster_id), assignment);
        Ok(())
    }

    async fn find_assignments_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ClusterAssignment>, RepositoryError> {
        let mut found: Vec<ClusterAssignment> = self
            .assignments
            .read()
            .values()
            .filter(|a| a.content_id == content_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.cluster_id);
        Ok(found)
    }

    async fn find_content_ids_by_cluster_id(
        &self,
        cluster_id: ClusterId,
        limit: usize,
    ) -> Result<Vec<ContentId>, RepositoryError> {
        let mut members: Vec<(ContentId, f32)> = self
            .assignments
            .read()
            .values()
            .filter(|a| a.cluster_id == cluster_id)
            .map(|a| (a.content_id, a.similarity))
            .collect();
        members.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(members.into_iter().take(limit).map(|(id, _)| id).collect())
    }

    async fn delete_assignments_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<(), RepositoryError> {
        self.assignments
            .write()
            .retain(|(id, _), _| *id != content_id);
        Ok(())
    }

    async fn update_cluster_stats(
        &self,
        id: ClusterId,
        size: usize,
        density: f32,
        coherence: f32,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.clusters.write();
        let cluster = rows.get_mut(&id).ok_or(RepositoryError::NotFound {
            entity: "cluster",
            id: id as i64,
        })?;
        cluster.size = size;
        cluster.density = density;
        cluster.coherence = coherence;
        cluster.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryInteractionRepo {
    rows: RwLock<Vec<UserInteraction>>,
}

impl InMemoryInteractionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn by_user_desc(&self, user_id: UserId) -> Vec<UserInteraction> {
        let mut found: Vec<UserInteraction> = self
            .rows
            .read()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found
    }
}

#[async_trait]
impl InteractionRepo for InMemoryInteractionRepo {
    async fn save(&self, interaction: UserInteraction) -> Result<(), RepositoryError> {
        self.rows.write().push(interaction);
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        Ok(self
            .by_user_desc(user_id)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn find_recent_by_user_id(
        &self,
        user_id: UserId,
        days: u32,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        Ok(self
            .by_user_desc(user_id)
            .into_iter()
            .filter(|i| i.timestamp >= cutoff)
            .take(limit)
            .collect())
    }

    async fn find_by_user_id_and_type(
        &self,
        user_id: UserId,
        kind: InteractionType,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        Ok(self
            .by_user_desc(user_id)
            .into_iter()
            .filter(|i| i.kind == kind)
            .take(limit)
            .collect())
    }

    async fn has_interacted(
        &self,
        user_id: UserId,
        content_id: ContentId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .rows
            .read()
            .iter()
            .any(|i| i.user_id == user_id && i.content_id == content_id))
    }

    async fn find_interacted_content_ids(
        &self,
        user_id: UserId,
        kinds: Option<&[InteractionType]>,
        since: Option<DateTime<Utc>>,
    ) -> Result<HashSet<ContentId>, RepositoryError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|i| i.user_id == user_id)
            .filter(|i| kinds.map_or(true, |k| k.contains(&i.kind)))
            .filter(|i| since.map_or(true, |s| i.timestamp >= s))
            .map(|i| i.content_id)
            .collect())
    }

    async fn count_by_user_id(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|i| i.user_id == user_id)
            .count())
    }

    async fn find_by_content_id(
        &self,
        content_id: ContentId,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        let mut found: Vec<UserInteraction> = self
            .rows
            .read()
            .iter()
            .filter(|i| i.content_id == content_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found.truncate(limit);
        Ok(found)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|i| i.timestamp >= cutoff);
        Ok(before - rows.len())
    }
}
