//! Repository contracts the recommendation pipeline depends on
//!
//! Every store is an external collaborator behind one of these traits. The
//! engine never holds a lock across these calls; implementations own their
//! conflict resolution.

use crate::error::RepositoryError;
use crate::model::{
    Cluster, ClusterAssignment, ClusterId, ContentEmbedding, ContentId, InteractionType, UserEmbedding,
    UserId, UserInteraction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Store of user embedding vectors.
#[async_trait]
pub trait UserEmbeddingRepo: Send + Sync {
    async fn find_by_user_id(&self, user_id: UserId)
        -> Result<Option<UserEmbedding>, RepositoryError>;

    async fn save(&self, embedding: UserEmbedding) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError>;
}

/// Store of content embedding vectors.
#[async_trait]
pub trait ContentEmbeddingRepo: Send + Sync {
    async fn find_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ContentEmbedding>, RepositoryError>;

    /// Batch lookup; ids with no row are silently absent from the result.
    async fn find_by_ids(
        &self,
        content_ids: &[ContentId],
    ) -> Result<Vec<ContentEmbedding>, RepositoryError>;

    /// Page through all embeddings in stable (content id) order.
    async fn find_all(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ContentEmbedding>, RepositoryError>;

    /// Nearest neighbors by cosine similarity, best first.
    async fn find_similar(
        &self,
        vector: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<(ContentId, f32)>, RepositoryError>;

    async fn save(&self, embedding: ContentEmbedding) -> Result<(), RepositoryError>;

    async fn delete(&self, content_id: ContentId) -> Result<(), RepositoryError>;
}

/// Store of clusters and content-to-cluster assignments.
#[async_trait]
pub trait ClusterRepo: Send + Sync {
    async fn save(&self, cluster: Cluster) -> Result<(), RepositoryError>;

    async fn save_many(&self, clusters: Vec<Cluster>) -> Result<(), RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Cluster>, RepositoryError>;

    async fn find_by_ids(&self, ids: &[ClusterId]) -> Result<Vec<Cluster>, RepositoryError>;

    async fn delete(&self, id: ClusterId) -> Result<(), RepositoryError>;

    /// Upsert keyed on (content, cluster).
    async fn save_assignment(&self, assignment: ClusterAssignment) -> Result<(), RepositoryError>;

    async fn find_assignments_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ClusterAssignment>, RepositoryError>;

    /// Member content ids of a cluster, highest assignment similarity first.
    async fn find_content_ids_by_cluster_id(
        &self,
        cluster_id: ClusterId,
        limit: usize,
    ) -> Result<Vec<ContentId>, RepositoryError>;

    async fn delete_assignments_by_content_id(
        &self,
        content_id: ContentId,
    ) -> Result<(), RepositoryError>;

    /// Administrative hook: refresh a cluster's derived statistics in place.
    async fn update_cluster_stats(
        &self,
        id: ClusterId,
        size: usize,
        density: f32,
        coherence: f32,
    ) -> Result<(), RepositoryError>;
}

/// Store of user interactions.
#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn save(&self, interaction: UserInteraction) -> Result<(), RepositoryError>;

    /// Page through a user's interactions, most recent first.
    async fn find_by_user_id(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError>;

    async fn find_recent_by_user_id(
        &self,
        user_id: UserId,
        days: u32,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError>;

    async fn find_by_user_id_and_type(
        &self,
        user_id: UserId,
        kind: InteractionType,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError>;

    async fn has_interacted(
        &self,
        user_id: UserId,
        content_id: ContentId,
    ) -> Result<bool, RepositoryError>;

    /// Content ids the user has interacted with, optionally restricted to the
    /// given kinds and/or to interactions at or after `since`.
    async fn find_interacted_content_ids(
        &self,
        user_id: UserId,
        kinds: Option<&[InteractionType]>,
        since: Option<DateTime<Utc>>,
    ) -> Result<HashSet<ContentId>, RepositoryError>;

    async fn count_by_user_id(&self, user_id: UserId) -> Result<usize, RepositoryError>;

    async fn find_by_content_id(
        &self,
        content_id: ContentId,
        limit: usize,
    ) -> Result<Vec<UserInteraction>, RepositoryError>;

    /// Administrative hook: age out interactions older than the cutoff.
    /// Returns the number of rows removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
