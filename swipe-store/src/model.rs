//! Persistent entities consumed by the recommendation pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type UserId = i64;
pub type ContentId = i64;
pub type ClusterId = u64;

/// Open-ended metadata value. Stores attach arbitrary keys to embeddings;
/// the observed shapes are closed into this tagged union so the core never
/// duck-types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MetaValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Topics(Vec<String>),
    Instant(DateTime<Utc>),
}

/// A user's position in the embedding space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserEmbedding {
    pub user_id: UserId,
    #[serde(with = "crate::vector::payload")]
    pub vector: Vec<f32>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: UserEmbeddingMeta,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserEmbeddingMeta {
    #[serde(default)]
    pub interests: Vec<String>,
    pub last_interaction_at: Option<DateTime<Utc>>,
    /// Preferred language, when the profile service recorded one.
    pub language: Option<String>,
}

/// A content item's position in the embedding space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentEmbedding {
    pub content_id: ContentId,
    #[serde(with = "crate::vector::payload")]
    pub vector: Vec<f32>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ContentMeta,
}

impl ContentEmbedding {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentMeta {
    #[serde(default)]
    pub topics: Vec<String>,
    pub author_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub engagement: Option<EngagementMetrics>,
    pub location: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, MetaValue>,
}

/// Raw engagement counters as recorded by the interaction tracker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub views: u64,
    pub unique_views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
    /// Average watch time in seconds.
    pub avg_watch_time: f32,
    /// Fraction of plays watched to completion, in [0, 1].
    pub completion_rate: f32,
    pub reports: u64,
}

/// A dense group of content embeddings discovered by the clusterer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    #[serde(with = "crate::vector::payload")]
    pub centroid: Vec<f32>,
    pub size: usize,
    pub density: f32,
    pub coherence: f32,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Hour-of-day range (inclusive) the cluster's audience is active in.
    /// The range may wrap midnight, e.g. (22, 2).
    pub active_hours: Option<(u8, u8)>,
    pub geo_focus: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    /// Whether the cluster's active window contains the given hour.
    /// Ranges are inclusive and may wrap midnight.
    pub fn active_during(&self, hour: u8) -> bool {
        match self.active_hours {
            Some((start, end)) if start <= end => hour >= start && hour <= end,
            Some((start, end)) => hour >= start || hour <= end,
            None => false,
        }
    }
}

/// Membership relation between a content item and a cluster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub content_id: ContentId,
    pub cluster_id: ClusterId,
    /// Cosine similarity of the member to the cluster centroid, in [0, 1].
    pub similarity: f32,
    pub assigned_at: DateTime<Utc>,
}

/// A single user action on a content item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserInteraction {
    pub user_id: UserId,
    pub content_id: ContentId,
    pub kind: InteractionType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: InteractionMeta,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InteractionMeta {
    pub duration_secs: Option<f32>,
    pub watch_percent: Option<f32>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionType {
    View,
    CompleteView,
    PartialView,
    Like,
    LikeComment,
    Comment,
    Share,
    Save,
    Dislike,
    Skip,
    Report,
    ShowLessOften,
}

impl InteractionType {
    /// Negative signals must never feed interest aggregation.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            InteractionType::Dislike
                | InteractionType::Skip
                | InteractionType::Report
                | InteractionType::ShowLessOften
        )
    }
}
