//! Engagement feature extraction
//!
//! Derives a 9-dimensional normalized engagement vector from raw counters.
//! The operation is stateless and deterministic; every division by views
//! returns 0 when views is 0.

use crate::util::vector_ops;
use serde::{Deserialize, Serialize};
use swipe_store::EngagementMetrics;

/// Derived engagement features. Every feature lies in [0, 1]; `vector` is
/// the L2-normalized 9-tuple in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngagementVector {
    pub like_rate: f32,
    pub comment_rate: f32,
    pub share_rate: f32,
    pub save_rate: f32,
    pub retention_rate: f32,
    pub avg_completion_rate: f32,
    pub report_rate: f32,
    pub virality_score: f32,
    pub quality_score: f32,
    pub vector: Vec<f32>,
}

/// Derive engagement features from raw counters and the content duration in
/// seconds.
pub fn calculate_engagement(metrics: &EngagementMetrics, duration_secs: f32) -> EngagementVector {
    let rate = |count: u64| -> f32 {
        if metrics.views == 0 {
            0.0
        } else {
            (count as f32 / metrics.views as f32).clamp(0.0, 1.0)
        }
    };

    let like_rate = rate(metrics.likes);
    let comment_rate = rate(metrics.comments);
    let share_rate = rate(metrics.shares);
    let save_rate = rate(metrics.saves);
    let report_rate = rate(metrics.reports);

    let retention_rate = if metrics.views == 0 || duration_secs <= 0.0 {
        0.0
    } else {
        (metrics.avg_watch_time / (metrics.views as f32 * duration_secs)).clamp(0.0, 1.0)
    };

    let avg_completion_rate = metrics.completion_rate.clamp(0.0, 1.0);
    let virality_score = (share_rate + save_rate) / 2.0;
    let quality_score =
        (retention_rate + avg_completion_rate - 2.0 * report_rate).clamp(0.0, 1.0);

    let raw = [
        like_rate,
        comment_rate,
        share_rate,
        save_rate,
        retention_rate,
        avg_completion_rate,
        report_rate,
        virality_score,
        quality_score,
    ];

    EngagementVector {
        like_rate,
        comment_rate,
        share_rate,
        save_rate,
        retention_rate,
        avg_completion_rate,
        report_rate,
        virality_score,
        quality_score,
        vector: vector_ops::normalize_l2(&raw),
    }
}

impl EngagementVector {
    /// The raw (un-normalized) features in vector order.
    pub fn features(&self) -> [f32; 9] {
        [
            self.like_rate,
            self.comment_rate,
            self.share_rate,
            self.save_rate,
            self.retention_rate,
            self.avg_completion_rate,
            self.report_rate,
            self.virality_score,
            self.quality_score,
        ]
    }
}
