//! User profile construction from interaction history
//!
//! A profile is the lightweight stand-in for a user embedding: the topics a
//! user keeps coming back to, aggregated by frequency over their recent
//! interactions.

use crate::params;
use chrono::Weekday;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use swipe_store::{UserId, UserInteraction};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Demographics {
    pub language: Option<String>,
}

/// Interest profile derived from interaction history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Most frequent interaction topics, best first.
    pub interests: Vec<String>,
    pub demographics: Demographics,
}

impl UserProfile {
    /// Aggregate topics across the given interactions by frequency and keep
    /// the top ones as interests. Negative interactions (skip, dislike,
    /// report, show-less-often) are ignored so they never become interests.
    ///
    /// Returns `None` when no interest signal exists.
    pub fn from_interactions(
        user_id: UserId,
        interactions: &[UserInteraction],
        demographics: Demographics,
    ) -> Option<Self> {
        let interests: Vec<String> = interactions
            .iter()
            .filter(|interaction| !interaction.kind.is_negative())
            .flat_map(|interaction| interaction.metadata.topics.iter())
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(params::PROFILE_MAX_INTERESTS)
            .map(|(topic, _)| topic.clone())
            .collect();

        if interests.is_empty() {
            return None;
        }

        Some(Self {
            user_id,
            interests,
            demographics,
        })
    }
}

/// Request-time context signals.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecommendationContext {
    /// Hour of day, 0-23.
    pub time_of_day: Option<u8>,
    pub weekday: Option<Weekday>,
    /// Location code, e.g. "US-CA". A country prefix before '-' allows
    /// partial matching.
    pub location: Option<String>,
}

impl RecommendationContext {
    /// The country portion of a location code.
    pub fn country_of(location: &str) -> &str {
        location.split('-').next().unwrap_or(location)
    }
}
