//! Global parameters and constants for the swipe engine

/// Neutral sub-score used when data is missing or a candidate fails scoring
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Default number of recommendations per request
pub const DEFAULT_RESULT_SIZE: usize = 20;

/// Headroom multiplier between the requested limit and the candidate set
/// handed to the ranker
pub const CANDIDATE_HEADROOM: usize = 3;

/// Maximum points fed into one clustering run; the distance matrix is O(N^2)
pub const MAX_CLUSTER_INPUT_POINTS: usize = 10_000;

/// Interactions considered when building a user profile
pub const PROFILE_INTERACTION_WINDOW: usize = 100;

/// Interests kept after topic frequency aggregation
pub const PROFILE_MAX_INTERESTS: usize = 10;

/// Topics kept per cluster after member topic aggregation
pub const CLUSTER_MAX_TOPICS: usize = 5;

// ============================================================================
// Ranking Weights
// ============================================================================

pub const RELEVANCE_WEIGHT: f64 = 0.40;
pub const ENGAGEMENT_WEIGHT: f64 = 0.25;
pub const NOVELTY_WEIGHT: f64 = 0.15;
pub const DIVERSITY_WEIGHT: f64 = 0.10;
pub const CONTEXT_WEIGHT: f64 = 0.10;

/// Baselines the novelty / diversity level adjustments are measured against
pub const NOVELTY_BASELINE: f64 = 0.3;
pub const DIVERSITY_BASELINE: f64 = 0.4;

// ============================================================================
// Engagement Sub-score
// ============================================================================

pub const ENGAGEMENT_COMMENT_WEIGHT: f64 = 1.5;
pub const ENGAGEMENT_SHARE_WEIGHT: f64 = 2.0;
pub const ENGAGEMENT_VIEW_WEIGHT: f64 = 0.2;

/// The weighted interaction total is divided by this before capping at 1
pub const ENGAGEMENT_CALIBRATION: f64 = 500.0;

// ============================================================================
// Novelty Sub-score
// ============================================================================

/// Exponential decay constant for content age (hours)
pub const RECENCY_DECAY_HOURS: f64 = 48.0;
pub const NOVELTY_RECENCY_SHARE: f64 = 0.6;
pub const NOVELTY_TOPIC_SHARE: f64 = 0.4;

// ============================================================================
// Diversity Sub-score
// ============================================================================

/// Previously selected candidates the diversity sub-score looks back at
pub const DIVERSITY_LOOKBACK: usize = 5;

// ============================================================================
// Context Sub-score
// ============================================================================

pub const MORNING_PEAK: (u8, u8) = (7, 9);
pub const EVENING_PEAK: (u8, u8) = (18, 21);
pub const LOW_ENGAGEMENT_HOURS: (u8, u8) = (0, 5);

pub const PEAK_HOURS_WEIGHT: f64 = 0.3;
pub const LOW_ENGAGEMENT_WEIGHT: f64 = 0.2;

/// Hours-to-peak smoothing constant for the off-peak decay
pub const OFF_PEAK_DECAY_HOURS: f64 = 3.0;

pub const WEEKEND_WEIGHT: f64 = 0.2;
pub const MID_WEEK_WEIGHT: f64 = 0.1;
pub const WEEK_START_END_WEIGHT: f64 = 0.05;

pub const SAME_LOCATION_WEIGHT: f64 = 0.3;
pub const DIFFERENT_LOCATION_WEIGHT: f64 = 0.2;

// ============================================================================
// Cluster Matching
// ============================================================================

/// Profile-only matching starts from this similarity
pub const PROFILE_BASE_SIMILARITY: f32 = 0.5;
pub const PROFILE_INTEREST_STEP: f32 = 0.1;
pub const PROFILE_INTEREST_CAP: f32 = 0.3;

// Contextual boost components
pub const BOOST_ACTIVE_HOURS: f32 = 0.20;
pub const BOOST_INTEREST_STEP: f32 = 0.10;
pub const BOOST_INTEREST_CAP: f32 = 0.30;
pub const BOOST_GEO_MATCH: f32 = 0.15;
pub const BOOST_LANGUAGE_MATCH: f32 = 0.15;

// Cold-start fallback allocation across size buckets
pub const FALLBACK_LARGE_SHARE: f64 = 0.6;
pub const FALLBACK_MEDIUM_SHARE: f64 = 0.3;

/// Size-bucket boundaries relative to the mean cluster size
pub const FALLBACK_LARGE_FACTOR: f32 = 1.2;
pub const FALLBACK_SMALL_FACTOR: f32 = 0.8;

pub const FALLBACK_SIZE_WEIGHT: f32 = 0.6;
pub const FALLBACK_DENSITY_WEIGHT: f32 = 0.4;

/// Upper bound of the uniform random term added to fallback scores
pub const FALLBACK_JITTER: f64 = 0.05;

// ============================================================================
// Ranker Content-vector Cache
// ============================================================================

pub const RANKER_CACHE_CAPACITY: u64 = 100_000;
pub const RANKER_CACHE_TTL_SECS: u64 = 3600;
