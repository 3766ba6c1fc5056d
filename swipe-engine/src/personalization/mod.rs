//! User profiles and request context

pub mod user_profile;

pub use user_profile::{Demographics, RecommendationContext, UserProfile};
