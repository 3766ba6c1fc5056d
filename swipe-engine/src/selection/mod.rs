//! Candidate selection from matched clusters

pub mod candidate_selector;

pub use candidate_selector::{Candidate, CandidateMeta, CandidateSelector, SelectorOptions};
