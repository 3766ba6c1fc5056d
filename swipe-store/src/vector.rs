//! Vector payload normalization
//!
//! Stores persist embedding vectors either as numeric arrays or as
//! JSON-encoded strings of numeric arrays. Both shapes are parsed once,
//! here, at the repository boundary; the rest of the pipeline only ever
//! sees `Vec<f32>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The two on-disk shapes a vector may arrive in.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorPayload {
    /// Plain numeric array.
    Array(Vec<f32>),
    /// JSON-encoded string of a numeric array, e.g. `"[0.1, 0.2]"`.
    Encoded(String),
}

impl VectorPayload {
    /// Normalize to a plain vector, decoding the string form if needed.
    pub fn into_vec(self) -> Result<Vec<f32>, serde_json::Error> {
        match self {
            VectorPayload::Array(values) => Ok(values),
            VectorPayload::Encoded(raw) => serde_json::from_str(&raw),
        }
    }
}

/// Serde adapter for entity vector fields: tolerates both payload shapes on
/// read, always writes the plain array form.
///
/// Usage: `#[serde(with = "crate::vector::payload")]`.
pub mod payload {
    use super::*;

    pub fn serialize<S>(vector: &[f32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        vector.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        VectorPayload::deserialize(deserializer)?
            .into_vec()
            .map_err(serde::de::Error::custom)
    }
}
