//! Embedding service contracts
//!
//! Model loading and inference live outside the core; the ingestion
//! pipeline talks to them through these traits and the core only ever
//! consumes the resulting vectors.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("inference failure: {0}")]
    Inference(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug)]
pub struct TextEmbedding {
    pub vector: Vec<f32>,
    pub token_count: usize,
    pub success: bool,
}

#[derive(Clone, Debug)]
pub struct VisualEmbedding {
    pub vector: Vec<f32>,
    pub frames_processed: usize,
    pub success: bool,
}

#[derive(Clone, Debug)]
pub struct Transcription {
    pub text: String,
    pub language: Option<String>,
    pub confidence: Option<f32>,
}

#[async_trait]
pub trait TextEmbeddingService: Send + Sync {
    async fn generate(&self, text: &str) -> Result<TextEmbedding, EmbeddingError>;
}

#[async_trait]
pub trait VisualEmbeddingService: Send + Sync {
    /// Embed a sampled sequence of video frames.
    async fn generate(&self, frames: &[Vec<u8>]) -> Result<VisualEmbedding, EmbeddingError>;
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, EmbeddingError>;
}
