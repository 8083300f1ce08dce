//! Error types for textsum-rs.

use std::path::PathBuf;

/// Errors that can occur while loading or running a summarizer.
///
/// Unknown words and unknown output ids are not errors: they are recovered
/// where they happen (see [`crate::vocab::Lookup`]).
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    /// Model or vocabulary file not found at specified path.
    #[error("Model file not found: {0}")]
    ModelFileNotFound(PathBuf),

    /// ONNX Runtime error.
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// Encoder or decoder produced something the loop cannot consume.
    #[error("Model inference error: {0}")]
    Inference(String),

    /// Tokenizer error.
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Vocabulary file could not be interpreted.
    #[error("Invalid vocabulary: {0}")]
    VocabularyFormat(String),

    /// A reserved token (start/end marker) is missing from the vocabulary.
    #[error("Reserved token '{0}' is not in the target vocabulary")]
    MissingSpecialToken(String),

    /// Input tokenized to more ids than the encoder accepts.
    #[error("Input has {len} tokens, the encoder accepts at most {max}")]
    InputTooLong { len: usize, max: usize },

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for summarizer operations.
pub type Result<T> = std::result::Result<T, SummarizerError>;
