//! Summarizer settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SummarizerError};
use crate::normalize::TruncationPolicy;

/// Length of the encoder input sequence.
pub const MAX_INPUT_LEN: usize = 100;

/// Maximum number of words in a summary.
pub const MAX_SUMMARY_LEN: usize = 15;

/// Target-side sequence start marker.
pub const START_TOKEN: &str = "sostok";

/// Target-side sequence end marker.
pub const END_TOKEN: &str = "eostok";

/// Settings shared by every request of a [`crate::Summarizer`].
///
/// Every field has a default, so a partial JSON file is valid:
///
/// ```
/// let config = textsum_rs::SummarizerConfig::from_json_str(r#"{"max_summary_len": 10}"#).unwrap();
/// assert_eq!(config.max_summary_len, 10);
/// assert_eq!(config.max_input_len, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub max_input_len: usize,
    pub max_summary_len: usize,
    pub start_token: String,
    pub end_token: String,
    pub truncation: TruncationPolicy,
    /// Ceiling on decoder invocations; clamped to `max_summary_len + 1`.
    pub max_steps: Option<usize>,
    /// Intra-op thread count for the ONNX sessions.
    pub intra_threads: Option<usize>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_input_len: MAX_INPUT_LEN,
            max_summary_len: MAX_SUMMARY_LEN,
            start_token: START_TOKEN.to_string(),
            end_token: END_TOKEN.to_string(),
            truncation: TruncationPolicy::default(),
            max_steps: None,
            intra_threads: None,
        }
    }
}

impl SummarizerConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_input_len == 0 {
            return Err(SummarizerError::InvalidConfig(
                "max_input_len must be at least 1".to_string(),
            ));
        }
        if self.max_summary_len == 0 {
            return Err(SummarizerError::InvalidConfig(
                "max_summary_len must be at least 1".to_string(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(SummarizerError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if self.start_token.is_empty() || self.end_token.is_empty() {
            return Err(SummarizerError::InvalidConfig(
                "start and end tokens must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective decoder invocation ceiling.
    pub fn step_limit(&self) -> usize {
        let hard = self.max_summary_len.saturating_add(1);
        self.max_steps.map_or(hard, |n| n.min(hard))
    }
}
