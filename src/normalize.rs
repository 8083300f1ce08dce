//! Text to fixed-length encoder input.

use log::{debug, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SummarizerError};
use crate::vocab::{Vocabulary, PAD_ID};

/// What to do with input that tokenizes to more ids than the encoder accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Keep the leading ids.
    #[default]
    Truncate,
    /// Fail with [`SummarizerError::InputTooLong`].
    Reject,
}

/// Source ids of exactly the encoder's input length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSequence {
    ids: Vec<u32>,
    token_count: usize,
}

impl InputSequence {
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of leading ids that came from the text rather than padding.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Converts to the shape expected by the encoder: [1, len].
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((1, self.ids.len()), |(_, i)| self.ids[i] as f32)
    }
}

/// Tokenizes `text` and pads or truncates it to `max_len` ids.
pub fn normalize(
    text: &str,
    vocab: &Vocabulary,
    max_len: usize,
    policy: TruncationPolicy,
) -> Result<InputSequence> {
    let mut ids = vocab.text_to_ids(text);

    if ids.is_empty() {
        debug!("Input produced no tokens; encoder sees padding only");
    }

    if ids.len() > max_len {
        match policy {
            TruncationPolicy::Truncate => {
                warn!("Input has {} tokens, truncating to {}", ids.len(), max_len);
                ids.truncate(max_len);
            }
            TruncationPolicy::Reject => {
                return Err(SummarizerError::InputTooLong {
                    len: ids.len(),
                    max: max_len,
                });
            }
        }
    }

    let token_count = ids.len();
    ids.resize(max_len, PAD_ID);

    Ok(InputSequence { ids, token_count })
}
