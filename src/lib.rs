//! Greedy seq2seq text summarization for Rust.
//!
//! This crate runs a pretrained encoder-decoder (LSTM) summarization model,
//! exported to ONNX, and turns raw text into a short summary.
//!
//! # Quick Start
//!
//! ```no_run
//! use textsum_rs::Summarizer;
//!
//! let mut summarizer = Summarizer::builder()
//!     .artifacts_dir("models/news-summarizer")
//!     .build()
//!     .unwrap();
//! let summary = summarizer.summarize("The storm hit the coast late on Sunday ...").unwrap();
//! println!("{}", summary);
//! ```
//!
//! # Low-level API
//!
//! ```no_run
//! use textsum_rs::{
//!     decode, load_vocabulary, normalize, DecodeSettings, OnnxSeq2Seq, Seq2SeqModel,
//!     TruncationPolicy,
//! };
//!
//! let source = load_vocabulary("x_tokenizer.json").unwrap();
//! let target = load_vocabulary("y_tokenizer.json").unwrap();
//! let mut model = OnnxSeq2Seq::from_paths("encoder_model.onnx", "decoder_model.onnx").unwrap();
//!
//! let input = normalize("some long article", &source, 100, TruncationPolicy::Truncate).unwrap();
//! let encoded = model.encode(&input).unwrap();
//! let settings = DecodeSettings::new(target.special_id("sostok").unwrap(), "eostok", 15);
//! let summary = decode(&mut model, &encoded, &target, &settings).unwrap();
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod format;
pub mod hub;
pub mod model;
pub mod normalize;
pub mod summarizer;
pub mod vocab;

pub use config::{SummarizerConfig, END_TOKEN, MAX_INPUT_LEN, MAX_SUMMARY_LEN, START_TOKEN};
pub use decode::{
    argmax, decode, decode_tokens, step, DecodeSettings, Decoded, DecoderState, Phase, StopReason,
};
pub use error::{Result, SummarizerError};
pub use hub::{download_artifacts, load_vocabulary, ModelArtifacts};
pub use model::{EncoderOutput, OnnxSeq2Seq, RecurrentState, Seq2SeqModel, StepOutput};
pub use normalize::{normalize, InputSequence, TruncationPolicy};
pub use summarizer::{Summarizer, SummarizerBuilder, SummaryResponse};
pub use vocab::{Lookup, TextRules, Vocabulary, PAD_ID};

/// Summarizes `text` with a loaded summarizer.
///
/// # Example
/// ```no_run
/// use textsum_rs::{summarize, Summarizer};
///
/// let mut summarizer = Summarizer::builder().hub_repo("someone/news-summarizer").build().unwrap();
/// let text = summarize("The storm hit the coast late on Sunday ...", &mut summarizer).unwrap();
/// ```
pub fn summarize(text: &str, summarizer: &mut Summarizer) -> Result<String> {
    summarizer.summarize(text)
}
