//! The summarization context object.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;
use crate::decode::{decode_tokens, DecodeSettings, Decoded};
use crate::error::{Result, SummarizerError};
use crate::hub::{download_artifacts, load_vocabulary, ModelArtifacts};
use crate::model::{OnnxSeq2Seq, Seq2SeqModel};
use crate::normalize::{normalize, TruncationPolicy};
use crate::vocab::{Lookup, Vocabulary};

/// Response body handed to the request-handling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub predicted_summary: String,
}

impl From<String> for SummaryResponse {
    fn from(predicted_summary: String) -> Self {
        Self { predicted_summary }
    }
}

/// Everything one summarization request needs.
///
/// Vocabularies are shared through `Arc` and never mutated. Each request
/// creates its own encoder output and decoder state, so a `Summarizer` can be
/// reused across requests; concurrent callers need one instance each (or a
/// lock around a shared one).
pub struct Summarizer {
    source: Arc<Vocabulary>,
    target: Arc<Vocabulary>,
    model: Box<dyn Seq2SeqModel + Send>,
    config: SummarizerConfig,
    settings: DecodeSettings,
}

impl Summarizer {
    /// Creates a builder that loads artifacts from disk or the Hub.
    pub fn builder() -> SummarizerBuilder {
        SummarizerBuilder::default()
    }

    /// Assembles a summarizer from already loaded parts.
    ///
    /// Fails if the config is invalid or the target vocabulary lacks the
    /// start marker.
    pub fn new(
        source: Arc<Vocabulary>,
        target: Arc<Vocabulary>,
        model: Box<dyn Seq2SeqModel + Send>,
        config: SummarizerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let start_id = target.special_id(&config.start_token)?;
        if target.lookup_token(&config.end_token) == Lookup::Unknown {
            // The loop compares strings, so a missing end marker only means
            // decoding always runs to the word cap.
            warn!(
                "End marker '{}' is not in the target vocabulary",
                config.end_token
            );
        }

        let settings = DecodeSettings {
            start_id,
            end_token: config.end_token.clone(),
            max_summary_len: config.max_summary_len,
            max_steps: config.step_limit(),
        };

        Ok(Self {
            source,
            target,
            model,
            config,
            settings,
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    pub fn source_vocab(&self) -> &Arc<Vocabulary> {
        &self.source
    }

    pub fn target_vocab(&self) -> &Arc<Vocabulary> {
        &self.target
    }

    /// Summarizes `text`.
    pub fn summarize(&mut self, text: &str) -> Result<String> {
        Ok(self.summarize_detailed(text)?.text())
    }

    /// Summarizes `text` and returns the full decoding trace.
    pub fn summarize_detailed(&mut self, text: &str) -> Result<Decoded> {
        let input = normalize(
            text,
            &self.source,
            self.config.max_input_len,
            self.config.truncation,
        )?;
        debug!(
            "Normalized input: {} tokens, {} padding",
            input.token_count(),
            input.len() - input.token_count()
        );

        let encoded = self.model.encode(&input)?;
        decode_tokens(self.model.as_mut(), &encoded, &self.target, &self.settings)
    }

    /// Runs one throwaway request so the first real one does not pay for
    /// session initialization.
    pub fn warmup(&mut self) -> Result<()> {
        self.summarize_detailed("").map(|_| ())
    }
}

enum ArtifactSource {
    Dir(PathBuf),
    Hub {
        repo_id: String,
        revision: Option<String>,
    },
}

/// Builder for configuring a [`Summarizer`].
#[derive(Default)]
pub struct SummarizerBuilder {
    source: Option<ArtifactSource>,
    config: Option<SummarizerConfig>,
    max_input_len: Option<usize>,
    max_summary_len: Option<usize>,
    truncation: Option<TruncationPolicy>,
    intra_threads: Option<usize>,
    warmup: bool,
}

impl SummarizerBuilder {
    /// Loads artifacts from a local directory.
    pub fn artifacts_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.source = Some(ArtifactSource::Dir(dir.into()));
        self
    }

    /// Downloads artifacts from a HuggingFace Hub model repository.
    pub fn hub_repo(mut self, repo_id: &str) -> Self {
        self.source = Some(ArtifactSource::Hub {
            repo_id: repo_id.to_string(),
            revision: None,
        });
        self
    }

    /// Pins the Hub revision. Ignored for local directories.
    pub fn revision(mut self, revision: &str) -> Self {
        if let Some(ArtifactSource::Hub { revision: rev, .. }) = &mut self.source {
            *rev = Some(revision.to_string());
        }
        self
    }

    /// Uses `config` instead of the artifacts' `summarizer.json`.
    pub fn config(mut self, config: SummarizerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the encoder input length.
    pub fn max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = Some(len);
        self
    }

    /// Sets the word cap of a summary.
    pub fn max_summary_len(mut self, len: usize) -> Self {
        self.max_summary_len = Some(len);
        self
    }

    /// Sets how overlong input is handled.
    pub fn truncation(mut self, policy: TruncationPolicy) -> Self {
        self.truncation = Some(policy);
        self
    }

    /// Sets the intra-op thread count of the ONNX sessions.
    pub fn intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Runs a warmup request after loading.
    pub fn warmup(mut self, warmup: bool) -> Self {
        self.warmup = warmup;
        self
    }

    /// Loads everything and builds the summarizer.
    pub fn build(self) -> Result<Summarizer> {
        let artifacts = match self.source {
            Some(ArtifactSource::Dir(dir)) => ModelArtifacts::from_dir(dir)?,
            Some(ArtifactSource::Hub { repo_id, revision }) => {
                download_artifacts(&repo_id, revision.as_deref())?
            }
            None => {
                return Err(SummarizerError::InvalidConfig(
                    "no artifacts directory or hub repository given".to_string(),
                ))
            }
        };

        let mut config = match (self.config, &artifacts.config) {
            (Some(config), _) => config,
            (None, Some(path)) => SummarizerConfig::from_json_file(path)?,
            (None, None) => SummarizerConfig::default(),
        };
        if let Some(len) = self.max_input_len {
            config.max_input_len = len;
        }
        if let Some(len) = self.max_summary_len {
            config.max_summary_len = len;
        }
        if let Some(policy) = self.truncation {
            config.truncation = policy;
        }
        if let Some(threads) = self.intra_threads {
            config.intra_threads = Some(threads);
        }

        let source = Arc::new(load_vocabulary(&artifacts.source_vocab)?);
        let target = Arc::new(load_vocabulary(&artifacts.target_vocab)?);
        info!(
            "Loaded vocabularies: {} source words, {} target words",
            source.len(),
            target.len()
        );

        let model = OnnxSeq2Seq::from_paths_with_threads(
            &artifacts.encoder,
            &artifacts.decoder,
            config.intra_threads,
        )?;

        let mut summarizer = Summarizer::new(source, target, Box::new(model), config)?;
        if self.warmup {
            summarizer.warmup()?;
        }
        Ok(summarizer)
    }
}
