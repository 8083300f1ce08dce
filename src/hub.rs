//! Model artifact discovery and HuggingFace Hub downloading.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use log::{debug, info};

use crate::error::{Result, SummarizerError};
use crate::vocab::Vocabulary;

pub const ENCODER_FILE: &str = "encoder_model.onnx";
pub const DECODER_FILE: &str = "decoder_model.onnx";
pub const SOURCE_VOCAB_FILE: &str = "x_tokenizer.json";
pub const TARGET_VOCAB_FILE: &str = "y_tokenizer.json";

/// Optional settings file looked up next to the models.
pub const CONFIG_FILE: &str = "summarizer.json";

/// Locations of the files a summarizer is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub encoder: PathBuf,
    pub decoder: PathBuf,
    pub source_vocab: PathBuf,
    pub target_vocab: PathBuf,
    pub config: Option<PathBuf>,
}

impl ModelArtifacts {
    /// Finds the artifacts in a local directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let require = |name: &str| -> Result<PathBuf> {
            let path = dir.join(name);
            if path.exists() {
                Ok(path)
            } else {
                Err(SummarizerError::ModelFileNotFound(path))
            }
        };

        let config = dir.join(CONFIG_FILE);
        Ok(Self {
            encoder: require(ENCODER_FILE)?,
            decoder: require(DECODER_FILE)?,
            source_vocab: require(SOURCE_VOCAB_FILE)?,
            target_vocab: require(TARGET_VOCAB_FILE)?,
            config: config.exists().then_some(config),
        })
    }
}

/// Downloads the artifacts from a HuggingFace Hub model repository.
///
/// Files are cached by `hf-hub`; later calls resolve to the cached copies.
pub fn download_artifacts(repo_id: &str, revision: Option<&str>) -> Result<ModelArtifacts> {
    let api = Api::new()?;
    let repo = match revision {
        Some(rev) => api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            rev.to_string(),
        )),
        None => api.model(repo_id.to_string()),
    };

    info!("Fetching summarizer artifacts from '{repo_id}'");
    let encoder = repo.get(ENCODER_FILE)?;
    let decoder = repo.get(DECODER_FILE)?;
    let source_vocab = repo.get(SOURCE_VOCAB_FILE)?;
    let target_vocab = repo.get(TARGET_VOCAB_FILE)?;
    let config = optional_file(CONFIG_FILE, repo.get(CONFIG_FILE));

    Ok(ModelArtifacts {
        encoder,
        decoder,
        source_vocab,
        target_vocab,
        config,
    })
}

/// Keeps an optional download's path; a failure means the file is skipped.
fn optional_file<E: std::fmt::Display>(
    name: &str,
    fetched: std::result::Result<PathBuf, E>,
) -> Option<PathBuf> {
    match fetched {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("Skipping optional '{name}': {e}");
            None
        }
    }
}

/// Loads a vocabulary file, accepting both Keras tokenizer exports and
/// HuggingFace `tokenizer.json` files.
pub fn load_vocabulary<P: AsRef<Path>>(path: P) -> Result<Vocabulary> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SummarizerError::ModelFileNotFound(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    if value.get("class_name").and_then(|v| v.as_str()) == Some("Tokenizer") {
        Vocabulary::from_keras_json_str(&raw)
    } else {
        Vocabulary::from_tokenizer_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERAS_VOCAB: &str = r#"{
        "class_name": "Tokenizer",
        "config": {"word_index": "{\"sostok\": 1, \"eostok\": 2}"}
    }"#;

    fn touch_all(dir: &Path) {
        for name in [ENCODER_FILE, DECODER_FILE, SOURCE_VOCAB_FILE, TARGET_VOCAB_FILE] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch_all(dir.path());

        let artifacts = ModelArtifacts::from_dir(dir.path()).unwrap();
        assert_eq!(artifacts.encoder, dir.path().join(ENCODER_FILE));
        assert_eq!(artifacts.target_vocab, dir.path().join(TARGET_VOCAB_FILE));
        assert!(artifacts.config.is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), b"{}").unwrap();
        let artifacts = ModelArtifacts::from_dir(dir.path()).unwrap();
        assert_eq!(artifacts.config, Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        touch_all(dir.path());
        std::fs::remove_file(dir.path().join(DECODER_FILE)).unwrap();

        let err = ModelArtifacts::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SummarizerError::ModelFileNotFound(p) if p.ends_with(DECODER_FILE)));
    }

    #[test]
    fn test_optional_file() {
        let path = PathBuf::from("/cache/summarizer.json");
        let fetched: std::result::Result<PathBuf, std::io::Error> = Ok(path.clone());
        assert_eq!(optional_file(CONFIG_FILE, fetched), Some(path));

        let failed: std::result::Result<PathBuf, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "401 Unauthorized",
        ));
        assert_eq!(optional_file(CONFIG_FILE, failed), None);
    }

    #[test]
    fn test_load_keras_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TARGET_VOCAB_FILE);
        std::fs::write(&path, KERAS_VOCAB).unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.special_id("eostok").unwrap(), 2);
    }

    #[test]
    fn test_load_hf_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let tokenizer = r#"{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {"<unk>": 0, "sostok": 1, "eostok": 2, "storm": 3},
                "unk_token": "<unk>"
            }
        }"#;
        std::fs::write(&path, tokenizer).unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.lookup_id(3), Some("storm"));
        assert_eq!(vocab.unknown_id(), 0);
    }

    #[test]
    fn test_load_vocabulary_missing() {
        let err = load_vocabulary("/nonexistent/y_tokenizer.json").unwrap_err();
        assert!(matches!(err, SummarizerError::ModelFileNotFound(_)));
    }
}
