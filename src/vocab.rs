//! Source and target vocabularies.
//!
//! A [`Vocabulary`] maps words to integer ids and back. It is loaded once,
//! never mutated, and shared read-only between requests.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SummarizerError};

/// Characters replaced by the split string before words are cut.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Id used for padding, and for unknown words when no OOV token exists.
pub const PAD_ID: u32 = 0;

/// Unknown-token spellings recognised in HuggingFace vocabularies.
const UNKNOWN_TOKENS: [&str; 3] = ["<unk>", "[UNK]", "<UNK>"];

/// Outcome of a dictionary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Known(u32),
    Unknown,
}

impl Lookup {
    /// Returns the id, or `fallback` for an unknown token.
    pub fn id_or(self, fallback: u32) -> u32 {
        match self {
            Lookup::Known(id) => id,
            Lookup::Unknown => fallback,
        }
    }
}

/// Rules for cutting raw text into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRules {
    pub filters: String,
    pub lower: bool,
    pub split: String,
    pub char_level: bool,
}

impl Default for TextRules {
    fn default() -> Self {
        Self {
            filters: DEFAULT_FILTERS.to_string(),
            lower: true,
            split: " ".to_string(),
            char_level: false,
        }
    }
}

impl TextRules {
    /// Splits `text` into words. Empty pieces are dropped.
    pub fn words(&self, text: &str) -> Vec<String> {
        let text = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if self.char_level {
            return text.chars().map(String::from).collect();
        }

        let split = if self.split.is_empty() {
            " "
        } else {
            self.split.as_str()
        };
        let filtered: String = text
            .chars()
            .map(|c| {
                if self.filters.contains(c) {
                    split.to_string()
                } else {
                    c.to_string()
                }
            })
            .collect();

        filtered
            .split(split)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Bidirectional word/id mapping.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: HashMap<u32, String>,
    oov_id: Option<u32>,
    num_words: Option<usize>,
    rules: TextRules,
}

impl Vocabulary {
    /// Builds a vocabulary from a word → id map.
    ///
    /// Fails if two words share an id, since the reverse map would be
    /// ambiguous.
    pub fn from_word_index(word_index: HashMap<String, u32>) -> Result<Self> {
        let mut id_to_token = HashMap::with_capacity(word_index.len());
        for (token, &id) in &word_index {
            if let Some(previous) = id_to_token.insert(id, token.clone()) {
                return Err(SummarizerError::VocabularyFormat(format!(
                    "id {id} is assigned to both '{previous}' and '{token}'"
                )));
            }
        }

        Ok(Self {
            token_to_id: word_index,
            id_to_token,
            oov_id: None,
            num_words: None,
            rules: TextRules::default(),
        })
    }

    /// Loads the JSON export of a Keras `Tokenizer` (`tokenizer.to_json()`).
    pub fn from_keras_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SummarizerError::ModelFileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_keras_json_str(&raw)
    }

    /// Parses the JSON export of a Keras `Tokenizer`.
    pub fn from_keras_json_str(raw: &str) -> Result<Self> {
        let export: KerasExport = serde_json::from_str(raw)?;
        if export.class_name != "Tokenizer" {
            return Err(SummarizerError::VocabularyFormat(format!(
                "expected a Keras Tokenizer export, found '{}'",
                export.class_name
            )));
        }
        let config = export.config;

        // Keras stores the dictionaries as JSON encoded strings.
        let word_index: HashMap<String, u32> = match config.word_index {
            serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
            other => serde_json::from_value(other)?,
        };

        let mut vocab = Self::from_word_index(word_index)?.with_rules(TextRules {
            filters: config.filters,
            lower: config.lower,
            split: config.split,
            char_level: config.char_level,
        });
        vocab.num_words = config.num_words;
        if let Some(token) = config.oov_token {
            vocab = vocab.with_oov_token(&token)?;
        }

        Ok(vocab)
    }

    /// Builds a vocabulary from a HuggingFace `tokenizer.json` file.
    ///
    /// Only the token table is used; words are still cut with [`TextRules`].
    pub fn from_tokenizer_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SummarizerError::ModelFileNotFound(path.to_path_buf()));
        }
        let tokenizer = tokenizers::Tokenizer::from_file(path)?;
        Self::from_tokenizer(&tokenizer)
    }

    /// Builds a vocabulary from an already loaded HuggingFace tokenizer.
    pub fn from_tokenizer(tokenizer: &tokenizers::Tokenizer) -> Result<Self> {
        let vocab = Self::from_word_index(tokenizer.get_vocab(true))?;
        let unk = UNKNOWN_TOKENS
            .iter()
            .find(|t| vocab.token_to_id.contains_key(**t));
        match unk {
            Some(unk) => vocab.with_oov_token(unk),
            None => Ok(vocab),
        }
    }

    /// Marks `token` as the out-of-vocabulary token.
    pub fn with_oov_token(mut self, token: &str) -> Result<Self> {
        let id = self.token_to_id.get(token).copied().ok_or_else(|| {
            SummarizerError::VocabularyFormat(format!(
                "OOV token '{token}' is not in the vocabulary"
            ))
        })?;
        self.oov_id = Some(id);
        Ok(self)
    }

    /// Limits text lookups to ids below `num_words`.
    pub fn with_num_words(mut self, num_words: usize) -> Self {
        self.num_words = Some(num_words);
        self
    }

    /// Replaces the text splitting rules.
    pub fn with_rules(mut self, rules: TextRules) -> Self {
        self.rules = rules;
        self
    }

    /// Looks up a single word.
    pub fn lookup_token(&self, token: &str) -> Lookup {
        match self.token_to_id.get(token) {
            Some(&id) if self.num_words.map_or(true, |n| (id as usize) < n) => {
                Lookup::Known(id)
            }
            _ => Lookup::Unknown,
        }
    }

    /// Returns the string form of `id`, if any.
    pub fn lookup_id(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    /// Resolves a reserved token that must exist, like the start marker.
    pub fn special_id(&self, token: &str) -> Result<u32> {
        self.token_to_id
            .get(token)
            .copied()
            .ok_or_else(|| SummarizerError::MissingSpecialToken(token.to_string()))
    }

    /// Id substituted for unknown words.
    pub fn unknown_id(&self) -> u32 {
        self.oov_id.unwrap_or(PAD_ID)
    }

    /// Splits text into words with this vocabulary's rules.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.rules.words(text)
    }

    /// Converts text to ids. Unknown words map to [`Vocabulary::unknown_id`].
    pub fn text_to_ids(&self, text: &str) -> Vec<u32> {
        let unknown = self.unknown_id();
        self.words(text)
            .iter()
            .map(|w| self.lookup_token(w).id_or(unknown))
            .collect()
    }

    pub fn rules(&self) -> &TextRules {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }
}

#[derive(Deserialize)]
struct KerasExport {
    class_name: String,
    config: KerasConfig,
}

#[derive(Deserialize)]
struct KerasConfig {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    word_index: serde_json::Value,
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_lower() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}
