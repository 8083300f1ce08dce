//! End-to-end tests of the summarizer with an in-memory model.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayD, IxDyn};
use textsum_rs::{
    summarize, EncoderOutput, InputSequence, RecurrentState, Seq2SeqModel, StepOutput, StopReason,
    Summarizer, SummarizerConfig, SummarizerError, TruncationPolicy, Vocabulary,
};

const VOCAB_SIZE: usize = 8;
const END_ID: usize = 2;

/// Copies the input back out word by word, ending at the first padding id.
///
/// The context holds the input ids; the hidden state holds the read position.
struct EchoModel {
    fail_encoder: bool,
}

impl EchoModel {
    fn new() -> Self {
        Self {
            fail_encoder: false,
        }
    }
}

impl Seq2SeqModel for EchoModel {
    fn encode(&mut self, input: &InputSequence) -> textsum_rs::Result<EncoderOutput> {
        if self.fail_encoder {
            return Err(SummarizerError::Inference("shape mismatch".to_string()));
        }
        let ids: Vec<f32> = input.ids().iter().map(|&id| id as f32).collect();
        Ok(EncoderOutput {
            context: ArrayD::from_shape_vec(IxDyn(&[1, ids.len()]), ids).unwrap(),
            state: RecurrentState::new(Array2::zeros((1, 1)), Array2::zeros((1, 1))),
        })
    }

    fn decode_step(
        &mut self,
        _last_token: u32,
        context: &ArrayD<f32>,
        state: &RecurrentState,
    ) -> textsum_rs::Result<StepOutput> {
        let pos = state.hidden[[0, 0]] as usize;
        let next = if pos < context.len() {
            context[&[0, pos][..]] as usize
        } else {
            0
        };
        let next = if next == 0 { END_ID } else { next };

        let mut scores = Array1::from_elem(VOCAB_SIZE, -1.0);
        scores[next] = 1.0;
        Ok(StepOutput {
            scores,
            state: RecurrentState::new(&state.hidden + 1.0, state.cell.clone()),
        })
    }
}

fn vocab(words: &[(&str, u32)]) -> Arc<Vocabulary> {
    let map = words.iter().map(|(w, i)| (w.to_string(), *i)).collect();
    Arc::new(Vocabulary::from_word_index(map).unwrap())
}

fn source_vocab() -> Arc<Vocabulary> {
    vocab(&[("storm", 3), ("hits", 4), ("coast", 5), ("sea", 6)])
}

fn target_vocab() -> Arc<Vocabulary> {
    vocab(&[
        ("<pad>", 0),
        ("sostok", 1),
        ("eostok", 2),
        ("storm", 3),
        ("hits", 4),
        ("coast", 5),
    ])
}

fn summarizer(config: SummarizerConfig) -> Summarizer {
    Summarizer::new(source_vocab(), target_vocab(), Box::new(EchoModel::new()), config).unwrap()
}

#[test]
fn test_summarize_short_text() {
    let mut s = summarizer(SummarizerConfig::default());
    assert_eq!(s.summarize("Storm hits coast.").unwrap(), "storm hits coast");
}

#[test]
fn test_summarize_free_function() {
    let mut s = summarizer(SummarizerConfig::default());
    assert_eq!(summarize("storm, coast!", &mut s).unwrap(), "storm coast");
}

#[test]
fn test_empty_input() {
    let mut s = summarizer(SummarizerConfig::default());
    let decoded = s.summarize_detailed("").unwrap();
    assert_eq!(decoded.text(), "");
    assert_eq!(decoded.stop, StopReason::EndToken);
    assert_eq!(decoded.steps, 1);
}

#[test]
fn test_word_cap_on_long_input() {
    let mut s = summarizer(SummarizerConfig::default());
    let text = "storm hits coast ".repeat(10);
    let decoded = s.summarize_detailed(&text).unwrap();

    assert_eq!(decoded.stop, StopReason::WordLimit);
    assert_eq!(decoded.words.len(), 15);
    assert!(decoded.steps <= 16);
    assert!(!decoded.text().contains("eostok"));
}

#[test]
fn test_custom_word_cap() {
    let config = SummarizerConfig {
        max_summary_len: 2,
        ..SummarizerConfig::default()
    };
    let mut s = summarizer(config);
    assert_eq!(s.summarize("storm hits coast").unwrap(), "storm hits");
}

#[test]
fn test_source_only_word_becomes_blank() {
    // "sea" exists in the source vocabulary but not in the target one.
    let mut s = summarizer(SummarizerConfig::default());
    assert_eq!(s.summarize("storm sea coast").unwrap(), "storm  coast");
}

#[test]
fn test_unknown_words_collapse_to_padding() {
    let mut s = summarizer(SummarizerConfig::default());
    // "calm" is unknown, maps to 0 and reads as the end of input.
    assert_eq!(s.summarize("calm storm").unwrap(), "");
}

#[test]
fn test_overlong_input_truncated_or_rejected() {
    let text = "storm ".repeat(150);

    let mut s = summarizer(SummarizerConfig::default());
    assert!(s.summarize(&text).is_ok());

    let config = SummarizerConfig {
        truncation: TruncationPolicy::Reject,
        ..SummarizerConfig::default()
    };
    let mut s = summarizer(config);
    let err = s.summarize(&text).unwrap_err();
    assert!(matches!(err, SummarizerError::InputTooLong { len: 150, max: 100 }));
}

#[test]
fn test_deterministic() {
    let mut a = summarizer(SummarizerConfig::default());
    let mut b = summarizer(SummarizerConfig::default());
    let text = "coast hits storm storm";
    assert_eq!(a.summarize(text).unwrap(), b.summarize(text).unwrap());
    assert_eq!(a.summarize(text).unwrap(), a.summarize(text).unwrap());
}

#[test]
fn test_vocabularies_shared_between_summarizers() {
    let source = source_vocab();
    let target = target_vocab();
    let _a = Summarizer::new(
        source.clone(),
        target.clone(),
        Box::new(EchoModel::new()),
        SummarizerConfig::default(),
    )
    .unwrap();
    let _b = Summarizer::new(
        source.clone(),
        target.clone(),
        Box::new(EchoModel::new()),
        SummarizerConfig::default(),
    )
    .unwrap();
    assert_eq!(Arc::strong_count(&target), 3);
}

#[test]
fn test_missing_start_token() {
    let target = vocab(&[("eostok", 2), ("storm", 3)]);
    let err = Summarizer::new(
        source_vocab(),
        target,
        Box::new(EchoModel::new()),
        SummarizerConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, SummarizerError::MissingSpecialToken(t) if t == "sostok"));
}

#[test]
fn test_encoder_failure_propagates() {
    let model = EchoModel { fail_encoder: true };
    let mut s = Summarizer::new(
        source_vocab(),
        target_vocab(),
        Box::new(model),
        SummarizerConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        s.summarize("storm").unwrap_err(),
        SummarizerError::Inference(_)
    ));
}

#[test]
fn test_warmup() {
    let mut s = summarizer(SummarizerConfig::default());
    s.warmup().unwrap();
    assert_eq!(s.summarize("hits").unwrap(), "hits");
}

#[test]
fn test_missing_end_marker_runs_to_step_limit() {
    let target = vocab(&[("sostok", 1), ("storm", 3), ("hits", 4)]);
    let mut s = Summarizer::new(
        source_vocab(),
        target,
        Box::new(EchoModel::new()),
        SummarizerConfig::default(),
    )
    .unwrap();

    let decoded = s.summarize_detailed("storm hits").unwrap();
    assert_eq!(decoded.text(), "storm hits");
    assert_eq!(decoded.stop, StopReason::StepLimit);
    assert_eq!(decoded.steps, 16);
}
