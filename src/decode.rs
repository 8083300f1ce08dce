//! Greedy autoregressive decoding.
//!
//! The loop starts from the encoder's state and the start marker, asks the
//! decoder for one token at a time and stops on the end marker, on the word
//! cap, or on the step ceiling, whichever comes first.

use log::{debug, trace};
use ndarray::ArrayD;

use crate::error::{Result, SummarizerError};
use crate::format::{format, word_count};
use crate::model::{EncoderOutput, RecurrentState, Seq2SeqModel};
use crate::vocab::Vocabulary;

/// Why decoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The decoder emitted the end marker.
    EndToken,
    /// The output reached the word cap.
    WordLimit,
    /// The decoder was invoked the maximum number of times.
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Done(StopReason),
}

/// Per-request settings of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSettings {
    pub start_id: u32,
    pub end_token: String,
    pub max_summary_len: usize,
    pub max_steps: usize,
}

impl DecodeSettings {
    /// Settings with the step ceiling derived from the word cap.
    pub fn new(start_id: u32, end_token: &str, max_summary_len: usize) -> Self {
        Self {
            start_id,
            end_token: end_token.to_string(),
            max_summary_len,
            max_steps: max_summary_len.saturating_add(1),
        }
    }
}

/// Loop state between two decoder invocations.
///
/// [`step`] consumes a reference and returns the next state, so any
/// intermediate state can be kept and decoding resumed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderState {
    pub last_token: u32,
    pub state: RecurrentState,
    pub words: Vec<String>,
    pub token_ids: Vec<u32>,
    pub steps: usize,
}

impl DecoderState {
    pub fn initial(start_id: u32, encoded: &EncoderOutput) -> Self {
        Self {
            last_token: start_id,
            state: encoded.state.clone(),
            words: Vec::new(),
            token_ids: Vec::new(),
            steps: 0,
        }
    }
}

/// Full trace of one decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Visible words in emission order, end marker excluded.
    pub words: Vec<String>,
    /// Every id the decoder emitted, end marker included.
    pub token_ids: Vec<u32>,
    pub steps: usize,
    pub stop: StopReason,
}

impl Decoded {
    pub fn text(&self) -> String {
        format(&self.words)
    }
}

/// Index of the highest score; the first one wins ties.
///
/// NaN never wins. Returns `None` if there is no comparable score.
pub fn argmax<'a, I>(scores: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.into_iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i as u32)
}

/// Runs one decoder invocation and returns the next state.
pub fn step<M: Seq2SeqModel + ?Sized>(
    model: &mut M,
    context: &ArrayD<f32>,
    vocab: &Vocabulary,
    settings: &DecodeSettings,
    current: &DecoderState,
) -> Result<(DecoderState, Phase)> {
    let out = model.decode_step(current.last_token, context, &current.state)?;

    let next = argmax(&out.scores).ok_or_else(|| {
        SummarizerError::Inference("decoder returned no usable scores".to_string())
    })?;

    let token = match vocab.lookup_id(next) {
        Some(token) => token,
        None => {
            debug!("Decoder emitted id {next} with no target word; using a blank");
            ""
        }
    };
    trace!("Step {}: id {} -> {:?}", current.steps + 1, next, token);

    let is_end = token == settings.end_token;
    let mut words = current.words.clone();
    if !is_end {
        // A multi-word entry only contributes what still fits under the cap.
        let room = settings.max_summary_len.saturating_sub(word_count(&words));
        if word_count(&[token]) > room {
            let kept: Vec<&str> = token.split_whitespace().take(room).collect();
            words.push(kept.join(" "));
        } else {
            words.push(token.to_string());
        }
    }
    let mut token_ids = current.token_ids.clone();
    token_ids.push(next);

    let next_state = DecoderState {
        last_token: next,
        state: out.state,
        words,
        token_ids,
        steps: current.steps + 1,
    };

    let phase = if is_end {
        Phase::Done(StopReason::EndToken)
    } else if word_count(&next_state.words) >= settings.max_summary_len {
        Phase::Done(StopReason::WordLimit)
    } else if next_state.steps >= settings.max_steps {
        Phase::Done(StopReason::StepLimit)
    } else {
        Phase::Running
    };

    Ok((next_state, phase))
}

/// Decodes until a stop condition holds and returns the full trace.
pub fn decode_tokens<M: Seq2SeqModel + ?Sized>(
    model: &mut M,
    encoded: &EncoderOutput,
    vocab: &Vocabulary,
    settings: &DecodeSettings,
) -> Result<Decoded> {
    let mut state = DecoderState::initial(settings.start_id, encoded);

    loop {
        let (next, phase) = step(model, &encoded.context, vocab, settings, &state)?;
        state = next;

        if let Phase::Done(stop) = phase {
            debug!("Decoding stopped after {} steps: {:?}", state.steps, stop);
            return Ok(Decoded {
                words: state.words,
                token_ids: state.token_ids,
                steps: state.steps,
                stop,
            });
        }
    }
}

/// Decodes and formats the summary text.
pub fn decode<M: Seq2SeqModel + ?Sized>(
    model: &mut M,
    encoded: &EncoderOutput,
    vocab: &Vocabulary,
    settings: &DecodeSettings,
) -> Result<String> {
    Ok(decode_tokens(model, encoded, vocab, settings)?.text())
}
