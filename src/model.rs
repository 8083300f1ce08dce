//! Encoder/decoder inference.
//!
//! [`Seq2SeqModel`] is the seam between the decoding loop and the numeric
//! backend. [`OnnxSeq2Seq`] runs exported Keras inference models through
//! ONNX Runtime.

use std::borrow::Cow;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayD, ArrayView, Ix2, IxDyn};
use ort::session::{Session, SessionInputValue};
use ort::value::Value;

use crate::error::{Result, SummarizerError};
use crate::normalize::InputSequence;

/// Recurrent (hidden, cell) pair carried between decoding steps.
///
/// Each step produces a new value; nothing updates a state in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    pub hidden: Array2<f32>,
    pub cell: Array2<f32>,
}

impl RecurrentState {
    pub fn new(hidden: Array2<f32>, cell: Array2<f32>) -> Self {
        Self { hidden, cell }
    }
}

/// Encoder result for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOutput {
    /// Per-position hidden vectors, read by every decoder step.
    pub context: ArrayD<f32>,
    /// Initial decoder state.
    pub state: RecurrentState,
}

/// One decoder step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Scores over the whole target vocabulary for the next token.
    pub scores: Array1<f32>,
    pub state: RecurrentState,
}

/// A trained encoder-decoder pair.
pub trait Seq2SeqModel {
    /// Encodes a normalized input sequence.
    fn encode(&mut self, input: &InputSequence) -> Result<EncoderOutput>;

    /// Scores the token following `last_token`.
    fn decode_step(
        &mut self,
        last_token: u32,
        context: &ArrayD<f32>,
        state: &RecurrentState,
    ) -> Result<StepOutput>;
}

/// Seq2seq model backed by two ONNX Runtime sessions.
///
/// Inputs are bound positionally to the names the graphs declare:
/// the encoder takes `[sequence]` and returns `[context, h, c]`, the decoder
/// takes `[target, context, h, c]` and returns `[scores, h, c]`.
pub struct OnnxSeq2Seq {
    encoder: Session,
    decoder: Session,
    encoder_input_names: Vec<String>,
    decoder_input_names: Vec<String>,
}

impl OnnxSeq2Seq {
    /// Loads the encoder and decoder ONNX files.
    ///
    /// # Arguments
    /// * `encoder_path` - Path to the encoder inference model
    /// * `decoder_path` - Path to the single-step decoder inference model
    pub fn from_paths<P: AsRef<Path>>(encoder_path: P, decoder_path: P) -> Result<Self> {
        Self::from_paths_with_threads(encoder_path, decoder_path, None)
    }

    /// Like [`OnnxSeq2Seq::from_paths`], limiting each session's intra-op threads.
    pub fn from_paths_with_threads<P: AsRef<Path>>(
        encoder_path: P,
        decoder_path: P,
        intra_threads: Option<usize>,
    ) -> Result<Self> {
        let encoder_path = encoder_path.as_ref();
        let decoder_path = decoder_path.as_ref();

        if !encoder_path.exists() {
            return Err(SummarizerError::ModelFileNotFound(encoder_path.to_path_buf()));
        }
        if !decoder_path.exists() {
            return Err(SummarizerError::ModelFileNotFound(decoder_path.to_path_buf()));
        }

        let encoder = open_session(encoder_path, intra_threads)?;
        let decoder = open_session(decoder_path, intra_threads)?;

        let encoder_input_names: Vec<String> =
            encoder.inputs().iter().map(|i| i.name().to_string()).collect();
        let decoder_input_names: Vec<String> =
            decoder.inputs().iter().map(|i| i.name().to_string()).collect();

        if encoder_input_names.len() != 1 {
            return Err(SummarizerError::Inference(format!(
                "encoder must take 1 input, graph declares {}",
                encoder_input_names.len()
            )));
        }
        if decoder_input_names.len() != 4 {
            return Err(SummarizerError::Inference(format!(
                "decoder must take 4 inputs (target, context, h, c), graph declares {}",
                decoder_input_names.len()
            )));
        }

        info!(
            "Loaded seq2seq model: encoder {:?}, decoder {:?}",
            encoder_path, decoder_path
        );
        debug!("Encoder inputs: {:?}", encoder_input_names);
        debug!("Decoder inputs: {:?}", decoder_input_names);

        Ok(Self {
            encoder,
            decoder,
            encoder_input_names,
            decoder_input_names,
        })
    }
}

impl Seq2SeqModel for OnnxSeq2Seq {
    fn encode(&mut self, input: &InputSequence) -> Result<EncoderOutput> {
        let encoder_inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = vec![(
            Cow::Owned(self.encoder_input_names[0].clone()),
            Value::from_array(input.to_array())?.into(),
        )];

        let outputs = self.encoder.run(encoder_inputs)?;
        if outputs.len() < 3 {
            return Err(SummarizerError::Inference(format!(
                "encoder returned {} outputs, expected context, h and c",
                outputs.len()
            )));
        }

        let context: ArrayView<f32, IxDyn> = outputs[0].try_extract_array()?;
        let hidden: ArrayView<f32, IxDyn> = outputs[1].try_extract_array()?;
        let cell: ArrayView<f32, IxDyn> = outputs[2].try_extract_array()?;

        Ok(EncoderOutput {
            context: context.to_owned(),
            state: RecurrentState::new(to_state_matrix(hidden)?, to_state_matrix(cell)?),
        })
    }

    fn decode_step(
        &mut self,
        last_token: u32,
        context: &ArrayD<f32>,
        state: &RecurrentState,
    ) -> Result<StepOutput> {
        let target = Array2::from_elem((1, 1), last_token as f32);
        let names = &self.decoder_input_names;

        let decoder_inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = vec![
            (Cow::Owned(names[0].clone()), Value::from_array(target)?.into()),
            (Cow::Owned(names[1].clone()), Value::from_array(context.clone())?.into()),
            (Cow::Owned(names[2].clone()), Value::from_array(state.hidden.clone())?.into()),
            (Cow::Owned(names[3].clone()), Value::from_array(state.cell.clone())?.into()),
        ];

        let outputs = self.decoder.run(decoder_inputs)?;
        if outputs.len() < 3 {
            return Err(SummarizerError::Inference(format!(
                "decoder returned {} outputs, expected scores, h and c",
                outputs.len()
            )));
        }

        // Scores come as [1, seq_len, vocab]; only the last position matters.
        let logits: ArrayView<f32, IxDyn> = outputs[0].try_extract_array()?;
        let vocab_size = logits.shape().last().copied().unwrap_or(0);
        if vocab_size == 0 {
            return Err(SummarizerError::Inference(
                "decoder returned an empty score vector".to_string(),
            ));
        }
        let offset = logits.len() - vocab_size;
        let scores: Array1<f32> = logits.iter().skip(offset).copied().collect();

        let hidden: ArrayView<f32, IxDyn> = outputs[1].try_extract_array()?;
        let cell: ArrayView<f32, IxDyn> = outputs[2].try_extract_array()?;

        Ok(StepOutput {
            scores,
            state: RecurrentState::new(to_state_matrix(hidden)?, to_state_matrix(cell)?),
        })
    }
}

fn open_session(path: &Path, intra_threads: Option<usize>) -> Result<Session> {
    let mut builder = Session::builder()?;
    if let Some(threads) = intra_threads {
        builder = builder
            .with_intra_threads(threads)
            .map_err(|e| SummarizerError::Inference(format!("Failed to set threads: {e}")))?;
    }
    Ok(builder.commit_from_file(path)?)
}

fn to_state_matrix(view: ArrayView<f32, IxDyn>) -> Result<Array2<f32>> {
    view.to_owned()
        .into_dimensionality::<Ix2>()
        .map_err(|e| SummarizerError::Inference(format!("Recurrent state shape error: {e}")))
}
