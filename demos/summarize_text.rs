//! Example: Summarize a piece of text.
//!
//! Usage: cargo run --example summarize_text -- --artifacts <dir> [TEXT]
//!        echo "long article" | cargo run --example summarize_text -- --repo <hub id> --json

use std::io::Read;
use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use textsum_rs::{Summarizer, SummaryResponse};

#[derive(Parser, Debug)]
#[command(about = "Summarize text with a seq2seq ONNX model")]
struct Args {
    /// Directory holding encoder_model.onnx, decoder_model.onnx and the tokenizers
    #[arg(long, conflicts_with = "repo")]
    artifacts: Option<PathBuf>,

    /// HuggingFace Hub repository to download the artifacts from
    #[arg(long)]
    repo: Option<String>,

    /// Maximum number of words in the summary
    #[arg(long)]
    max_words: Option<usize>,

    /// Print the JSON response body instead of plain text
    #[arg(long)]
    json: bool,

    /// Text to summarize; read from stdin when omitted
    text: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut builder = match (&args.artifacts, &args.repo) {
        (Some(dir), _) => Summarizer::builder().artifacts_dir(dir),
        (None, Some(repo)) => Summarizer::builder().hub_repo(repo),
        (None, None) => {
            error!("Pass --artifacts <dir> or --repo <hub id>");
            exit(2);
        }
    };
    if let Some(n) = args.max_words {
        builder = builder.max_summary_len(n);
    }

    let start = Instant::now();
    let mut summarizer = match builder.build() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load summarizer: {e}");
            exit(1);
        }
    };
    info!("Summarizer loaded in {:.2}s", start.elapsed().as_secs_f32());

    let text = match args.text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                error!("Failed to read stdin: {e}");
                exit(1);
            }
            buf
        }
    };

    let start = Instant::now();
    let decoded = match summarizer.summarize_detailed(&text) {
        Ok(d) => d,
        Err(e) => {
            error!("Summarization failed: {e}");
            exit(1);
        }
    };
    info!(
        "Decoded {} steps in {:.2}s ({:?})",
        decoded.steps,
        start.elapsed().as_secs_f32(),
        decoded.stop
    );

    if args.json {
        let response = SummaryResponse::from(decoded.text());
        match serde_json::to_string(&response) {
            Ok(body) => println!("{body}"),
            Err(e) => {
                error!("Failed to serialize response: {e}");
                exit(1);
            }
        }
    } else {
        println!("{}", decoded.text());
    }
}
