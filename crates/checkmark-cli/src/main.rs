// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Checkmark — grade a photographed multiple-choice answer sheet.
//
// Entry point. Initialises logging, parses the command line, and runs the
// evaluator.

mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use checkmark_core::human_errors::humanize_error;
use checkmark_core::{AnswerKey, EvaluatorConfig, Result};
use checkmark_evaluator::{SheetEvaluator, SheetImage, save_image};

use report::{Report, default_output_path};

#[derive(Parser)]
#[command(name = "checkmark")]
#[command(about = "Grade photographed multiple-choice answer sheets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one photo against an answer key.
    Evaluate(EvaluateArgs),

    /// Print the default evaluator settings as JSON.
    Config,
}

#[derive(Debug, Clone, Args)]
struct EvaluateArgs {
    /// Photo of the answer sheet.
    image: PathBuf,

    /// Expected answers, e.g. "ABCDA BCDAB" or "0 1 2 3".
    #[arg(long)]
    key: String,

    /// Where to write the annotated image (default: <stem>_graded.png).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Evaluator settings (JSON); missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON report instead of the score line.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Evaluate(args) => run_evaluate(&args),
        Commands::Config => print_default_config(),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "checkmark failed");
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let key: AnswerKey = args.key.parse()?;
    let config = match &args.config {
        Some(path) => EvaluatorConfig::from_json_file(path)?,
        None => EvaluatorConfig::default(),
    };
    let evaluator = SheetEvaluator::new(config)?;

    let bytes = std::fs::read(&args.image)?;
    let photo = SheetImage::from_bytes(&bytes)?;
    tracing::info!(path = %args.image.display(), "Evaluating sheet");
    let evaluation = evaluator.evaluate(photo.as_dynamic(), &key)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.image));
    save_image(&evaluation.annotated, &output)?;

    if args.json {
        let report = Report::new(&args.image, &bytes, &output, &evaluation);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", evaluation.score);
    }
    Ok(())
}

fn print_default_config() -> Result<()> {
    let json = serde_json::to_string_pretty(&EvaluatorConfig::default())?;
    println!("{json}");
    Ok(())
}
