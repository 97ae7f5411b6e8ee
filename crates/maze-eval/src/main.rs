//! CLI entry point for the maze evaluator.
//!
//! Usage:
//!   maze-eval [LAYOUT] [options]
//!
//! Options:
//!   --pass-report <path>     Where to write passing states (default: pass.txt)
//!   --fail-report <path>     Also write failing states to this file
//!   --no-path-constraints    Ignore CONTAINS and OMITS directives
//!   --json                   Print the summary as JSON
//!   --dump-layout            Print the parsed layout as JSON and exit
//!
//! Exit codes: 0 on success, 1 on a fatal layout, predicate or I/O error,
//! 2 when the layout file does not exist.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use maze_eval::{evaluate, logging, write_report, EvalConfig, EvalError, Evaluation, Layout};

const DEFAULT_LAYOUT: &str = "layout.txt";

const EXIT_FATAL: i32 = 1;
const EXIT_MISSING_LAYOUT: i32 = 2;

#[derive(Parser)]
#[command(name = "maze-eval")]
#[command(about = "Evaluate every door state of a maze layout")]
#[command(version)]
struct Cli {
    /// Layout file to evaluate
    #[arg(value_name = "LAYOUT")]
    layout: Option<PathBuf>,

    /// Where to write passing states
    #[arg(long, value_name = "PATH", default_value = "pass.txt")]
    pass_report: PathBuf,

    /// Also collect failing states and write them here
    #[arg(long, value_name = "PATH")]
    fail_report: Option<PathBuf>,

    /// Ignore CONTAINS and OMITS path-membership directives
    #[arg(long)]
    no_path_constraints: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the parsed layout as JSON and exit without evaluating
    #[arg(long)]
    dump_layout: bool,
}

#[derive(Error, Debug)]
enum AppError {
    #[error("could not find layout file {}", .0.display())]
    MissingLayout(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("could not serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingLayout(_) => EXIT_MISSING_LAYOUT,
            _ => EXIT_FATAL,
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let path = match &cli.layout {
        Some(path) => path.clone(),
        None => {
            info!("reading default layout file {DEFAULT_LAYOUT}");
            PathBuf::from(DEFAULT_LAYOUT)
        }
    };
    if !path.is_file() {
        return Err(AppError::MissingLayout(path));
    }

    let text = fs::read_to_string(&path).map_err(|source| AppError::Io {
        path: path.clone(),
        source,
    })?;
    let layout = Layout::parse(&text).map_err(EvalError::from)?;
    if cli.dump_layout {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    let config = EvalConfig {
        path_constraints: !cli.no_path_constraints,
        collect_failures: cli.fail_report.is_some(),
        ..Default::default()
    };
    let evaluation = evaluate(&layout, &config)?;

    write_report(&cli.pass_report, &evaluation.passed).map_err(|source| AppError::Io {
        path: cli.pass_report.clone(),
        source,
    })?;
    if let Some(fail_report) = &cli.fail_report {
        write_report(fail_report, &evaluation.failed).map_err(|source| AppError::Io {
            path: fail_report.clone(),
            source,
        })?;
    }

    print_summary(&evaluation, cli.json)
}

fn print_summary(evaluation: &Evaluation, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(evaluation)?);
    } else {
        println!(
            "{} passing, {} failing, {} skipped",
            evaluation.pass_count, evaluation.fail_count, evaluation.skip_count
        );
    }
    Ok(())
}
