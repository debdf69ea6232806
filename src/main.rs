// ========================================================================================
//
//                         The advscore command-line orchestrator
//
// ========================================================================================
//
// This binary drives the scoring library from the command line. It owns argument
// parsing, configuration loading and file handling, and delegates every score
// computation to a `ScoreTransform` selected by the configuration.
//
// - `advscore score` transforms the items of a CSV file in configured batches.
// - `advscore compare` runs every transform path over the reference batch, checks that
//   they agree bit for bit, and reports the mean time per batch for each path.

use advscore::config::{BatchLayout, ConfigError, DEFAULT_BATCH_SIZE, ScorerConfig};
use advscore::io::{self as item_io, ItemColumns, ItemIoError};
use advscore::transform::{self, TransformPath};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use thiserror::Error;

// ========================================================================================
//                          Command-line interface definition
// ========================================================================================

#[derive(Parser, Debug)]
#[command(
    name = "advscore",
    version,
    about = "Batched advertising-boost scoring over aligned, natively-ordered buffers."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform the items of a CSV file with `score,adv_weight,prosale_only` columns.
    Score(ScoreArgs),
    /// Run every transform path over the reference batch and check that they agree.
    Compare(CompareArgs),
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Path to the input CSV file.
    input: PathBuf,

    /// Path to a TOML scorer configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transform path, overriding the configuration.
    #[arg(long, value_enum)]
    path: Option<TransformPath>,

    /// Where to write the scored CSV. Defaults to standard output.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Number of items in the reference batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    size: usize,

    /// Number of timed transforms per path.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    iterations: u32,

    /// Path to a TOML scorer configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Items(#[from] ItemIoError),
    #[error("cannot open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "the {path} path disagrees with the managed path at item {index}: expected {expected}, found {found}"
    )]
    Mismatch {
        path: &'static str,
        index: usize,
        expected: f32,
        found: f32,
    },
}

// ========================================================================================
//                             Main orchestration logic
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Score(args) => run_score(args),
        Command::Compare(args) => run_compare(args),
    };

    if let Err(e) = outcome {
        eprintln!("Fatal error: {e}");
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ScorerConfig, CliError> {
    match path {
        Some(path) => Ok(ScorerConfig::load(path)?),
        None => Ok(ScorerConfig::default()),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), CliError> {
    let start_time = Instant::now();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = args.path {
        config.batch.path = path;
    }

    let input = File::open(&args.input).map_err(|source| CliError::Io {
        path: args.input.display().to_string(),
        source,
    })?;
    let mut items = item_io::read_items(input)?;
    info!("Read {} items from {}", items.len(), args.input.display());

    let mut transformer = config.batch.transformer();
    transform::transform_in_batches(
        transformer.as_mut(),
        items.as_batch(),
        config.batch.size,
        &config.params,
    );
    info!(
        "Scored {} items on the {} path in {:.2?}",
        items.len(),
        transformer.name(),
        start_time.elapsed()
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.display().to_string(),
                source,
            })?;
            item_io::write_items(file, &items)?;
            info!("Wrote scored items to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            item_io::write_items(stdout.lock(), &items)?;
        }
    }
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let reference = ItemColumns::reference(args.size);
    info!(
        "Comparing transform paths over {} items, {} iterations each",
        args.size, args.iterations
    );

    let mut expected: Option<Vec<f32>> = None;
    for path in TransformPath::ALL {
        let layout = BatchLayout {
            path,
            ..config.batch
        };
        let mut transformer = layout.transformer();
        let mut elapsed = Duration::ZERO;
        let mut items = reference.clone();

        for iteration in 0..args.iterations {
            items.scores.copy_from_slice(&reference.scores);
            let start = Instant::now();
            transform::transform_in_batches(
                transformer.as_mut(),
                items.as_batch(),
                layout.size,
                &config.params,
            );
            let pass = start.elapsed();
            elapsed += pass;
            debug!("{} iteration {iteration}: {pass:.2?}", transformer.name());
        }

        match &expected {
            None => expected = Some(items.scores),
            Some(expected) => check_agreement(transformer.name(), expected, &items.scores)?,
        }
        info!("{:>8}: {:.2?} per pass", transformer.name(), elapsed / args.iterations);
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "all {} transform paths agree", TransformPath::ALL.len())
        .map_err(|source| CliError::Io {
            path: "<stdout>".to_string(),
            source,
        })?;
    Ok(())
}

fn check_agreement(path: &'static str, expected: &[f32], found: &[f32]) -> Result<(), CliError> {
    match expected
        .iter()
        .zip(found)
        .position(|(e, f)| e.to_bits() != f.to_bits())
    {
        Some(index) => Err(CliError::Mismatch {
            path,
            index,
            expected: expected[index],
            found: found[index],
        }),
        None => Ok(()),
    }
}
