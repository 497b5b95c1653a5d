// Chordchain CLI entry point.
//
// Usage:
//   chordchain build [--genre G]... [--orders 1,2,3,4] [--min-count N]
//   chordchain generate --genre G [--seed-chords "C Am F"] [--input-length N]
//     [--length N] [--seed N]
//   chordchain analyze [--genre G]...
//
// Common flags: --config path.json, --data-dir DIR. Log verbosity follows
// RUST_LOG (default `chordchain=info`).

use chordchain_cli::config::AppConfig;
use chordchain_cli::pipeline::{GenerateRequest, analyze_models, build_models, generate_music_sequence};
use chordchain_cli::report::{format_analysis, format_training_summary};
use chordchain_core::genre::Genre;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chordchain", about = "Genre-aware chord progression generator")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Data directory (corpus, Matrices/, Chord_Sequences/)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Train transition matrices from the corpus
    Build(BuildArgs),
    /// Generate a chord progression
    Generate(GenerateArgs),
    /// Report sparsity of trained matrices
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Genres to train (default: all)
    #[arg(long = "genre")]
    genres: Vec<Genre>,
    /// N-gram orders to train
    #[arg(long, value_delimiter = ',')]
    orders: Option<Vec<usize>>,
    /// Minimum transition count for orders 2 and up
    #[arg(long)]
    min_count: Option<u64>,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Genre to generate in
    #[arg(long)]
    genre: String,
    /// Seed chords, separated by spaces or commas
    #[arg(long, default_value = "")]
    seed_chords: String,
    /// Length of the input context
    #[arg(long)]
    input_length: Option<usize>,
    /// Length of the generated sequence
    #[arg(long)]
    length: Option<usize>,
    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Genres to analyze (default: all)
    #[arg(long = "genre")]
    genres: Vec<Genre>,
}

fn genres_or_all(genres: Vec<Genre>) -> Vec<Genre> {
    if genres.is_empty() { Genre::ALL.to_vec() } else { genres }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chordchain=info".parse::<Directive>()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Command::Build(args) => {
            if let Some(orders) = args.orders {
                config.ngram_orders = orders;
            }
            if let Some(min_count) = args.min_count {
                config.min_count = min_count;
            }
            let summary = build_models(&config, &genres_or_all(args.genres))?;
            print!("{}", format_training_summary(&summary));
        }
        Command::Generate(args) => {
            let mut rng = match args.seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            let request = GenerateRequest {
                genre: args.genre,
                seed_chords: args
                    .seed_chords
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
                input_length: args.input_length.unwrap_or(config.input_length),
                output_length: args.length.unwrap_or(config.output_length),
            };
            let outcome = generate_music_sequence(&config, &request, &mut rng)?;
            println!("Genre: {}", outcome.genre);
            println!("Initial chord sequence: {}", outcome.input_sequence.join(" "));
            println!("Generated chord sequence: {}", outcome.generated_sequence.join(" "));
            println!("Saved to: {}", outcome.path.display());
        }
        Command::Analyze(args) => {
            let report = analyze_models(&config, &genres_or_all(args.genres))?;
            print!("{}", format_analysis(&report));
        }
    }
    Ok(())
}
