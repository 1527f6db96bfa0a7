use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

mod client;
mod commands;
mod config;
mod error;

use commands::OutputOptions;
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "helix")]
#[command(about = "Helix - gene range selection, sequence retrieval and ClinVar variants")]
#[command(version)]
#[command(long_about = "
Helix looks up genes, fetches sequence for a chosen range of a gene and lists
known ClinVar variants, optionally scoring single nucleotide variants with a
variant-effect predictor.

Examples:
  helix genomes --organism Human
  helix genomes --all
  helix chromosomes --genome hg38
  helix search BRCA1
  helix view BRCA1 --start 43044295 --end 43045295
  helix view BRCA1 --variants --analyze 12345 --compare 12345 67890
  helix sequence chr17 43044295 43044395
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Genome assembly to use (overrides general.genome)
    #[arg(long, global = true)]
    pub genome: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List genome assemblies grouped by organism
    Genomes {
        /// Only show assemblies of this organism (defaults to general.organism)
        #[arg(long)]
        organism: Option<String>,

        /// Show assemblies of every organism
        #[arg(long, conflicts_with = "organism")]
        all: bool,
    },

    /// List the primary chromosomes of the selected assembly
    Chromosomes,

    /// Search genes by symbol or name
    Search {
        /// Search text, e.g. a gene symbol
        query: String,
    },

    /// Open a gene: fetch a range of its sequence and its known variants
    View {
        /// Gene symbol
        symbol: String,

        /// Range start (absolute chromosome coordinate)
        #[arg(long)]
        start: Option<i64>,

        /// Range end (absolute chromosome coordinate)
        #[arg(long)]
        end: Option<i64>,

        /// List known ClinVar variants
        #[arg(long)]
        variants: bool,

        /// Analyze these ClinVar variants with the predictor
        #[arg(long, num_args = 1..)]
        analyze: Vec<String>,

        /// Compare the predictions of two ClinVar variants
        #[arg(long, num_args = 2, value_names = ["A", "B"])]
        compare: Option<Vec<String>>,
    },

    /// Fetch sequence for a chromosome range
    Sequence {
        /// Chromosome name, e.g. chr17
        chrom: String,

        /// Range start (1-based)
        start: i64,

        /// Range end (inclusive)
        end: i64,
    },

    /// Show the active configuration or write an example
    Config {
        /// Print the default configuration
        #[arg(long)]
        example: bool,

        /// Write the default configuration to this path
        #[arg(short, long, conflicts_with = "example")]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| CliError::config(format!("{:#}", e)))?;
    let genome = cli.genome.clone().unwrap_or_else(|| config.general.genome.clone());
    let out = OutputOptions {
        json: cli.json,
        quiet: cli.quiet,
    };

    // Execute the requested command
    match cli.command {
        Commands::Genomes { organism, all } => {
            commands::genomes::execute(&config, out, &genome, organism, all).await?;
        }

        Commands::Chromosomes => {
            commands::chromosomes::execute(&config, out, &genome).await?;
        }

        Commands::Search { query } => {
            commands::search::execute(&config, out, &genome, &query).await?;
        }

        Commands::View {
            symbol,
            start,
            end,
            variants,
            analyze,
            compare,
        } => {
            let compare = match compare.as_deref() {
                Some([a, b]) => Some((a.clone(), b.clone())),
                _ => None,
            };
            let request = commands::view::ViewRequest {
                symbol,
                start,
                end,
                variants,
                analyze,
                compare,
            };
            commands::view::execute(&config, out, &genome, request).await?;
        }

        Commands::Sequence { chrom, start, end } => {
            commands::sequence::execute(&config, out, &genome, chrom, start, end).await?;
        }

        Commands::Config { example, output } => {
            commands::config::execute(&config, example, output)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose, cli.quiet)?;

    if let Err(err) = run(cli).await {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            print_error_and_exit(cli_err);
        }
        return Err(err);
    }

    Ok(())
}
