//! Sequence command - fetch an arbitrary chromosome range

use anyhow::Result;
use helix_core::fetch::{FetchOutcome, SequenceFetchCoordinator};
use helix_core::{GeneBounds, GenomicPos};
use serde::Serialize;

use super::{format_sequence, OutputOptions};
use crate::client::HttpGenomeService;
use crate::config::Config;
use crate::error::CliError;

/// Without a gene the only bounds are the chromosome's own.
const CHROMOSOME_BOUNDS: GeneBounds = GeneBounds { min: 1, max: GenomicPos::MAX };

#[derive(Debug, Serialize)]
struct SequenceReport<'a> {
    genome: &'a str,
    chrom: &'a str,
    start: GenomicPos,
    end: GenomicPos,
    sequence: &'a str,
    truncated: bool,
    warning: Option<&'a str>,
}

pub async fn execute(
    config: &Config,
    out: OutputOptions,
    genome_id: &str,
    chrom: String,
    start: GenomicPos,
    end: GenomicPos,
) -> Result<()> {
    let service = HttpGenomeService::new(config)?;
    let mut fetcher = SequenceFetchCoordinator::new(config.view.max_view_range);
    fetcher.reset(Some(CHROMOSOME_BOUNDS));

    let spinner = out.spinner(format!("Fetching {}:{}-{}", chrom, start, end));
    let result = fetcher.request_sequence(&service, &chrom, start, end, genome_id).await;
    spinner.finish_and_clear();

    let outcome = result.map_err(CliError::from)?;
    let (Some(sequence), Some(actual)) = (fetcher.sequence(), fetcher.actual_range()) else {
        return Err(CliError::Sequence { message: "no sequence returned".to_string() }.into());
    };
    let truncated = matches!(outcome, FetchOutcome::Applied { truncated: Some(_) });
    if truncated {
        log::warn!("Server returned {}-{} for requested {}-{}", actual.start, actual.end, start, end);
    }

    if out.json {
        return out.print_json(&SequenceReport {
            genome: genome_id,
            chrom: &chrom,
            start: actual.start,
            end: actual.end,
            sequence,
            truncated,
            warning: fetcher.error(),
        });
    }

    println!(">{} {}:{}-{}", genome_id, chrom, actual.start, actual.end);
    if let Some(warning) = fetcher.error() {
        eprintln!("warning: {}", warning);
    }
    println!("{}", format_sequence(sequence, actual.start, 60));
    Ok(())
}
