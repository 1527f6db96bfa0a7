//! Search command - find genes by symbol or name

use anyhow::Result;
use helix_core::{Gene, GenomeService};

use super::OutputOptions;
use crate::client::HttpGenomeService;
use crate::config::Config;
use crate::error::CliError;

pub async fn execute(config: &Config, out: OutputOptions, genome_id: &str, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::validation("search query must not be empty").into());
    }

    let service = HttpGenomeService::new(config)?;
    let spinner = out.spinner(format!("Searching for {}", query));
    let result = service.search_genes(query, genome_id).await;
    spinner.finish_and_clear();
    let genes = result.map_err(CliError::from)?;
    log::info!("Found {} genes matching '{}'", genes.len(), query);

    if out.json {
        return out.print_json(&genes);
    }
    if genes.is_empty() {
        println!("No genes match '{}'", query);
        return Ok(());
    }
    print!("{}", render(&genes));
    Ok(())
}

/// The gene whose symbol equals `symbol`, else the first hit.
pub fn pick_gene(genes: Vec<Gene>, symbol: &str) -> Option<Gene> {
    let exact = genes.iter().position(|g| g.symbol.eq_ignore_ascii_case(symbol));
    match exact {
        Some(idx) => genes.into_iter().nth(idx),
        None => genes.into_iter().next(),
    }
}

fn render(genes: &[Gene]) -> String {
    genes
        .iter()
        .map(|g| {
            format!(
                "{:<12} {:<6} {:<10} {}\n",
                g.symbol,
                g.chrom,
                g.gene_id.as_deref().unwrap_or("-"),
                g.description.as_deref().unwrap_or("")
            )
        })
        .collect()
}
