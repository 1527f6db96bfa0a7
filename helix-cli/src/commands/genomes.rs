//! Genomes command - list UCSC assemblies grouped by organism

use anyhow::Result;
use helix_core::{GenomeAssembly, GenomeService};
use std::collections::BTreeMap;

use super::OutputOptions;
use crate::client::HttpGenomeService;
use crate::config::Config;
use crate::error::CliError;

pub async fn execute(
    config: &Config,
    out: OutputOptions,
    genome_id: &str,
    organism: Option<String>,
    all: bool,
) -> Result<()> {
    let organism = resolve_organism(config, organism, all);
    let service = HttpGenomeService::new(config)?;
    let spinner = out.spinner("Fetching genome assemblies");
    let result = service.list_genomes().await;
    spinner.finish_and_clear();
    let genomes = result.map_err(CliError::from)?;

    let selected = select_organism(genomes, organism.as_deref());
    if selected.is_empty() {
        if let Some(organism) = organism {
            return Err(CliError::not_found(format!("no assemblies for organism '{}'", organism)).into());
        }
    }
    log::info!(
        "Listing {} assemblies across {} organisms",
        selected.values().map(Vec::len).sum::<usize>(),
        selected.len()
    );

    if out.json {
        return out.print_json(&selected);
    }
    print!("{}", render(&selected, genome_id));
    Ok(())
}

/// `--organism` wins; otherwise `general.organism` unless every organism was asked for.
pub fn resolve_organism(config: &Config, organism: Option<String>, all: bool) -> Option<String> {
    if all {
        return None;
    }
    organism.or_else(|| Some(config.general.organism.clone()).filter(|o| !o.trim().is_empty()))
}

/// Keep one organism, matched case-insensitively; all of them when `None`.
pub fn select_organism(
    genomes: BTreeMap<String, Vec<GenomeAssembly>>,
    organism: Option<&str>,
) -> BTreeMap<String, Vec<GenomeAssembly>> {
    match organism {
        Some(wanted) => genomes
            .into_iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .collect(),
        None => genomes,
    }
}

fn render(genomes: &BTreeMap<String, Vec<GenomeAssembly>>, current: &str) -> String {
    let mut text = String::new();
    for (organism, assemblies) in genomes {
        text.push_str(&format!("{}\n", organism));
        for assembly in assemblies {
            let marker = if assembly.id == current { "*" } else { " " };
            let inactive = if assembly.active { "" } else { " (inactive)" };
            text.push_str(&format!(
                " {} {:<10} {} [{}]{}\n",
                marker, assembly.id, assembly.name, assembly.source_name, inactive
            ));
        }
    }
    text
}
