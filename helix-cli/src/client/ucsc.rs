//! UCSC Genome Browser REST payloads.

use helix_core::catalog;
use helix_core::service::{SequenceResponse, ServiceError, ServiceResult};
use helix_core::{ActualRange, Chromosome, GenomeAssembly, GenomicPos};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Deserialize)]
pub struct GenomeList {
    #[serde(rename = "ucscGenomes")]
    pub ucsc_genomes: Option<HashMap<String, UcscGenome>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UcscGenome {
    pub organism: Option<String>,
    pub scientific_name: Option<String>,
    pub source_name: Option<String>,
    #[serde(default)]
    pub active: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChromosomeList {
    pub chromosomes: Option<HashMap<String, u64>>,
}

#[derive(Debug, Deserialize)]
pub struct SequenceData {
    pub dna: Option<String>,
    pub start: Option<GenomicPos>,
    pub end: Option<GenomicPos>,
    pub error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_genomes(body: GenomeList) -> ServiceResult<BTreeMap<String, Vec<GenomeAssembly>>> {
    let genomes = body
        .ucsc_genomes
        .ok_or_else(|| ServiceError::malformed("UCSC API Error: missing ucscGenomes"))?;

    let mut assemblies: Vec<GenomeAssembly> = genomes
        .into_iter()
        .map(|(id, info)| GenomeAssembly {
            name: non_empty(info.scientific_name).unwrap_or_else(|| id.clone()),
            source_name: non_empty(info.source_name).unwrap_or_else(|| id.clone()),
            active: info.active != 0,
            organism: non_empty(info.organism).unwrap_or_default(),
            id,
        })
        .collect();
    assemblies.sort_by(|a, b| a.id.cmp(&b.id));
    log::debug!("UCSC lists {} assemblies", assemblies.len());
    Ok(catalog::group_by_organism(assemblies))
}

pub fn parse_chromosomes(body: ChromosomeList) -> ServiceResult<Vec<Chromosome>> {
    let chromosomes = body
        .chromosomes
        .ok_or_else(|| ServiceError::malformed("UCSC API Error: missing chromosomes"))?;
    Ok(catalog::filter_and_sort_chromosomes(
        chromosomes.into_iter().map(|(name, size)| Chromosome::new(name, size)),
    ))
}

pub fn ucsc_chrom_name(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_string()
    } else {
        format!("chr{}", chrom)
    }
}

/// UCSC takes 0-based half-open coordinates and `;`-separated parameters.
pub fn sequence_url(base: &str, genome_id: &str, chrom: &str, start: GenomicPos, end: GenomicPos) -> String {
    format!(
        "{}/getData/sequence?genome={};chrom={};start={};end={}",
        base,
        genome_id,
        ucsc_chrom_name(chrom),
        start - 1,
        end
    )
}

pub fn parse_sequence(data: SequenceData, start: GenomicPos, end: GenomicPos) -> ServiceResult<SequenceResponse> {
    let SequenceData { dna, start: served_start, end: served_end, error } = data;
    let sequence = dna.unwrap_or_default().to_uppercase();
    if sequence.is_empty() && error.is_none() {
        return Err(ServiceError::malformed("UCSC response carried neither sequence nor error"));
    }
    let actual_range = ActualRange::new(
        served_start.map(|s| s + 1).unwrap_or(start),
        served_end.unwrap_or(end),
    );
    Ok(SequenceResponse {
        sequence,
        actual_range,
        error,
    })
}
