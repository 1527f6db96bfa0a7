//! View command - open a gene, fetch a range and overlay ClinVar variants

use anyhow::Result;
use helix_core::fetch::Truncation;
use helix_core::variants::{ClinvarAgreement, VariantComparison};
use helix_core::{
    ActualRange, AnalysisStatus, Gene, GeneBounds, GeneDetails, GeneSession, GenomeService, GenomicPos, Strand,
    Variant,
};
use serde::Serialize;

use super::search::pick_gene;
use super::{format_sequence, OutputOptions};
use crate::client::ncbi::group_thousands;
use crate::client::{HttpGenomeService, PredictorClient};
use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub symbol: String,
    pub start: Option<GenomicPos>,
    pub end: Option<GenomicPos>,
    pub variants: bool,
    pub analyze: Vec<String>,
    pub compare: Option<(String, String)>,
}

impl ViewRequest {
    fn wants_variants(&self) -> bool {
        self.variants || !self.analyze.is_empty() || self.compare.is_some()
    }

    /// Variants to analyze, in order, each once. Compared variants are
    /// analyzed too.
    pub fn analysis_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        let compared = self.compare.iter().flat_map(|(a, b)| [a.clone(), b.clone()]);
        for id in self.analyze.iter().cloned().chain(compared) {
            if !targets.contains(&id) {
                targets.push(id);
            }
        }
        targets
    }
}

#[derive(Debug, Serialize)]
struct ViewReport<'a> {
    genome: &'a str,
    gene: &'a Gene,
    details: Option<&'a GeneDetails>,
    bounds: Option<GeneBounds>,
    range: Option<ActualRange>,
    truncation: Option<Truncation>,
    sequence: Option<&'a str>,
    sequence_error: Option<&'a str>,
    variants: Vec<&'a Variant>,
    comparison: Option<VariantComparison>,
    clinvar_agreement: Vec<ClinvarAgreement>,
}

pub async fn execute(config: &Config, out: OutputOptions, genome_id: &str, request: ViewRequest) -> Result<()> {
    let service = HttpGenomeService::new(config)?;
    let mut session = GeneSession::new(service, config.session_config(Some(genome_id)));

    let spinner = out.spinner(format!("Looking up {}", request.symbol));
    let hits = session.service().search_genes(&request.symbol, genome_id).await;
    spinner.finish_and_clear();
    let gene = pick_gene(hits.map_err(CliError::from)?, &request.symbol)
        .ok_or_else(|| CliError::not_found(format!("no gene matches '{}'", request.symbol)))?;

    let spinner = out.spinner(format!("Loading {}", gene.symbol));
    let selected = session.select_gene(gene).await;
    spinner.finish_and_clear();
    selected.map_err(CliError::from)?;

    if request.start.is_some() || request.end.is_some() {
        let start = request.start.or(session.selector().start());
        let end = request.end.or(session.selector().end());
        session.set_start_text(start.map(|s| s.to_string()).unwrap_or_default());
        session.set_end_text(end.map(|e| e.to_string()).unwrap_or_default());
        let spinner = out.spinner("Fetching sequence");
        let submitted = session.submit_text().await;
        spinner.finish_and_clear();
        submitted.map_err(CliError::from)?;
    }

    let mut comparison = None;
    let mut agreements = Vec::new();
    if request.wants_variants() {
        let spinner = out.spinner("Fetching ClinVar variants");
        let loaded = session.load_variants().await;
        spinner.finish_and_clear();
        loaded.map_err(CliError::from)?;

        let targets = request.analysis_targets();
        if !targets.is_empty() {
            let predictor = PredictorClient::from_config(config)?.ok_or(CliError::PredictorMissing)?;
            for id in &targets {
                let spinner = out.spinner(format!("Analyzing {}", id));
                let analyzed = session.analyze_variant(id, &predictor).await;
                spinner.finish_and_clear();
                match analyzed {
                    Ok(result) => log::info!("{}: {} ({:.6})", id, result.prediction, result.score),
                    Err(err) => log::warn!("{}", err),
                }
            }
            for id in &targets {
                if let Ok(agreement) = session.compare_with_clinvar(id) {
                    agreements.push(agreement);
                }
            }
        }

        if let Some((a, b)) = &request.compare {
            comparison = Some(session.compare_variants(a, b).map_err(CliError::from)?);
        }
    }

    let Some(gene) = session.gene() else {
        return Err(CliError::not_found("gene selection was lost").into());
    };
    let fetcher = session.fetcher();

    if out.json {
        return out.print_json(&ViewReport {
            genome: genome_id,
            gene,
            details: session.gene_details(),
            bounds: session.bounds(),
            range: fetcher.actual_range(),
            truncation: fetcher.truncation(),
            sequence: fetcher.sequence(),
            sequence_error: fetcher.error(),
            variants: session.variants().variants().collect(),
            comparison,
            clinvar_agreement: agreements,
        });
    }

    print!("{}", render_header(gene, session.gene_details(), session.bounds()));
    if let Some(message) = fetcher.error() {
        eprintln!("warning: {}", message);
    }
    if let (Some(sequence), Some(range)) = (fetcher.sequence(), fetcher.actual_range()) {
        println!("Range: {}-{} ({} bp)", range.start, range.end, range.width());
        if let Some(t) = fetcher.truncation() {
            println!(
                "Note: requested {}-{}, server returned {}-{}",
                t.requested.start, t.requested.end, t.served.start, t.served.end
            );
        }
        println!("{}", format_sequence(sequence, range.start, 60));
    }

    if request.wants_variants() {
        let variants: Vec<&Variant> = session.variants().variants().collect();
        println!();
        println!("Known variants ({}):", variants.len());
        for variant in variants {
            println!("{}", render_variant(variant));
        }
    }
    if let Some(cmp) = &comparison {
        println!();
        println!("{}", render_comparison(cmp));
    }
    for agreement in &agreements {
        let verdict = match agreement.agrees {
            Some(true) => "agrees with",
            Some(false) => "disagrees with",
            None => "cannot be compared to",
        };
        println!(
            "{}: prediction '{}' {} ClinVar '{}'",
            agreement.clinvar_id, agreement.prediction, verdict, agreement.classification
        );
    }
    Ok(())
}

fn render_header(gene: &Gene, details: Option<&GeneDetails>, bounds: Option<GeneBounds>) -> String {
    let mut text = format!(
        "{} ({}, gene {})",
        gene.symbol,
        gene.chrom,
        gene.gene_id.as_deref().unwrap_or("?")
    );
    if let Some(description) = &gene.description {
        text.push_str(&format!(" - {}", description));
    }
    text.push('\n');

    if let Some(organism) = details.and_then(|d| d.organism.as_ref()) {
        text.push_str(&format!("Organism: {}\n", organism.scientific_name));
    }
    if let Some(bounds) = bounds {
        let strand = match details.and_then(GeneDetails::strand) {
            Some(Strand::Reverse) => " (reverse strand)",
            Some(Strand::Forward) => " (forward strand)",
            None => "",
        };
        text.push_str(&format!(
            "Bounds: {}-{}{}\n",
            group_thousands(bounds.low()),
            group_thousands(bounds.high()),
            strand
        ));
    }
    if let Some(summary) = details.and_then(|d| d.summary.as_deref()) {
        text.push_str(&format!("Summary: {}\n", summary));
    }
    text
}

fn render_variant(variant: &Variant) -> String {
    let analysis = match &variant.status {
        AnalysisStatus::Resolved(result) => format!("  [predicted: {} {:+.6}]", result.prediction, result.score),
        AnalysisStatus::Analyzing => "  [analyzing]".to_string(),
        AnalysisStatus::Unanalyzed => match &variant.analysis_error {
            Some(error) => format!("  [analysis failed: {}]", error),
            None => String::new(),
        },
    };
    format!(
        "  {:<10} {:<26} {:>12}  {}  {}{}",
        variant.clinvar_id, variant.variation_type, variant.location, variant.classification, variant.title, analysis
    )
}

fn render_comparison(cmp: &VariantComparison) -> String {
    let (a, b) = (&cmp.first, &cmp.second);
    let verdict = if cmp.same_prediction { "same prediction" } else { "different predictions" };
    format!(
        "Comparison {} vs {}: score delta {:+.6} ({})",
        a.clinvar_id, b.clinvar_id, cmp.score_delta, verdict
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_core::types::{GenomicInfo, Organism};
    use helix_core::AnalysisResult;

    #[test]
    fn test_analysis_targets_dedup() {
        let request = ViewRequest {
            symbol: "BRCA1".to_string(),
            analyze: vec!["1".to_string(), "2".to_string()],
            compare: Some(("2".to_string(), "3".to_string())),
            ..ViewRequest::default()
        };
        assert_eq!(request.analysis_targets(), vec!["1", "2", "3"]);
        assert!(request.wants_variants());
        assert!(!ViewRequest::default().wants_variants());
    }

    #[test]
    fn test_render_header() {
        let gene = Gene::new("BRCA1", "chr17")
            .with_gene_id("672")
            .with_description("BRCA1 DNA repair associated");
        let details = GeneDetails {
            summary: None,
            organism: Some(Organism {
                scientific_name: "Homo sapiens".to_string(),
                common_name: None,
            }),
            genomic_info: vec![GenomicInfo {
                chr_start: 43125482,
                chr_stop: 43044294,
                strand: Some(Strand::Reverse),
            }],
        };
        let text = render_header(&gene, Some(&details), Some(GeneBounds::new(43125482, 43044294)));
        assert!(text.starts_with("BRCA1 (chr17, gene 672) - BRCA1 DNA repair associated"));
        assert!(text.contains("Bounds: 43,044,294-43,125,482 (reverse strand)"));
    }

    #[test]
    fn test_render_variant_states() {
        let mut variant = Variant::new("12345", "c.5123C>A", "43,057,062", "Single Nucleotide Variant", "Pathogenic");
        assert!(!render_variant(&variant).contains('['));

        variant.analysis_error = Some("predictor down".to_string());
        assert!(render_variant(&variant).contains("analysis failed: predictor down"));

        variant.analysis_error = None;
        variant.status = AnalysisStatus::Resolved(AnalysisResult::new("Likely pathogenic", -0.0021));
        assert!(render_variant(&variant).contains("predicted: Likely pathogenic -0.002100"));
    }
}
