//! NCBI payloads: clinical-tables gene search, E-utilities gene summaries
//! and ClinVar records.

use helix_core::service::{GeneDetailsResponse, ServiceError, ServiceResult};
use helix_core::types::{GenomicInfo, Organism};
use helix_core::{Gene, GeneBounds, GeneDetails, GenomicPos, SelectedRange, Strand, Variant};
use serde::Deserialize;
use serde_json::Value;

pub const SEARCH_DISPLAY_FIELDS: &str = "chromosome,Symbol,description,map_location,type_of_gene";
pub const SEARCH_EXTRA_FIELDS: &str =
    "chromosome,Symbol,description,map_location,type_of_gene,GenomicInfo,GeneID";

/// Gene search rows: `[total, codes, extra_fields, display_rows]`.
pub fn parse_gene_search(body: &Value) -> ServiceResult<Vec<Gene>> {
    let rows = body
        .get(3)
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::malformed("gene search response has no result rows"))?;
    let gene_ids = body
        .get(2)
        .and_then(|extra| extra.get("GeneID"))
        .and_then(Value::as_array);

    let mut genes = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let field = |idx: usize| row.get(idx).and_then(Value::as_str).map(str::trim).unwrap_or("");
        let (chromosome, symbol, description) = (field(0), field(1), field(2));
        if symbol.is_empty() {
            continue;
        }
        let chrom = if chromosome.is_empty() || chromosome.starts_with("chr") {
            chromosome.to_string()
        } else {
            format!("chr{}", chromosome)
        };
        let mut gene = Gene::new(symbol, chrom);
        if !description.is_empty() {
            gene.name = description.to_string();
            gene = gene.with_description(description);
        }
        if let Some(id) = gene_ids.and_then(|ids| ids.get(i)).and_then(value_as_id) {
            gene = gene.with_gene_id(id);
        }
        genes.push(gene);
    }
    Ok(genes)
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct GeneSummary {
    summary: Option<String>,
    organism: Option<NcbiOrganism>,
    #[serde(default)]
    genomicinfo: Vec<NcbiGenomicInfo>,
}

#[derive(Debug, Deserialize)]
struct NcbiOrganism {
    scientificname: String,
    commonname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NcbiGenomicInfo {
    chrstart: GenomicPos,
    chrstop: GenomicPos,
}

/// `result[gene_id]` of an esummary `db=gene` response.
pub fn parse_gene_details(
    body: &Value,
    gene_id: &str,
    initial_window: GenomicPos,
) -> ServiceResult<GeneDetailsResponse> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(ServiceError::unavailable(error.to_string()));
    }
    let record = body
        .get("result")
        .and_then(|r| r.get(gene_id))
        .ok_or_else(|| ServiceError::not_found(format!("gene {} has no summary", gene_id)))?;
    if let Some(error) = record.get("error").and_then(Value::as_str) {
        return Err(ServiceError::not_found(format!("gene {}: {}", gene_id, error)));
    }
    let summary: GeneSummary = serde_json::from_value(record.clone())
        .map_err(|e| ServiceError::malformed(format!("gene summary for {}: {}", gene_id, e)))?;

    let genomic_info: Vec<GenomicInfo> = summary
        .genomicinfo
        .iter()
        .map(|info| GenomicInfo {
            chr_start: info.chrstart,
            chr_stop: info.chrstop,
            strand: Some(if info.chrstart > info.chrstop {
                Strand::Reverse
            } else {
                Strand::Forward
            }),
        })
        .collect();

    let gene_bounds = genomic_info
        .first()
        .map(|info| GeneBounds::new(info.chr_start, info.chr_stop));
    let initial_range = gene_bounds.map(|bounds| {
        let (low, high) = (bounds.low(), bounds.high());
        SelectedRange::new(low, high.min(low + initial_window))
    });

    Ok(GeneDetailsResponse {
        gene_details: GeneDetails {
            summary: summary.summary.filter(|s| !s.trim().is_empty()),
            organism: summary.organism.map(|o| Organism {
                scientific_name: o.scientificname,
                common_name: o.commonname.filter(|c| !c.is_empty()),
            }),
            genomic_info,
        },
        gene_bounds,
        initial_range,
    })
}

#[derive(Debug, Deserialize)]
pub struct EsearchResponse {
    pub esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
pub struct EsearchResult {
    #[serde(default)]
    pub idlist: Vec<String>,
}

fn is_grch37(genome_id: &str) -> bool {
    genome_id.eq_ignore_ascii_case("hg19")
}

pub fn clinvar_search_term(gene: &Gene, bounds: &GeneBounds, genome_id: &str) -> String {
    let chrom = gene.chrom.strip_prefix("chr").unwrap_or(&gene.chrom);
    let position_field = if is_grch37(genome_id) { "chrpos37" } else { "chrpos38" };
    format!(
        "{}[gene] AND {}[chr] AND {}:{}[{}]",
        gene.symbol,
        chrom,
        bounds.low(),
        bounds.high(),
        position_field
    )
}

#[derive(Debug, Deserialize)]
struct ClinvarSummary {
    #[serde(default)]
    title: String,
    obj_type: Option<String>,
    germline_classification: Option<Classification>,
    clinical_significance: Option<Classification>,
    #[serde(default)]
    variation_set: Vec<VariationSet>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VariationSet {
    #[serde(default)]
    variation_loc: Vec<VariationLoc>,
}

#[derive(Debug, Deserialize)]
struct VariationLoc {
    #[serde(default)]
    assembly_name: String,
    #[serde(default)]
    start: String,
}

/// 43057062 -> "43,057,062"
pub fn group_thousands(value: GenomicPos) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn variant_location(summary: &ClinvarSummary, genome_id: &str) -> String {
    let assembly = if is_grch37(genome_id) { "GRCh37" } else { "GRCh38" };
    let locations: Vec<&VariationLoc> = summary
        .variation_set
        .iter()
        .flat_map(|set| set.variation_loc.iter())
        .collect();
    locations
        .iter()
        .find(|loc| loc.assembly_name == assembly)
        .or_else(|| locations.first())
        .and_then(|loc| loc.start.trim().parse::<GenomicPos>().ok())
        .map(group_thousands)
        .unwrap_or_else(|| "Unknown".to_string())
}

/// esummary `db=clinvar` records, in the order of `ids`.
pub fn parse_clinvar_summaries(body: &Value, ids: &[String], genome_id: &str) -> ServiceResult<Vec<Variant>> {
    let result = body
        .get("result")
        .ok_or_else(|| ServiceError::malformed("ClinVar summary has no result"))?;

    let mut variants = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(record) = result.get(id) else {
            log::debug!("ClinVar summary is missing record {}", id);
            continue;
        };
        let summary: ClinvarSummary = match serde_json::from_value(record.clone()) {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Skipping unreadable ClinVar record {}: {}", id, e);
                continue;
            }
        };
        let classification = summary
            .germline_classification
            .as_ref()
            .or(summary.clinical_significance.as_ref())
            .map(|c| c.description.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        let variation_type = title_case(summary.obj_type.as_deref().unwrap_or("Unknown"));
        let location = variant_location(&summary, genome_id);
        variants.push(Variant::new(id.clone(), summary.title, location, variation_type, classification));
    }
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_gene_search() {
        let body = json!([
            2,
            ["672", "7157"],
            {"GeneID": ["672", "7157"]},
            [
                ["17", "BRCA1", "BRCA1 DNA repair associated", "17q21.31", "protein-coding"],
                ["17", "TP53", "tumor protein p53", "17p13.1", "protein-coding"]
            ]
        ]);
        let genes = parse_gene_search(&body).unwrap();
        assert_eq!(genes.len(), 2);
        assert_eq!(genes[0].symbol, "BRCA1");
        assert_eq!(genes[0].chrom, "chr17");
        assert_eq!(genes[0].gene_id.as_deref(), Some("672"));
        assert_eq!(genes[1].description.as_deref(), Some("tumor protein p53"));
    }

    #[test]
    fn test_parse_gene_details() {
        let body = json!({
            "result": {
                "uids": ["672"],
                "672": {
                    "summary": "This gene encodes a nuclear phosphoprotein.",
                    "organism": {"scientificname": "Homo sapiens", "commonname": "human"},
                    "genomicinfo": [{"chrloc": "17", "chrstart": 43125482, "chrstop": 43044294}]
                }
            }
        });
        let details = parse_gene_details(&body, "672", 10_000).unwrap();
        assert_eq!(details.gene_bounds, Some(GeneBounds::new(43125482, 43044294)));
        assert_eq!(details.initial_range, Some(SelectedRange::new(43044294, 43054294)));
        assert_eq!(details.gene_details.strand(), Some(Strand::Reverse));
        assert_eq!(
            details.gene_details.organism.unwrap().common_name.as_deref(),
            Some("human")
        );
    }

    #[test]
    fn test_short_gene_initial_range_is_clamped() {
        let body = json!({"result": {"1": {"genomicinfo": [{"chrstart": 1000, "chrstop": 2000}]}}});
        let details = parse_gene_details(&body, "1", 10_000).unwrap();
        assert_eq!(details.initial_range, Some(SelectedRange::new(1000, 2000)));
    }

    #[test]
    fn test_gene_without_coordinates() {
        let body = json!({"result": {"9": {"summary": ""}}});
        let details = parse_gene_details(&body, "9", 10_000).unwrap();
        assert!(details.gene_bounds.is_none());
        assert!(details.gene_details.summary.is_none());
    }

    #[test]
    fn test_clinvar_search_term() {
        let gene = Gene::new("BRCA1", "chr17");
        let bounds = GeneBounds::new(43125482, 43044294);
        assert_eq!(
            clinvar_search_term(&gene, &bounds, "hg38"),
            "BRCA1[gene] AND 17[chr] AND 43044294:43125482[chrpos38]"
        );
        assert!(clinvar_search_term(&gene, &bounds, "hg19").ends_with("[chrpos37]"));
    }

    #[test]
    fn test_parse_clinvar_summaries() {
        let body = json!({
            "result": {
                "uids": ["55555", "12345"],
                "12345": {
                    "title": "NM_007294.4(BRCA1):c.5123C>A (p.Ala1708Glu)",
                    "obj_type": "single nucleotide variant",
                    "germline_classification": {"description": "Pathogenic"},
                    "variation_set": [{"variation_loc": [
                        {"assembly_name": "GRCh37", "start": "41209079"},
                        {"assembly_name": "GRCh38", "start": "43057062"}
                    ]}]
                },
                "55555": {
                    "title": "NM_007294.4(BRCA1):c.68_69del",
                    "obj_type": "Deletion",
                    "clinical_significance": {"description": "Pathogenic/Likely pathogenic"},
                    "variation_set": []
                }
            }
        });
        let ids = vec!["12345".to_string(), "55555".to_string(), "404".to_string()];
        let variants = parse_clinvar_summaries(&body, &ids, "hg38").unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].clinvar_id, "12345");
        assert_eq!(variants[0].location, "43,057,062");
        assert_eq!(variants[0].variation_type, "Single Nucleotide Variant");
        assert!(variants[0].is_snv());
        assert_eq!(variants[1].location, "Unknown");
        assert_eq!(variants[1].classification, "Pathogenic/Likely pathogenic");

        let hg19 = parse_clinvar_summaries(&body, &ids[..1], "hg19").unwrap();
        assert_eq!(hg19[0].location, "41,209,079");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(43057062), "43,057,062");
    }
}
