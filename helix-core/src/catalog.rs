//! Genome catalog helpers: organism grouping and chromosome ordering.

use crate::types::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const FALLBACK_ORGANISM: &str = "Other";

pub fn group_by_organism<I>(assemblies: I) -> BTreeMap<String, Vec<GenomeAssembly>>
where
    I: IntoIterator<Item = GenomeAssembly>,
{
    let mut grouped: BTreeMap<String, Vec<GenomeAssembly>> = BTreeMap::new();
    for assembly in assemblies {
        let organism = if assembly.organism.trim().is_empty() {
            FALLBACK_ORGANISM.to_string()
        } else {
            assembly.organism.clone()
        };
        grouped.entry(organism).or_default().push(assembly);
    }
    grouped
}

/// Alternate haplotypes, unplaced and random scaffolds.
pub fn is_alternate_scaffold(name: &str) -> bool {
    name.contains('_') || name.contains("Un") || name.contains("random")
}

fn numeric_part(name: &str) -> Option<u64> {
    let stripped = name.strip_prefix("chr").unwrap_or(name);
    if !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit()) {
        stripped.parse().ok()
    } else {
        None
    }
}

/// chr1, chr2, ..., chr22, then chrM, chrX, chrY.
pub fn compare_chromosome_names(a: &str, b: &str) -> Ordering {
    match (numeric_part(a), numeric_part(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let a = a.strip_prefix("chr").unwrap_or(a);
            let b = b.strip_prefix("chr").unwrap_or(b);
            a.cmp(b)
        }
    }
}

pub fn filter_and_sort_chromosomes<I>(chromosomes: I) -> Vec<Chromosome>
where
    I: IntoIterator<Item = Chromosome>,
{
    let mut kept: Vec<Chromosome> = chromosomes
        .into_iter()
        .filter(|c| !is_alternate_scaffold(&c.name))
        .collect();
    kept.sort_by(|a, b| compare_chromosome_names(&a.name, &b.name));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(chromosomes: &[Chromosome]) -> Vec<&str> {
        chromosomes.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_numeric_before_lexical() {
        let input = ["chr2", "chr10", "chrX", "chr1"]
            .iter()
            .map(|n| Chromosome::new(*n, 100))
            .collect::<Vec<_>>();
        let sorted = filter_and_sort_chromosomes(input);
        assert_eq!(names(&sorted), vec!["chr1", "chr2", "chr10", "chrX"]);
    }

    #[test]
    fn test_filters_scaffolds() {
        let input = vec![
            Chromosome::new("chr1", 248_956_422),
            Chromosome::new("chr1_KI270706v1_random", 175_055),
            Chromosome::new("chrUn_GL000195v1", 182_896),
            Chromosome::new("chrY", 57_227_415),
            Chromosome::new("chrM", 16_569),
            Chromosome::new("chr6_GL000250v2_alt", 4_672_374),
        ];
        let sorted = filter_and_sort_chromosomes(input);
        assert_eq!(names(&sorted), vec!["chr1", "chrM", "chrY"]);
    }

    #[test]
    fn test_group_by_organism() {
        let make = |id: &str, organism: &str| GenomeAssembly {
            id: id.to_string(),
            name: id.to_string(),
            source_name: id.to_string(),
            active: true,
            organism: organism.to_string(),
        };
        let grouped = group_by_organism(vec![
            make("hg38", "Human"),
            make("mm39", "Mouse"),
            make("hg19", "Human"),
            make("xx1", ""),
        ]);
        assert_eq!(grouped["Human"].len(), 2);
        assert_eq!(grouped["Human"][0].id, "hg38");
        assert_eq!(grouped["Mouse"].len(), 1);
        assert_eq!(grouped[FALLBACK_ORGANISM][0].id, "xx1");
    }
}
