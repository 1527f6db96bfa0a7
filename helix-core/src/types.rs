use serde::{Deserialize, Serialize};

pub type GenomicPos = i64;

/// Absolute chromosome coordinates spanning a gene.
///
/// `min` and `max` come straight from the metadata service and follow the
/// gene's strand, so they are not guaranteed to be ordered. Use
/// [`GeneBounds::low`] / [`GeneBounds::high`] rather than the raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneBounds {
    pub min: GenomicPos,
    pub max: GenomicPos,
}

impl GeneBounds {
    pub fn new(min: GenomicPos, max: GenomicPos) -> Self {
        Self { min, max }
    }

    pub fn low(&self) -> GenomicPos {
        self.min.min(self.max)
    }

    pub fn high(&self) -> GenomicPos {
        self.min.max(self.max)
    }

    /// Number of bases covered, counting both ends.
    pub fn length(&self) -> GenomicPos {
        self.high() - self.low() + 1
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// A user-requested coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedRange {
    pub start: GenomicPos,
    pub end: GenomicPos,
}

impl SelectedRange {
    pub fn new(start: GenomicPos, end: GenomicPos) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> GenomicPos {
        self.end - self.start
    }

    pub fn contains(&self, other: &ActualRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// The coordinate pair the sequence service actually served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualRange {
    pub start: GenomicPos,
    pub end: GenomicPos,
}

impl ActualRange {
    pub fn new(start: GenomicPos, end: GenomicPos) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> GenomicPos {
        self.end - self.start
    }
}

impl From<SelectedRange> for ActualRange {
    fn from(range: SelectedRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl From<char> for Strand {
    fn from(c: char) -> Self {
        match c {
            '-' => Strand::Reverse,
            _ => Strand::Forward,
        }
    }
}

impl From<Strand> for char {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// A gene as returned by the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub symbol: String,
    pub name: String,
    pub chrom: String,
    pub description: Option<String>,
    pub gene_id: Option<String>,
}

impl Gene {
    pub fn new(symbol: impl Into<String>, chrom: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
            chrom: chrom.into(),
            description: None,
            gene_id: None,
        }
    }

    pub fn with_gene_id(mut self, gene_id: impl Into<String>) -> Self {
        self.gene_id = Some(gene_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Organism {
    pub scientific_name: String,
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicInfo {
    pub chr_start: GenomicPos,
    pub chr_stop: GenomicPos,
    pub strand: Option<Strand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneDetails {
    pub summary: Option<String>,
    pub organism: Option<Organism>,
    pub genomic_info: Vec<GenomicInfo>,
}

impl GeneDetails {
    pub fn strand(&self) -> Option<Strand> {
        self.genomic_info.first().and_then(|info| info.strand)
    }
}

/// One genome assembly from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeAssembly {
    pub id: String,
    pub name: String,
    pub source_name: String,
    pub active: bool,
    pub organism: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    pub name: String,
    pub size: u64,
}

impl Chromosome {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}
