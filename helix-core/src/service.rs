//! Contracts for the external collaborators: the genome metadata service and
//! the variant-effect predictor.
//!
//! The core never talks to the network itself. Hosts implement these traits
//! (the CLI does so over HTTP, tests with in-memory fakes) and every call is
//! a single suspension point for the component that issued it.

use crate::types::*;
use crate::variants::{AnalysisResult, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::Malformed(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneDetailsResponse {
    pub gene_details: GeneDetails,
    pub gene_bounds: Option<GeneBounds>,
    pub initial_range: Option<SelectedRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceResponse {
    pub sequence: String,
    pub actual_range: ActualRange,
    /// Service-reported problem that did not prevent a response.
    pub error: Option<String>,
}

/// What the predictor needs to score one substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub clinvar_id: String,
    pub chromosome: String,
    pub position: GenomicPos,
    pub reference: char,
    pub alternative: char,
    pub genome_id: String,
}

#[allow(async_fn_in_trait)]
pub trait GenomeService {
    async fn list_genomes(&self) -> ServiceResult<BTreeMap<String, Vec<GenomeAssembly>>>;

    /// Primary chromosomes only, in display order.
    async fn list_chromosomes(&self, genome_id: &str) -> ServiceResult<Vec<Chromosome>>;

    async fn search_genes(&self, query: &str, genome_id: &str) -> ServiceResult<Vec<Gene>>;

    async fn gene_details(&self, gene_id: &str) -> ServiceResult<GeneDetailsResponse>;

    async fn sequence(
        &self,
        chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        genome_id: &str,
    ) -> ServiceResult<SequenceResponse>;

    /// Known variants for a gene, without analysis state.
    async fn known_variants(
        &self,
        gene: &Gene,
        bounds: &GeneBounds,
        genome_id: &str,
    ) -> ServiceResult<Vec<Variant>>;
}

#[allow(async_fn_in_trait)]
pub trait VariantPredictor {
    async fn classify(&self, request: &ClassifyRequest) -> ServiceResult<AnalysisResult>;
}

impl<T: GenomeService> GenomeService for &T {
    async fn list_genomes(&self) -> ServiceResult<BTreeMap<String, Vec<GenomeAssembly>>> {
        (**self).list_genomes().await
    }

    async fn list_chromosomes(&self, genome_id: &str) -> ServiceResult<Vec<Chromosome>> {
        (**self).list_chromosomes(genome_id).await
    }

    async fn search_genes(&self, query: &str, genome_id: &str) -> ServiceResult<Vec<Gene>> {
        (**self).search_genes(query, genome_id).await
    }

    async fn gene_details(&self, gene_id: &str) -> ServiceResult<GeneDetailsResponse> {
        (**self).gene_details(gene_id).await
    }

    async fn sequence(
        &self,
        chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        genome_id: &str,
    ) -> ServiceResult<SequenceResponse> {
        (**self).sequence(chrom, start, end, genome_id).await
    }

    async fn known_variants(
        &self,
        gene: &Gene,
        bounds: &GeneBounds,
        genome_id: &str,
    ) -> ServiceResult<Vec<Variant>> {
        (**self).known_variants(gene, bounds, genome_id).await
    }
}
