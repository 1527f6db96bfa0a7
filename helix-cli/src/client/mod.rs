//! HTTP collaborators: UCSC for assemblies and sequence, NCBI for gene
//! search, gene summaries and ClinVar, plus the variant-effect predictor.

pub mod ucsc;
pub mod ncbi;
pub mod predictor;

use crate::config::Config;
use anyhow::{Context, Result};
use helix_core::service::{GeneDetailsResponse, GenomeService, SequenceResponse, ServiceError, ServiceResult};
use helix_core::{Chromosome, Gene, GeneBounds, GenomeAssembly, GenomicPos, Variant};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

pub use predictor::PredictorClient;

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("helix/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) fn classify_status(service: &str, status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = format!("{} returned status {}: {}", service, status, body.trim());
    if status.as_u16() == 404 {
        ServiceError::not_found(message)
    } else {
        ServiceError::unavailable(message)
    }
}

pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::unavailable(format!("{} timed out", service))
    } else {
        ServiceError::unavailable(format!("{} request failed: {}", service, err))
    }
}

/// Send a request and decode a JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    service: &str,
    request: reqwest::RequestBuilder,
) -> ServiceResult<T> {
    let response = request.send().await.map_err(|e| transport_error(service, e))?;
    let status = response.status();
    log::trace!("{} responded {} for {}", service, status, response.url());
    let body = response.text().await.map_err(|e| transport_error(service, e))?;
    if !status.is_success() {
        return Err(classify_status(service, status, &body));
    }
    serde_json::from_str(&body)
        .map_err(|e| ServiceError::malformed(format!("{} sent unreadable JSON: {}", service, e)))
}

/// [`GenomeService`] backed by the public UCSC and NCBI APIs.
#[derive(Debug, Clone)]
pub struct HttpGenomeService {
    client: reqwest::Client,
    ucsc_base_url: String,
    eutils_base_url: String,
    clinical_tables_base_url: String,
    initial_window: GenomicPos,
    max_variants: usize,
}

impl HttpGenomeService {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config.api.timeout_secs)?,
            ucsc_base_url: config.api.ucsc_base_url.trim_end_matches('/').to_string(),
            eutils_base_url: config.api.eutils_base_url.trim_end_matches('/').to_string(),
            clinical_tables_base_url: config.api.clinical_tables_base_url.trim_end_matches('/').to_string(),
            initial_window: config.view.initial_window.min(config.view.max_view_range),
            max_variants: config.api.max_variants,
        })
    }
}

impl GenomeService for HttpGenomeService {
    async fn list_genomes(&self) -> ServiceResult<BTreeMap<String, Vec<GenomeAssembly>>> {
        let url = format!("{}/list/ucscGenomes", self.ucsc_base_url);
        log::debug!("GET {}", url);
        let body: ucsc::GenomeList = fetch_json("UCSC", self.client.get(&url)).await?;
        ucsc::parse_genomes(body)
    }

    async fn list_chromosomes(&self, genome_id: &str) -> ServiceResult<Vec<Chromosome>> {
        let url = format!("{}/list/chromosomes", self.ucsc_base_url);
        log::debug!("GET {} genome={}", url, genome_id);
        let body: ucsc::ChromosomeList =
            fetch_json("UCSC", self.client.get(&url).query(&[("genome", genome_id)])).await?;
        ucsc::parse_chromosomes(body)
    }

    async fn search_genes(&self, query: &str, genome_id: &str) -> ServiceResult<Vec<Gene>> {
        let url = format!("{}/api/ncbi_genes/v3/search", self.clinical_tables_base_url);
        log::debug!("Searching genes for '{}' ({})", query, genome_id);
        let request = self.client.get(&url).query(&[
            ("terms", query),
            ("df", ncbi::SEARCH_DISPLAY_FIELDS),
            ("ef", ncbi::SEARCH_EXTRA_FIELDS),
        ]);
        let body: serde_json::Value = fetch_json("NCBI gene search", request).await?;
        ncbi::parse_gene_search(&body)
    }

    async fn gene_details(&self, gene_id: &str) -> ServiceResult<GeneDetailsResponse> {
        let url = format!("{}/esummary.fcgi", self.eutils_base_url);
        log::debug!("Fetching gene summary {}", gene_id);
        let request = self
            .client
            .get(&url)
            .query(&[("db", "gene"), ("id", gene_id), ("retmode", "json")]);
        let body: serde_json::Value = fetch_json("NCBI E-utilities", request).await?;
        ncbi::parse_gene_details(&body, gene_id, self.initial_window)
    }

    async fn sequence(
        &self,
        chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        genome_id: &str,
    ) -> ServiceResult<SequenceResponse> {
        let url = ucsc::sequence_url(&self.ucsc_base_url, genome_id, chrom, start, end);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(|e| transport_error("UCSC", e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error("UCSC", e))?;

        // UCSC reports range problems as a JSON body with an error field and
        // a 4xx status; keep the message rather than the status.
        match serde_json::from_str::<ucsc::SequenceData>(&body) {
            Ok(data) => ucsc::parse_sequence(data, start, end),
            Err(_) if !status.is_success() => Err(classify_status("UCSC", status, &body)),
            Err(e) => Err(ServiceError::malformed(format!("UCSC sent unreadable JSON: {}", e))),
        }
    }

    async fn known_variants(
        &self,
        gene: &Gene,
        bounds: &GeneBounds,
        genome_id: &str,
    ) -> ServiceResult<Vec<Variant>> {
        let term = ncbi::clinvar_search_term(gene, bounds, genome_id);
        log::debug!("ClinVar search: {}", term);
        let retmax = self.max_variants.to_string();
        let search_url = format!("{}/esearch.fcgi", self.eutils_base_url);
        let request = self.client.get(&search_url).query(&[
            ("db", "clinvar"),
            ("term", term.as_str()),
            ("retmode", "json"),
            ("retmax", retmax.as_str()),
        ]);
        let search: ncbi::EsearchResponse = fetch_json("ClinVar search", request).await?;
        let ids = search.esearchresult.idlist;
        if ids.is_empty() {
            log::info!("No ClinVar records for {}", gene.symbol);
            return Ok(Vec::new());
        }

        let summary_url = format!("{}/esummary.fcgi", self.eutils_base_url);
        let id_list = ids.join(",");
        let request = self.client.get(&summary_url).query(&[
            ("db", "clinvar"),
            ("id", id_list.as_str()),
            ("retmode", "json"),
        ]);
        let body: serde_json::Value = fetch_json("ClinVar summary", request).await?;
        ncbi::parse_clinvar_summaries(&body, &ids, genome_id)
    }
}
