//! Per-gene session: wires the range selector, the sequence fetch
//! coordinator and the variant overlay to one service.

use crate::coords::{self, ValidationError};
use crate::fetch::{FetchError, FetchOutcome, FetchTicket, SequenceFetchCoordinator};
use crate::selector::{DragTarget, RangeCommit, RangeSelector, TrackRect};
use crate::service::{GeneDetailsResponse, GenomeService, ServiceError, VariantPredictor};
use crate::types::*;
use crate::variants::{
    AnalysisOutcome, AnalysisResult, AnalysisTicket, ClinvarAgreement, LoadMode, LoadTicket, Variant,
    VariantComparison, VariantContext, VariantError, VariantOverlay,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MISSING_GENE_ID: &str = "Gene ID is missing, can not fetch details.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{}", MISSING_GENE_ID)]
    MissingIdentifier,

    #[error("Failed to load gene details: {0}")]
    GeneDetails(String),

    #[error("No gene selected")]
    NoGene,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Variant(#[from] VariantError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub genome_id: String,
    pub max_view_range: GenomicPos,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            genome_id: "hg38".to_string(),
            max_view_range: coords::DEFAULT_MAX_VIEW_RANGE,
        }
    }
}

/// Issued by [`GeneSession::begin_gene`]; binds a gene-details response to
/// the selection that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneTicket {
    epoch: u64,
    gene_id: String,
}

impl GeneTicket {
    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }
}

#[derive(Debug)]
pub struct GeneSession<S> {
    service: S,
    config: SessionConfig,
    epoch: u64,
    gene: Option<Gene>,
    details: Option<GeneDetails>,
    bounds: Option<GeneBounds>,
    selector: RangeSelector,
    fetcher: SequenceFetchCoordinator,
    variants: VariantOverlay,
    loading_gene: bool,
    error: Option<String>,
}

impl<S: GenomeService> GeneSession<S> {
    pub fn new(service: S, config: SessionConfig) -> Self {
        Self {
            selector: RangeSelector::new(config.max_view_range),
            fetcher: SequenceFetchCoordinator::new(config.max_view_range),
            service,
            config,
            epoch: 0,
            gene: None,
            details: None,
            bounds: None,
            variants: VariantOverlay::new(),
            loading_gene: false,
            error: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn gene(&self) -> Option<&Gene> {
        self.gene.as_ref()
    }

    pub fn gene_details(&self) -> Option<&GeneDetails> {
        self.details.as_ref()
    }

    pub fn bounds(&self) -> Option<GeneBounds> {
        self.bounds
    }

    pub fn selector(&self) -> &RangeSelector {
        &self.selector
    }

    /// For hosts that register a capture listener or edit text directly.
    pub fn selector_mut(&mut self) -> &mut RangeSelector {
        &mut self.selector
    }

    pub fn fetcher(&self) -> &SequenceFetchCoordinator {
        &self.fetcher
    }

    pub fn variants(&self) -> &VariantOverlay {
        &self.variants
    }

    pub fn is_loading_gene(&self) -> bool {
        self.loading_gene
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop all per-gene state and make `gene` current.
    pub fn begin_gene(&mut self, gene: Gene) -> Result<GeneTicket, SessionError> {
        self.epoch += 1;
        self.selector.set_bounds(None);
        self.fetcher.reset(None);
        self.variants.reset(None);
        self.details = None;
        self.bounds = None;
        self.error = None;
        self.loading_gene = false;

        log::info!("Selected gene {} on {} (epoch {})", gene.symbol, gene.chrom, self.epoch);
        let gene_id = gene.gene_id.clone();
        self.gene = Some(gene);

        let Some(gene_id) = gene_id.filter(|id| !id.trim().is_empty()) else {
            self.error = Some(MISSING_GENE_ID.to_string());
            return Err(SessionError::MissingIdentifier);
        };
        self.loading_gene = true;
        Ok(GeneTicket {
            epoch: self.epoch,
            gene_id,
        })
    }

    /// Apply a gene-details response. `Ok(None)` means the gene changed
    /// while it was in flight and nothing was applied.
    pub fn apply_gene_details(
        &mut self,
        ticket: GeneTicket,
        result: Result<GeneDetailsResponse, ServiceError>,
    ) -> Result<Option<SelectedRange>, SessionError> {
        if ticket.epoch != self.epoch {
            log::debug!("Discarding gene details for {} (stale epoch {})", ticket.gene_id, ticket.epoch);
            return Ok(None);
        }
        self.loading_gene = false;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Gene details for {} failed: {}", ticket.gene_id, err);
                let err = SessionError::GeneDetails(err.to_string());
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        let GeneDetailsResponse {
            gene_details,
            gene_bounds,
            initial_range,
        } = response;
        self.details = Some(gene_details);

        let Some(bounds) = gene_bounds else {
            let err = SessionError::GeneDetails(format!("no genomic coordinates for gene {}", ticket.gene_id));
            self.error = Some(err.to_string());
            return Err(err);
        };
        let (low, high) = coords::normalize_bounds(&bounds);
        let initial = initial_range
            .unwrap_or_else(|| SelectedRange::new(low, high.min(low + self.config.max_view_range)));

        self.bounds = Some(bounds);
        self.selector.set_bounds(Some(bounds));
        self.selector.seed(initial);
        self.fetcher.reset(Some(bounds));
        if let Some(gene) = self.gene.clone() {
            self.variants.reset(Some(VariantContext {
                gene,
                bounds,
                genome_id: self.config.genome_id.clone(),
            }));
        }
        log::info!("Gene bounds {}-{}, initial range {}-{}", low, high, initial.start, initial.end);
        Ok(Some(initial))
    }

    /// Select a gene, load its details and fetch the initial range.
    ///
    /// A failed initial sequence fetch is left in the coordinator's error
    /// state rather than returned.
    pub async fn select_gene(&mut self, gene: Gene) -> Result<(), SessionError> {
        let ticket = self.begin_gene(gene)?;
        let result = self.service.gene_details(ticket.gene_id()).await;
        let Some(initial) = self.apply_gene_details(ticket, result)? else {
            return Ok(());
        };
        if let Err(err) = self.fetch_range(initial).await {
            log::warn!("Initial sequence fetch failed: {}", err);
        }
        Ok(())
    }

    pub fn begin_fetch(&mut self, range: SelectedRange) -> Result<FetchTicket, SessionError> {
        let gene = self.gene.as_ref().ok_or(SessionError::NoGene)?;
        let ticket = self
            .fetcher
            .begin(&gene.chrom, range.start, range.end, &self.config.genome_id)?;
        Ok(ticket)
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<crate::service::SequenceResponse, ServiceError>,
    ) -> FetchOutcome {
        self.fetcher.complete(ticket, result)
    }

    pub async fn fetch_range(&mut self, range: SelectedRange) -> Result<FetchOutcome, SessionError> {
        let ticket = self.begin_fetch(range)?;
        let request = ticket.request().clone();
        let result = self
            .service
            .sequence(&request.chrom, request.range.start, request.range.end, &request.genome_id)
            .await;
        match self.complete_fetch(ticket, result) {
            FetchOutcome::Failed { message } => Err(FetchError::SequenceFetch { message }.into()),
            outcome => Ok(outcome),
        }
    }

    async fn apply_commit(&mut self, commit: RangeCommit) -> Result<FetchOutcome, SessionError> {
        log::debug!("Committed {}-{} via {:?}", commit.range.start, commit.range.end, commit.source);
        self.error = None;
        self.fetch_range(commit.range).await
    }

    pub fn pointer_down(&mut self, target: DragTarget, x: f64, track: &TrackRect) -> bool {
        self.selector.pointer_down(target, x, track)
    }

    pub fn pointer_move(&mut self, x: f64, track: &TrackRect) -> Option<SelectedRange> {
        self.selector.pointer_move(x, track)
    }

    /// End a drag and fetch the committed range, if the gesture produced one.
    pub async fn pointer_up(&mut self) -> Result<Option<FetchOutcome>, SessionError> {
        match self.selector.pointer_up() {
            Some(commit) => self.apply_commit(commit).await.map(Some),
            None => {
                if let Some(err) = self.selector.last_error() {
                    self.error = Some(err.to_string());
                }
                Ok(None)
            }
        }
    }

    pub fn set_start_text(&mut self, text: impl Into<String>) {
        self.selector.set_start_text(text);
    }

    pub fn set_end_text(&mut self, text: impl Into<String>) {
        self.selector.set_end_text(text);
    }

    /// Submit typed coordinates. Invalid input stays local and never reaches
    /// the service.
    pub async fn submit_text(&mut self) -> Result<FetchOutcome, SessionError> {
        match self.selector.commit_text() {
            Ok(commit) => self.apply_commit(commit).await,
            Err(err) => {
                log::debug!("Rejected range entry: {}", err);
                self.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Start a variant list fetch; the caller queries
    /// [`GenomeService::known_variants`] with the overlay's context and hands
    /// the result to [`GeneSession::finish_load`].
    pub fn begin_load(&mut self, mode: LoadMode) -> Result<LoadTicket, SessionError> {
        Ok(self.variants.begin_load(mode)?)
    }

    /// Returns false if the list was superseded while in flight.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Variant>, ServiceError>) -> bool {
        self.variants.finish_load(ticket, result)
    }

    /// Mark a variant as analyzing. Several variants may be in flight at
    /// once, and list refreshes may land before their results do.
    pub fn begin_analysis(&mut self, clinvar_id: &str) -> Result<AnalysisTicket, SessionError> {
        Ok(self.variants.begin_analysis(clinvar_id)?)
    }

    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: Result<AnalysisResult, ServiceError>,
    ) -> AnalysisOutcome {
        self.variants.finish_analysis(ticket, result)
    }

    pub async fn load_variants(&mut self) -> Result<(), SessionError> {
        self.variants.load_variants(&self.service).await?;
        Ok(())
    }

    pub async fn refresh_variants(&mut self) -> Result<(), SessionError> {
        self.variants.refresh(&self.service).await?;
        Ok(())
    }

    pub async fn analyze_variant<P: VariantPredictor>(
        &mut self,
        clinvar_id: &str,
        predictor: &P,
    ) -> Result<AnalysisResult, SessionError> {
        Ok(self.variants.analyze(clinvar_id, predictor).await?)
    }

    pub fn compare_variants(&self, first: &str, second: &str) -> Result<VariantComparison, SessionError> {
        Ok(self.variants.compare(first, second)?)
    }

    pub fn compare_with_clinvar(&self, clinvar_id: &str) -> Result<ClinvarAgreement, SessionError> {
        Ok(self.variants.compare_with_clinvar(clinvar_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::SequenceResponse;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct StubService {
        sequence_calls: Cell<usize>,
    }

    impl GenomeService for StubService {
        async fn list_genomes(&self) -> Result<BTreeMap<String, Vec<GenomeAssembly>>, ServiceError> {
            Ok(BTreeMap::new())
        }

        async fn list_chromosomes(&self, _genome_id: &str) -> Result<Vec<Chromosome>, ServiceError> {
            Ok(Vec::new())
        }

        async fn search_genes(&self, _query: &str, _genome_id: &str) -> Result<Vec<Gene>, ServiceError> {
            Ok(Vec::new())
        }

        async fn gene_details(&self, _gene_id: &str) -> Result<GeneDetailsResponse, ServiceError> {
            Ok(GeneDetailsResponse {
                gene_details: GeneDetails::default(),
                gene_bounds: Some(GeneBounds::new(2000, 1000)),
                initial_range: None,
            })
        }

        async fn sequence(
            &self,
            _chrom: &str,
            start: GenomicPos,
            end: GenomicPos,
            _genome_id: &str,
        ) -> Result<SequenceResponse, ServiceError> {
            self.sequence_calls.set(self.sequence_calls.get() + 1);
            Ok(SequenceResponse {
                sequence: "A".repeat((end - start) as usize),
                actual_range: ActualRange::new(start, end),
                error: None,
            })
        }

        async fn known_variants(
            &self,
            _gene: &Gene,
            _bounds: &GeneBounds,
            _genome_id: &str,
        ) -> Result<Vec<Variant>, ServiceError> {
            Ok(Vec::new())
        }
    }

    fn brca1() -> Gene {
        Gene::new("BRCA1", "chr17").with_gene_id("672")
    }

    #[tokio::test]
    async fn test_missing_gene_id_issues_no_request() {
        let mut session = GeneSession::new(StubService::default(), SessionConfig::default());
        let err = session.select_gene(Gene::new("ORPHAN", "chr1")).await.unwrap_err();
        assert_eq!(err, SessionError::MissingIdentifier);
        assert_eq!(session.error(), Some(MISSING_GENE_ID));
        assert_eq!(session.service().sequence_calls.get(), 0);
        assert!(session.bounds().is_none());
    }

    #[tokio::test]
    async fn test_initial_range_defaults_to_window() {
        let config = SessionConfig {
            max_view_range: 300,
            ..SessionConfig::default()
        };
        let mut session = GeneSession::new(StubService::default(), config);
        session.select_gene(brca1()).await.unwrap();

        assert_eq!(session.bounds(), Some(GeneBounds::new(2000, 1000)));
        assert_eq!(session.selector().start(), Some(1000));
        assert_eq!(session.selector().end(), Some(1300));
        assert_eq!(session.fetcher().sequence().map(str::len), Some(300));
        assert_eq!(session.service().sequence_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_invalid_text_stays_local() {
        let mut session = GeneSession::new(StubService::default(), SessionConfig::default());
        session.select_gene(brca1()).await.unwrap();
        session.set_start_text("1500");
        session.set_end_text("1200");

        let err = session.submit_text().await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(session.error(), Some("start must be less than end"));
        assert_eq!(session.service().sequence_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_rejected_drag_stays_in_selector() {
        let mut session = GeneSession::new(StubService::default(), SessionConfig::default());
        session.select_gene(brca1()).await.unwrap();
        session.set_start_text("2000");
        session.set_end_text("2000");

        let track = TrackRect::new(0.0, 100.0);
        assert!(session.pointer_down(DragTarget::EndHandle, 100.0, &track));
        session.pointer_move(100.0, &track);
        assert_eq!(session.pointer_up().await.unwrap(), None);
        assert_eq!(session.error(), Some("start must be less than end"));
        assert_eq!(session.service().sequence_calls.get(), 1);
    }

    #[test]
    fn test_stale_gene_details_are_discarded() {
        let mut session = GeneSession::new(StubService::default(), SessionConfig::default());
        let first = session.begin_gene(brca1()).unwrap();
        let _second = session
            .begin_gene(Gene::new("TP53", "chr17").with_gene_id("7157"))
            .unwrap();

        let applied = session
            .apply_gene_details(
                first,
                Ok(GeneDetailsResponse {
                    gene_details: GeneDetails::default(),
                    gene_bounds: Some(GeneBounds::new(1, 500)),
                    initial_range: None,
                }),
            )
            .unwrap();
        assert_eq!(applied, None);
        assert!(session.bounds().is_none());
        assert_eq!(session.gene().map(|g| g.symbol.as_str()), Some("TP53"));
    }

    #[test]
    fn test_gene_details_without_bounds() {
        let mut session = GeneSession::new(StubService::default(), SessionConfig::default());
        let ticket = session.begin_gene(brca1()).unwrap();
        let err = session
            .apply_gene_details(
                ticket,
                Ok(GeneDetailsResponse {
                    gene_details: GeneDetails::default(),
                    gene_bounds: None,
                    initial_range: None,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::GeneDetails(_)));
        assert!(!session.is_loading_gene());
    }
}
