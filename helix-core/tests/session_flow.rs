use helix_core::fetch::FetchOutcome;
use helix_core::service::{ServiceResult, SequenceResponse};
use helix_core::*;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

struct FakeService {
    bounds: GeneBounds,
    initial: SelectedRange,
    variants: RefCell<Vec<Variant>>,
    sequence_calls: RefCell<Vec<(GenomicPos, GenomicPos)>>,
}

impl FakeService {
    fn new() -> Self {
        Self {
            bounds: GeneBounds::new(1000, 2000),
            initial: SelectedRange::new(1000, 1070),
            variants: RefCell::new(Vec::new()),
            sequence_calls: RefCell::new(Vec::new()),
        }
    }
}

impl GenomeService for FakeService {
    async fn list_genomes(&self) -> ServiceResult<BTreeMap<String, Vec<GenomeAssembly>>> {
        Ok(BTreeMap::new())
    }

    async fn list_chromosomes(&self, _genome_id: &str) -> ServiceResult<Vec<Chromosome>> {
        Ok(Vec::new())
    }

    async fn search_genes(&self, _query: &str, _genome_id: &str) -> ServiceResult<Vec<Gene>> {
        Ok(Vec::new())
    }

    async fn gene_details(&self, _gene_id: &str) -> ServiceResult<GeneDetailsResponse> {
        Ok(GeneDetailsResponse {
            gene_details: GeneDetails::default(),
            gene_bounds: Some(self.bounds),
            initial_range: Some(self.initial),
        })
    }

    async fn sequence(
        &self,
        _chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        _genome_id: &str,
    ) -> ServiceResult<SequenceResponse> {
        self.sequence_calls.borrow_mut().push((start, end));
        Ok(SequenceResponse {
            sequence: "ACGT".repeat(((end - start) as usize + 3) / 4)[..(end - start) as usize].to_string(),
            actual_range: ActualRange::new(start, end),
            error: None,
        })
    }

    async fn known_variants(
        &self,
        _gene: &Gene,
        _bounds: &GeneBounds,
        _genome_id: &str,
    ) -> ServiceResult<Vec<Variant>> {
        Ok(self.variants.borrow().clone())
    }
}

struct FakePredictor {
    calls: Cell<usize>,
}

impl VariantPredictor for FakePredictor {
    async fn classify(&self, request: &ClassifyRequest) -> ServiceResult<AnalysisResult> {
        self.calls.set(self.calls.get() + 1);
        let score = if request.alternative == 'A' { -0.0031 } else { 0.0007 };
        let prediction = if score < 0.0 { "Likely pathogenic" } else { "Likely benign" };
        Ok(AnalysisResult::new(prediction, score).with_confidence(0.9))
    }
}

fn gene() -> Gene {
    Gene::new("TEST1", "chr17").with_gene_id("42")
}

fn snv(id: &str, title: &str, location: &str) -> Variant {
    Variant::new(id, title, location, "single nucleotide variant", "Pathogenic")
}

#[tokio::test]
async fn drag_end_handle_commits_once() {
    let service = FakeService::new();
    let mut session = GeneSession::new(&service, SessionConfig::default());
    session.select_gene(gene()).await.unwrap();

    assert_eq!(session.fetcher().sequence().map(str::len), Some(70));
    assert_eq!(session.fetcher().actual_range(), Some(ActualRange::new(1000, 1070)));
    assert_eq!(service.sequence_calls.borrow().len(), 1);

    let track = TrackRect::new(0.0, 100.0);
    assert!(session.pointer_down(DragTarget::EndHandle, 7.0, &track));
    for x in [20.0, 45.0, 63.0, 80.0] {
        session.pointer_move(x, &track);
    }
    assert_eq!(session.selector().end(), Some(1800));
    assert_eq!(service.sequence_calls.borrow().len(), 1);

    let outcome = session.pointer_up().await.unwrap();
    assert_eq!(outcome, Some(FetchOutcome::Applied { truncated: None }));
    assert_eq!(*service.sequence_calls.borrow(), vec![(1000, 1070), (1000, 1800)]);
    assert_eq!(session.fetcher().actual_range(), Some(ActualRange::new(1000, 1800)));
    assert!(!session.selector().is_dragging());
}

#[tokio::test]
async fn stale_sequence_is_not_shown() {
    let service = FakeService::new();
    let mut session = GeneSession::new(&service, SessionConfig::default());
    session.select_gene(gene()).await.unwrap();

    let a = session.begin_fetch(SelectedRange::new(1100, 1200)).unwrap();
    let b = session.begin_fetch(SelectedRange::new(1300, 1400)).unwrap();
    let b_response = service.sequence("chr17", 1300, 1400, "hg38").await;
    let a_response = service.sequence("chr17", 1100, 1200, "hg38").await;

    assert!(matches!(session.complete_fetch(b, b_response), FetchOutcome::Applied { .. }));
    assert_eq!(session.complete_fetch(a, a_response), FetchOutcome::Stale);
    assert_eq!(session.fetcher().actual_range(), Some(ActualRange::new(1300, 1400)));
}

#[tokio::test]
async fn gene_change_suppresses_in_flight_fetch() {
    let service = FakeService::new();
    let mut session = GeneSession::new(&service, SessionConfig::default());
    session.select_gene(gene()).await.unwrap();

    let pending = session.begin_fetch(SelectedRange::new(1500, 1600)).unwrap();
    session
        .select_gene(Gene::new("TEST2", "chr3").with_gene_id("43"))
        .await
        .unwrap();
    let late = service.sequence("chr17", 1500, 1600, "hg38").await;

    assert_eq!(session.complete_fetch(pending, late), FetchOutcome::Stale);
    assert_eq!(session.fetcher().actual_range(), Some(ActualRange::new(1000, 1070)));
    assert_eq!(session.gene().map(|g| g.symbol.as_str()), Some("TEST2"));
}

#[tokio::test]
async fn refresh_keeps_resolved_analysis() {
    let service = FakeService::new();
    *service.variants.borrow_mut() = vec![
        snv("V123", "NM_000001.1(TEST1):c.100C>A (p.Pro34Thr)", "1,200"),
        snv("V456", "NM_000001.1(TEST1):c.200G>T (p.Gly67Val)", "1,300"),
        Variant::new("V789", "NM_000001.1(TEST1):c.300del", "1,400", "Deletion", "Benign"),
    ];
    let predictor = FakePredictor { calls: Cell::new(0) };
    let mut session = GeneSession::new(&service, SessionConfig::default());
    session.select_gene(gene()).await.unwrap();
    session.load_variants().await.unwrap();
    assert_eq!(session.variants().len(), 3);

    let result = session.analyze_variant("V123", &predictor).await.unwrap();
    assert_eq!(result.prediction, "Likely pathogenic");

    let err = session.analyze_variant("V789", &predictor).await.unwrap_err();
    assert!(matches!(err, SessionError::Variant(VariantError::NotSnv { .. })));
    assert_eq!(predictor.calls.get(), 1);

    session.refresh_variants().await.unwrap();
    let v123 = session.variants().get("V123").unwrap();
    assert!(matches!(v123.status, AnalysisStatus::Resolved(_)));

    session.analyze_variant("V456", &predictor).await.unwrap();
    let cmp = session.compare_variants("V123", "V456").unwrap();
    assert!(cmp.score_delta > 0.0);
    assert_eq!(session.compare_with_clinvar("V123").unwrap().agrees, Some(true));

    service.variants.borrow_mut().retain(|v| v.clinvar_id != "V123");
    session.refresh_variants().await.unwrap();
    assert!(session.variants().get("V123").is_none());
    assert!(matches!(
        session.variants().get("V456").unwrap().status,
        AnalysisStatus::Resolved(_)
    ));
}

#[tokio::test]
async fn refresh_during_analysis_keeps_result() {
    let service = FakeService::new();
    *service.variants.borrow_mut() = vec![
        snv("V123", "NM_000001.1(TEST1):c.100C>A (p.Pro34Thr)", "1,200"),
        snv("V456", "NM_000001.1(TEST1):c.200G>T (p.Gly67Val)", "1,300"),
    ];
    let predictor = FakePredictor { calls: Cell::new(0) };
    let mut session = GeneSession::new(&service, SessionConfig::default());
    session.select_gene(gene()).await.unwrap();
    session.load_variants().await.unwrap();

    // Two analyses in flight at once.
    let first = session.begin_analysis("V123").unwrap();
    let second = session.begin_analysis("V456").unwrap();
    assert!(matches!(
        session.begin_analysis("V123"),
        Err(SessionError::Variant(VariantError::AlreadyAnalyzing(_)))
    ));

    // The list changes under them before either result lands.
    service.variants.borrow_mut()[0].title = "NM_000001.2(TEST1):c.100C>A (p.Pro34Thr)".to_string();
    let reload = session.begin_load(LoadMode::Merge).unwrap();
    let context = session.variants().context().cloned().unwrap();
    let listed = service
        .known_variants(&context.gene, &context.bounds, &context.genome_id)
        .await;
    assert!(session.finish_load(reload, listed));
    assert_eq!(session.variants().get("V123").unwrap().status, AnalysisStatus::Analyzing);

    let second_result = predictor.classify(second.request()).await;
    let first_result = predictor.classify(first.request()).await;
    assert!(matches!(session.finish_analysis(second, second_result), AnalysisOutcome::Resolved(_)));
    assert!(matches!(session.finish_analysis(first, first_result), AnalysisOutcome::Resolved(_)));

    let v123 = session.variants().get("V123").unwrap();
    assert!(v123.title.starts_with("NM_000001.2"));
    assert_eq!(
        v123.status.result().map(|r| r.prediction.as_str()),
        Some("Likely pathogenic")
    );
    assert!(matches!(
        session.variants().get("V456").unwrap().status,
        AnalysisStatus::Resolved(_)
    ));
    assert_eq!(predictor.calls.get(), 2);
}
