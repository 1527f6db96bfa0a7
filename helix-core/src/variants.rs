//! Variant overlay: ClinVar variants for the active gene and their
//! per-variant effect analysis.
//!
//! The collection is keyed by `clinvar_id`. Analysis is an expensive external
//! call, so a list refresh must never throw away an analysis that is running
//! or finished for a variant that is still in the list.

use crate::service::{ClassifyRequest, GenomeService, ServiceError, VariantPredictor};
use crate::types::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

pub const SNV_VARIATION_TYPE: &str = "single nucleotide variant";
pub const VARIANTS_FETCH_FAILED: &str = "Failed to fetch ClinVar variants";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("Variant {clinvar_id} is a {variation_type}, only single nucleotide variants can be analyzed")]
    NotSnv {
        clinvar_id: String,
        variation_type: String,
    },

    #[error("Variant {0} is already being analyzed")]
    AlreadyAnalyzing(String),

    #[error("Variant {0} already has an analysis result")]
    AlreadyResolved(String),

    #[error("Variant {0} has not been analyzed yet")]
    NotResolved(String),

    #[error("Analysis failed for {clinvar_id}: {message}")]
    Analysis { clinvar_id: String, message: String },

    #[error("Analysis of {0} was superseded by a newer variant list or gene")]
    Superseded(String),

    #[error("No gene loaded for variant lookup")]
    NoContext,

    #[error("{0}")]
    Fetch(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prediction: String,
    pub score: f64,
    pub confidence: Option<f64>,
}

impl AnalysisResult {
    pub fn new(prediction: impl Into<String>, score: f64) -> Self {
        Self {
            prediction: prediction.into(),
            score,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[default]
    Unanalyzed,
    Analyzing,
    Resolved(AnalysisResult),
}

impl AnalysisStatus {
    /// Analyzing or resolved; state a refresh has to keep.
    pub fn is_pinned(&self) -> bool {
        !matches!(self, AnalysisStatus::Unanalyzed)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisStatus::Resolved(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub clinvar_id: String,
    pub title: String,
    pub location: String,
    pub variation_type: String,
    pub classification: String,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub analysis_error: Option<String>,
}

impl Variant {
    pub fn new(
        clinvar_id: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        variation_type: impl Into<String>,
        classification: impl Into<String>,
    ) -> Self {
        Self {
            clinvar_id: clinvar_id.into(),
            title: title.into(),
            location: location.into(),
            variation_type: variation_type.into(),
            classification: classification.into(),
            status: AnalysisStatus::Unanalyzed,
            analysis_error: None,
        }
    }

    pub fn is_snv(&self) -> bool {
        self.variation_type.trim().eq_ignore_ascii_case(SNV_VARIATION_TYPE)
    }

    pub fn position(&self) -> Option<GenomicPos> {
        let digits: String = self.location.chars().filter(|c| *c != ',').collect();
        digits.trim().parse().ok()
    }

    /// Reference and alternative bases of an `X>Y` substitution in the title.
    pub fn substitution(&self) -> Option<(char, char)> {
        static SUBSTITUTION: OnceLock<Option<Regex>> = OnceLock::new();
        let re = SUBSTITUTION
            .get_or_init(|| Regex::new(r"([ACGTacgt])>([ACGTacgt])").ok())
            .as_ref()?;
        let caps = re.captures(&self.title)?;
        let reference = caps.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
        let alternative = caps.get(2)?.as_str().chars().next()?.to_ascii_uppercase();
        Some((reference, alternative))
    }
}

/// Reconcile a freshly fetched list with the current collection.
///
/// New ids come in unanalyzed, unanalyzed ids take the incoming record,
/// analyzing/resolved ids keep their analysis state on top of the incoming
/// record, ids missing from `incoming` are dropped. Output order follows
/// `incoming`; duplicate ids keep their first occurrence.
pub fn merge_variants(existing: &HashMap<String, Variant>, incoming: Vec<Variant>) -> Vec<Variant> {
    let mut seen = std::collections::HashSet::new();
    incoming
        .into_iter()
        .filter(|v| seen.insert(v.clinvar_id.clone()))
        .map(|mut fresh| {
            match existing.get(&fresh.clinvar_id) {
                Some(current) if current.status.is_pinned() => {
                    fresh.status = current.status.clone();
                    fresh.analysis_error = None;
                }
                _ => {
                    fresh.status = AnalysisStatus::Unanalyzed;
                    fresh.analysis_error = None;
                }
            }
            fresh
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantContext {
    pub gene: Gene,
    pub bounds: GeneBounds,
    pub genome_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    sequence: u64,
    mode: LoadMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    epoch: u64,
    request: ClassifyRequest,
}

impl AnalysisTicket {
    pub fn clinvar_id(&self) -> &str {
        &self.request.clinvar_id
    }

    pub fn request(&self) -> &ClassifyRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Resolved(AnalysisResult),
    Failed(String),
    /// The variant left the list, or the gene changed, while the predictor ran.
    Discarded,
}

impl AnalysisOutcome {
    pub fn into_result(self, clinvar_id: &str) -> Result<AnalysisResult, VariantError> {
        match self {
            AnalysisOutcome::Resolved(result) => Ok(result),
            AnalysisOutcome::Failed(message) => Err(VariantError::Analysis {
                clinvar_id: clinvar_id.to_string(),
                message,
            }),
            AnalysisOutcome::Discarded => Err(VariantError::Superseded(clinvar_id.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantComparison {
    pub first: Variant,
    pub second: Variant,
    pub score_delta: f64,
    pub same_prediction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClinicalCall {
    Pathogenic,
    Benign,
    Uncertain,
}

impl ClinicalCall {
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("conflicting") || label.contains("uncertain") {
            ClinicalCall::Uncertain
        } else if label.contains("pathogenic") {
            ClinicalCall::Pathogenic
        } else if label.contains("benign") {
            ClinicalCall::Benign
        } else {
            ClinicalCall::Uncertain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinvarAgreement {
    pub clinvar_id: String,
    pub classification: String,
    pub prediction: String,
    pub score: f64,
    pub agrees: Option<bool>,
}

#[derive(Debug, Default)]
pub struct VariantOverlay {
    order: Vec<String>,
    variants: HashMap<String, Variant>,
    context: Option<VariantContext>,
    epoch: u64,
    load_sequence: u64,
    loading: bool,
    error: Option<String>,
}

impl VariantOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything about the previous gene.
    pub fn reset(&mut self, context: Option<VariantContext>) {
        self.epoch += 1;
        self.order.clear();
        self.variants.clear();
        self.context = context;
        self.loading = false;
        self.error = None;
    }

    pub fn context(&self) -> Option<&VariantContext> {
        self.context.as_ref()
    }

    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.order.iter().filter_map(|id| self.variants.get(id))
    }

    pub fn get(&self, clinvar_id: &str) -> Option<&Variant> {
        self.variants.get(clinvar_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_load(&mut self, mode: LoadMode) -> Result<LoadTicket, VariantError> {
        if self.context.is_none() {
            return Err(VariantError::NoContext);
        }
        self.load_sequence += 1;
        self.loading = true;
        self.error = None;
        Ok(LoadTicket {
            epoch: self.epoch,
            sequence: self.load_sequence,
            mode,
        })
    }

    /// Apply a list fetch. Returns false if the ticket was superseded.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Variant>, ServiceError>) -> bool {
        if ticket.epoch != self.epoch || ticket.sequence != self.load_sequence {
            log::debug!("Discarding stale variant list");
            return false;
        }
        self.loading = false;
        let incoming = match result {
            Ok(incoming) => incoming,
            Err(err) => {
                log::warn!("Variant list fetch failed: {}", err);
                self.error = Some(VARIANTS_FETCH_FAILED.to_string());
                return true;
            }
        };
        let merged = match ticket.mode {
            LoadMode::Replace => merge_variants(&HashMap::new(), incoming),
            LoadMode::Merge => merge_variants(&self.variants, incoming),
        };
        self.order = merged.iter().map(|v| v.clinvar_id.clone()).collect();
        self.variants = merged.into_iter().map(|v| (v.clinvar_id.clone(), v)).collect();
        log::info!("Variant overlay holds {} variants", self.order.len());
        true
    }

    async fn fetch<S: GenomeService>(&mut self, service: &S, mode: LoadMode) -> Result<(), VariantError> {
        let ticket = self.begin_load(mode)?;
        let context = self.context.clone().ok_or(VariantError::NoContext)?;
        let result = service
            .known_variants(&context.gene, &context.bounds, &context.genome_id)
            .await;
        self.finish_load(ticket, result);
        match self.error() {
            Some(message) => Err(VariantError::Fetch(message.to_string())),
            None => Ok(()),
        }
    }

    /// Replace the collection with the service's current list.
    pub async fn load_variants<S: GenomeService>(&mut self, service: &S) -> Result<(), VariantError> {
        self.fetch(service, LoadMode::Replace).await
    }

    /// Re-fetch and merge, keeping analysis state by `clinvar_id`.
    pub async fn refresh<S: GenomeService>(&mut self, service: &S) -> Result<(), VariantError> {
        self.fetch(service, LoadMode::Merge).await
    }

    pub fn begin_analysis(&mut self, clinvar_id: &str) -> Result<AnalysisTicket, VariantError> {
        let genome_id = self
            .context
            .as_ref()
            .map(|c| (c.genome_id.clone(), c.gene.chrom.clone()))
            .ok_or(VariantError::NoContext)?;
        let variant = self
            .variants
            .get_mut(clinvar_id)
            .ok_or_else(|| VariantError::UnknownVariant(clinvar_id.to_string()))?;

        if !variant.is_snv() {
            return Err(VariantError::NotSnv {
                clinvar_id: clinvar_id.to_string(),
                variation_type: variant.variation_type.clone(),
            });
        }
        match variant.status {
            AnalysisStatus::Analyzing => return Err(VariantError::AlreadyAnalyzing(clinvar_id.to_string())),
            AnalysisStatus::Resolved(_) => return Err(VariantError::AlreadyResolved(clinvar_id.to_string())),
            AnalysisStatus::Unanalyzed => {}
        }

        let (genome_id, chromosome) = genome_id;
        let request = match (variant.position(), variant.substitution()) {
            (Some(position), Some((reference, alternative))) => ClassifyRequest {
                clinvar_id: clinvar_id.to_string(),
                chromosome,
                position,
                reference,
                alternative,
                genome_id,
            },
            _ => {
                let message = "could not read position or substitution from the variant".to_string();
                variant.analysis_error = Some(message.clone());
                return Err(VariantError::Analysis {
                    clinvar_id: clinvar_id.to_string(),
                    message,
                });
            }
        };

        variant.status = AnalysisStatus::Analyzing;
        variant.analysis_error = None;
        log::debug!("Analyzing variant {} at {}", clinvar_id, request.position);
        Ok(AnalysisTicket {
            epoch: self.epoch,
            request,
        })
    }

    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: Result<AnalysisResult, ServiceError>,
    ) -> AnalysisOutcome {
        if ticket.epoch != self.epoch {
            return AnalysisOutcome::Discarded;
        }
        let Some(variant) = self.variants.get_mut(ticket.clinvar_id()) else {
            log::debug!("Variant {} left the list during analysis", ticket.clinvar_id());
            return AnalysisOutcome::Discarded;
        };
        if variant.status != AnalysisStatus::Analyzing {
            return AnalysisOutcome::Discarded;
        }
        match result {
            Ok(result) => {
                variant.status = AnalysisStatus::Resolved(result.clone());
                variant.analysis_error = None;
                AnalysisOutcome::Resolved(result)
            }
            Err(err) => {
                log::warn!("Analysis failed for {}: {}", ticket.clinvar_id(), err);
                let message = err.to_string();
                variant.status = AnalysisStatus::Unanalyzed;
                variant.analysis_error = Some(message.clone());
                AnalysisOutcome::Failed(message)
            }
        }
    }

    pub async fn analyze<P: VariantPredictor>(
        &mut self,
        clinvar_id: &str,
        predictor: &P,
    ) -> Result<AnalysisResult, VariantError> {
        let ticket = self.begin_analysis(clinvar_id)?;
        let result = predictor.classify(ticket.request()).await;
        self.finish_analysis(ticket, result).into_result(clinvar_id)
    }

    fn resolved(&self, clinvar_id: &str) -> Result<(&Variant, &AnalysisResult), VariantError> {
        let variant = self
            .get(clinvar_id)
            .ok_or_else(|| VariantError::UnknownVariant(clinvar_id.to_string()))?;
        let result = variant
            .status
            .result()
            .ok_or_else(|| VariantError::NotResolved(clinvar_id.to_string()))?;
        Ok((variant, result))
    }

    pub fn compare(&self, first: &str, second: &str) -> Result<VariantComparison, VariantError> {
        let (a, ra) = self.resolved(first)?;
        let (b, rb) = self.resolved(second)?;
        Ok(VariantComparison {
            first: a.clone(),
            second: b.clone(),
            score_delta: rb.score - ra.score,
            same_prediction: ra.prediction.eq_ignore_ascii_case(&rb.prediction),
        })
    }

    pub fn compare_with_clinvar(&self, clinvar_id: &str) -> Result<ClinvarAgreement, VariantError> {
        let (variant, result) = self.resolved(clinvar_id)?;
        let clinical = ClinicalCall::from_label(&variant.classification);
        let predicted = ClinicalCall::from_label(&result.prediction);
        let agrees = match (clinical, predicted) {
            (ClinicalCall::Uncertain, _) | (_, ClinicalCall::Uncertain) => None,
            (c, p) => Some(c == p),
        };
        Ok(ClinvarAgreement {
            clinvar_id: variant.clinvar_id.clone(),
            classification: variant.classification.clone(),
            prediction: result.prediction.clone(),
            score: result.score,
            agrees,
        })
    }
}
