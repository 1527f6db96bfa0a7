//! Sequence fetch coordination with stale-response suppression.
//!
//! The transport cannot abort a request, so every request carries the
//! generation that issued it. Only a result whose generation is still the
//! latest is applied; anything older is dropped on arrival.

use crate::coords::{self, ValidationError};
use crate::service::{GenomeService, SequenceResponse, ServiceError};
use crate::types::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SEQUENCE_FETCH_FAILED: &str = "Failed to fetch gene sequence data. Please try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] ValidationError),

    #[error("No gene bounds loaded")]
    NoBounds,

    #[error("{message}")]
    SequenceFetch { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub chrom: String,
    pub range: SelectedRange,
    pub genome_id: String,
}

/// Proof of issue for one request. Hand it back to
/// [`SequenceFetchCoordinator::complete`] together with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    request: FetchRequest,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }
}

/// The server answered with less than was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub requested: SelectedRange,
    pub served: ActualRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { truncated: Option<Truncation> },
    Failed { message: String },
    Stale,
}

#[derive(Debug, Clone)]
pub struct SequenceFetchCoordinator {
    bounds: Option<GeneBounds>,
    max_view_range: GenomicPos,
    generation: u64,
    sequence: Option<String>,
    actual_range: Option<ActualRange>,
    requested: Option<SelectedRange>,
    truncation: Option<Truncation>,
    loading: bool,
    error: Option<String>,
}

impl SequenceFetchCoordinator {
    pub fn new(max_view_range: GenomicPos) -> Self {
        Self {
            bounds: None,
            max_view_range,
            generation: 0,
            sequence: None,
            actual_range: None,
            requested: None,
            truncation: None,
            loading: false,
            error: None,
        }
    }

    /// Drop everything tied to the previous gene. Results still in flight
    /// for it will be discarded when they arrive.
    pub fn reset(&mut self, bounds: Option<GeneBounds>) {
        self.generation += 1;
        self.bounds = bounds;
        self.sequence = None;
        self.actual_range = None;
        self.requested = None;
        self.truncation = None;
        self.loading = false;
        self.error = None;
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn actual_range(&self) -> Option<ActualRange> {
        self.actual_range
    }

    pub fn requested_range(&self) -> Option<SelectedRange> {
        self.requested
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Validate and tag a request. Supersedes whatever is in flight.
    pub fn begin(
        &mut self,
        chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        genome_id: &str,
    ) -> Result<FetchTicket, FetchError> {
        let bounds = self.bounds.ok_or(FetchError::NoBounds)?;
        let range = coords::validate_range(start, end, &bounds, self.max_view_range)?;

        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.requested = Some(range);
        log::debug!(
            "Sequence request #{} {}:{}-{} ({})",
            self.generation,
            chrom,
            range.start,
            range.end,
            genome_id
        );

        Ok(FetchTicket {
            generation: self.generation,
            request: FetchRequest {
                chrom: chrom.to_string(),
                range,
                genome_id: genome_id.to_string(),
            },
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<SequenceResponse, ServiceError>,
    ) -> FetchOutcome {
        if !self.is_current(&ticket) {
            log::debug!(
                "Discarding stale sequence response #{} (current #{})",
                ticket.generation,
                self.generation
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;

        let requested = ticket.request.range;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Sequence fetch failed: {}", err);
                return self.fail(SEQUENCE_FETCH_FAILED.to_string());
            }
        };

        let SequenceResponse { sequence, actual_range, error } = response;
        if sequence.is_empty() {
            let message = error.unwrap_or_else(|| SEQUENCE_FETCH_FAILED.to_string());
            return self.fail(message);
        }

        let Some(served) = clip_to_request(actual_range, requested) else {
            log::warn!(
                "Served range {}-{} lies outside request {}-{}",
                actual_range.start,
                actual_range.end,
                requested.start,
                requested.end
            );
            return self.fail(SEQUENCE_FETCH_FAILED.to_string());
        };

        let truncated = (served != ActualRange::from(requested)).then_some(Truncation {
            requested,
            served,
        });
        if let Some(t) = truncated {
            log::info!(
                "Server truncated {}-{} to {}-{}",
                t.requested.start,
                t.requested.end,
                t.served.start,
                t.served.end
            );
        }

        self.sequence = Some(sequence);
        self.actual_range = Some(served);
        self.truncation = truncated;
        self.error = error;
        FetchOutcome::Applied { truncated }
    }

    fn fail(&mut self, message: String) -> FetchOutcome {
        self.error = Some(message.clone());
        FetchOutcome::Failed { message }
    }

    pub async fn request_sequence<S: GenomeService>(
        &mut self,
        service: &S,
        chrom: &str,
        start: GenomicPos,
        end: GenomicPos,
        genome_id: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let ticket = self.begin(chrom, start, end, genome_id)?;
        let result = service.sequence(chrom, start, end, genome_id).await;
        match self.complete(ticket, result) {
            FetchOutcome::Failed { message } => Err(FetchError::SequenceFetch { message }),
            outcome => Ok(outcome),
        }
    }
}

fn clip_to_request(served: ActualRange, requested: SelectedRange) -> Option<ActualRange> {
    let start = served.start.max(requested.start);
    let end = served.end.min(requested.end);
    (start < end).then_some(ActualRange::new(start, end))
}
