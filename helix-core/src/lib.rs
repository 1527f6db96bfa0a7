//! Helix Core Library
//!
//! Coordinate model, range selection, sequence fetch coordination and
//! variant overlays for browsing gene regions.

pub mod types;
pub mod coords;
pub mod catalog;
pub mod service;
pub mod selector;
pub mod fetch;
pub mod variants;
pub mod session;

// Re-export commonly used types and functions
pub use types::{ActualRange, Chromosome, Gene, GeneBounds, GeneDetails, GenomeAssembly, GenomicPos, SelectedRange, Strand};
pub use coords::{validate_range, NormalizedProjection, ValidationError, ValidationReason, DEFAULT_MAX_VIEW_RANGE};
pub use service::{ClassifyRequest, GeneDetailsResponse, GenomeService, SequenceResponse, ServiceError, VariantPredictor};
pub use selector::{CaptureChange, DragState, DragTarget, RangeCommit, RangeSelector, TrackRect};
pub use fetch::{FetchError, FetchOutcome, SequenceFetchCoordinator};
pub use variants::{
    merge_variants, AnalysisOutcome, AnalysisResult, AnalysisStatus, LoadMode, Variant, VariantError, VariantOverlay,
};
pub use session::{GeneSession, SessionConfig, SessionError};

/// Version information for the Helix core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
