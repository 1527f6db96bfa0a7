//! Coordinate model: gene bounds, percent projection and range validation.
//!
//! Everything here is pure. The slider track works in percent of the gene
//! span, the sequence service works in absolute chromosome coordinates, and
//! these functions translate between the two.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_MAX_VIEW_RANGE: GenomicPos = 10_000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordError {
    #[error("Degenerate range: gene bounds have zero width at {0}")]
    DegenerateRange(GenomicPos),
}

/// The first rule a requested range breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationReason {
    NotANumber,
    StartNotBeforeEnd,
    StartBeforeGene { low: GenomicPos },
    EndAfterGene { high: GenomicPos },
    TooWide { max: GenomicPos },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::NotANumber => write!(f, "start and end must be whole numbers"),
            ValidationReason::StartNotBeforeEnd => write!(f, "start must be less than end"),
            ValidationReason::StartBeforeGene { low } => write!(f, "start must be at least {}", low),
            ValidationReason::EndAfterGene { high } => write!(f, "end must be at most {}", high),
            ValidationReason::TooWide { max } => write!(f, "range must not exceed {} bp", max),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: ValidationReason,
}

impl From<ValidationReason> for ValidationError {
    fn from(reason: ValidationReason) -> Self {
        Self { reason }
    }
}

pub fn normalize_bounds(bounds: &GeneBounds) -> (GenomicPos, GenomicPos) {
    (bounds.low(), bounds.high())
}

pub fn to_percent(coord: GenomicPos, low: GenomicPos, high: GenomicPos) -> Result<f64, CoordError> {
    if high == low {
        return Err(CoordError::DegenerateRange(low));
    }
    Ok(coord.saturating_sub(low) as f64 / high.saturating_sub(low) as f64 * 100.0)
}

/// Like [`to_percent`], substituting 0% for a zero-width gene.
pub fn to_percent_or_zero(coord: GenomicPos, low: GenomicPos, high: GenomicPos) -> f64 {
    to_percent(coord, low, high).unwrap_or(0.0)
}

pub fn from_percent(pct: f64, low: GenomicPos, high: GenomicPos) -> GenomicPos {
    let pct = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
    low + (pct / 100.0 * (high - low) as f64).round() as GenomicPos
}

/// Parse one user-typed coordinate. Surrounding whitespace and thousands
/// separators are tolerated, anything else is not.
pub fn parse_coordinate(text: &str) -> Option<GenomicPos> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<GenomicPos>().ok()
}

pub fn validate_range(
    start: GenomicPos,
    end: GenomicPos,
    bounds: &GeneBounds,
    max_view_range: GenomicPos,
) -> Result<SelectedRange, ValidationError> {
    let (low, high) = normalize_bounds(bounds);
    if start >= end {
        return Err(ValidationReason::StartNotBeforeEnd.into());
    }
    if start < low {
        return Err(ValidationReason::StartBeforeGene { low }.into());
    }
    if end > high {
        return Err(ValidationReason::EndAfterGene { high }.into());
    }
    if end - start > max_view_range {
        return Err(ValidationReason::TooWide { max: max_view_range }.into());
    }
    Ok(SelectedRange::new(start, end))
}

/// Validate raw text input; the integer check comes first.
pub fn validate_range_text(
    start: &str,
    end: &str,
    bounds: &GeneBounds,
    max_view_range: GenomicPos,
) -> Result<SelectedRange, ValidationError> {
    match (parse_coordinate(start), parse_coordinate(end)) {
        (Some(start), Some(end)) => validate_range(start, end, bounds, max_view_range),
        _ => Err(ValidationReason::NotANumber.into()),
    }
}

/// Percent-space view of a range on the gene track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProjection {
    pub start_pct: f64,
    pub end_pct: f64,
}

impl NormalizedProjection {
    pub fn from_range(start: GenomicPos, end: GenomicPos, bounds: &GeneBounds) -> Self {
        let (low, high) = normalize_bounds(bounds);
        Self {
            start_pct: to_percent_or_zero(start, low, high).clamp(0.0, 100.0),
            end_pct: to_percent_or_zero(end, low, high).clamp(0.0, 100.0),
        }
    }

    pub fn width_pct(&self) -> f64 {
        (self.end_pct - self.start_pct).max(0.0)
    }

    pub fn to_range(&self, bounds: &GeneBounds) -> SelectedRange {
        let (low, high) = normalize_bounds(bounds);
        SelectedRange::new(
            from_percent(self.start_pct, low, high),
            from_percent(self.end_pct, low, high),
        )
    }
}

impl Default for NormalizedProjection {
    fn default() -> Self {
        Self {
            start_pct: 0.0,
            end_pct: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bounds() -> GeneBounds {
        GeneBounds::new(0, 1000)
    }

    #[test]
    fn test_to_percent_degenerate() {
        assert_eq!(to_percent(5, 5, 5), Err(CoordError::DegenerateRange(5)));
        assert_eq!(to_percent_or_zero(5, 5, 5), 0.0);
    }

    #[test]
    fn test_from_percent_clamps_and_rounds() {
        assert_eq!(from_percent(-10.0, 1000, 2000), 1000);
        assert_eq!(from_percent(150.0, 1000, 2000), 2000);
        assert_eq!(from_percent(80.0, 1000, 2000), 1800);
        assert_eq!(from_percent(33.33, 0, 10), 3);
        assert_eq!(from_percent(f64::NAN, 1000, 2000), 1000);
    }

    #[test]
    fn test_validate_start_not_before_end() {
        let err = validate_range(5, 3, &bounds(), 10_000).unwrap_err();
        assert_eq!(err.reason, ValidationReason::StartNotBeforeEnd);
        assert_eq!(err.to_string(), "start must be less than end");
    }

    #[test]
    fn test_validate_reports_first_broken_rule() {
        // Both below the gene and reversed: ordering wins.
        let err = validate_range(-5, -10, &bounds(), 10_000).unwrap_err();
        assert_eq!(err.reason, ValidationReason::StartNotBeforeEnd);

        let err = validate_range(-5, 2000, &bounds(), 10).unwrap_err();
        assert_eq!(err.reason, ValidationReason::StartBeforeGene { low: 0 });

        let err = validate_range(10, 2000, &bounds(), 10).unwrap_err();
        assert_eq!(err.reason, ValidationReason::EndAfterGene { high: 1000 });

        let err = validate_range(10, 500, &bounds(), 100).unwrap_err();
        assert_eq!(err.reason, ValidationReason::TooWide { max: 100 });
        assert_eq!(err.to_string(), "range must not exceed 100 bp");
    }

    #[test]
    fn test_validate_uses_normalized_bounds() {
        let reversed = GeneBounds::new(1000, 0);
        assert_eq!(validate_range(0, 1000, &reversed, 10_000), Ok(SelectedRange::new(0, 1000)));
    }

    #[test]
    fn test_validate_text_requires_integers() {
        let err = validate_range_text("12a", "50", &bounds(), 10_000).unwrap_err();
        assert_eq!(err.reason, ValidationReason::NotANumber);
        let err = validate_range_text("", "50", &bounds(), 10_000).unwrap_err();
        assert_eq!(err.reason, ValidationReason::NotANumber);
        assert_eq!(
            validate_range_text(" 1,000 ", "50", &GeneBounds::new(0, 5000), 10_000).unwrap_err().reason,
            ValidationReason::StartNotBeforeEnd
        );
        assert_eq!(validate_range_text("10", "50", &bounds(), 10_000), Ok(SelectedRange::new(10, 50)));
    }

    #[test]
    fn test_projection_of_range() {
        let bounds = GeneBounds::new(1000, 2000);
        let projection = NormalizedProjection::from_range(1000, 1070, &bounds);
        assert_eq!(projection.start_pct, 0.0);
        assert!((projection.end_pct - 7.0).abs() < 1e-9);
        assert_eq!(projection.to_range(&bounds), SelectedRange::new(1000, 1070));
    }

    proptest! {
        #[test]
        fn prop_percent_roundtrip_within_one_unit(
            low in -1_000_000i64..1_000_000,
            span in 1i64..5_000_000,
            pct in 0.0f64..=100.0,
        ) {
            let high = low + span;
            let coord = from_percent(pct, low, high);
            let back = to_percent(coord, low, high).unwrap();
            let unit = 100.0 / span as f64;
            prop_assert!((back - pct).abs() <= unit + 1e-9);
        }

        #[test]
        fn prop_coordinate_roundtrip_exact(
            low in -1_000_000i64..1_000_000,
            span in 1i64..5_000_000,
            offset in 0.0f64..=1.0,
        ) {
            let high = low + span;
            let coord = low + (offset * span as f64) as i64;
            let pct = to_percent(coord, low, high).unwrap();
            prop_assert_eq!(from_percent(pct, low, high), coord);
        }
    }
}
