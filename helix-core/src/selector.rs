//! Range selector: the drag/text-entry state machine behind the gene track.
//!
//! The selector owns the transient, uncommitted state of a gesture. Pointer
//! moves only update that state; the single [`RangeCommit`] returned from
//! [`RangeSelector::pointer_up`] (or [`RangeSelector::commit_text`]) is the
//! only thing that should ever lead to a sequence fetch.

use crate::coords::{self, NormalizedProjection, ValidationError};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragTarget {
    StartHandle,
    EndHandle,
    RangeBar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    DraggingStart,
    DraggingEnd,
    /// Whole-interval translation. Remembers where the bar was grabbed and
    /// the coordinates at grab time so the interval moves rigidly.
    DraggingRange {
        grab_pct: f64,
        start: GenomicPos,
        end: GenomicPos,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Rendered bounding box of the track, in the same units as pointer x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackRect {
    pub left: f64,
    pub width: f64,
}

impl TrackRect {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    pub fn percent_at(&self, x: f64) -> Option<f64> {
        if !(self.width.is_finite() && self.width > 0.0) || !x.is_finite() {
            return None;
        }
        Some(((x - self.left) / self.width * 100.0).clamp(0.0, 100.0))
    }

    pub fn x_at(&self, pct: f64) -> f64 {
        self.left + pct / 100.0 * self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitSource {
    Drag,
    TextEntry,
}

/// A finished adjustment, ready to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCommit {
    pub range: SelectedRange,
    pub source: CommitSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureChange {
    Acquired,
    Released,
}

pub type CaptureListener = Box<dyn FnMut(CaptureChange)>;

fn clamp_between(value: GenomicPos, lower: GenomicPos, upper: GenomicPos) -> GenomicPos {
    // On conflicting limits the upper one wins.
    value.max(lower).min(upper)
}

pub struct RangeSelector {
    bounds: Option<GeneBounds>,
    max_view_range: GenomicPos,
    start_text: String,
    end_text: String,
    drag: DragState,
    capture_listener: Option<CaptureListener>,
    last_error: Option<ValidationError>,
}

impl fmt::Debug for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSelector")
            .field("bounds", &self.bounds)
            .field("max_view_range", &self.max_view_range)
            .field("start_text", &self.start_text)
            .field("end_text", &self.end_text)
            .field("drag", &self.drag)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl RangeSelector {
    pub fn new(max_view_range: GenomicPos) -> Self {
        Self {
            bounds: None,
            max_view_range,
            start_text: String::new(),
            end_text: String::new(),
            drag: DragState::Idle,
            capture_listener: None,
            last_error: None,
        }
    }

    /// Register the host hook that attaches/detaches viewport-wide pointer
    /// listeners. It sees exactly one `Released` per `Acquired`.
    pub fn on_capture_change(&mut self, listener: CaptureListener) {
        self.capture_listener = Some(listener);
    }

    pub fn bounds(&self) -> Option<GeneBounds> {
        self.bounds
    }

    pub fn max_view_range(&self) -> GenomicPos {
        self.max_view_range
    }

    /// Replace the gene bounds. Any gesture in progress is abandoned and the
    /// typed coordinates are cleared.
    pub fn set_bounds(&mut self, bounds: Option<GeneBounds>) {
        self.cancel_drag();
        self.bounds = bounds;
        self.start_text.clear();
        self.end_text.clear();
        self.last_error = None;
    }

    pub fn seed(&mut self, range: SelectedRange) {
        self.start_text = range.start.to_string();
        self.end_text = range.end.to_string();
        self.last_error = None;
    }

    pub fn start_text(&self) -> &str {
        &self.start_text
    }

    pub fn end_text(&self) -> &str {
        &self.end_text
    }

    pub fn set_start_text(&mut self, text: impl Into<String>) {
        self.start_text = text.into();
    }

    pub fn set_end_text(&mut self, text: impl Into<String>) {
        self.end_text = text.into();
    }

    pub fn start(&self) -> Option<GenomicPos> {
        coords::parse_coordinate(&self.start_text)
    }

    pub fn end(&self) -> Option<GenomicPos> {
        coords::parse_coordinate(&self.end_text)
    }

    /// Width of the typed range, or 0 while the text is incomplete or reversed.
    pub fn range_size(&self) -> GenomicPos {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) if end >= start => end.saturating_sub(start),
            _ => 0,
        }
    }

    pub fn projection(&self) -> Option<NormalizedProjection> {
        let bounds = self.bounds?;
        Some(NormalizedProjection::from_range(self.start()?, self.end()?, &bounds))
    }

    pub fn state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    fn notify(&mut self, change: CaptureChange) {
        if let Some(listener) = self.capture_listener.as_mut() {
            listener(change);
        }
    }

    fn enter(&mut self, state: DragState) {
        let was_dragging = self.drag.is_dragging();
        self.drag = state;
        if !was_dragging {
            self.notify(CaptureChange::Acquired);
        }
    }

    fn leave(&mut self) {
        if self.drag.is_dragging() {
            self.drag = DragState::Idle;
            self.notify(CaptureChange::Released);
        }
    }

    /// Start a gesture. Returns whether the pointer was captured.
    pub fn pointer_down(&mut self, target: DragTarget, x: f64, track: &TrackRect) -> bool {
        if self.bounds.is_none() || self.drag.is_dragging() {
            return false;
        }
        let state = match target {
            DragTarget::StartHandle => DragState::DraggingStart,
            DragTarget::EndHandle => DragState::DraggingEnd,
            DragTarget::RangeBar => {
                let (Some(start), Some(end)) = (self.start(), self.end()) else {
                    return false;
                };
                // Only a well-formed range inside the gene can be moved rigidly.
                let (low, high) = self.bounds.map(|b| coords::normalize_bounds(&b)).unwrap_or_default();
                if start >= end || start < low || end > high {
                    log::debug!("Refusing range drag of {}-{}", start, end);
                    return false;
                }
                let Some(grab_pct) = track.percent_at(x) else {
                    return false;
                };
                DragState::DraggingRange { grab_pct, start, end }
            }
        };
        log::trace!("Pointer down on {:?}", target);
        self.enter(state);
        true
    }

    /// Apply one pointer move. Returns the updated selection, if any.
    pub fn pointer_move(&mut self, x: f64, track: &TrackRect) -> Option<SelectedRange> {
        if !self.drag.is_dragging() {
            return None;
        }
        let bounds = self.bounds?;
        let pct = track.percent_at(x)?;
        let (low, high) = coords::normalize_bounds(&bounds);
        let coord = coords::from_percent(pct, low, high);

        match self.drag {
            DragState::Idle => return None,
            DragState::DraggingStart => {
                let start = match self.end() {
                    Some(end) => clamp_between(
                        coord,
                        low.max(end.saturating_sub(self.max_view_range)),
                        end.saturating_sub(1),
                    ),
                    None => coord,
                };
                self.start_text = start.to_string();
            }
            DragState::DraggingEnd => {
                let end = match self.start() {
                    Some(start) => clamp_between(
                        coord,
                        start.saturating_add(1),
                        high.min(start.saturating_add(self.max_view_range)),
                    ),
                    None => coord,
                };
                self.end_text = end.to_string();
            }
            DragState::DraggingRange { grab_pct, start, end } => {
                let span = (high - low) as f64;
                let delta = ((pct - grab_pct) / 100.0 * span).round() as GenomicPos;
                let delta = clamp_between(delta, low - start, high - end);
                self.start_text = (start + delta).to_string();
                self.end_text = (end + delta).to_string();
            }
        }

        Some(SelectedRange::new(self.start()?, self.end()?))
    }

    /// Finish the gesture. Emits one commit when both ends are defined and
    /// the pair validates; otherwise the failure lands in `last_error`.
    pub fn pointer_up(&mut self) -> Option<RangeCommit> {
        if !self.drag.is_dragging() {
            return None;
        }
        self.leave();
        let (Some(bounds), Some(start), Some(end)) = (self.bounds, self.start(), self.end()) else {
            log::debug!("Drag finished without a complete range");
            return None;
        };
        match coords::validate_range(start, end, &bounds, self.max_view_range) {
            Ok(range) => {
                self.last_error = None;
                log::debug!("Drag finished: {}-{}", range.start, range.end);
                Some(RangeCommit {
                    range,
                    source: CommitSource::Drag,
                })
            }
            Err(err) => {
                log::debug!("Drag finished on an invalid range: {}", err);
                self.last_error = Some(err);
                None
            }
        }
    }

    /// Abandon a gesture without committing (teardown, gene change).
    pub fn cancel_drag(&mut self) {
        self.leave();
    }

    /// Treat the typed coordinates as a commit if they validate.
    pub fn commit_text(&mut self) -> Result<RangeCommit, ValidationError> {
        let result = match self.bounds {
            Some(bounds) => coords::validate_range_text(
                &self.start_text,
                &self.end_text,
                &bounds,
                self.max_view_range,
            ),
            None => Err(coords::ValidationReason::NotANumber.into()),
        };
        match result {
            Ok(range) => {
                self.last_error = None;
                Ok(RangeCommit {
                    range,
                    source: CommitSource::TextEntry,
                })
            }
            Err(err) => {
                log::debug!("Rejected typed range: {}", err);
                self.last_error = Some(err);
                Err(err)
            }
        }
    }
}

impl Drop for RangeSelector {
    fn drop(&mut self) {
        self.leave();
    }
}
