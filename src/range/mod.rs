//! Plot range synchronization.
//!
//! Two controls edit the same range:
//!
//! - the **bound inputs** (start and end edited one at a time)
//! - the **interval control** (both ends reported together)
//!
//! The transition functions are pure; [`RangeSync`] only stores the result
//! and the interval control's mirrored value. A rejected bound edit leaves
//! everything as it was.

use chrono::{Duration, NaiveDate};

use crate::domain::{DateSpan, RangeState};
use crate::error::ValidationError;

/// A single bound edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start(NaiveDate),
    End(NaiveDate),
}

/// Interval control update: taken as-is.
pub fn apply_interval_update(_state: RangeState, start: NaiveDate, end: NaiveDate) -> RangeState {
    RangeState { start, end }
}

/// Bound input update: rejected when it would put start after end or leave
/// the loaded span.
pub fn apply_bound_update(
    state: RangeState,
    span: DateSpan,
    bound: Bound,
) -> Result<RangeState, ValidationError> {
    let date = match bound {
        Bound::Start(d) | Bound::End(d) => d,
    };
    if !span.contains(date) {
        return Err(ValidationError::OutOfSpan {
            date,
            min: span.min,
            max: span.max,
        });
    }

    let next = match bound {
        Bound::Start(start) => RangeState { start, ..state },
        Bound::End(end) => RangeState { end, ..state },
    };
    if next.start > next.end {
        return Err(ValidationError::StartAfterEnd {
            start: next.start,
            end: next.end,
        });
    }
    Ok(next)
}

/// Carry a range over to a new dataset span.
///
/// Bounds are clamped into the span; a range that does not overlap the span
/// at all (or no previous range) becomes the full span.
pub fn rebase(previous: Option<RangeState>, span: DateSpan) -> RangeState {
    let Some(prev) = previous else {
        return RangeState::full(span);
    };
    if prev.end < span.min || prev.start > span.max {
        return RangeState::full(span);
    }
    RangeState {
        start: prev.start.clamp(span.min, span.max),
        end: prev.end.clamp(span.min, span.max),
    }
}

/// Move the whole window by `days`, keeping its width and staying in span.
pub fn shifted(state: RangeState, span: DateSpan, days: i64) -> RangeState {
    let width = state.end - state.start;
    let total = span.max - span.min;
    if width >= total {
        return RangeState::full(span);
    }

    let mut start = state.start + Duration::days(days);
    if start < span.min {
        start = span.min;
    }
    if start + width > span.max {
        start = span.max - width;
    }
    RangeState {
        start,
        end: start + width,
    }
}

/// Grow (positive) or shrink (negative) both ends by `days`.
///
/// Shrinking never inverts the window; it stops at a single day.
pub fn resized(state: RangeState, span: DateSpan, days: i64) -> RangeState {
    let mut start = (state.start - Duration::days(days)).clamp(span.min, span.max);
    let mut end = (state.end + Duration::days(days)).clamp(span.min, span.max);
    if start > end {
        let mid = state.start + (state.end - state.start) / 2;
        start = mid;
        end = mid;
    }
    RangeState { start, end }
}

/// Range state for the currently loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSync {
    span: DateSpan,
    state: RangeState,
    interval: RangeState,
}

impl RangeSync {
    /// Start at the dataset's full span.
    pub fn new(span: DateSpan) -> Self {
        let state = RangeState::full(span);
        Self {
            span,
            state,
            interval: state,
        }
    }

    pub fn span(&self) -> DateSpan {
        self.span
    }

    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Value currently shown by the interval control.
    pub fn interval(&self) -> RangeState {
        self.interval
    }

    pub fn on_interval(&mut self, start: NaiveDate, end: NaiveDate) {
        self.state = apply_interval_update(self.state, start, end);
        self.interval = self.state;
    }

    pub fn on_bound(&mut self, bound: Bound) -> Result<(), ValidationError> {
        self.state = apply_bound_update(self.state, self.span, bound)?;
        self.interval = self.state;
        Ok(())
    }

    /// The dataset was replaced; rebase onto its span.
    pub fn on_dataset(&mut self, span: DateSpan) {
        self.span = span;
        self.state = rebase(Some(self.state), span);
        self.interval = self.state;
    }

    pub fn shift(&mut self, days: i64) {
        let next = shifted(self.interval, self.span, days);
        self.on_interval(next.start, next.end);
    }

    pub fn resize(&mut self, days: i64) {
        let next = resized(self.interval, self.span, days);
        self.on_interval(next.start, next.end);
    }

    pub fn reset(&mut self) {
        self.on_interval(self.span.min, self.span.max);
    }
}
