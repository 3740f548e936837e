use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive calendar-day interval, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A stretch of the academic year with no vacation in it.
pub type AvailabilityPeriod = DateInterval;

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(DateInterval { start, end })
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// First date of the first table row to last date of the last row, in document order.
///
/// Not checked for `start <= end`: an out-of-order table simply yields no availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcademicYearSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Sort by start date and coalesce intervals that overlap or touch.
pub fn merge_intervals(mut intervals: Vec<DateInterval>) -> Vec<DateInterval> {
    intervals.sort();

    let mut merged: Vec<DateInterval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            Some(last) if touches(last, &iv) => last.end = last.end.max(iv.end),
            _ => merged.push(iv),
        }
    }
    merged
}

fn touches(earlier: &DateInterval, later: &DateInterval) -> bool {
    match earlier.end.succ_opt() {
        Some(next) => later.start <= next,
        None => true,
    }
}

/// Subtract `vacations` from `span`, walking a cursor from the span start.
///
/// Vacations are clipped to the span, then sorted and merged, so neither table
/// order nor dates outside the year change the result. A trailing period is
/// only emitted while the cursor is strictly before `span.end`.
pub fn complement(span: &AcademicYearSpan, vacations: &[DateInterval]) -> Vec<AvailabilityPeriod> {
    let in_span: Vec<DateInterval> = vacations
        .iter()
        .filter_map(|v| DateInterval::new(v.start.max(span.start), v.end.min(span.end)))
        .collect();

    let mut periods = Vec::new();
    let mut cursor = Some(span.start);

    for v in merge_intervals(in_span) {
        let Some(at) = cursor else { break };

        if at < v.start {
            // v.start > at, so it always has a predecessor.
            let gap_end = v.start.pred_opt().unwrap_or(v.start);
            if let Some(period) = DateInterval::new(at, gap_end) {
                periods.push(period);
            }
        }

        cursor = v.end.succ_opt().map(|next| next.max(at));
    }

    if let Some(at) = cursor {
        if at < span.end {
            periods.push(DateInterval { start: at, end: span.end });
        }
    }

    periods
}

// ── Tests ──
