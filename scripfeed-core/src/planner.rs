//! Range planner: splits a date range into bounded, chronologically ordered
//! chunks that a single remote query can cover.
//!
//! A chunk of `max_span_days + 1` calendar days still has a span
//! (`end - start`) of `max_span_days`, so the chunk count is
//! `ceil(days / (max_span_days + 1))`, the fewest that respects the bound.
//! Days are then spread evenly across the chunks, with any remainder going
//! to the later ones, so January 2024 with a span of 15 becomes
//! `01-01..01-15` and `01-16..01-31`.

use crate::domain::DateChunk;
use chrono::{Duration, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("max span must be at least one day")]
    ZeroSpan,
}

/// Plan chunks for `[start, end]`. A missing `end` means today (local time).
pub fn plan(
    start: NaiveDate,
    end: Option<NaiveDate>,
    max_span_days: u32,
) -> Result<Vec<DateChunk>, RangeError> {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    plan_between(start, end, max_span_days)
}

/// Plan chunks for an explicit `[start, end]`.
pub fn plan_between(
    start: NaiveDate,
    end: NaiveDate,
    max_span_days: u32,
) -> Result<Vec<DateChunk>, RangeError> {
    if max_span_days == 0 {
        return Err(RangeError::ZeroSpan);
    }
    if start > end {
        return Err(RangeError::InvalidRange { start, end });
    }

    let days = (end - start).num_days() + 1;
    let max_days = i64::from(max_span_days) + 1;
    let count = ((days + max_days - 1) / max_days).max(1);
    let base = days / count;
    let longer_from = count - days % count;

    let mut chunks = Vec::with_capacity(count as usize);
    let mut cursor = start;
    for i in 0..count {
        let len = if i >= longer_from { base + 1 } else { base };
        let chunk_end = if i + 1 == count {
            end
        } else {
            cursor + Duration::days(len - 1)
        };
        chunks.push(DateChunk::new(cursor, chunk_end));
        if i + 1 < count {
            cursor = chunk_end + Duration::days(1);
        }
    }

    Ok(chunks)
}
