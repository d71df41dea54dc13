//! Day index query.
//!
//! # Responsibility
//! - Partition a document snapshot into "created on D" and "updated on D".
//! - Order both lists newest-first.
//!
//! # Invariants
//! - Creation wins: a document created on D is never listed as updated on D.
//! - A document appears at most once across both lists.
//! - Sorting is stable; equal timestamps keep snapshot order.
//! - Timestamps outside the representable range belong to no day.

use crate::model::document::{Document, EpochMillis};
use chrono::{Local, NaiveDate, TimeZone};

/// Result of one day query, borrowing from the queried snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayActivity<'a> {
    /// Target day.
    pub day: NaiveDate,
    /// Documents created on `day`, newest `created_at` first.
    pub created: Vec<&'a Document>,
    /// Documents modified (but not created) on `day`, newest `modified_at` first.
    pub updated: Vec<&'a Document>,
}

impl DayActivity<'_> {
    /// Total number of listed documents.
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }
}

/// Returns the local calendar day of `timestamp`.
pub fn day_bucket(timestamp: EpochMillis) -> Option<NaiveDate> {
    day_bucket_in(timestamp, &Local)
}

/// Returns the calendar day of `timestamp` in `zone`.
///
/// `None` when the instant cannot be represented.
pub fn day_bucket_in<Tz: TimeZone>(timestamp: EpochMillis, zone: &Tz) -> Option<NaiveDate> {
    zone.timestamp_millis_opt(timestamp)
        .single()
        .map(|instant| instant.date_naive())
}

/// Queries `documents` for activity on the local calendar `day`.
pub fn query_by_day(documents: &[Document], day: NaiveDate) -> DayActivity<'_> {
    query_by_day_in(documents, day, &Local)
}

/// Queries `documents` for activity on `day` as observed in `zone`.
pub fn query_by_day_in<'a, Tz: TimeZone>(
    documents: &'a [Document],
    day: NaiveDate,
    zone: &Tz,
) -> DayActivity<'a> {
    let mut created = Vec::new();
    let mut updated = Vec::new();

    for document in documents {
        if day_bucket_in(document.created_at, zone) == Some(day) {
            created.push(document);
        } else if day_bucket_in(document.modified_at, zone) == Some(day) {
            updated.push(document);
        }
    }

    created.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    updated.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    DayActivity {
        day,
        created,
        updated,
    }
}
