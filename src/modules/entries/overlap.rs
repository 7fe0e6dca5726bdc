// Overlap resolution for overwrite inserts.
//
// Purpose
// - Decide how existing entries must shrink, split, or disappear so that a
//   new entry can land on a timeline where no two entries share an instant.
//
// Responsibilities
// - Stay pure. Callers fetch the owner's entries, ask for a plan, and apply
//   the returned actions to storage before inserting the new entry.

use chrono::{DateTime, Utc};
use std::cmp::Ordering::{Equal, Greater, Less};
use uuid::Uuid;

use crate::modules::entries::model::Entry;

/// Interval `[start, end)` on the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Window test shared by overlap detection and `?start_time`/`?end_time`
/// filtering. Bounds are inclusive: with none given every range matches;
/// with one bound a range matches unless it lies strictly on the open side;
/// with both bounds a range matches when either endpoint falls within
/// `[from, until]` or the range covers that window entirely.
pub fn matches_window(
    range: TimeRange,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    match (from, until) {
        (None, None) => true,
        (Some(from), None) => range.end >= from,
        (None, Some(until)) => until >= range.start,
        (Some(from), Some(until)) => {
            let start_inside = range.start >= from && range.start <= until;
            let end_inside = range.end >= from && range.end <= until;
            let covers = range.start <= from && range.end >= until;
            start_inside || end_inside || covers
        }
    }
}

/// How an existing entry relates to the range being inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// The new range swallows the existing entry whole.
    Covered,
    /// The existing entry extends past the new range on both sides.
    Contains,
    /// The new range cuts into the head of the existing entry.
    ClipsStart,
    /// The new range cuts into the tail of the existing entry.
    ClipsEnd,
}

/// Classifies how `existing` overlaps `new`, or `None` when the two ranges
/// never touch. The classification is a total match over the ordering of the
/// endpoints, so every touching geometry lands in exactly one variant; on
/// endpoint ties `Covered` wins over `Contains`, and both win over the
/// clipping variants.
pub fn classify(new: TimeRange, existing: TimeRange) -> Option<Overlap> {
    if !matches_window(existing, Some(new.start), Some(new.end)) {
        return None;
    }
    let overlap = match (new.start.cmp(&existing.start), new.end.cmp(&existing.end)) {
        (Less | Equal, Equal | Greater) => Overlap::Covered,
        (Equal | Greater, Less | Equal) => Overlap::Contains,
        (Less, Less) => Overlap::ClipsStart,
        (Greater, Greater) => Overlap::ClipsEnd,
    };
    Some(overlap)
}

/// One storage mutation the reconciler wants applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Delete the entry entirely.
    Remove { id: Uuid },
    /// Shrink the entry to the given range.
    Resize { id: Uuid, range: TimeRange },
    /// Shrink the entry to `head` and create a fresh entry covering `tail`,
    /// carrying over the original category and tag.
    Split {
        id: Uuid,
        head: TimeRange,
        tail: TimeRange,
    },
}

/// Plans the mutations that clear `[new.start, new.end)` across `existing`.
/// Remainders that would have zero length are dropped rather than stored, so
/// a split flush against either edge degrades to a plain resize.
pub fn plan(new: TimeRange, existing: &[Entry]) -> Vec<ReconcileAction> {
    let mut actions = Vec::new();
    for entry in existing {
        let range = entry.range();
        let Some(overlap) = classify(new, range) else {
            continue;
        };
        let action = match overlap {
            Overlap::Covered => ReconcileAction::Remove { id: entry.id },
            Overlap::Contains => {
                let head = TimeRange {
                    start: range.start,
                    end: new.start,
                };
                let tail = TimeRange {
                    start: new.end,
                    end: range.end,
                };
                match (head.is_empty(), tail.is_empty()) {
                    (false, false) => ReconcileAction::Split {
                        id: entry.id,
                        head,
                        tail,
                    },
                    (false, true) => ReconcileAction::Resize {
                        id: entry.id,
                        range: head,
                    },
                    (true, false) => ReconcileAction::Resize {
                        id: entry.id,
                        range: tail,
                    },
                    (true, true) => ReconcileAction::Remove { id: entry.id },
                }
            }
            Overlap::ClipsStart => ReconcileAction::Resize {
                id: entry.id,
                range: TimeRange {
                    start: new.end,
                    end: range.end,
                },
            },
            Overlap::ClipsEnd => ReconcileAction::Resize {
                id: entry.id,
                range: TimeRange {
                    start: range.start,
                    end: new.start,
                },
            },
        };
        actions.push(action);
    }
    actions
}
