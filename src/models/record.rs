//! Notification history.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Candidate;

/// One chapter that has been announced. Written once, never changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifiedRecord {
    /// Normalized chapter URL
    pub identifier: String,

    /// Title at the time of the announcement
    pub title: String,

    /// When the record was created
    pub notified_at: DateTime<Utc>,
}

impl NotifiedRecord {
    pub fn from_candidate(candidate: &Candidate, now: DateTime<Utc>) -> Self {
        Self {
            identifier: candidate.identifier.clone(),
            title: candidate.title.clone(),
            notified_at: now,
        }
    }
}

/// Every chapter announced so far, keyed by identifier.
///
/// Records keep their insertion order; an identifier appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    records: Vec<NotifiedRecord>,
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored records, keeping the first record per identifier.
    pub fn from_records(records: impl IntoIterator<Item = NotifiedRecord>) -> Self {
        let mut seen = Self::new();
        for record in records {
            seen.push(record);
        }
        seen
    }

    fn push(&mut self, record: NotifiedRecord) -> bool {
        if self.ids.insert(record.identifier.clone()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ids.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NotifiedRecord] {
        &self.records
    }

    /// The most recently announced record.
    pub fn latest(&self) -> Option<&NotifiedRecord> {
        self.records.iter().max_by_key(|r| r.notified_at)
    }

    /// Return a new set with one record appended per item not yet present.
    pub fn merge(&self, items: &[Candidate], now: DateTime<Utc>) -> Self {
        let mut merged = self.clone();
        for item in items {
            merged.push(NotifiedRecord::from_candidate(item, now));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_from_records_keeps_first_duplicate() {
        let seen = SeenSet::from_records(vec![
            NotifiedRecord {
                identifier: "/c/1".into(),
                title: "First".into(),
                notified_at: at(1),
            },
            NotifiedRecord {
                identifier: "/c/1".into(),
                title: "Again".into(),
                notified_at: at(2),
            },
        ]);

        assert_eq!(seen.len(), 1);
        assert_eq!(seen.records()[0].title, "First");
    }

    #[test]
    fn test_merge_is_pure() {
        let base = SeenSet::new();
        let items = vec![Candidate::new("/c/12", "Ch 12"), Candidate::new("/c/13", "Ch 13")];

        let merged = base.merge(&items, at(5));

        assert!(base.is_empty());
        assert_eq!(merged.len(), 2);
        assert!(merged.contains("/c/12"));
        assert!(merged.contains("/c/13"));
        assert!(merged.records().iter().all(|r| r.notified_at == at(5)));
    }

    #[test]
    fn test_merge_never_rewrites_existing_record() {
        let base = SeenSet::new().merge(&[Candidate::new("/c/12", "Old title")], at(1));
        let merged = base.merge(&[Candidate::new("/c/12", "New title")], at(2));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.records()[0].title, "Old title");
        assert_eq!(merged.records()[0].notified_at, at(1));
    }

    #[test]
    fn test_latest() {
        let seen = SeenSet::new()
            .merge(&[Candidate::new("/c/1", "One")], at(3))
            .merge(&[Candidate::new("/c/2", "Two")], at(7));

        assert_eq!(seen.latest().map(|r| r.identifier.as_str()), Some("/c/2"));
        assert!(SeenSet::new().latest().is_none());
    }
}
