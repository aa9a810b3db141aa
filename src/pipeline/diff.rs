//! Diff calculation between extracted candidates and the notification history.
//!
//! A candidate is new when its normalized identifier is not in the history
//! and it has a non-empty title. Title changes on known identifiers are
//! ignored. Within one batch the first occurrence of an identifier wins.

use std::collections::HashSet;

use crate::models::{Candidate, NotifyOrder, SeenSet};
use crate::utils::text::is_blank;
use crate::utils::url::normalize;

/// Extended diff result with per-reason drop counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Chapters to announce, in announcement order
    pub added: Vec<Candidate>,
    /// Candidates already in the history
    pub already_seen: usize,
    /// Candidates dropped for an empty title or identifier
    pub untitled: usize,
    /// Repeats of an identifier earlier in the same batch
    pub duplicates: usize,
}

impl DiffResult {
    /// Check if there is anything to announce.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Calculator for the "new chapters" subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCalculator {
    order: NotifyOrder,
}

impl DiffCalculator {
    pub fn new(order: NotifyOrder) -> Self {
        Self { order }
    }

    /// Calculate which candidates have not been announced yet.
    pub fn calculate(&self, candidates: &[Candidate], seen: &SeenSet) -> DiffResult {
        let mut result = DiffResult::default();
        let mut batch: HashSet<String> = HashSet::new();

        for candidate in candidates {
            let identifier = normalize(&candidate.identifier);

            if identifier.is_empty() || is_blank(&candidate.title) {
                log::debug!("Dropping untitled entry '{}'", candidate.identifier);
                result.untitled += 1;
                continue;
            }
            if seen.contains(&identifier) {
                result.already_seen += 1;
                continue;
            }
            if !batch.insert(identifier.clone()) {
                result.duplicates += 1;
                continue;
            }

            result.added.push(Candidate {
                identifier,
                title: candidate.title.clone(),
                number: candidate.number.clone(),
            });
        }

        if self.order == NotifyOrder::Identifier {
            result.added.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        }

        result
    }
}

/// Convenience function: new candidates in page order.
pub fn calculate_diff(candidates: &[Candidate], seen: &SeenSet) -> DiffResult {
    DiffCalculator::default().calculate(candidates, seen)
}
