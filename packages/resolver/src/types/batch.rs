//! Batch run reporting types.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::attempt::ExtractionAttempt;

/// One invocation of the batch orchestrator.
///
/// `results` preserves input domain order regardless of completion order.
/// Read-only once the orchestrator returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    /// Input domains, deduplicated, in submission order
    pub domains: Vec<String>,
    pub concurrency_limit: usize,
    pub results: IndexMap<String, ExtractionAttempt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: BatchStats,
}

/// Outcome counts over one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Identifier extracted
    pub succeeded: usize,
    /// Genuinely not found (no error)
    pub not_found: usize,
    /// Infrastructure fault recorded for the domain
    pub errored: usize,
}

impl BatchStats {
    /// Tally outcomes from settled attempts.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ExtractionAttempt>) -> Self {
        let mut stats = Self::default();
        for attempt in results {
            if attempt.success {
                stats.succeeded += 1;
            } else if attempt.is_error() {
                stats.errored += 1;
            } else {
                stats.not_found += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attempt::{ExtractionMethod, ProofRecord};

    #[test]
    fn stats_tally_all_three_outcomes() {
        let mut ok = ExtractionAttempt::new("a.com", "https://a.com");
        ok.succeed(
            "7707083893",
            ProofRecord::new("https://a.com", "ИНН 7707083893", ExtractionMethod::LocalPattern),
        );
        let missing = ExtractionAttempt::new("b.com", "https://b.com");
        let broken = ExtractionAttempt::failed("c.com", "https://c.com", "navigate failed");

        let stats = BatchStats::from_results([&ok, &missing, &broken]);
        assert_eq!(
            stats,
            BatchStats {
                succeeded: 1,
                not_found: 1,
                errored: 1
            }
        );
    }
}
