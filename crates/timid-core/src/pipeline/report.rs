use std::fmt;

use crate::media::MediaClass;
use crate::observer::ItemOutcome;

/// Counts for one class pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    pub class: MediaClass,
    /// Items of this class the source listed.
    pub listed: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub rate_limited: u64,
    /// Completions (or pass ends) whose progress record could not be saved.
    pub persistence_failures: u64,
    /// Bytes written by completed items.
    pub bytes: u64,
    /// Lowest sequence id abandoned during the pass.
    pub lowest_abandoned: Option<u64>,
    /// True if the source listing ran to its end.
    pub listing_complete: bool,
    /// Why the pass ended early, if the source failed.
    pub fatal: Option<String>,
}

impl ClassReport {
    pub fn new(class: MediaClass) -> Self {
        Self {
            class,
            listed: 0,
            completed: 0,
            skipped: 0,
            failed: 0,
            rate_limited: 0,
            persistence_failures: 0,
            bytes: 0,
            lowest_abandoned: None,
            listing_complete: false,
            fatal: None,
        }
    }

    pub(super) fn tally(&mut self, sequence_id: u64, outcome: &ItemOutcome) {
        match *outcome {
            ItemOutcome::Completed { bytes, persisted } => {
                self.completed += 1;
                self.bytes += bytes;
                if !persisted {
                    self.persistence_failures += 1;
                }
            }
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::RateLimited => self.rate_limited += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
        if outcome.is_abandoned() {
            self.lowest_abandoned = Some(match self.lowest_abandoned {
                Some(low) => low.min(sequence_id),
                None => sequence_id,
            });
        }
    }

    /// Items that will be retried by the next run.
    pub fn abandoned(&self) -> u64 {
        self.failed + self.rate_limited
    }
}

impl fmt::Display for ClassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} listed, {} completed, {} skipped, {} failed, {} rate-limited, {} bytes",
            self.class,
            self.listed,
            self.completed,
            self.skipped,
            self.failed,
            self.rate_limited,
            self.bytes
        )?;
        if !self.listing_complete {
            f.write_str(" (pass incomplete)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DedupVerdict;

    #[test]
    fn tally_counts_and_tracks_lowest_abandoned() {
        let mut r = ClassReport::new(MediaClass::Image);
        r.tally(5, &ItemOutcome::Completed { bytes: 10, persisted: true });
        r.tally(6, &ItemOutcome::Skipped(DedupVerdict::InWindow));
        r.tally(9, &ItemOutcome::Failed);
        r.tally(7, &ItemOutcome::RateLimited);
        r.tally(8, &ItemOutcome::Completed { bytes: 5, persisted: false });
        assert_eq!(r.completed, 2);
        assert_eq!(r.bytes, 15);
        assert_eq!(r.skipped, 1);
        assert_eq!(r.abandoned(), 2);
        assert_eq!(r.persistence_failures, 1);
        assert_eq!(r.lowest_abandoned, Some(7));
    }

    #[test]
    fn display_marks_incomplete_pass() {
        let r = ClassReport::new(MediaClass::Video);
        assert!(r.to_string().starts_with("video: 0 listed"));
        assert!(r.to_string().ends_with("(pass incomplete)"));
    }
}
