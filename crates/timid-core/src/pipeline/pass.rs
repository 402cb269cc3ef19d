//! One class pass: list, dedup, admit, transfer, drain.

use futures::StreamExt;
use tokio::task::{JoinError, JoinSet};

use crate::dedup;
use crate::error::TransferError;
use crate::media::{MediaClass, TransferItem};
use crate::observer::ItemOutcome;

use super::report::ClassReport;
use super::state::DriverState;
use super::Pipeline;

type Joined = Result<(TransferItem, ItemOutcome), JoinError>;

impl Pipeline {
    /// Run one pass for `class`. Per-item failures are counted, never
    /// returned; a source failure ends listing and is reported in `fatal`.
    pub async fn run_class(&self, class: MediaClass) -> ClassReport {
        let mut report = ClassReport::new(class);
        let mut state = DriverState::Idle;
        let after = self.store.resume_after(class).await;
        let mut highest_seen = after;
        let task = self.item_task();
        let mut tasks: JoinSet<(TransferItem, ItemOutcome)> = JoinSet::new();

        tracing::info!(%class, after, "pass starting");
        let mut items = self.source.list_items(after);

        loop {
            self.enter(class, &mut state, DriverState::Listing);
            let next = tokio::select! {
                biased;
                _ = self.control.stopped() => break,
                next = items.next() => next,
            };
            let item = match next {
                None => {
                    report.listing_complete = true;
                    break;
                }
                Some(Err(e)) => {
                    let err = TransferError::FatalSource(e);
                    tracing::error!(%class, error = %err, "listing failed, ending pass");
                    report.fatal = Some(err.to_string());
                    break;
                }
                Some(Ok(item)) => item,
            };
            highest_seen = highest_seen.max(item.sequence_id);
            if item.class != class {
                continue;
            }
            report.listed += 1;
            tracing::debug!(
                %class,
                item_id = %item.id,
                seq = item.sequence_id,
                highest_seen,
                file = %item.file_name(),
                bytes = item.size_bytes,
                "listed"
            );

            let verdict = dedup::check(&self.store, &item).await;
            let claim = if verdict.is_skip() {
                Err(verdict)
            } else {
                dedup::claim(&self.in_flight, &item)
            };
            let claim = match claim {
                Ok(claim) => claim,
                Err(verdict) => {
                    self.enter(class, &mut state, DriverState::Skipping);
                    let outcome = ItemOutcome::Skipped(verdict);
                    self.observer.on_item_finished(&item, &outcome);
                    report.tally(item.sequence_id, &outcome);
                    continue;
                }
            };

            // Reap finished tasks while waiting so results do not pile up.
            let permit = loop {
                tokio::select! {
                    biased;
                    _ = self.control.stopped() => break None,
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                        reap(&mut report, after, joined);
                    }
                    permit = self.slots.acquire(class) => break permit,
                }
            };
            let Some(permit) = permit else {
                break;
            };

            self.enter(class, &mut state, DriverState::Transferring);
            tracing::debug!(
                %class,
                item_id = %item.id,
                in_use = self.slots.in_use(class),
                capacity = self.slots.capacity(class),
                "admitted"
            );
            let task = task.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let _claim = claim;
                let outcome = task.transfer(&item).await;
                (item, outcome)
            });
        }
        drop(items);

        self.enter(class, &mut state, DriverState::Draining);
        while let Some(joined) = tasks.join_next().await {
            reap(&mut report, after, joined);
        }

        if let Err(e) = self
            .store
            .finish_pass(class, report.lowest_abandoned, report.listing_complete)
            .await
        {
            tracing::error!(%class, error = %e, "could not save rescan point");
            report.persistence_failures += 1;
        }
        self.enter(class, &mut state, DriverState::Idle);

        tracing::info!(
            %class,
            listed = report.listed,
            completed = report.completed,
            skipped = report.skipped,
            failed = report.failed,
            rate_limited = report.rate_limited,
            bytes = report.bytes,
            listing_complete = report.listing_complete,
            "pass finished"
        );
        report
    }

    fn enter(&self, class: MediaClass, state: &mut DriverState, next: DriverState) {
        if *state != next {
            tracing::trace!(%class, from = %state, to = %next, "driver state");
            *state = next;
            self.observer.on_class_state(class, next);
        }
    }
}

/// Fold one finished task into the report. A task that panicked abandons an
/// unknown item of this pass, so the rescan floor drops to the pass start.
fn reap(report: &mut ClassReport, after: u64, joined: Joined) {
    match joined {
        Ok((item, outcome)) => report.tally(item.sequence_id, &outcome),
        Err(e) => {
            tracing::error!(class = %report.class, error = %e, "transfer task died");
            report.tally(after.saturating_add(1), &ItemOutcome::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reap_tallies_outcomes() {
        let mut report = ClassReport::new(MediaClass::Image);
        let item = TransferItem {
            id: "a".into(),
            sequence_id: 12,
            class: MediaClass::Image,
            size_bytes: 1,
            locator: String::new(),
            destination: "/tmp/a".into(),
        };
        reap(&mut report, 10, Ok((item, ItemOutcome::Failed)));
        assert_eq!(report.failed, 1);
        assert_eq!(report.lowest_abandoned, Some(12));
    }
}
