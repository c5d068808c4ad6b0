use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use tokio::{select, task};
use tokio_util::sync::CancellationToken;

use crate::{Coordinator, Envelope, EventParser};

/// One worker task: pulls work, normalises it into an event and hands the
/// event to the coordinator. Runs until cancelled.
///
/// Parsing and dispatch are synchronous and may block in listener code, so
/// each item is processed on Tokio's blocking pool. The task waits for an
/// item to finish before pulling the next one; workers therefore run in
/// parallel with each other and never stall the runtime's async threads.
pub(crate) struct Worker {
    pub(crate) name: Arc<str>,
    pub(crate) coordinator: Arc<dyn Coordinator>,
    pub(crate) parser: Arc<dyn EventParser>,
    pub(crate) cancel_token: CancellationToken,
}

impl Worker {
    pub async fn run(self) {
        tracing::debug!(worker = %self.name, "worker started");
        loop {
            // Cancellation is checked first so a stopped worker never takes
            // another item off the queue.
            let envelope = select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                envelope = self.coordinator.work_queue().pull() => envelope,
            };
            let Some(envelope) = envelope else {
                break;
            };

            let name = self.name.clone();
            let coordinator = self.coordinator.clone();
            let parser = self.parser.clone();
            let job = task::spawn_blocking(move || {
                perform(&name, coordinator.as_ref(), parser.as_ref(), envelope)
            });
            if let Err(err) = job.await {
                tracing::error!(worker = %self.name, error = %err, "Work item processing aborted");
            }
        }
        tracing::debug!(worker = %self.name, "worker stopped");
    }
}

fn perform(
    worker: &str,
    coordinator: &dyn Coordinator,
    parser: &dyn EventParser,
    envelope: Envelope,
) {
    let Envelope { meta, item } = envelope;
    let work_id = meta.short_id();
    tracing::trace!(worker, work_id, item = %item, "performing work");

    match catch_unwind(AssertUnwindSafe(|| item.into_event(parser))) {
        Ok(Ok(Some(event))) => coordinator.notify(event),
        Ok(Ok(None)) => tracing::trace!(worker, work_id, "nothing to dispatch"),
        Ok(Err(err)) => {
            tracing::warn!(
                worker,
                work_id,
                error = %err,
                "Dropping unparseable work item"
            );
        }
        Err(_) => {
            tracing::error!(worker, work_id, "Parser panicked, dropping work item");
        }
    }
}
