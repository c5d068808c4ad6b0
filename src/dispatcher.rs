use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use crate::{
    Error, EventListener, GerritEvent, Handled, ListenerHandle, ListenerRegistry,
    SuppressionTable,
};

/// Fans a single event out to every registered listener.
///
/// Owns the listener registry and the suppression table. [`notify`] is
/// called by workers; each call runs entirely on the caller's stack,
/// listeners are invoked one after another, never in parallel.
///
/// [`notify`]: Dispatcher::notify
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: ListenerRegistry,
    suppression: SuppressionTable,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn suppression(&self) -> &SuppressionTable {
        &self.suppression
    }

    /// Deliver `event` to all listeners registered at the time of the call.
    ///
    /// Suppressed comments reach no listener at all. A listener that
    /// returns an error or panics is logged and skipped; the remaining
    /// listeners still receive the event and this method always returns.
    pub fn notify(&self, event: GerritEvent) {
        if self.suppression.should_suppress(&event) {
            tracing::trace!(event = %event, "comment-added ignored");
            return;
        }

        let listeners = self.registry.snapshot();
        tracing::trace!(event = %event, listeners = listeners.len(), "notifying listeners");
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| deliver(listener, &event))) {
                Ok(Ok(())) => {}
                Ok(Err(Failure {
                    handler: GENERIC_HANDLER,
                    error,
                })) => {
                    tracing::error!(
                        listener = %listener,
                        event = %event,
                        kind = event.kind(),
                        handler = GENERIC_HANDLER,
                        error = %error,
                        "When notifying listener"
                    );
                }
                Ok(Err(Failure { handler, error })) => {
                    tracing::error!(
                        listener = %listener,
                        event = %event,
                        kind = event.kind(),
                        handler,
                        error = %error,
                        "Error thrown during event handling"
                    );
                }
                Err(panic) => {
                    tracing::error!(
                        listener = %listener,
                        event = %event,
                        kind = event.kind(),
                        panic = panic_message(panic.as_ref()),
                        "Listener panicked"
                    );
                }
            }
        }
    }
}

const GENERIC_HANDLER: &str = "on_event";

/// A handler error, tagged with the handler that returned it.
#[derive(Debug)]
struct Failure {
    handler: &'static str,
    error: Error,
}

impl Failure {
    fn tag(handler: &'static str) -> impl FnOnce(Error) -> Failure {
        move |error| Failure { handler, error }
    }
}

/// Call the handler for the event's exact type, or `on_event` when the
/// listener does not handle that type.
fn deliver(
    listener: &ListenerHandle,
    event: &GerritEvent,
) -> std::result::Result<(), Failure> {
    let listener: &dyn EventListener = &**listener;
    let (handler, handled) = match event {
        GerritEvent::ChangeAbandoned(e) => {
            ("on_change_abandoned", listener.on_change_abandoned(e))
        }
        GerritEvent::ChangeMerged(e) => ("on_change_merged", listener.on_change_merged(e)),
        GerritEvent::ChangeRestored(e) => ("on_change_restored", listener.on_change_restored(e)),
        GerritEvent::CommentAdded(e) => ("on_comment_added", listener.on_comment_added(e)),
        GerritEvent::DraftPublished(e) => ("on_draft_published", listener.on_draft_published(e)),
        GerritEvent::PatchsetCreated(e) => {
            ("on_patchset_created", listener.on_patchset_created(e))
        }
        GerritEvent::RefUpdated(e) => ("on_ref_updated", listener.on_ref_updated(e)),
        GerritEvent::ReviewerAdded(e) => ("on_reviewer_added", listener.on_reviewer_added(e)),
        GerritEvent::TopicChanged(e) => ("on_topic_changed", listener.on_topic_changed(e)),
        GerritEvent::RefReplicated(e) => ("on_ref_replicated", listener.on_ref_replicated(e)),
        GerritEvent::RefReplicationDone(e) => {
            ("on_ref_replication_done", listener.on_ref_replication_done(e))
        }
    };
    if handled.map_err(Failure::tag(handler))? == Handled::No {
        tracing::debug!(
            listener = %listener.name(),
            kind = event.kind(),
            "No specific handler, calling on_event"
        );
        listener
            .on_event(event)
            .map_err(Failure::tag(GENERIC_HANDLER))?;
    }
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
