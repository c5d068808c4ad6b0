use crate::{GerritEvent, WorkQueue};

/// What a worker loop needs from the hub, and nothing more.
///
/// Workers pull from [`work_queue`](Coordinator::work_queue) and push each
/// normalised event into [`notify`](Coordinator::notify). A worker must not
/// call any other hub operation from inside its loop.
///
/// [`GerritHandler::coordinator`](crate::GerritHandler::coordinator) hands
/// out the hub's implementation for embedders running their own workers.
pub trait Coordinator: Send + Sync + 'static {
    fn work_queue(&self) -> &WorkQueue;

    /// Dispatch an event to the registered listeners on the caller's stack.
    fn notify(&self, event: GerritEvent);
}
