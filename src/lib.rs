//! Gerrit event hub
//!
//! Receives raw Gerrit `stream-events` output, parses it on a pool of
//! worker tasks and fans each event out to registered listeners.
//!
//! - Producers submit lines, JSON objects or ready events to a [`GerritHandler`].
//! - Workers pull from the shared [`WorkQueue`] and turn work into [`GerritEvent`]s.
//! - The [`Dispatcher`] hands every event to each [`EventListener`], preferring
//!   a handler for the exact event type and falling back to `on_event`.
//! - Comments written by a provider's own account can be suppressed
//!   with [`GerritHandler::set_ignore_email`].

mod config;
mod coordinator;
mod dispatcher;
mod envelope;
mod error;
mod event;
mod handler;
mod internal;
mod listener;
mod meta;
mod parser;
mod queue;
mod registry;
mod suppression;
mod work_item;

pub use config::{Config, DEFAULT_WORKER_COUNT};
pub use coordinator::Coordinator;
pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use error::Error;
pub use event::{
    Account, Approval, Change, ChangeAbandoned, ChangeMerged, ChangeRestored, CommentAdded,
    DraftPublished, GerritEvent, PatchSet, PatchsetCreated, Provider, RefReplicated,
    RefReplicationDone, RefUpdate, RefUpdated, ReviewerAdded, TopicChanged,
};
pub use handler::{GerritHandler, State};
pub use listener::{EventListener, FnListener, Handled, ListenerHandle, from_fn};
pub use meta::Meta;
pub use parser::{EventParser, JsonEventParser};
pub use queue::WorkQueue;
pub use registry::{ListenerRegistry, Snapshot};
pub use suppression::SuppressionTable;
pub use work_item::WorkItem;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Unique id assigned to every queued work item.
pub type WorkId = u128;

pub mod prelude {
    pub use crate::error::Error as GerritError;
    pub use crate::event::GerritEvent;
    pub use crate::handler::GerritHandler;
    pub use crate::listener::{EventListener, Handled, ListenerHandle};
    pub use crate::{Config, Provider};
}
