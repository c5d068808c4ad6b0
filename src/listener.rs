use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

use crate::{
    ChangeAbandoned, ChangeMerged, ChangeRestored, CommentAdded, DraftPublished, GerritEvent,
    PatchsetCreated, RefReplicated, RefReplicationDone, RefUpdated, Result, ReviewerAdded,
    TopicChanged,
};

/// Outcome of a type-specific handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The handler consumed the event; the generic handler is not called.
    Yes,
    /// The listener has no handler for this type; fall back to
    /// [`EventListener::on_event`].
    No,
}

/// Receiver of dispatched Gerrit events.
///
/// Every listener implements the generic [`on_event`](EventListener::on_event).
/// It may additionally override the handler for any concrete event type;
/// the dispatcher calls the handler matching the event's exact type and
/// only falls back to `on_event` when that handler reports [`Handled::No`],
/// which is what the default implementations do.
///
/// Listeners are shared between workers and may be called concurrently
/// from several of them, hence `Send + Sync` and `&self` receivers.
///
/// Errors and panics raised by a handler are logged by the dispatcher and
/// never reach other listeners.
///
/// # Examples
///
/// ```rust
/// use gerrit_events::{CommentAdded, EventListener, GerritEvent, Handled, Result};
///
/// struct Votes;
///
/// impl EventListener for Votes {
///     fn on_event(&self, _event: &GerritEvent) -> Result<()> {
///         Ok(())
///     }
///
///     fn on_comment_added(&self, event: &CommentAdded) -> Result<Handled> {
///         println!("Code-Review {:?}", event.approval("Code-Review"));
///         Ok(Handled::Yes)
///     }
/// }
/// ```
pub trait EventListener: Send + Sync + 'static {
    /// Generic entry point, called for every event without a specific handler.
    fn on_event(&self, event: &GerritEvent) -> Result<()>;

    fn on_change_abandoned(&self, event: &ChangeAbandoned) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_change_merged(&self, event: &ChangeMerged) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_change_restored(&self, event: &ChangeRestored) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_comment_added(&self, event: &CommentAdded) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_draft_published(&self, event: &DraftPublished) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_patchset_created(&self, event: &PatchsetCreated) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_ref_updated(&self, event: &RefUpdated) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_reviewer_added(&self, event: &ReviewerAdded) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_topic_changed(&self, event: &TopicChanged) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_ref_replicated(&self, event: &RefReplicated) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    fn on_ref_replication_done(&self, event: &RefReplicationDone) -> Result<Handled> {
        let _event = event;
        Ok(Handled::No)
    }

    /// Human-readable name used in log records.
    ///
    /// Defaults to the implementing type's name.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

/// A registered listener.
///
/// Handles compare by identity: two handles are equal when they point to
/// the same listener allocation, whatever the listener's contents. The
/// caller keeps its own `Arc` and stays the listener's owner; the registry
/// only ever drops its clone.
#[derive(Clone)]
pub struct ListenerHandle(Arc<dyn EventListener>);

impl ListenerHandle {
    pub fn new<L: EventListener>(listener: L) -> Self {
        Self(Arc::new(listener))
    }

    #[inline]
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether this handle refers to the listener behind `arc`.
    pub fn is<L: EventListener>(&self, arc: &Arc<L>) -> bool {
        self.addr() == Arc::as_ptr(arc) as *const () as usize
    }
}

impl<L: EventListener> From<Arc<L>> for ListenerHandle {
    fn from(listener: Arc<L>) -> Self {
        Self(listener)
    }
}

impl From<Arc<dyn EventListener>> for ListenerHandle {
    fn from(listener: Arc<dyn EventListener>) -> Self {
        Self(listener)
    }
}

impl Deref for ListenerHandle {
    type Target = dyn EventListener;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ListenerHandle {}

impl Hash for ListenerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerHandle")
            .field(&self.0.name())
            .field(&format_args!("{:#x}", self.addr()))
            .finish()
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name())
    }
}

/// A listener made of a single closure handling every event generically.
pub struct FnListener<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&GerritEvent) -> Result<()> + Send + Sync + 'static,
{
    fn on_event(&self, event: &GerritEvent) -> Result<()> {
        (self.f)(event)
    }

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}

/// Wrap a closure into a listener handle.
pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, f: F) -> ListenerHandle
where
    F: Fn(&GerritEvent) -> Result<()> + Send + Sync + 'static,
{
    ListenerHandle::new(FnListener {
        name: name.into(),
        f,
    })
}
