//! Gerrit stream events.
//!
//! [`GerritEvent`] is the closed set of event types the hub understands,
//! one variant per Gerrit `stream-events` type. Each variant wraps a plain
//! struct so listeners can implement a handler for exactly that type.

mod attr;
mod events;

use std::fmt;

use serde::Deserialize;

pub use attr::{Account, Approval, Change, PatchSet, Provider, RefUpdate};
pub use events::{
    ChangeAbandoned, ChangeMerged, ChangeRestored, CommentAdded, DraftPublished, PatchsetCreated,
    RefReplicated, RefReplicationDone, RefUpdated, ReviewerAdded, TopicChanged,
};

/// Applies `$body` to the inner struct of whichever variant `$event` is.
macro_rules! with_inner {
    ($event:expr, $inner:ident => $body:expr) => {
        match $event {
            GerritEvent::ChangeAbandoned($inner) => $body,
            GerritEvent::ChangeMerged($inner) => $body,
            GerritEvent::ChangeRestored($inner) => $body,
            GerritEvent::CommentAdded($inner) => $body,
            GerritEvent::DraftPublished($inner) => $body,
            GerritEvent::PatchsetCreated($inner) => $body,
            GerritEvent::RefUpdated($inner) => $body,
            GerritEvent::ReviewerAdded($inner) => $body,
            GerritEvent::TopicChanged($inner) => $body,
            GerritEvent::RefReplicated($inner) => $body,
            GerritEvent::RefReplicationDone($inner) => $body,
        }
    };
}

/// An event received from (or injected as if from) a Gerrit server.
///
/// Decodes from the JSON objects Gerrit writes on `stream-events`, using
/// the `type` field as the tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GerritEvent {
    ChangeAbandoned(ChangeAbandoned),
    ChangeMerged(ChangeMerged),
    ChangeRestored(ChangeRestored),
    CommentAdded(CommentAdded),
    DraftPublished(DraftPublished),
    PatchsetCreated(PatchsetCreated),
    RefUpdated(RefUpdated),
    ReviewerAdded(ReviewerAdded),
    TopicChanged(TopicChanged),
    RefReplicated(RefReplicated),
    RefReplicationDone(RefReplicationDone),
}

impl GerritEvent {
    /// Every `type` string this crate decodes.
    pub const KINDS: [&'static str; 11] = [
        "change-abandoned",
        "change-merged",
        "change-restored",
        "comment-added",
        "draft-published",
        "patchset-created",
        "ref-updated",
        "reviewer-added",
        "topic-changed",
        "ref-replicated",
        "ref-replication-done",
    ];

    /// The Gerrit `type` string of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            GerritEvent::ChangeAbandoned(_) => "change-abandoned",
            GerritEvent::ChangeMerged(_) => "change-merged",
            GerritEvent::ChangeRestored(_) => "change-restored",
            GerritEvent::CommentAdded(_) => "comment-added",
            GerritEvent::DraftPublished(_) => "draft-published",
            GerritEvent::PatchsetCreated(_) => "patchset-created",
            GerritEvent::RefUpdated(_) => "ref-updated",
            GerritEvent::ReviewerAdded(_) => "reviewer-added",
            GerritEvent::TopicChanged(_) => "topic-changed",
            GerritEvent::RefReplicated(_) => "ref-replicated",
            GerritEvent::RefReplicationDone(_) => "ref-replication-done",
        }
    }

    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }

    pub fn provider(&self) -> Option<&Provider> {
        with_inner!(self, e => e.provider.as_ref())
    }

    pub fn set_provider(&mut self, provider: Option<Provider>) {
        with_inner!(self, e => e.provider = provider)
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.set_provider(Some(provider));
        self
    }

    pub fn event_created_on(&self) -> Option<u64> {
        with_inner!(self, e => e.event_created_on)
    }

    pub fn change(&self) -> Option<&Change> {
        match self {
            GerritEvent::ChangeAbandoned(e) => e.change.as_ref(),
            GerritEvent::ChangeMerged(e) => e.change.as_ref(),
            GerritEvent::ChangeRestored(e) => e.change.as_ref(),
            GerritEvent::CommentAdded(e) => e.change.as_ref(),
            GerritEvent::DraftPublished(e) => e.change.as_ref(),
            GerritEvent::PatchsetCreated(e) => e.change.as_ref(),
            GerritEvent::ReviewerAdded(e) => e.change.as_ref(),
            GerritEvent::TopicChanged(e) => e.change.as_ref(),
            GerritEvent::RefUpdated(_)
            | GerritEvent::RefReplicated(_)
            | GerritEvent::RefReplicationDone(_) => None,
        }
    }

    pub fn patch_set(&self) -> Option<&PatchSet> {
        match self {
            GerritEvent::ChangeAbandoned(e) => e.patch_set.as_ref(),
            GerritEvent::ChangeMerged(e) => e.patch_set.as_ref(),
            GerritEvent::ChangeRestored(e) => e.patch_set.as_ref(),
            GerritEvent::CommentAdded(e) => e.patch_set.as_ref(),
            GerritEvent::DraftPublished(e) => e.patch_set.as_ref(),
            GerritEvent::PatchsetCreated(e) => e.patch_set.as_ref(),
            GerritEvent::ReviewerAdded(e) => e.patch_set.as_ref(),
            GerritEvent::TopicChanged(_)
            | GerritEvent::RefUpdated(_)
            | GerritEvent::RefReplicated(_)
            | GerritEvent::RefReplicationDone(_) => None,
        }
    }

    /// The user who caused the event, when Gerrit reports one.
    pub fn account(&self) -> Option<&Account> {
        match self {
            GerritEvent::ChangeAbandoned(e) => e.abandoner.as_ref(),
            GerritEvent::ChangeMerged(e) => e.submitter.as_ref(),
            GerritEvent::ChangeRestored(e) => e.restorer.as_ref(),
            GerritEvent::CommentAdded(e) => e.author.as_ref(),
            GerritEvent::DraftPublished(e) => e.uploader.as_ref(),
            GerritEvent::PatchsetCreated(e) => e.uploader.as_ref(),
            GerritEvent::RefUpdated(e) => e.submitter.as_ref(),
            GerritEvent::ReviewerAdded(e) => e.reviewer.as_ref(),
            GerritEvent::TopicChanged(e) => e.changer.as_ref(),
            GerritEvent::RefReplicated(_) | GerritEvent::RefReplicationDone(_) => None,
        }
    }
}

impl fmt::Display for GerritEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())?;
        if let Some(number) = self.change().and_then(|c| c.number) {
            write!(f, " change {number}")?;
            if let Some(ps) = self.patch_set().and_then(|p| p.number) {
                write!(f, "/{ps}")?;
            }
        }
        if let Some(provider) = self.provider() {
            write!(f, " from {provider}")?;
        }
        Ok(())
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for GerritEvent {
                fn from(event: $variant) -> Self {
                    GerritEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_variant!(
    ChangeAbandoned,
    ChangeMerged,
    ChangeRestored,
    CommentAdded,
    DraftPublished,
    PatchsetCreated,
    RefUpdated,
    ReviewerAdded,
    TopicChanged,
    RefReplicated,
    RefReplicationDone,
);
