use std::{collections::HashMap, sync::RwLock};

use crate::GerritEvent;

/// Per-provider email whose `comment-added` events are dropped.
///
/// A client that posts review comments back to Gerrit receives its own
/// comments on the stream; registering the client's email here stops
/// those from being dispatched again. Entries are keyed by provider name,
/// at most one per provider, and the last write wins.
#[derive(Debug, Default)]
pub struct SuppressionTable {
    ignored: RwLock<HashMap<String, String>>,
}

impl SuppressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ignored email for `provider`, or clear it with `None`.
    pub fn set_ignore_email(&self, provider: &str, email: Option<&str>) {
        let mut ignored = self.ignored.write().unwrap_or_else(|e| e.into_inner());
        match email {
            Some(email) => {
                ignored.insert(provider.to_string(), email.to_string());
            }
            None => {
                ignored.remove(provider);
            }
        }
    }

    pub fn ignore_email(&self, provider: &str) -> Option<String> {
        self.ignored
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(provider)
            .cloned()
    }

    /// Whether `event` is a comment authored by its provider's ignored email.
    ///
    /// Only `comment-added` events are ever suppressed. The comparison is
    /// exact and case-sensitive; an event without an author email or
    /// without a provider is never suppressed.
    pub fn should_suppress(&self, event: &GerritEvent) -> bool {
        let GerritEvent::CommentAdded(comment) = event else {
            return false;
        };
        let Some(email) = comment.author.as_ref().and_then(|a| a.email.as_deref()) else {
            return false;
        };
        let Some(provider) = comment.provider.as_ref() else {
            return false;
        };
        self.ignored
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&provider.name)
            .is_some_and(|ignored| ignored == email)
    }

    pub fn len(&self) -> usize {
        self.ignored.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
