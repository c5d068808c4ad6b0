use serde::Deserialize;

use super::attr::{Account, Approval, Change, PatchSet, Provider, RefUpdate};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeAbandoned {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub abandoner: Option<Account>,
    pub reason: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeMerged {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub submitter: Option<Account>,
    pub new_rev: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeRestored {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub restorer: Option<Account>,
    pub reason: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

/// A review comment, optionally with label votes.
///
/// This is the only event subject to ignore-email suppression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentAdded {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub author: Option<Account>,
    pub approvals: Vec<Approval>,
    pub comment: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

impl CommentAdded {
    /// Vote value for the given label, e.g. `"Code-Review"`.
    pub fn approval(&self, label: &str) -> Option<&str> {
        self.approvals
            .iter()
            .find(|a| a.label.as_deref() == Some(label))
            .and_then(|a| a.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftPublished {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub uploader: Option<Account>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchsetCreated {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub uploader: Option<Account>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefUpdated {
    pub submitter: Option<Account>,
    pub ref_update: Option<RefUpdate>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewerAdded {
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub reviewer: Option<Account>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopicChanged {
    pub change: Option<Change>,
    pub changer: Option<Account>,
    pub old_topic: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

/// Sent by the replication plugin once per target node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefReplicated {
    pub project: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub target_node: Option<String>,
    pub status: Option<String>,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefReplicationDone {
    pub project: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub nodes_count: u32,
    pub event_created_on: Option<u64>,
    #[serde(skip)]
    pub provider: Option<Provider>,
}
