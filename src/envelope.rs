use crate::{Meta, WorkItem};

/// A work item plus the metadata it travels with through the queue.
///
/// - `item`: the payload a worker will normalise and dispatch.
/// - `meta`: [`Meta`] identifying the submission in log records.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub meta: Meta,
    pub item: WorkItem,
}

impl Envelope {
    pub fn new(item: WorkItem) -> Self {
        Self {
            meta: Meta::new(),
            item,
        }
    }
}

impl From<WorkItem> for Envelope {
    fn from(item: WorkItem) -> Self {
        Envelope::new(item)
    }
}
