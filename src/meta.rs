use std::time::SystemTime;

use uuid::Uuid;

use crate::WorkId;

/// Metadata attached to every queued work item.
///
/// - `id`: unique identifier, carried in log records from submission to dispatch.
/// - `enqueued_at`: submission time in nanoseconds since Unix epoch (truncated to `u64`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    id: WorkId,
    enqueued_at: u64,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().as_u128(),
            enqueued_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
        }
    }

    pub fn id(&self) -> WorkId {
        self.id
    }

    /// Short hex form of the id for log fields.
    pub fn short_id(&self) -> String {
        format!("{:08x}", (self.id >> 96) as u32)
    }

    pub fn enqueued_at(&self) -> u64 {
        self.enqueued_at
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}
