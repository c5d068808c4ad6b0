use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Workers need a Tokio runtime: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),

    #[error("Worker task join error: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),

    #[error("Couldn't parse event payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("The work queue has been closed.")]
    QueueClosed,

    #[error("Interrupted while waiting for work queue capacity.")]
    Interrupted,

    #[error("Error external to gerrit-events occurred: {0}")]
    External(Arc<str>),
}

impl Error {
    /// Wrap an error raised by listener or embedder code.
    pub fn external(msg: impl std::fmt::Display) -> Self {
        Error::External(Arc::from(msg.to_string()))
    }
}
