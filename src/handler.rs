use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Coordinator, Dispatcher, Envelope, EventParser, GerritEvent, JsonEventParser,
    ListenerHandle, Provider, Result, Snapshot, WorkItem, WorkQueue, internal::Worker,
};

/// Lifecycle of a [`GerritHandler`].
///
/// Construction starts the workers, so a handler is `Running` from the
/// moment it exists. Shutting down is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    ShutDown,
}

struct Shared {
    queue: WorkQueue,
    dispatcher: Dispatcher,
}

impl Coordinator for Shared {
    fn work_queue(&self) -> &WorkQueue {
        &self.queue
    }

    fn notify(&self, event: GerritEvent) {
        self.dispatcher.notify(event);
    }
}

struct Lifecycle {
    state: State,
    workers: Vec<JoinHandle<()>>,
}

/// The event hub: owns the work queue, the worker pool, the listener
/// registry and the suppression table.
///
/// - Producers feed it with `submit_text`, `submit_json` and `submit_event`.
/// - Clients register with `add_listener` and friends.
/// - Workers, started on construction, drain the queue and dispatch.
/// - `shutdown` stops the workers for good.
///
/// Every method takes `&self`, so the handler can be shared behind an
/// `Arc` between the stream reader, the listeners' owners and whoever
/// shuts it down.
///
/// # Examples
///
/// ```rust,no_run
/// use gerrit_events::{Config, GerritHandler, Provider, from_fn};
///
/// # async fn example() -> gerrit_events::Result<()> {
/// let handler = GerritHandler::new(Config::default())?;
/// handler.add_listener(from_fn("printer", |event| {
///     println!("{event}");
///     Ok(())
/// }));
/// handler.set_ignore_email("review", Some("ci-bot@example.com"));
///
/// let provider = Provider::new("review");
/// handler
///     .submit_text(r#"{"type":"patchset-created"}"#, Some(provider))
///     .await;
///
/// handler.shutdown(true).await?;
/// # Ok(())
/// # }
/// ```
pub struct GerritHandler {
    config: Config,
    worker_count: AtomicUsize,
    shared: Arc<Shared>,
    cancel_token: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
}

impl GerritHandler {
    /// Create a handler and start `config.worker_count` workers using the
    /// JSON stream-events parser.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_parser(config, JsonEventParser)
    }

    /// Like [`new`](GerritHandler::new) with a custom parser for raw payloads.
    pub fn with_parser<P: EventParser>(config: Config, parser: P) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()?;

        let shared = Arc::new(Shared {
            queue: WorkQueue::new(config.queue_capacity)?,
            dispatcher: Dispatcher::new(),
        });
        let parser: Arc<dyn EventParser> = Arc::new(parser);
        let cancel_token = CancellationToken::new();

        let workers = (0..config.worker_count)
            .map(|i| {
                let worker = Worker {
                    name: Arc::from(format!("{}-{}", config.worker_name_prefix, i)),
                    coordinator: shared.clone(),
                    parser: parser.clone(),
                    cancel_token: cancel_token.child_token(),
                };
                runtime.spawn(worker.run())
            })
            .collect();

        tracing::info!(
            workers = config.worker_count,
            queue_capacity = ?config.queue_capacity,
            "Gerrit event handler started"
        );

        Ok(Self {
            worker_count: AtomicUsize::new(config.worker_count),
            config,
            shared,
            cancel_token,
            lifecycle: Mutex::new(Lifecycle {
                state: State::Running,
                workers,
            }),
        })
    }

    /// Queue one line of `stream-events` output.
    pub async fn submit_text(&self, payload: impl Into<String>, provider: Option<Provider>) {
        let payload = payload.into();
        tracing::debug!(payload = %payload, "Trigger event string");
        self.submit(WorkItem::Text { payload, provider }).await;
    }

    /// Queue a stream-events JSON object.
    pub async fn submit_json(&self, payload: serde_json::Value, provider: Option<Provider>) {
        tracing::debug!(payload = %payload, "Trigger event json object");
        self.submit(WorkItem::Json { payload, provider }).await;
    }

    /// Queue an already built event, to be dispatched as if it came from
    /// the stream.
    pub async fn submit_event(&self, event: GerritEvent) {
        tracing::debug!(event = %event, "Internally trigger event");
        self.submit(WorkItem::Event(event)).await;
    }

    /// Never fails: when the item cannot be queued it is dropped and a
    /// warning is logged.
    async fn submit(&self, item: WorkItem) {
        let envelope = Envelope::new(item);
        let work_id = envelope.meta.short_id();
        tracing::trace!(work_id, "putting work on queue");
        if let Err(err) = self.shared.queue.push(envelope, &self.cancel_token).await {
            tracing::warn!(
                work_id,
                error = %err,
                "Work item dropped while putting it on the queue"
            );
        }
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add_listener(&self, listener: impl Into<ListenerHandle>) -> bool {
        self.shared.dispatcher.registry().add(listener.into())
    }

    /// Register several listeners at once, returning how many were new.
    pub fn add_listeners<I>(&self, listeners: I) -> usize
    where
        I: IntoIterator<Item = ListenerHandle>,
    {
        self.shared.dispatcher.registry().add_all(listeners)
    }

    pub fn remove_listener(&self, listener: impl Into<ListenerHandle>) -> bool {
        self.shared.dispatcher.registry().remove(&listener.into())
    }

    /// Remove every listener and return those that were registered.
    pub fn remove_all_listeners(&self) -> HashSet<ListenerHandle> {
        self.shared.dispatcher.registry().remove_all()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.dispatcher.registry().len()
    }

    /// Read-only view of the listeners registered right now.
    pub fn listeners(&self) -> Snapshot {
        self.shared.dispatcher.registry().snapshot()
    }

    /// Ignore `comment-added` events from `email` on the given provider;
    /// `None` removes the entry.
    pub fn set_ignore_email(&self, provider: &str, email: Option<&str>) {
        self.shared
            .dispatcher
            .suppression()
            .set_ignore_email(provider, email);
    }

    pub fn ignore_email(&self, provider: &str) -> Option<String> {
        self.shared.dispatcher.suppression().ignore_email(provider)
    }

    /// The pull/push seam for embedders driving their own worker loops.
    pub fn coordinator(&self) -> Arc<dyn Coordinator> {
        self.shared.clone()
    }

    /// Configured number of workers.
    pub fn worker_count(&self) -> usize {
        self.worker_count.load(Ordering::Relaxed)
    }

    /// Store a new worker count.
    ///
    /// Running workers are neither started nor stopped; the value is only
    /// informative for whoever builds the next handler.
    pub fn set_worker_count(&self, count: usize) {
        let previous = self.worker_count.swap(count, Ordering::Relaxed);
        if previous != count {
            tracing::info!(
                previous,
                count,
                running = self.running_workers(),
                "Worker count changed; running workers are not resized"
            );
        }
    }

    /// Number of worker tasks owned by the handler. Zero after shutdown.
    pub fn running_workers(&self) -> usize {
        self.lock_lifecycle().workers.len()
    }

    /// Number of queued items not yet taken by a worker.
    pub fn pending_work(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn state(&self) -> State {
        self.lock_lifecycle().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == State::Running
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop all workers.
    ///
    /// With `join`, waits for each worker to finish the item it is
    /// dispatching; no listener is called after this returns. Without it,
    /// workers are only signalled. Items still queued are left untouched
    /// and are never dispatched. Calling it again is a no-op.
    ///
    /// Fails only if a worker task panicked.
    pub async fn shutdown(&self, join: bool) -> Result<()> {
        let workers = {
            let mut lifecycle = self.lock_lifecycle();
            if lifecycle.state == State::ShutDown {
                tracing::debug!("Gerrit event handler already shut down");
                return Ok(());
            }
            lifecycle.state = State::ShutDown;
            std::mem::take(&mut lifecycle.workers)
        };

        self.cancel_token.cancel();
        if !join {
            tracing::info!(pending = self.pending_work(), "Gerrit event handler signalled to stop");
            return Ok(());
        }

        let mut result = Ok(());
        for handle in workers {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Worker task failed");
                if result.is_ok() {
                    result = Err(err.into());
                }
            }
        }
        tracing::info!(pending = self.pending_work(), "Gerrit event handler shut down");
        result
    }

    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for GerritHandler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl std::fmt::Debug for GerritHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GerritHandler")
            .field("state", &self.state())
            .field("worker_count", &self.worker_count())
            .field("listeners", &self.listener_count())
            .field("queue", &self.shared.queue)
            .finish()
    }
}
