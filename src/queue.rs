use std::sync::atomic::{AtomicIsize, Ordering};

use tokio::{
    select,
    sync::{
        Mutex,
        mpsc::{
            self, Receiver, Sender, UnboundedReceiver, UnboundedSender, error::TrySendError,
        },
    },
};
use tokio_util::sync::CancellationToken;

use crate::{Envelope, Error, Result};

enum WorkSender {
    Bounded(Sender<Envelope>),
    Unbounded(UnboundedSender<Envelope>),
}

enum WorkReceiver {
    Bounded(Receiver<Envelope>),
    Unbounded(UnboundedReceiver<Envelope>),
}

impl WorkReceiver {
    async fn recv(&mut self) -> Option<Envelope> {
        match self {
            WorkReceiver::Bounded(rx) => rx.recv().await,
            WorkReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn try_recv(&mut self) -> Option<Envelope> {
        match self {
            WorkReceiver::Bounded(rx) => rx.try_recv().ok(),
            WorkReceiver::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// The single FIFO shared by every producer and every worker.
///
/// Producers [`push`](WorkQueue::push); workers [`pull`](WorkQueue::pull).
/// Pulls are serialized through a fair lock, so items leave the queue in
/// the order their pushes completed and each item is handed to exactly one
/// puller. Nothing is persisted: whatever is still queued when the last
/// worker stops stays here until the queue is dropped.
pub struct WorkQueue {
    sender: WorkSender,
    receiver: Mutex<WorkReceiver>,
    capacity: Option<usize>,
    // Counted after a send lands and before a pull returns, so it may dip
    // below zero for an instant; `len` clamps.
    queued: AtomicIsize,
}

/// Logs the envelope loss when a push waiting for capacity is dropped by
/// its caller.
struct WaitGuard<'a> {
    work_id: &'a str,
    armed: bool,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                work_id = self.work_id,
                "Work item dropped while waiting for queue capacity"
            );
        }
    }
}

impl WorkQueue {
    /// A queue holding at most `capacity` items, or unbounded for `None`.
    ///
    /// Fails with [`Error::InvalidConfig`] for a capacity of zero.
    pub fn new(capacity: Option<usize>) -> Result<Self> {
        let (sender, receiver) = match capacity {
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "queue capacity must be greater than zero",
                ));
            }
            Some(size) => {
                let (tx, rx) = mpsc::channel(size);
                (WorkSender::Bounded(tx), WorkReceiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (WorkSender::Unbounded(tx), WorkReceiver::Unbounded(rx))
            }
        };
        Ok(Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
            queued: AtomicIsize::new(0),
        })
    }

    /// Enqueue an envelope.
    ///
    /// Only waits when a bounded queue is full. A wait is abandoned with
    /// [`Error::Interrupted`] as soon as `interrupt` is cancelled; the
    /// envelope is dropped in that case. Dropping the returned future
    /// while it waits also drops the envelope, with a warning.
    pub async fn push(&self, envelope: Envelope, interrupt: &CancellationToken) -> Result<()> {
        match &self.sender {
            WorkSender::Unbounded(tx) => tx.send(envelope).map_err(|_| Error::QueueClosed)?,
            WorkSender::Bounded(tx) => match tx.try_send(envelope) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => return Err(Error::QueueClosed),
                Err(TrySendError::Full(envelope)) => {
                    tracing::trace!("work queue full, waiting for capacity");
                    let work_id = envelope.meta.short_id();
                    let mut guard = WaitGuard {
                        work_id: &work_id,
                        armed: true,
                    };
                    let result = select! {
                        biased;
                        _ = interrupt.cancelled() => Err(Error::Interrupted),
                        res = tx.send(envelope) => res.map_err(|_| Error::QueueClosed),
                    };
                    guard.armed = false;
                    result?
                }
            },
        }
        self.queued.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Wait for the next envelope.
    ///
    /// Cancel safe: dropping the future before it completes loses nothing.
    pub async fn pull(&self) -> Option<Envelope> {
        let mut receiver = self.receiver.lock().await;
        let envelope = receiver.recv().await;
        if envelope.is_some() {
            self.queued.fetch_sub(1, Ordering::AcqRel);
        }
        envelope
    }

    /// Take the next envelope if one is ready and no other puller is waiting.
    pub fn try_pull(&self) -> Option<Envelope> {
        let mut receiver = self.receiver.try_lock().ok()?;
        let envelope = receiver.try_recv();
        if envelope.is_some() {
            self.queued.fetch_sub(1, Ordering::AcqRel);
        }
        envelope
    }

    /// Number of envelopes queued and not yet pulled. Producers still
    /// waiting for capacity are not counted.
    pub fn len(&self) -> usize {
        usize::try_from(self.queued.load(Ordering::Acquire)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("capacity", &self.capacity)
            .field("pending", &self.len())
            .finish()
    }
}
