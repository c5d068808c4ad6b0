#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use gerrit_events::{CommentAdded, EventListener, GerritEvent, Handled, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(200);

/// Forwards every event it receives, tagged with how it was handled.
pub struct Recorder {
    tx: UnboundedSender<(&'static str, GerritEvent)>,
    comments_only: bool,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<(&'static str, GerritEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Self {
            tx,
            comments_only: false,
        });
        (recorder, rx)
    }

    /// A recorder with its own `comment-added` handler.
    pub fn with_comment_handler() -> (Arc<Self>, UnboundedReceiver<(&'static str, GerritEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Self {
            tx,
            comments_only: true,
        });
        (recorder, rx)
    }
}

impl EventListener for Recorder {
    fn on_event(&self, event: &GerritEvent) -> Result<()> {
        let _ = self.tx.send(("generic", event.clone()));
        Ok(())
    }

    fn on_comment_added(&self, event: &CommentAdded) -> Result<Handled> {
        if !self.comments_only {
            return Ok(Handled::No);
        }
        let _ = self.tx.send(("comment-added", event.clone().into()));
        Ok(Handled::Yes)
    }
}

pub async fn next(
    rx: &mut UnboundedReceiver<(&'static str, GerritEvent)>,
) -> (&'static str, GerritEvent) {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("recorder dropped")
}

pub async fn assert_silent(rx: &mut UnboundedReceiver<(&'static str, GerritEvent)>) {
    if let Ok(Some((how, event))) = tokio::time::timeout(QUIET, rx.recv()).await {
        panic!("unexpected {how} delivery of {event}");
    }
}

pub fn comment_line(number: u32, email: &str) -> String {
    format!(
        r#"{{"type":"comment-added","change":{{"project":"p","branch":"main","number":{number}}},"author":{{"name":"A","email":"{email}"}},"comment":"c{number}"}}"#
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
