use std::sync::Arc;

use gerrit_events::*;

// A listener that only cares about votes, everything else is just printed.
struct VotePrinter;

impl EventListener for VotePrinter {
    fn on_event(&self, event: &GerritEvent) -> Result<()> {
        println!("event: {event}");
        Ok(())
    }

    fn on_comment_added(&self, event: &CommentAdded) -> Result<Handled> {
        let Some(vote) = event.approval("Code-Review") else {
            return Ok(Handled::No);
        };
        let author = event.author.as_ref().map(ToString::to_string).unwrap_or_default();
        println!("Code-Review {vote} by {author}");
        Ok(Handled::Yes)
    }
}

const STREAM: &[&str] = &[
    r#"{"type":"patchset-created","change":{"project":"demo","number":1},"patchSet":{"number":1},"uploader":{"name":"Alice","email":"alice@example.com"}}"#,
    r#"{"type":"comment-added","change":{"project":"demo","number":1},"author":{"name":"CI","email":"ci@example.com"},"approvals":[{"type":"Verified","value":"1"}],"comment":"Build started"}"#,
    r#"{"type":"comment-added","change":{"project":"demo","number":1},"author":{"name":"Bob","email":"bob@example.com"},"approvals":[{"type":"Code-Review","value":"2"}]}"#,
    r#"{"type":"project-created","projectName":"ignored"}"#,
    r#"{"type":"change-merged","change":{"project":"demo","number":1},"submitter":{"name":"Bob"},"newRev":"c0ffee"}"#,
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let handler = GerritHandler::new(Config::default().with_worker_count(1))?;
    handler.add_listener(Arc::new(VotePrinter));

    // Our own CI account's comments are not interesting.
    handler.set_ignore_email("review", Some("ci@example.com"));

    let provider = Provider::new("review").with_host("review.example.com", 29418);
    for line in STREAM {
        handler.submit_text(*line, Some(provider.clone())).await;
    }

    // Let the worker drain the queue before stopping it.
    while handler.pending_work() > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    handler.shutdown(true).await
}
