//! End-to-end tests of the event hub: submit on one side, listeners on the other.

mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use common::{Recorder, assert_silent, comment_line, init_tracing, next};
use gerrit_events::{
    Config, Error, GerritEvent, GerritHandler, ListenerHandle, PatchsetCreated, Provider,
    RefUpdated, State, from_fn,
};
use serde_json::json;

fn change_number(event: &GerritEvent) -> Option<u64> {
    event.change().and_then(|c| c.number)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_text_is_parsed_and_dispatched() {
    init_tracing();
    let handler = GerritHandler::new(Config::default()).unwrap();
    let (recorder, mut rx) = Recorder::new();
    assert!(handler.add_listener(recorder.clone()));

    let provider = Provider::new("review").with_host("review.example.com", 29418);
    handler
        .submit_text(comment_line(42, "dev@example.com"), Some(provider.clone()))
        .await;

    let (how, event) = next(&mut rx).await;
    assert_eq!(how, "generic");
    assert_eq!(event.kind(), "comment-added");
    assert_eq!(change_number(&event), Some(42));
    assert_eq!(event.provider(), Some(&provider));

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_object_is_dispatched() {
    let handler = GerritHandler::new(Config::default()).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    handler
        .submit_json(
            json!({
                "type": "change-merged",
                "change": {"project": "p", "number": 7},
                "submitter": {"name": "S", "email": "s@example.com"},
                "newRev": "abc123"
            }),
            None,
        )
        .await;

    let (_, event) = next(&mut rx).await;
    let GerritEvent::ChangeMerged(merged) = &event else {
        panic!("unexpected event {event}");
    };
    assert_eq!(merged.new_rev.as_deref(), Some("abc123"));
    assert!(event.provider().is_none());

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_specific_handler_preferred() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let (recorder, mut rx) = Recorder::with_comment_handler();
    handler.add_listener(recorder);

    handler
        .submit_text(comment_line(1, "dev@example.com"), None)
        .await;
    handler.submit_event(PatchsetCreated::default().into()).await;

    assert_eq!(next(&mut rx).await.0, "comment-added");
    let (how, event) = next(&mut rx).await;
    assert_eq!(how, "generic");
    assert_eq!(event.kind(), "patchset-created");

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_worker_keeps_submission_order() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    for n in 1..=20 {
        handler.submit_text(comment_line(n, "dev@example.com"), None).await;
    }
    for n in 1..=20 {
        let (_, event) = next(&mut rx).await;
        assert_eq!(change_number(&event), Some(n as u64));
    }

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_item_dispatched_once_with_many_workers() {
    let handler = GerritHandler::new(Config::default().with_worker_count(4)).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    for n in 0..100 {
        handler.submit_text(comment_line(n, "dev@example.com"), None).await;
    }
    let mut seen = Vec::new();
    for _ in 0..100 {
        let (_, event) = next(&mut rx).await;
        seen.extend(change_number(&event));
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..100).collect::<Vec<u64>>());
    assert_silent(&mut rx).await;

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_suppressed_comments_reach_no_listener() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);
    handler.set_ignore_email("review", Some("bot@example.com"));
    assert_eq!(handler.ignore_email("review").as_deref(), Some("bot@example.com"));

    let review = Some(Provider::new("review"));
    let other = Some(Provider::new("other"));
    handler
        .submit_text(comment_line(1, "bot@example.com"), review.clone())
        .await;
    handler
        .submit_text(comment_line(2, "dev@example.com"), review.clone())
        .await;
    handler
        .submit_text(comment_line(3, "bot@example.com"), other)
        .await;

    assert_eq!(change_number(&next(&mut rx).await.1), Some(2));
    assert_eq!(change_number(&next(&mut rx).await.1), Some(3));
    assert_silent(&mut rx).await;

    handler.set_ignore_email("review", None);
    handler
        .submit_text(comment_line(4, "bot@example.com"), review)
        .await;
    assert_eq!(change_number(&next(&mut rx).await.1), Some(4));

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_double_add_delivers_once() {
    let handler = GerritHandler::new(Config::default()).unwrap();
    let (recorder, mut rx) = Recorder::new();
    assert!(handler.add_listener(recorder.clone()));
    assert!(!handler.add_listener(recorder.clone()));
    assert_eq!(handler.listener_count(), 1);

    handler.submit_event(RefUpdated::default().into()).await;
    next(&mut rx).await;
    assert_silent(&mut rx).await;

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_listeners() {
    let handler = GerritHandler::new(Config::default()).unwrap();
    let (first, mut first_rx) = Recorder::new();
    let (second, mut second_rx) = Recorder::new();
    handler.add_listeners([
        ListenerHandle::from(first.clone()),
        ListenerHandle::from(second.clone()),
    ]);
    assert_eq!(handler.listener_count(), 2);

    assert!(handler.remove_listener(first.clone()));
    assert!(!handler.remove_listener(first.clone()));
    handler.submit_event(RefUpdated::default().into()).await;
    next(&mut second_rx).await;
    assert_silent(&mut first_rx).await;

    let removed = handler.remove_all_listeners();
    assert_eq!(removed.len(), 1);
    assert!(removed.iter().any(|l| l.is(&second)));
    assert_eq!(handler.listener_count(), 0);

    handler.submit_event(RefUpdated::default().into()).await;
    assert_silent(&mut second_rx).await;

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_listener_does_not_block_others() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    handler.add_listener(from_fn("failing", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(Error::external("listener failed"))
    }));
    handler.add_listener(from_fn("panicking", |_| panic!("listener bug")));
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    handler.submit_event(PatchsetCreated::default().into()).await;
    handler.submit_event(RefUpdated::default().into()).await;

    assert_eq!(next(&mut rx).await.1.kind(), "patchset-created");
    assert_eq!(next(&mut rx).await.1.kind(), "ref-updated");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(handler.listener_count(), 3);

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_payloads_are_dropped() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    handler.submit_text("", None).await;
    handler.submit_text("garbage", None).await;
    handler
        .submit_text(r#"{"type":"project-created","projectName":"p"}"#, None)
        .await;
    handler
        .submit_text(r#"{"type":"comment-added","change":{"number":"NaN"}}"#, None)
        .await;
    handler.submit_text(comment_line(9, "dev@example.com"), None).await;

    let (_, event) = next(&mut rx).await;
    assert_eq!(change_number(&event), Some(9));
    assert_silent(&mut rx).await;

    handler.shutdown(true).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nothing_dispatched_after_shutdown() {
    let handler = GerritHandler::new(Config::default()).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    handler.shutdown(true).await.unwrap();
    assert_eq!(handler.state(), State::ShutDown);
    assert!(!handler.is_running());
    assert_eq!(handler.running_workers(), 0);

    handler.submit_event(PatchsetCreated::default().into()).await;
    assert_eq!(handler.pending_work(), 1);
    assert_silent(&mut rx).await;

    handler.shutdown(false).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_interrupts_blocked_producer() {
    let handler = Arc::new(
        GerritHandler::new(Config::default().with_worker_count(0).with_queue_capacity(1))
            .unwrap(),
    );
    handler.submit_event(PatchsetCreated::default().into()).await;
    assert_eq!(handler.pending_work(), 1);

    let producer = tokio::spawn({
        let handler = handler.clone();
        async move { handler.submit_event(RefUpdated::default().into()).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!producer.is_finished());

    handler.shutdown(false).await.unwrap();
    tokio::time::timeout(common::WAIT, producer)
        .await
        .expect("producer still blocked")
        .unwrap();
    assert_eq!(handler.pending_work(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_count_setter_does_not_resize() {
    let handler = GerritHandler::new(Config::default()).unwrap();
    assert_eq!(handler.worker_count(), 3);
    assert_eq!(handler.running_workers(), 3);

    handler.set_worker_count(8);
    assert_eq!(handler.worker_count(), 8);
    assert_eq!(handler.running_workers(), 3);

    handler.shutdown(true).await.unwrap();
    assert_eq!(handler.worker_count(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_custom_coordinator_loop() {
    let handler = GerritHandler::new(Config::default().with_worker_count(0)).unwrap();
    let (recorder, mut rx) = Recorder::new();
    handler.add_listener(recorder);

    handler.submit_event(PatchsetCreated::default().into()).await;
    let coordinator = handler.coordinator();
    let envelope = coordinator.work_queue().try_pull().expect("queued item");
    let event = envelope
        .item
        .into_event(&gerrit_events::JsonEventParser)
        .unwrap()
        .unwrap();
    coordinator.notify(event);

    assert_eq!(next(&mut rx).await.1.kind(), "patchset-created");
    handler.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_abandoned_submit_leaves_no_pending_work() {
    let handler =
        GerritHandler::new(Config::default().with_worker_count(0).with_queue_capacity(1))
            .unwrap();
    handler.submit_event(PatchsetCreated::default().into()).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        handler.submit_event(RefUpdated::default().into()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(handler.pending_work(), 1);

    let envelope = handler.coordinator().work_queue().try_pull();
    assert!(envelope.is_some());
    assert_eq!(handler.pending_work(), 0);
    assert!(handler.coordinator().work_queue().try_pull().is_none());
}

#[tokio::test]
async fn test_blocking_listeners_run_in_parallel() {
    let handler = GerritHandler::new(Config::default().with_worker_count(2)).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handler.add_listener(from_fn("slow", move |event| {
        std::thread::sleep(Duration::from_millis(400));
        let _ = tx.send(event.kind());
        Ok(())
    }));

    let started = Instant::now();
    handler.submit_event(PatchsetCreated::default().into()).await;
    handler.submit_event(RefUpdated::default().into()).await;

    let mut kinds = Vec::new();
    for _ in 0..2 {
        let kind = tokio::time::timeout(common::WAIT, rx.recv())
            .await
            .expect("timed out waiting for the slow listener")
            .expect("listener dropped");
        kinds.push(kind);
    }
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(750), "took {elapsed:?}");
    kinds.sort_unstable();
    assert_eq!(kinds, vec!["patchset-created", "ref-updated"]);

    handler.shutdown(true).await.unwrap();
}

#[tokio::test]
async fn test_producer_not_stalled_by_blocking_listener() {
    let handler = GerritHandler::new(Config::default().with_worker_count(1)).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handler.add_listener(from_fn("slow", move |event| {
        std::thread::sleep(Duration::from_millis(300));
        let _ = tx.send(event.kind());
        Ok(())
    }));

    handler.submit_event(PatchsetCreated::default().into()).await;
    // Let the worker pick the first event up and block in the listener.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    handler.submit_event(RefUpdated::default().into()).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(started.elapsed() < Duration::from_millis(200));

    for _ in 0..2 {
        tokio::time::timeout(common::WAIT, rx.recv())
            .await
            .unwrap()
            .unwrap();
    }
    handler.shutdown(true).await.unwrap();
}
