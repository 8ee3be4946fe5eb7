use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc::error::TryRecvError;

use crate::log_feed::emitter::JsonLinesEmitter;

use super::*;

struct RecordingEmitter {
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: &str, entry: &LogEntry) {
        self.seen
            .lock()
            .unwrap()
            .push((event.to_owned(), entry.message.clone()));
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn wait_for_subscribers(feed: &LogFeed, expected: usize) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while feed.subscriber_count() != expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[test]
fn get_logs_keeps_insertion_order() {
    let feed = LogFeed::new();
    feed.info("Checking if recipients are valid");
    feed.error("Entry at index: 1 is invalid");
    feed.warning("almost done");

    let logs = feed.get_logs();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].message, "Checking if recipients are valid");
    assert_eq!(logs[0].log_type, LogType::Info);
    assert_eq!(logs[1].log_type, LogType::Error);
    assert_eq!(logs[2].log_type, LogType::Warning);
}

#[test]
fn get_logs_is_a_snapshot() {
    let feed = LogFeed::new();
    feed.info("first");
    let snapshot = feed.get_logs();
    feed.info("second");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(feed.len(), 2);
}

#[test]
fn log_entry_uses_front_end_keys() {
    let entry = LogEntry {
        timestamp: "2024-01-01T10:00:00Z".to_owned(),
        message: "Check was successful".to_owned(),
        log_type: LogType::Warning,
    };
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "timestamp": "2024-01-01T10:00:00Z",
            "message": "Check was successful",
            "type": "warning",
        })
    );
}

#[test]
fn log_entry_timestamp_is_rfc3339() {
    let entry = LogEntry::now("hello", LogType::Info);
    assert!(chrono::DateTime::parse_from_rfc3339(&entry.timestamp).is_ok());
}

#[test]
fn every_entry_is_emitted_as_new_log() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let feed = LogFeed::with_emitter(RecordingEmitter { seen: seen.clone() });
    feed.info("one");
    feed.error("two");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("newLog".to_owned(), "one".to_owned()),
            ("newLog".to_owned(), "two".to_owned())
        ]
    );
}

#[test]
fn json_lines_emitter_writes_one_event_per_line() {
    let emitter = JsonLinesEmitter::new(Vec::new());
    emitter.emit(NEW_LOG_EVENT, &LogEntry::now("first", LogType::Info));
    emitter.emit(NEW_LOG_EVENT, &LogEntry::now("second", LogType::Error));

    let written = String::from_utf8(emitter.into_inner()).unwrap();
    let lines = written.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["event"], "newLog");
    assert_eq!(second["payload"]["message"], "second");
    assert_eq!(second["payload"]["type"], "error");
}

#[tokio::test]
async fn emitter_keeps_entries_a_lagging_subscriber_misses() {
    let buffer = SharedBuffer::default();
    let feed = Arc::new(LogFeed::with_emitter(JsonLinesEmitter::new(buffer.clone())));
    let _lagging = feed.subscribe(CancellationToken::new());

    for i in 0..SUBSCRIBER_BUFFER + 5 {
        feed.info(format!("entry {}", i));
    }

    let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let lines = written.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), SUBSCRIBER_BUFFER + 5);
    let last: serde_json::Value = serde_json::from_str(lines[SUBSCRIBER_BUFFER + 4]).unwrap();
    assert_eq!(last["payload"]["message"], format!("entry {}", SUBSCRIBER_BUFFER + 4));
}

#[tokio::test]
async fn subscriber_receives_only_new_entries() {
    let feed = Arc::new(LogFeed::new());
    feed.info("before");

    let mut subscription = feed.subscribe(CancellationToken::new());
    feed.info("after");

    let entry = subscription.recv().await.unwrap();
    assert_eq!(entry.message, "after");
    assert!(matches!(
        subscription.receiver.try_recv(),
        Err(TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn every_subscriber_gets_every_entry() {
    let feed = Arc::new(LogFeed::new());
    let mut first = feed.subscribe(CancellationToken::new());
    let mut second = feed.subscribe(CancellationToken::new());
    assert_ne!(first.id, second.id);
    assert_eq!(feed.subscriber_count(), 2);

    feed.info("Email sent to a@b.com successfully");

    assert_eq!(
        first.recv().await.unwrap().message,
        "Email sent to a@b.com successfully"
    );
    assert_eq!(
        second.recv().await.unwrap().message,
        "Email sent to a@b.com successfully"
    );
}

#[tokio::test]
async fn full_subscriber_does_not_block_the_feed() {
    let feed = Arc::new(LogFeed::new());
    let mut lagging = feed.subscribe(CancellationToken::new());

    for i in 0..SUBSCRIBER_BUFFER + 5 {
        feed.info(format!("entry {}", i));
    }

    assert_eq!(feed.len(), SUBSCRIBER_BUFFER + 5);
    for i in 0..SUBSCRIBER_BUFFER {
        assert_eq!(
            lagging.receiver.try_recv().unwrap().message,
            format!("entry {}", i)
        );
    }
    assert!(matches!(
        lagging.receiver.try_recv(),
        Err(TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn cancelled_subscriber_is_removed() {
    let feed = Arc::new(LogFeed::new());
    let cancel = CancellationToken::new();
    let mut subscription = feed.subscribe(cancel.clone());
    let _other = feed.subscribe(CancellationToken::new());

    feed.info("buffered");
    cancel.cancel();
    wait_for_subscribers(&feed, 1).await;

    feed.info("not delivered");
    assert_eq!(subscription.recv().await.unwrap().message, "buffered");
    assert!(subscription.recv().await.is_none());
}

#[tokio::test]
async fn child_token_cancellation_removes_subscriber() {
    let feed = Arc::new(LogFeed::new());
    let shutdown = CancellationToken::new();
    let _subscription = feed.subscribe(shutdown.child_token());

    shutdown.cancel();
    wait_for_subscribers(&feed, 0).await;
}

#[tokio::test]
async fn unsubscribe_reports_presence() {
    let feed = Arc::new(LogFeed::new());
    let mut subscription = feed.subscribe(CancellationToken::new());

    assert!(feed.unsubscribe(subscription.id));
    assert!(!feed.unsubscribe(subscription.id));
    assert!(subscription.recv().await.is_none());
}

#[tokio::test]
async fn dropped_subscription_is_removed_on_next_entry() {
    let feed = Arc::new(LogFeed::new());
    let subscription = feed.subscribe(CancellationToken::new());
    let mut kept = feed.subscribe(CancellationToken::new());
    assert_eq!(feed.subscriber_count(), 2);

    drop(subscription);
    feed.info("after drop");

    assert_eq!(feed.subscriber_count(), 1);
    assert_eq!(kept.recv().await.unwrap().message, "after drop");
}
