use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use log::{debug, log};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{
    emitter::{EventEmitter, NoopEmitter, NEW_LOG_EVENT},
    models::{LogEntry, LogType},
};

/// How many entries a subscriber may fall behind before it starts losing them.
pub const SUBSCRIBER_BUFFER: usize = 100;

pub type SubscriptionId = u64;

/// Receiving half handed out by [`LogFeed::subscribe`].
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::Receiver<LogEntry>,
}

impl Subscription {
    /// Waits for the next entry. `None` once the subscription has been removed
    /// from the feed and everything buffered was read.
    pub async fn recv(&mut self) -> Option<LogEntry> {
        self.receiver.recv().await
    }
}

/// Append-only log store shared between the mailing pipeline and whatever
/// displays its progress.
///
/// Readers take a snapshot with [`LogFeed::get_logs`]; live listeners either
/// subscribe to a buffered channel or get pushed through the [`EventEmitter`].
/// Delivery to subscribers never blocks: a full channel just misses the entry.
pub struct LogFeed {
    logs: RwLock<Vec<LogEntry>>,
    subscriptions: RwLock<HashMap<SubscriptionId, mpsc::Sender<LogEntry>>>,
    next_id: AtomicU64,
    emitter: Box<dyn EventEmitter>,
}

impl Default for LogFeed {
    fn default() -> Self {
        LogFeed::new()
    }
}

impl LogFeed {
    pub fn new() -> Self {
        LogFeed::with_emitter(NoopEmitter)
    }

    pub fn with_emitter(emitter: impl EventEmitter + 'static) -> Self {
        LogFeed {
            logs: RwLock::new(Vec::new()),
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            emitter: Box::new(emitter),
        }
    }

    pub fn add_log(&self, message: impl Into<String>, log_type: LogType) {
        let entry = LogEntry::now(message, log_type);
        log!(log_type.level(), "{}", entry.message);

        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());

        /* Notify all subscribers */
        let mut gone = Vec::new();
        {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in subscriptions.iter() {
                match sender.try_send(entry.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!("Subscriber {} is full, skipping entry", id)
                    }
                    Err(TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }
        /* Receivers dropped without cancelling their token */
        for id in gone {
            self.unsubscribe(id);
        }

        self.emitter.emit(NEW_LOG_EVENT, &entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.add_log(message, LogType::Info);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.add_log(message, LogType::Warning);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add_log(message, LogType::Error);
    }

    /// Snapshot of every entry recorded so far, oldest first.
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.logs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a new subscriber that receives entries recorded from now on.
    /// The subscription is dropped from the feed as soon as `cancel` fires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(self: &Arc<Self>, cancel: CancellationToken) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        debug!("Subscriber {} joined the log feed", id);

        let feed = Arc::downgrade(self);
        tokio::spawn(async move {
            cancel.cancelled().await;
            if let Some(feed) = feed.upgrade() {
                feed.unsubscribe(id);
            }
        });

        Subscription { id, receiver }
    }

    /// Removes a subscriber right away. Returns whether it was still present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            debug!("Subscriber {} left the log feed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
