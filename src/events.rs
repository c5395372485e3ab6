//! Change notifications
//!
//! Services emit a topic after every successful write so that anything
//! caching derived data (list views, balances, calendar pages) can refresh.
//! Delivery is synchronous and follows registration order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{BilleteraError, BilleteraResult};

/// Kind of data that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Accounts,
    Categories,
    Movements,
    Statements,
    Budgets,
    Goals,
    Recurring,
    Scheduled,
    Rules,
}

impl Topic {
    pub const ALL: [Topic; 9] = [
        Topic::Accounts,
        Topic::Categories,
        Topic::Movements,
        Topic::Statements,
        Topic::Budgets,
        Topic::Goals,
        Topic::Recurring,
        Topic::Scheduled,
        Topic::Rules,
    ];
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accounts => "accounts",
            Self::Categories => "categories",
            Self::Movements => "movements",
            Self::Statements => "statements",
            Self::Budgets => "budgets",
            Self::Goals => "goals",
            Self::Recurring => "recurring",
            Self::Scheduled => "scheduled",
            Self::Rules => "rules",
        };
        write!(f, "{}", name)
    }
}

/// Handle returned by [`DataEvents::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(Topic) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    callback: Callback,
}

/// Publish/subscribe bus for data changes
#[derive(Default)]
pub struct DataEvents {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl DataEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one topic
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> BilleteraResult<SubscriptionId>
    where
        F: Fn(Topic) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire subscriber lock: {}", e))
        })?;
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        subscribers.push(Subscriber {
            id,
            topic,
            callback: Arc::new(callback),
        });
        Ok(id)
    }

    /// Remove a subscription; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.subscribers.lock() {
            Ok(mut subscribers) => {
                let before = subscribers.len();
                subscribers.retain(|s| s.id != id);
                subscribers.len() != before
            }
            Err(_) => false,
        }
    }

    /// Notify every subscriber of `topic`, in registration order
    pub fn emit(&self, topic: Topic) {
        // Callbacks run outside the lock so they may subscribe or unsubscribe
        let callbacks: Vec<Callback> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers
                .iter()
                .filter(|s| s.topic == topic)
                .map(|s| Arc::clone(&s.callback))
                .collect(),
            Err(_) => return,
        };

        debug!(%topic, subscribers = callbacks.len(), "emitting data event");
        for callback in callbacks {
            callback(topic);
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.iter().filter(|s| s.topic == topic).count())
            .unwrap_or(0)
    }
}

/// Records which topics were emitted, each once, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ChangedTopics {
    seen: Arc<Mutex<Vec<Topic>>>,
}

impl ChangedTopics {
    /// Subscribe to every topic on `events`
    pub fn attach(events: &DataEvents) -> BilleteraResult<Self> {
        let changes = Self::default();
        for topic in Topic::ALL {
            let seen = Arc::clone(&changes.seen);
            events.subscribe(topic, move |topic| {
                if let Ok(mut seen) = seen.lock() {
                    if !seen.contains(&topic) {
                        seen.push(topic);
                    }
                }
            })?;
        }
        Ok(changes)
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.topics().is_empty()
    }
}

impl fmt::Debug for DataEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.subscribers.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("DataEvents")
            .field("subscribers", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_registration_order() {
        let events = DataEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            events
                .subscribe(Topic::Movements, move |_| log.lock().unwrap().push(name))
                .unwrap();
        }
        let other = Arc::clone(&log);
        events
            .subscribe(Topic::Budgets, move |_| other.lock().unwrap().push("budgets"))
            .unwrap();

        events.emit(Topic::Movements);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe() {
        let events = DataEvents::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let id = events
            .subscribe(Topic::Accounts, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        events.emit(Topic::Accounts);
        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        events.emit(Topic::Accounts);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(events.subscriber_count(Topic::Accounts), 0);
    }

    #[test]
    fn test_callback_receives_topic() {
        let events = DataEvents::new();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        events
            .subscribe(Topic::Rules, move |topic| *slot.lock().unwrap() = Some(topic))
            .unwrap();
        events.emit(Topic::Rules);
        assert_eq!(*seen.lock().unwrap(), Some(Topic::Rules));
    }

    #[test]
    fn test_subscribe_fails_on_poisoned_lock() {
        let events = Arc::new(DataEvents::new());
        let holder = Arc::clone(&events);
        let _ = std::thread::spawn(move || {
            let _guard = holder.subscribers.lock().unwrap();
            panic!("poisoning the subscriber list");
        })
        .join();

        let err = events.subscribe(Topic::Goals, |_| {}).unwrap_err();
        assert!(matches!(err, BilleteraError::Storage(_)));
        assert_eq!(events.subscriber_count(Topic::Goals), 0);
    }

    #[test]
    fn test_changed_topics_dedup() {
        let events = DataEvents::new();
        let changes = ChangedTopics::attach(&events).unwrap();
        assert!(changes.is_empty());

        events.emit(Topic::Movements);
        events.emit(Topic::Accounts);
        events.emit(Topic::Movements);
        assert_eq!(changes.topics(), vec![Topic::Movements, Topic::Accounts]);
        assert_eq!(events.subscriber_count(Topic::Rules), 1);
    }
}
