//! Event Bus implementation.
//!
//! Provides the generic [`EventBus`] used by each port session to fan events
//! out to synchronous handlers and async receivers.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{BusEvent, EventCategory};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches<E: BusEvent>(&self, event: &E) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

/// Type alias for event handler functions
type EventHandler<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for broadcast.
    pub channel_capacity: usize,
    /// Whether to keep event history.
    pub enable_history: bool,
    /// Maximum number of events to retain in history.
    pub max_history_size: usize,
    /// How long to retain events in history.
    pub history_retention: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
            history_retention: Duration::from_secs(300),
        }
    }
}

/// Event with timestamp for history
#[derive(Debug, Clone)]
struct TimestampedEvent<E> {
    event: E,
    timestamp: Instant,
}

/// Publish/subscribe hub for one event type
///
/// Handlers run on the publishing task, outside the handler lock, so a
/// handler may subscribe or unsubscribe without deadlocking.
pub struct EventBus<E: BusEvent> {
    /// Broadcast channel sender
    sender: broadcast::Sender<E>,
    /// Registered synchronous handlers
    handlers: Arc<RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler<E>)>>>,
    /// Event history (optional)
    history: Arc<RwLock<VecDeque<TimestampedEvent<E>>>>,
    /// Configuration
    config: EventBusConfig,
}

impl<E: BusEvent> EventBus<E> {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(VecDeque::new())),
            config,
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of handlers and receivers the event was delivered
    /// to. Publishing with nobody listening is not an error.
    pub fn publish(&self, event: E) -> usize {
        if self.config.enable_history {
            self.add_to_history(&event);
        }

        let matching: Vec<EventHandler<E>> = self
            .handlers
            .read()
            .values()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &matching {
            handler(event.clone());
        }

        let received = self.sender.send(event).unwrap_or(0);
        matching.len() + received
    }

    /// Subscribe to events with a synchronous handler
    ///
    /// The handler will be called on the publishing task, so it should
    /// return quickly to avoid blocking event dispatch.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Arc::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for manual event polling
    ///
    /// Receivers that fall more than `channel_capacity` events behind observe
    /// `RecvError::Lagged` and skip ahead.
    pub fn receiver(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Get the number of live async receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get recent event history (if enabled)
    ///
    /// Returns events since the given instant, or all history if None.
    pub fn history(&self, since: Option<Instant>) -> Vec<E> {
        if !self.config.enable_history {
            return Vec::new();
        }

        let history = self.history.read();
        match since {
            Some(since) => history
                .iter()
                .filter(|e| e.timestamp >= since)
                .map(|e| e.event.clone())
                .collect(),
            None => history.iter().map(|e| e.event.clone()).collect(),
        }
    }

    /// Clear event history
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Add an event to history, maintaining size and age limits
    fn add_to_history(&self, event: &E) {
        let mut history = self.history.write();
        let now = Instant::now();

        history.push_back(TimestampedEvent {
            event: event.clone(),
            timestamp: now,
        });

        let retention = self.config.history_retention;
        while history
            .front()
            .is_some_and(|e| now.duration_since(e.timestamp) > retention)
        {
            history.pop_front();
        }

        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Opened(String),
        Failed(String),
        Counter(u32),
    }

    impl BusEvent for TestEvent {
        fn category(&self) -> EventCategory {
            match self {
                TestEvent::Opened(_) => EventCategory::Connection,
                TestEvent::Failed(_) => EventCategory::Error,
                TestEvent::Counter(_) => EventCategory::Queue,
            }
        }
    }

    #[test]
    fn test_event_bus_creation() {
        let bus: EventBus<TestEvent> = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(TestEvent::Counter(1)), 0);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus: EventBus<TestEvent> = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);

        // Double unsubscribe should return false
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_event_delivery() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let _id = bus.subscribe(EventFilter::All, move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let delivered = bus.publish(TestEvent::Opened("/dev/ttyUSB0".to_string()));
        assert_eq!(delivered, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let connection_count = Arc::new(AtomicUsize::new(0));
        let error_count = Arc::new(AtomicUsize::new(0));

        let cc = connection_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Connection]),
            move |_| {
                cc.fetch_add(1, Ordering::SeqCst);
            },
        );

        let ec = error_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Error]),
            move |_| {
                ec.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.publish(TestEvent::Opened("test".to_string()));
        bus.publish(TestEvent::Failed("boom".to_string()));
        bus.publish(TestEvent::Counter(3));

        assert_eq!(connection_count.load(Ordering::SeqCst), 1);
        assert_eq!(error_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let slot: Arc<RwLock<Option<SubscriptionId>>> = Arc::new(RwLock::new(None));

        let bus_clone = Arc::clone(&bus);
        let slot_clone = Arc::clone(&slot);
        let id = bus.subscribe(EventFilter::All, move |_: TestEvent| {
            if let Some(id) = *slot_clone.read() {
                bus_clone.unsubscribe(id);
            }
        });
        *slot.write() = Some(id);

        bus.publish(TestEvent::Counter(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_history() {
        let config = EventBusConfig {
            enable_history: true,
            max_history_size: 10,
            ..Default::default()
        };
        let bus = EventBus::with_config(config);

        for i in 0..5 {
            bus.publish(TestEvent::Counter(i));
        }

        let history = bus.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0], TestEvent::Counter(0));

        bus.clear_history();
        assert_eq!(bus.history(None).len(), 0);
    }

    #[test]
    fn test_history_max_size() {
        let config = EventBusConfig {
            enable_history: true,
            max_history_size: 5,
            ..Default::default()
        };
        let bus = EventBus::with_config(config);

        for i in 0..10 {
            bus.publish(TestEvent::Counter(i));
        }

        let history = bus.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0], TestEvent::Counter(5));
    }

    #[test]
    fn test_filter_matches() {
        let event = TestEvent::Opened("test".to_string());

        assert!(EventFilter::All.matches(&event));
        assert!(EventFilter::Categories(vec![EventCategory::Connection]).matches(&event));
        assert!(!EventFilter::Categories(vec![EventCategory::Workflow]).matches(&event));
        assert!(
            EventFilter::Categories(vec![EventCategory::Connection, EventCategory::Workflow])
                .matches(&event)
        );
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus = EventBus::new();
        let mut receiver = bus.receiver();
        assert_eq!(bus.receiver_count(), 1);

        bus.publish(TestEvent::Opened("test".to_string()));

        match receiver.try_recv() {
            Ok(TestEvent::Opened(port)) => assert_eq!(port, "test"),
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}
