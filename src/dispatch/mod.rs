//! Cycle dispatch with per-producer failure isolation
//!
//! The dispatcher owns the ordered producer lists for both cycle kinds and
//! the ordered sink list shared between them. One cycle walks the relevant
//! producers, asks each for its notification, and routes ready messages to
//! every sink with the producer's name as the deduplication key.
//!
//! The core contract: one broken event source must never prevent other
//! events from notifying. Every producer and sink failure is caught, logged
//! with the producer's name attached, and terminal to that iteration only.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::events::{
    Favourites, FlashEventProducer, Producer, Production, RuneGoldbergProducer,
};
use crate::rotation::RotationTable;
use crate::sinks::{Sink, TelegramConfig, TelegramSink};

/// Which producer set a cycle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// Once-a-day events (Rune Goldberg)
    Daily,
    /// Once-an-hour events (wilderness flash events)
    Hourly,
}

impl CycleKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters describing one cycle's outcome
///
/// A producer counts as `delivered` when its notification reached at least
/// one sink (or there was no sink to reach); as `failed` when the producer
/// itself errored or every sink rejected the delivery. Individual sink
/// rejections are additionally tallied in `sink_failures`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Producers whose notification went out
    pub delivered: usize,
    /// Producers that stayed quiet on purpose
    pub suppressed: usize,
    /// Producers that errored, or whose delivery failed everywhere
    pub failed: usize,
    /// Total sink-level delivery failures
    pub sink_failures: usize,
}

impl CycleSummary {
    /// Total number of producers that ran
    pub fn total(&self) -> usize {
        self.delivered + self.suppressed + self.failed
    }
}

/// Routes producer output to notification sinks, cycle by cycle
#[derive(Default)]
pub struct Dispatcher {
    daily: Vec<Box<dyn Producer>>,
    hourly: Vec<Box<dyn Producer>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard producer and sink set from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut dispatcher = Self::new();

        let favourites = if config.events.favourites_only {
            Favourites::load(&config.events.favourites_path)
        } else {
            Favourites::disabled()
        };
        dispatcher.add_hourly_producer(Box::new(
            FlashEventProducer::new(RotationTable::wilderness_flash_events())
                .with_favourites(favourites),
        ));

        dispatcher.add_daily_producer(Box::new(RuneGoldbergProducer::new(
            config.http.request_timeout(),
        )?));

        if config.telegram.enabled {
            let api_key = config
                .telegram
                .api_key
                .clone()
                .ok_or_else(|| crate::error::Error::config("telegram.api_key is required"))?;
            let chat_id = config
                .telegram
                .chat_id
                .clone()
                .ok_or_else(|| crate::error::Error::config("telegram.chat_id is required"))?;

            let sink = TelegramSink::new(
                TelegramConfig::new(api_key, chat_id)
                    .with_timeout(config.http.request_timeout_secs),
            )?;
            dispatcher.add_sink(Arc::new(sink));
        }

        Ok(dispatcher)
    }

    /// Register a producer for the daily cycle
    pub fn add_daily_producer(&mut self, producer: Box<dyn Producer>) {
        self.daily.push(producer);
    }

    /// Register a producer for the hourly cycle
    pub fn add_hourly_producer(&mut self, producer: Box<dyn Producer>) {
        self.hourly.push(producer);
    }

    /// Register a notification sink
    pub fn add_sink(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Run one cycle at the current instant
    pub async fn run_cycle(&self, kind: CycleKind) -> CycleSummary {
        self.run_cycle_at(kind, Utc::now()).await
    }

    /// Run one cycle with an explicit `now`, for deterministic tests
    pub async fn run_cycle_at(&self, kind: CycleKind, now: DateTime<Utc>) -> CycleSummary {
        let producers = match kind {
            CycleKind::Daily => &self.daily,
            CycleKind::Hourly => &self.hourly,
        };

        let mut summary = CycleSummary::default();
        for producer in producers {
            let name = producer.name();
            tracing::info!(producer = %name, cycle = %kind, "Executing routine");

            match producer.produce(now).await {
                Err(e) => {
                    tracing::error!(producer = %name, error = %e, "Error executing routine");
                    summary.failed += 1;
                }
                Ok(Production::Suppressed { reason }) => {
                    tracing::info!(producer = %name, reason = %reason, "No notification this cycle");
                    summary.suppressed += 1;
                }
                Ok(Production::Ready(notification)) if notification.is_empty() => {
                    tracing::info!(producer = %name, "Empty message, no notification this cycle");
                    summary.suppressed += 1;
                }
                Ok(Production::Ready(notification)) => {
                    let mut accepted = 0usize;
                    for sink in &self.sinks {
                        match sink
                            .deliver(&notification.message, &notification.flags, Some(name))
                            .await
                        {
                            Ok(receipt) => {
                                tracing::debug!(
                                    producer = %name,
                                    sink = %receipt.channel,
                                    message_ids = ?receipt.message_ids,
                                    "Notification delivered"
                                );
                                accepted += 1;
                            }
                            Err(e) => {
                                tracing::error!(
                                    producer = %name,
                                    sink = %sink.name(),
                                    error = %e,
                                    "Delivery failed"
                                );
                                summary.sink_failures += 1;
                            }
                        }
                    }

                    if self.sinks.is_empty() || accepted > 0 {
                        summary.delivered += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            cycle = %kind,
            delivered = summary.delivered,
            suppressed = summary.suppressed,
            failed = summary.failed,
            "Cycle finished"
        );
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Notification, NotificationFlags, ProducerError};
    use crate::sinks::{DeliveryReceipt, SinkError, SinkResult};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct StubProducer {
        name: &'static str,
        outcome: fn() -> std::result::Result<Production, ProducerError>,
    }

    #[async_trait]
    impl Producer for StubProducer {
        fn name(&self) -> &str {
            self.name
        }

        async fn produce(
            &self,
            _now: DateTime<Utc>,
        ) -> std::result::Result<Production, ProducerError> {
            (self.outcome)()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        deliveries: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(
            &self,
            message: &str,
            _flags: &NotificationFlags,
            delete_previous_key: Option<&str>,
        ) -> SinkResult<DeliveryReceipt> {
            self.deliveries
                .lock()
                .await
                .push((message.to_string(), delete_previous_key.map(String::from)));
            Ok(DeliveryReceipt::new("recording", vec![1]))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl Sink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn deliver(
            &self,
            _message: &str,
            _flags: &NotificationFlags,
            _delete_previous_key: Option<&str>,
        ) -> SinkResult<DeliveryReceipt> {
            Err(SinkError::Api {
                status: 500,
                description: "broken".to_string(),
            })
        }
    }

    fn ready_hello() -> std::result::Result<Production, ProducerError> {
        Ok(Production::Ready(Notification::text("hello")))
    }

    #[tokio::test]
    async fn test_ready_notification_reaches_sink_with_key() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "Wilderness Flash Events",
            outcome: ready_hello,
        }));
        dispatcher.add_sink(sink.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        assert_eq!(summary.delivered, 1);
        let deliveries = sink.deliveries.lock().await;
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, "hello");
        assert_eq!(
            deliveries[0].1.as_deref(),
            Some("Wilderness Flash Events")
        );
    }

    #[tokio::test]
    async fn test_suppressed_producer_invokes_no_sink() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "quiet",
            outcome: || Ok(Production::suppressed("not a favourite")),
        }));
        dispatcher.add_sink(sink.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        assert_eq!(summary.suppressed, 1);
        assert_eq!(summary.delivered, 0);
        assert!(sink.deliveries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_is_treated_as_suppressed() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "blank",
            outcome: || Ok(Production::Ready(Notification::text("   "))),
        }));
        dispatcher.add_sink(sink.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        assert_eq!(summary.suppressed, 1);
        assert!(sink.deliveries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_producer_failure_does_not_abort_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "broken",
            outcome: || {
                Err(ProducerError::Extraction {
                    what: "daily runes",
                })
            },
        }));
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "working",
            outcome: ready_hello,
        }));
        dispatcher.add_sink(sink.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(sink.deliveries.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_isolated_and_counted() {
        let recording = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "working",
            outcome: ready_hello,
        }));
        dispatcher.add_sink(Arc::new(FailingSink));
        dispatcher.add_sink(recording.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        // The failing sink did not stop the recording sink
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.sink_failures, 1);
        assert_eq!(recording.deliveries.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_all_sinks_failing_marks_producer_failed() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_hourly_producer(Box::new(StubProducer {
            name: "working",
            outcome: ready_hello,
        }));
        dispatcher.add_sink(Arc::new(FailingSink));

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.sink_failures, 1);
    }

    #[tokio::test]
    async fn test_daily_and_hourly_sets_are_separate() {
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_daily_producer(Box::new(StubProducer {
            name: "daily-only",
            outcome: ready_hello,
        }));
        dispatcher.add_sink(sink.clone());

        let summary = dispatcher.run_cycle(CycleKind::Hourly).await;
        assert_eq!(summary.total(), 0);

        let summary = dispatcher.run_cycle(CycleKind::Daily).await;
        assert_eq!(summary.delivered, 1);
    }
}
