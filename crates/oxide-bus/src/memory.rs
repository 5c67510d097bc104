//! In-process event bus.

use async_trait::async_trait;
use futures::stream;
use oxide_core::events::Event;
use oxide_core::ports::{EventBus, EventStream};
use oxide_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, trace, warn};

use crate::config::BusConfig;
use crate::health::HealthCheck;
use crate::metrics::BusMetrics;
use crate::subject;

struct Subscriber {
    id: u64,
    pattern: String,
    group: Option<String>,
    sender: mpsc::Sender<Event>,
}

/// Ordered, multi-subscriber event bus living inside one process.
///
/// Every plain subscriber whose pattern matches receives its own copy of a message,
/// in publish order. Subscribers sharing a queue group split the messages between
/// them round robin.
///
/// Publishing never waits on a slow subscriber. A full buffer drops the copy for
/// that subscriber, or hands the message to the next member of its group.
#[derive(Clone)]
pub struct InMemoryEventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    group_cursors: Arc<Mutex<HashMap<String, usize>>>,
    next_id: Arc<AtomicU64>,
    config: BusConfig,
    metrics: Arc<BusMetrics>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl InMemoryEventBus {
    pub fn new(config: BusConfig) -> Self {
        let metrics = BusMetrics::new();
        metrics.set_connected(true);
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            group_cursors: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            config,
            metrics,
        }
    }

    /// Get metrics.
    pub fn metrics(&self) -> &Arc<BusMetrics> {
        &self.metrics
    }

    /// Check bus health.
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck::from_metrics(&self.metrics, true)
    }

    /// Number of live subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|s| !s.sender.is_closed());
        subscribers.len()
    }

    async fn add_subscriber(&self, pattern: &str, group: Option<&str>) -> Result<EventStream> {
        subject::validate_pattern(pattern)?;

        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().await.push(Subscriber {
            id,
            pattern: pattern.to_string(),
            group: group.map(str::to_string),
            sender,
        });
        debug!(subscriber = id, pattern, group, "Subscribed");

        let metrics = self.metrics.clone();
        let events = stream::unfold(receiver, move |mut receiver| {
            let metrics = metrics.clone();
            async move {
                let event = receiver.recv().await?;
                metrics.record_receive(0);
                Some((Ok::<Event, Error>(event), receiver))
            }
        });
        Ok(Box::pin(events))
    }

    /// Pick the recipients of a subject: every plain subscriber, and per group
    /// all members in round-robin order starting at the group's cursor.
    async fn route(&self, subject: &str) -> Vec<Vec<(u64, mpsc::Sender<Event>)>> {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|s| !s.sender.is_closed());

        let mut targets = Vec::new();
        let mut groups: HashMap<&str, Vec<&Subscriber>> = HashMap::new();
        for sub in subscribers.iter().filter(|s| subject::matches(&s.pattern, subject)) {
            match sub.group.as_deref() {
                Some(group) => groups.entry(group).or_default().push(sub),
                None => targets.push(vec![(sub.id, sub.sender.clone())]),
            }
        }

        if !groups.is_empty() {
            let mut cursors = self.group_cursors.lock().await;
            let mut names: Vec<&str> = groups.keys().copied().collect();
            names.sort_unstable();
            for name in names {
                let members = &groups[name];
                let cursor = cursors.entry(name.to_string()).or_insert(0);
                let start = *cursor % members.len();
                *cursor = cursor.wrapping_add(1);
                targets.push(
                    (0..members.len())
                        .map(|i| members[(start + i) % members.len()])
                        .map(|m| (m.id, m.sender.clone()))
                        .collect(),
                );
            }
        }

        targets
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: Event) -> Result<()> {
        let subject = event.subject();
        let targets = self.route(&subject).await;

        let mut delivered = 0u64;
        let mut backed_up = 0u64;
        for candidates in targets {
            let mut full = false;
            let mut taken = false;
            for (id, sender) in candidates {
                match sender.try_send(event.clone()) {
                    Ok(()) => {
                        taken = true;
                        break;
                    }
                    Err(TrySendError::Full(_)) => {
                        full = true;
                        trace!(subscriber = id, "Subscriber buffer full");
                    }
                    Err(TrySendError::Closed(_)) => {
                        trace!(subscriber = id, "Subscriber closed during publish");
                    }
                }
            }
            if taken {
                delivered += 1;
            } else if full {
                backed_up += 1;
            }
        }

        if backed_up > 0 {
            warn!(subject = %subject, backed_up, "Subscribers too slow, message dropped for them");
            if delivered == 0 {
                self.metrics.record_undeliverable();
                self.metrics.record_publish_failure();
                return Err(Error::EventBus(format!(
                    "Every subscriber of {subject} is backed up"
                )));
            }
        }

        if delivered == 0 {
            self.metrics.record_undeliverable();
            if self.config.require_subscriber {
                self.metrics.record_publish_failure();
                warn!(subject = %subject, "No subscribers for message");
                return Err(Error::NoSubscribers(subject));
            }
            return Ok(());
        }

        self.metrics.record_publish(0);
        self.metrics.record_delivery(delivered);
        trace!(subject = %subject, delivered, "Published event");
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<EventStream> {
        self.add_subscriber(pattern, None).await
    }

    async fn subscribe_with_group(&self, pattern: &str, group: &str) -> Result<EventStream> {
        self.add_subscriber(pattern, Some(group)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use oxide_core::events::WorkAssignedPayload;
    use oxide_core::ids::AgentId;
    use oxide_core::work::Work;
    use std::time::Duration;

    fn assigned(agent_id: AgentId) -> Event {
        Event::WorkAssigned(WorkAssignedPayload::new(agent_id, Work::NoWork))
    }

    async fn next(stream: &mut EventStream) -> Event {
        tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("event error")
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_messages_in_order() {
        let bus = InMemoryEventBus::default();
        let mut first = bus.subscribe("work.>").await.unwrap();
        let mut second = bus.subscribe("work.assigned.*").await.unwrap();

        let agents: Vec<AgentId> = (0..3).map(|_| AgentId::new()).collect();
        for id in &agents {
            bus.publish(assigned(*id)).await.unwrap();
        }

        for id in &agents {
            assert_eq!(next(&mut first).await.agent_id(), *id);
            assert_eq!(next(&mut second).await.agent_id(), *id);
        }
        assert_eq!(bus.metrics().snapshot().messages_delivered, 6);
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_fails() {
        let bus = InMemoryEventBus::default();
        let _other = bus.subscribe("agent.*.idle").await.unwrap();

        let err = bus.publish(assigned(AgentId::new())).await.unwrap_err();
        assert!(matches!(err, Error::NoSubscribers(_)));
        assert_eq!(bus.metrics().snapshot().messages_undeliverable, 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_allowed_when_configured() {
        let bus = InMemoryEventBus::new(BusConfig::default().with_require_subscriber(false));
        bus.publish(assigned(AgentId::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let bus = InMemoryEventBus::default();
        let stream = bus.subscribe("work.>").await.unwrap();
        assert_eq!(bus.subscriber_count().await, 1);

        drop(stream);
        assert_eq!(bus.subscriber_count().await, 0);
        assert!(bus.publish(assigned(AgentId::new())).await.is_err());
    }

    #[tokio::test]
    async fn test_queue_group_splits_messages() {
        let bus = InMemoryEventBus::default();
        let mut a = bus.subscribe_with_group("work.>", "finders").await.unwrap();
        let mut b = bus.subscribe_with_group("work.>", "finders").await.unwrap();

        let first = AgentId::new();
        let second = AgentId::new();
        bus.publish(assigned(first)).await.unwrap();
        bus.publish(assigned(second)).await.unwrap();

        assert_eq!(next(&mut a).await.agent_id(), first);
        assert_eq!(next(&mut b).await.agent_id(), second);
        assert_eq!(bus.metrics().snapshot().messages_delivered, 2);
    }

    #[tokio::test]
    async fn test_full_subscriber_fails_publish_without_waiting() {
        let bus = InMemoryEventBus::new(BusConfig::default().with_channel_capacity(1));
        let _stalled = bus.subscribe_with_group("work.>", "finders").await.unwrap();

        bus.publish(assigned(AgentId::new())).await.unwrap();
        let second = tokio::time::timeout(
            Duration::from_millis(200),
            bus.publish(assigned(AgentId::new())),
        )
        .await
        .expect("publish waited on a full subscriber");

        assert!(matches!(second, Err(Error::EventBus(_))));
        assert_eq!(bus.metrics().snapshot().publish_failures, 1);
    }

    #[tokio::test]
    async fn test_full_group_member_passes_message_on() {
        let bus = InMemoryEventBus::new(BusConfig::default().with_channel_capacity(1));
        let mut a = bus.subscribe_with_group("work.>", "finders").await.unwrap();
        let mut b = bus.subscribe_with_group("work.>", "finders").await.unwrap();

        let ids: Vec<AgentId> = (0..3).map(|_| AgentId::new()).collect();
        bus.publish(assigned(ids[0])).await.unwrap();
        bus.publish(assigned(ids[1])).await.unwrap();
        assert_eq!(next(&mut b).await.agent_id(), ids[1]);

        // a's turn, but its buffer still holds the first message.
        bus.publish(assigned(ids[2])).await.unwrap();

        assert_eq!(next(&mut b).await.agent_id(), ids[2]);
        assert_eq!(next(&mut a).await.agent_id(), ids[0]);
        assert_eq!(bus.metrics().snapshot().publish_failures, 0);
    }

    #[tokio::test]
    async fn test_rejects_invalid_pattern() {
        let bus = InMemoryEventBus::default();
        assert!(bus.subscribe("work.>.x").await.is_err());
    }
}
