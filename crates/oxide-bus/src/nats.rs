//! NATS-based event bus.

use async_trait::async_trait;
use futures::StreamExt;
use oxide_core::events::Event;
use oxide_core::ports::{EventBus, EventStream};
use oxide_core::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

use crate::config::BusConfig;
use crate::health::HealthCheck;
use crate::metrics::BusMetrics;
use crate::subject;

/// Event bus over core NATS subjects.
///
/// Core NATS does not report whether anyone is listening, so `require_subscriber`
/// only applies to the in-process bus.
#[derive(Clone)]
pub struct NatsEventBus {
    client: async_nats::Client,
    metrics: Arc<BusMetrics>,
    shutdown: Arc<AtomicBool>,
}

impl NatsEventBus {
    /// Connect to a NATS server with default settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(BusConfig::new(url)).await
    }

    /// Connect with custom configuration.
    pub async fn connect_with_config(config: BusConfig) -> Result<Self> {
        let urls = config.urls.join(",");
        info!("Connecting to NATS at {}", urls);

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(config.connection_timeout)
            .request_timeout(Some(config.request_timeout))
            .max_reconnects(config.max_reconnect_attempts)
            .connect(urls.as_str())
            .await
            .map_err(|e| Error::EventBus(format!("Failed to connect to NATS: {}", e)))?;

        let metrics = BusMetrics::new();
        metrics.set_connected(true);
        info!("Connected to NATS");

        Ok(Self {
            client,
            metrics,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get metrics.
    pub fn metrics(&self) -> &Arc<BusMetrics> {
        &self.metrics
    }

    /// Check connection health.
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck::from_metrics(&self.metrics, self.is_connected())
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Check if shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Graceful shutdown - drain all subscriptions.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown");
        self.shutdown.store(true, Ordering::SeqCst);

        if let Err(e) = self.client.drain().await {
            error!("Error draining NATS connection: {}", e);
        }

        self.metrics.set_connected(false);
        info!("NATS connection drained");

        Ok(())
    }

    fn event_stream(&self, subscriber: async_nats::Subscriber) -> EventStream {
        let metrics = self.metrics.clone();
        let shutdown = self.shutdown.clone();

        let stream = subscriber.map(move |msg| {
            if shutdown.load(Ordering::SeqCst) {
                return Err(Error::EventBus("Shutdown in progress".to_string()));
            }
            metrics.record_receive(msg.payload.len() as u64);
            serde_json::from_slice::<Event>(&msg.payload)
                .map_err(|e| Error::Serialization(e.to_string()))
        });

        Box::pin(stream)
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(&self, event: Event) -> Result<()> {
        if self.is_shutdown() {
            return Err(Error::EventBus(
                "Cannot publish: shutdown in progress".to_string(),
            ));
        }

        let subject = event.subject();
        let payload = serde_json::to_vec(&event)?;
        let payload_len = payload.len() as u64;

        match self.client.publish(subject.clone(), payload.into()).await {
            Ok(()) => {
                self.metrics.record_publish(payload_len);
                debug!(subject = %subject, "Published event");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure();
                error!(subject = %subject, "Failed to publish event: {}", e);
                Err(Error::EventBus(format!("Failed to publish: {}", e)))
            }
        }
    }

    async fn subscribe(&self, pattern: &str) -> Result<EventStream> {
        subject::validate_pattern(pattern)?;
        debug!("Subscribing to pattern {}", pattern);

        let subscriber = self
            .client
            .subscribe(pattern.to_string())
            .await
            .map_err(|e| Error::EventBus(format!("Failed to subscribe: {}", e)))?;

        Ok(self.event_stream(subscriber))
    }

    async fn subscribe_with_group(&self, pattern: &str, group: &str) -> Result<EventStream> {
        subject::validate_pattern(pattern)?;
        debug!("Subscribing to pattern {} with group {}", pattern, group);

        let subscriber = self
            .client
            .queue_subscribe(pattern.to_string(), group.to_string())
            .await
            .map_err(|e| Error::EventBus(format!("Failed to subscribe: {}", e)))?;

        Ok(self.event_stream(subscriber))
    }
}
