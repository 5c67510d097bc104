//! Configuration for the event buses.

use std::time::Duration;

/// Configuration shared by the in-process and NATS event buses.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// NATS server URLs (comma-separated for cluster).
    pub urls: Vec<String>,
    /// Per-subscriber buffer of the in-process bus.
    pub channel_capacity: usize,
    /// Fail a publish that no live subscriber would receive.
    pub require_subscriber: bool,
    /// Maximum reconnection attempts.
    pub max_reconnect_attempts: Option<usize>,
    /// Connection timeout.
    pub connection_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            urls: vec!["nats://localhost:4222".to_string()],
            channel_capacity: 1024,
            require_subscriber: true,
            max_reconnect_attempts: None, // Unlimited
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl BusConfig {
    /// Create a new config with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    /// Set multiple server URLs for cluster support.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set the per-subscriber buffer size.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Allow or reject publishing without subscribers.
    pub fn with_require_subscriber(mut self, require: bool) -> Self {
        self.require_subscriber = require;
        self
    }

    /// Set max reconnection attempts.
    pub fn with_max_reconnects(mut self, max: usize) -> Self {
        self.max_reconnect_attempts = Some(max);
        self
    }
}
