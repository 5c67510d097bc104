//! Health check for event buses.

use crate::metrics::BusMetrics;

/// Health status of a bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Healthy and connected.
    Healthy,
    /// Degraded but functional.
    Degraded { reason: String },
    /// Unhealthy and not connected.
    Unhealthy { reason: String },
}

impl HealthStatus {
    /// Check if the status is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Check if the service is operational (healthy or degraded).
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }
}

/// Health check result with details.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub connected: bool,
    pub messages_published: u64,
    pub messages_received: u64,
    pub publish_failures: u64,
    pub messages_undeliverable: u64,
}

impl HealthCheck {
    /// Create a health check from metrics.
    pub fn from_metrics(metrics: &BusMetrics, connected: bool) -> Self {
        let snapshot = metrics.snapshot();

        let status = if !connected {
            HealthStatus::Unhealthy {
                reason: "Not connected".to_string(),
            }
        } else if snapshot.publish_failures > 0 {
            HealthStatus::Degraded {
                reason: format!("{} publish failures recorded", snapshot.publish_failures),
            }
        } else if snapshot.messages_undeliverable > 0 {
            HealthStatus::Degraded {
                reason: format!(
                    "{} messages had no subscriber",
                    snapshot.messages_undeliverable
                ),
            }
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            connected,
            messages_published: snapshot.messages_published,
            messages_received: snapshot.messages_received,
            publish_failures: snapshot.publish_failures,
            messages_undeliverable: snapshot.messages_undeliverable,
        }
    }
}
