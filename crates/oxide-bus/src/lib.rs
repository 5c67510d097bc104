//! Message topics for Oxide CI.
//!
//! Both buses implement [`oxide_core::ports::EventBus`]: [`InMemoryEventBus`] for
//! single-process deployments and tests, [`NatsEventBus`] for a brokered fleet.

pub mod config;
pub mod health;
mod memory;
pub mod metrics;
mod nats;
pub mod subject;

pub use config::BusConfig;
pub use health::{HealthCheck, HealthStatus};
pub use memory::InMemoryEventBus;
pub use metrics::{BusMetrics, MetricsSnapshot};
pub use nats::NatsEventBus;
