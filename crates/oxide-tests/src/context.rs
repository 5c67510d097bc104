//! Test context providing access to containerized services.

use crate::containers::NatsContainer;
use oxide_bus::NatsEventBus;

/// Entry point for tests that need a real broker.
///
/// Drop the returned context to stop the containers.
pub struct TestContext;

impl TestContext {
    /// Create context with only NATS.
    pub async fn nats_only() -> anyhow::Result<NatsOnlyContext> {
        crate::init_test_logging();

        let nats = NatsContainer::start().await?;
        let event_bus = NatsEventBus::connect(nats.url()).await?;

        Ok(NatsOnlyContext { nats, event_bus })
    }
}

/// Minimal context with only NATS.
pub struct NatsOnlyContext {
    pub nats: NatsContainer,
    pub event_bus: NatsEventBus,
}

impl NatsOnlyContext {
    pub fn nats_url(&self) -> &str {
        self.nats.url()
    }
}
