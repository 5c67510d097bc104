//! Event bus integration tests.
//!
//! Run with: `cargo test -p oxide-tests --test eventbus_tests --features integration`

#![cfg(feature = "integration")]

use futures::StreamExt;
use oxide_core::events::{AGENT_IDLE_SUBJECTS, AgentIdlePayload, Event, WorkAssignedPayload};
use oxide_core::ports::EventBus;
use oxide_core::work::Work;
use oxide_scheduler::{DispatchService, DispatcherConfig};
use oxide_tests::context::TestContext;
use oxide_tests::{AgentFixture, ScriptedSelector, WorkFixture};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_publish_event() {
    let ctx = TestContext::nats_only()
        .await
        .expect("Failed to create context");

    let event = Event::WorkAssigned(WorkAssignedPayload::new(
        AgentFixture::idle("a1").id(),
        Work::NoWork,
    ));

    ctx.event_bus
        .publish(event)
        .await
        .expect("Failed to publish event");

    let metrics = ctx.event_bus.metrics().snapshot();
    assert_eq!(metrics.messages_published, 1);
}

#[tokio::test]
async fn test_subscribe_and_receive() {
    let ctx = TestContext::nats_only()
        .await
        .expect("Failed to create context");

    let agent = AgentFixture::idle("a1");
    let mut stream = ctx
        .event_bus
        .subscribe(AGENT_IDLE_SUBJECTS)
        .await
        .expect("Failed to subscribe");

    ctx.event_bus
        .publish(Event::AgentIdle(AgentIdlePayload::new(agent.clone())))
        .await
        .expect("Failed to publish");

    let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Timeout waiting for event")
        .expect("Stream ended");

    match received {
        Ok(Event::AgentIdle(payload)) => {
            assert_eq!(payload.agent_id, agent.id());
            assert_eq!(payload.agent.identity, agent.identity);
        }
        _ => panic!("Unexpected event type"),
    }
}

#[tokio::test]
async fn test_dispatch_cycle_over_nats() {
    let ctx = TestContext::nats_only()
        .await
        .expect("Failed to create context");

    let selector = Arc::new(ScriptedSelector::default());
    let agent = AgentFixture::idle("a1");
    let job = WorkFixture::build(&agent, "j1", "https://git.example.com/app.git", "abc123");
    selector.push(job.clone());

    let service = DispatchService::start(
        &DispatcherConfig::default(),
        Arc::new(ctx.event_bus.clone()),
        selector,
    )
    .await
    .expect("Failed to start dispatch service");

    let mut delivered = Work::NoWork;
    for _ in 0..100 {
        delivered = service.dispatcher().get_work(&agent).await;
        if !delivered.is_no_work() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(delivered, job);
    service.shutdown();
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::nats_only()
        .await
        .expect("Failed to create context");

    let health = ctx.event_bus.health_check();
    assert!(health.status.is_healthy());
    assert!(health.connected);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let ctx = TestContext::nats_only()
        .await
        .expect("Failed to create context");

    assert!(!ctx.event_bus.is_shutdown());
    ctx.event_bus.shutdown().await.expect("Failed to shutdown");
    assert!(ctx.event_bus.is_shutdown());
}
