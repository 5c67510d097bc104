//! Work finder: answers idle signals with a work assignment.

use futures::{FutureExt, StreamExt};
use oxide_core::events::{AGENT_IDLE_SUBJECTS, AgentIdlePayload, Event, WorkAssignedPayload};
use oxide_core::ids::AgentId;
use oxide_core::ports::{EventBus, WorkSelector};
use oxide_core::work::Work;
use oxide_core::{Error, Result};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runs the injected [`WorkSelector`] for every idle agent and publishes the
/// outcome. Every idle signal is answered, including when selection fails.
pub struct WorkFinder {
    selector: Arc<dyn WorkSelector>,
    bus: Arc<dyn EventBus>,
}

impl WorkFinder {
    pub fn new(selector: Arc<dyn WorkSelector>, bus: Arc<dyn EventBus>) -> Self {
        Self { selector, bus }
    }

    /// Select work for the agent and publish the assignment.
    ///
    /// A selection error publishes "no work" and is returned to the caller.
    /// A panic publishes "no work" and then resumes unwinding.
    pub async fn on_agent_idle(&self, payload: AgentIdlePayload) -> Result<Work> {
        let agent_id = payload.agent_id;
        debug!(agent_id = %agent_id, "Selecting work");

        let selection = AssertUnwindSafe(self.selector.select_work(&payload.agent))
            .catch_unwind()
            .await;

        match selection {
            Ok(Ok(work)) => {
                self.assign(agent_id, work.clone()).await?;
                info!(agent_id = %agent_id, work = %work.description(), "Work selected");
                Ok(work)
            }
            Ok(Err(e)) => {
                error!(agent_id = %agent_id, "Work selection failed: {}", e);
                self.answer_with_no_work(agent_id).await;
                Err(Error::WorkSelection {
                    agent: agent_id.to_string(),
                    message: e.to_string(),
                })
            }
            Err(panic) => {
                error!(agent_id = %agent_id, "Work selection panicked");
                self.answer_with_no_work(agent_id).await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn assign(&self, agent_id: AgentId, work: Work) -> Result<()> {
        self.bus
            .publish(Event::WorkAssigned(WorkAssignedPayload::new(agent_id, work)))
            .await
    }

    async fn answer_with_no_work(&self, agent_id: AgentId) {
        if let Err(e) = self.assign(agent_id, Work::NoWork).await {
            warn!(agent_id = %agent_id, "Failed to publish no-work answer: {}", e);
        }
    }

    /// Consume idle signals as a member of `group`, one at a time.
    ///
    /// The subscription is active when this returns. A panicking selection is
    /// answered with "no work" and the listener moves on to the next signal,
    /// so signals already buffered for this member are never lost.
    pub async fn listen(self: Arc<Self>, group: &str) -> Result<JoinHandle<()>> {
        let mut stream = self
            .bus
            .subscribe_with_group(AGENT_IDLE_SUBJECTS, group)
            .await?;

        Ok(tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Event::AgentIdle(payload)) => {
                        let agent_id = payload.agent_id;
                        match AssertUnwindSafe(self.on_agent_idle(payload))
                            .catch_unwind()
                            .await
                        {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => warn!("Idle signal answered with no work: {}", e),
                            Err(_) => {
                                error!(agent_id = %agent_id, "Recovered from selector panic")
                            }
                        }
                    }
                    Ok(other) => debug!(subject = %other.subject(), "Ignoring event"),
                    Err(e) => warn!("Failed to receive idle signal: {}", e),
                }
            }
            debug!("Work finder stopped");
        }))
    }
}
