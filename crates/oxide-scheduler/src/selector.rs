//! Queue-backed work selection.

use async_trait::async_trait;
use oxide_core::Result;
use oxide_core::agent::Agent;
use oxide_core::ids::WorkId;
use oxide_core::ports::WorkSelector;
use oxide_core::work::{BuildWork, Work};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::queue::{JobQueue, QueuedJob};

/// Selects work for an agent from a shared [`JobQueue`].
#[derive(Default)]
pub struct QueueWorkSelector {
    queue: Mutex<JobQueue>,
}

impl QueueWorkSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, job: QueuedJob) {
        debug!(job = %job.job, "Job queued");
        self.queue.lock().await.enqueue(job);
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl WorkSelector for QueueWorkSelector {
    async fn select_work(&self, agent: &Agent) -> Result<Work> {
        if !agent.status.is_available() {
            debug!(agent_id = %agent.id(), status = ?agent.status, "Agent not available");
            return Ok(Work::NoWork);
        }

        let Some(job) = self.queue.lock().await.take_for(agent) else {
            return Ok(Work::NoWork);
        };

        info!(agent_id = %agent.id(), job = %job.job, "Selected job for agent");
        Ok(Work::Build(BuildWork {
            id: WorkId::new(),
            agent_id: agent.id(),
            job: job.job,
            materials: job.materials,
        }))
    }
}
