//! Wiring of one dispatcher and its work finders onto an event bus.

use oxide_core::Result;
use oxide_core::ports::{EventBus, WorkSelector};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::DispatcherConfig;
use crate::dispatcher::WorkDispatcher;
use crate::finder::WorkFinder;

/// A running dispatch cycle.
pub struct DispatchService {
    dispatcher: Arc<WorkDispatcher>,
    tasks: Vec<JoinHandle<()>>,
}

impl DispatchService {
    /// Start the dispatcher listener and `config.finder_count` finders.
    ///
    /// All subscriptions are active when this returns.
    pub async fn start(
        config: &DispatcherConfig,
        bus: Arc<dyn EventBus>,
        selector: Arc<dyn WorkSelector>,
    ) -> Result<Self> {
        let dispatcher = Arc::new(WorkDispatcher::new(bus.clone()));
        let mut tasks = vec![dispatcher.clone().listen().await?];

        for _ in 0..config.finder_count {
            let finder = Arc::new(WorkFinder::new(selector.clone(), bus.clone()));
            tasks.push(finder.listen(&config.finder_group).await?);
        }

        info!(
            finders = config.finder_count,
            group = %config.finder_group,
            "Dispatch service started"
        );
        Ok(Self { dispatcher, tasks })
    }

    pub fn dispatcher(&self) -> &Arc<WorkDispatcher> {
        &self.dispatcher
    }

    /// Number of listener tasks still running.
    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Stop every listener.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!("Dispatch service stopped");
    }
}
