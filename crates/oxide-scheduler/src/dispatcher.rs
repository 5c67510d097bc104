//! Work dispatcher: per-agent work slots fed by work-assigned events.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use oxide_core::Result;
use oxide_core::agent::Agent;
use oxide_core::events::{AgentIdlePayload, Event, WORK_ASSIGNED_SUBJECTS, WorkAssignedPayload};
use oxide_core::ids::AgentId;
use oxide_core::ports::EventBus;
use oxide_core::work::Work;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::{DispatcherMetrics, DispatcherSnapshot};

#[derive(Debug)]
enum Slot {
    /// An idle signal is out and no answer has arrived yet.
    Requested,
    /// Work waiting to be collected by the agent's next poll.
    Ready(Work),
}

/// Pairs polling agents with work produced by the work finders.
///
/// At most one idle signal per agent is outstanding between two assignments.
/// Slots of different agents live in separate shards and never contend.
pub struct WorkDispatcher {
    bus: Arc<dyn EventBus>,
    slots: DashMap<AgentId, Slot>,
    metrics: DispatcherMetrics,
}

impl WorkDispatcher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            bus,
            slots: DashMap::new(),
            metrics: DispatcherMetrics::default(),
        }
    }

    /// Publish an idle signal unless one is already outstanding for this agent.
    ///
    /// Returns whether a signal was published. A failed publish clears the
    /// outstanding marker so the next poll tries again.
    pub async fn on_agent_idle(&self, agent: &Agent) -> Result<bool> {
        let agent_id = agent.id();
        match self.slots.entry(agent_id) {
            Entry::Occupied(_) => {
                self.metrics.record_idle_suppressed();
                debug!(agent_id = %agent_id, "Idle signal already outstanding");
                return Ok(false);
            }
            Entry::Vacant(slot) => {
                slot.insert(Slot::Requested);
            }
        }

        let event = Event::AgentIdle(AgentIdlePayload::new(agent.clone()));
        if let Err(e) = self.bus.publish(event).await {
            self.slots
                .remove_if(&agent_id, |_, slot| matches!(slot, Slot::Requested));
            warn!(agent_id = %agent_id, "Failed to publish idle signal: {}", e);
            return Err(e);
        }

        self.metrics.record_idle_published();
        debug!(agent_id = %agent_id, "Published idle signal");
        Ok(true)
    }

    /// Store the answer to an idle signal.
    ///
    /// "No work" clears the slot instead of being stored: collecting a stored
    /// sentinel would return the same "no work" a cleared slot gives, and the
    /// cleared slot lets the following poll raise a fresh idle signal.
    pub fn on_work_assigned(&self, payload: WorkAssignedPayload) {
        let agent_id = payload.agent_id;
        self.metrics.record_assignment();

        if payload.work.is_no_work() {
            self.slots
                .remove_if(&agent_id, |_, slot| matches!(slot, Slot::Requested));
            debug!(agent_id = %agent_id, "No work for agent");
            return;
        }

        let description = payload.work.description();
        match self.slots.insert(agent_id, Slot::Ready(payload.work)) {
            Some(Slot::Requested) => {
                info!(agent_id = %agent_id, work = %description, "Work assigned");
            }
            Some(Slot::Ready(previous)) => {
                warn!(
                    agent_id = %agent_id,
                    work = %description,
                    replaced = %previous.description(),
                    "Replacing uncollected work"
                );
            }
            None => {
                info!(agent_id = %agent_id, work = %description, "Storing unsolicited work");
            }
        }
    }

    /// Hand out stored work, or raise an idle signal and return "no work".
    ///
    /// Never waits for a selection; the agent polls again later.
    pub async fn get_work(&self, agent: &Agent) -> Work {
        let agent_id = agent.id();
        let ready = self
            .slots
            .remove_if(&agent_id, |_, slot| matches!(slot, Slot::Ready(_)));
        if let Some((_, Slot::Ready(work))) = ready {
            self.metrics.record_delivery();
            info!(agent_id = %agent_id, work = %work.description(), "Delivering work");
            return work;
        }

        if let Err(e) = self.on_agent_idle(agent).await {
            debug!(agent_id = %agent_id, "Agent will retry on next poll: {}", e);
        }
        Work::NoWork
    }

    /// Whether an idle signal for this agent is awaiting an answer.
    pub fn is_awaiting_work(&self, agent_id: &AgentId) -> bool {
        self.slots
            .get(agent_id)
            .map(|slot| matches!(*slot, Slot::Requested))
            .unwrap_or(false)
    }

    /// Get a snapshot of the dispatcher counters.
    pub fn metrics(&self) -> DispatcherSnapshot {
        self.metrics.snapshot()
    }

    /// Subscribe to work assignments and apply them in arrival order.
    ///
    /// The subscription is active when this returns.
    pub async fn listen(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let mut stream = self.bus.subscribe(WORK_ASSIGNED_SUBJECTS).await?;

        Ok(tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(Event::WorkAssigned(payload)) => self.on_work_assigned(payload),
                    Ok(other) => debug!(subject = %other.subject(), "Ignoring event"),
                    Err(e) => warn!("Failed to receive work assignment: {}", e),
                }
            }
            debug!("Work assignment listener stopped");
        }))
    }
}
