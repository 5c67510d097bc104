//! Queue of jobs waiting for an agent.

use chrono::{DateTime, Utc};
use oxide_core::agent::Agent;
use oxide_core::work::{JobIdentifier, MaterialSync};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Priority for queue items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// A scheduled job waiting for a matching agent.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job: JobIdentifier,
    /// Resources the agent must provide.
    pub resources: Vec<String>,
    /// Environment the agent must belong to, if any.
    pub environment: Option<String>,
    pub materials: Vec<MaterialSync>,
    pub priority: Priority,
    pub queued_at: DateTime<Utc>,
}

impl QueuedJob {
    pub fn new(job: JobIdentifier, materials: Vec<MaterialSync>) -> Self {
        Self {
            job,
            resources: vec![],
            environment: None,
            materials,
            priority: Priority::Normal,
            queued_at: Utc::now(),
        }
    }

    pub fn with_resources(mut self, resources: &[&str]) -> Self {
        self.resources = resources.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the agent provides everything this job needs.
    pub fn can_run_on(&self, agent: &Agent) -> bool {
        agent.has_resources(&self.resources)
            && self
                .environment
                .as_deref()
                .is_none_or(|env| agent.in_environment(env))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.job == other.job
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then earlier queued time
        match (self.priority as u8).cmp(&(other.priority as u8)) {
            Ordering::Equal => other.queued_at.cmp(&self.queued_at),
            other => other,
        }
    }
}

/// Priority queue of jobs.
#[derive(Default)]
pub struct JobQueue {
    queue: BinaryHeap<QueuedJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job to the queue.
    pub fn enqueue(&mut self, job: QueuedJob) {
        self.queue.push(job);
    }

    /// Remove and return the most urgent job the agent can run.
    pub fn take_for(&mut self, agent: &Agent) -> Option<QueuedJob> {
        let mut skipped = Vec::new();
        let mut result = None;

        while let Some(job) = self.queue.pop() {
            if job.can_run_on(agent) {
                result = Some(job);
                break;
            }
            skipped.push(job);
        }

        // Put back jobs the agent could not take
        for job in skipped {
            self.queue.push(job);
        }

        result
    }

    /// Get the current queue length.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get the position of a job in the queue.
    pub fn position(&self, job: &JobIdentifier) -> Option<usize> {
        let mut sorted: Vec<_> = self.queue.iter().collect();
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.iter().position(|queued| queued.job == *job)
    }
}
