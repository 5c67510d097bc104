//! Test doubles shared by the scheduler's unit tests.

use async_trait::async_trait;
use futures::stream;
use oxide_core::agent::{Agent, AgentIdentity, AgentStatus, Os};
use oxide_core::events::Event;
use oxide_core::ids::{AgentId, WorkId};
use oxide_core::material::{GitMaterial, Material};
use oxide_core::ports::{EventBus, EventStream};
use oxide_core::revision::{Revision, RevisionContext};
use oxide_core::work::{BuildWork, JobIdentifier, MaterialSync, Work};
use oxide_core::{Error, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Event bus that records published events and never delivers them.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<Event>>,
    failing: AtomicBool,
}

impl RecordingBus {
    pub fn fail_publishing(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn idle_signals(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::AgentIdle(_)))
            .count()
    }

    pub fn assignments(&self) -> Vec<Work> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::WorkAssigned(p) => Some(p.work),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish(&self, event: Event) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::NoSubscribers(event.subject()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn subscribe(&self, _pattern: &str) -> Result<EventStream> {
        Ok(Box::pin(stream::empty()))
    }
}

pub fn agent(hostname: &str) -> Agent {
    Agent {
        identity: AgentIdentity::new(AgentId::new(), hostname, "10.0.0.1"),
        status: AgentStatus::Idle,
        resources: vec!["linux".to_string()],
        environments: vec![],
        os: Os::Linux,
        last_heartbeat_at: None,
    }
}

pub fn build_work(agent: &Agent, job: &str) -> Work {
    Work::Build(BuildWork {
        id: WorkId::new(),
        agent_id: agent.id(),
        job: JobIdentifier::new("build", 1, "compile", 1, job),
        materials: vec![MaterialSync {
            material: Material::Git(GitMaterial::new("https://git/repo")),
            revision: RevisionContext::new(Revision::new("abc123")),
        }],
    })
}
