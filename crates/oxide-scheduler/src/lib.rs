//! Work dispatch for Oxide CI.
//!
//! Agents poll the [`WorkDispatcher`], which raises an idle signal on the bus.
//! A [`WorkFinder`] answers each signal with a work assignment that the
//! dispatcher stores until the agent's next poll.

pub mod config;
pub mod dispatcher;
pub mod finder;
pub mod metrics;
pub mod queue;
pub mod selector;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::DispatcherConfig;
pub use dispatcher::WorkDispatcher;
pub use finder::WorkFinder;
pub use metrics::{DispatcherMetrics, DispatcherSnapshot};
pub use queue::{JobQueue, Priority, QueuedJob};
pub use selector::QueueWorkSelector;
pub use service::DispatchService;
