//! Oxide CI Lineage
//!
//! Value stream maps: the upstream sources and downstream runs connected
//! to one pipeline run or one material revision, laid out in levels for
//! rendering.

pub mod graph;
pub mod layout;
pub mod populate;
pub mod service;

#[cfg(test)]
mod testing;

pub use graph::{
    Node, NodeId, NodeKind, NodeRevision, PipelineRevision, StageOutcome, ValueStreamMap, ViewType,
};
pub use layout::{PresentationModel, PresentedNode};
pub use populate::{DownstreamInstancePopulator, RunStagesPopulator, UnrunStagesPopulator};
pub use service::ValueStreamMapService;
