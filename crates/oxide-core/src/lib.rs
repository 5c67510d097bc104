//! Oxide CI Core
//!
//! Core domain types, traits, and error handling for Oxide CI.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the dispatcher, the material planner and the lineage builder.

pub mod agent;
pub mod error;
pub mod events;
pub mod ids;
pub mod material;
pub mod pipeline;
pub mod ports;
pub mod revision;
pub mod run;
pub mod work;

pub use error::{Error, Result};
pub use ids::*;
