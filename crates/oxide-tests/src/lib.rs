//! Integration test infrastructure for Oxide CI.
//!
//! Shared fixtures for cross-crate scenarios, plus testcontainers-based
//! infrastructure for running the NATS bus against a real server.
//!
//! # Usage
//!
//! ```ignore
//! use oxide_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::nats_only().await?;
//!     // Use ctx.event_bus, ctx.nats_url(), etc.
//! }
//! ```

pub mod containers;
pub mod context;
pub mod fixtures;

pub use context::TestContext;
pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,oxide_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
