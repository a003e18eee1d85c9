//! Reelforge - persona-to-video generation service
//!
//! Configuration, service-backed agents and the HTTP layer around the
//! `reelforge-workflow` pipeline. Exposed as a library for integration tests.

pub mod agents;
pub mod config;
pub mod providers;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use reelforge_workflow::{Orchestrator, TaskRegistry};

/// Build a task registry whose agents follow `config`.
///
/// Production clients use blocking HTTP and must be created outside any
/// async runtime.
pub fn build_registry(config: &config::Config) -> Result<Arc<TaskRegistry>> {
    let agents = agents::select_agents(config)?;
    Ok(Arc::new(TaskRegistry::new(Orchestrator::new(agents))))
}
