//! Workflow state for agent crews.
//!
//! Holds the catalog of agent systems, the per-kind task templates, and the
//! `WorkflowStore` that owns one system's task chain and execution envelope.

pub mod catalog;
pub mod store;
pub mod templates;

pub use catalog::Catalog;
pub use store::WorkflowStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("agent system {0} has no agents")]
    EmptyRoster(String),

    #[error("workflow for {workflow} does not belong to system {system}")]
    SystemMismatch { system: String, workflow: String },
}
