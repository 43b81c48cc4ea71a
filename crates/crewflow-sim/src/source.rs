//! Where workflows come from.
//!
//! A `WorkflowSource` turns a system id into a [`Workflow`]. The simulated
//! source builds the template workflow from the catalog; the fixture source
//! reads recorded workflows from a JSON file. Which one is used is a
//! configuration decision; `FallbackSource` makes a fallback explicit instead
//! of hiding it in an error branch.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crewflow_protocol::{Workflow, DEFAULT_TASK_DURATION_SECS};
use crewflow_state::{Catalog, WorkflowStore};

use crate::SimError;

pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Workflow, SimError>> + Send + 'a>>;

/// Provider of the workflow for an agent system.
pub trait WorkflowSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn fetch<'a>(&'a self, system_id: &'a str) -> SourceFuture<'a>;
}

/// Builds the template workflow for catalog systems.
pub struct SimulatedSource {
    catalog: Catalog,
    task_duration_secs: i64,
}

impl SimulatedSource {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            task_duration_secs: DEFAULT_TASK_DURATION_SECS,
        }
    }

    pub fn with_task_duration(mut self, secs: i64) -> Self {
        self.task_duration_secs = secs;
        self
    }
}

impl WorkflowSource for SimulatedSource {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn fetch<'a>(&'a self, system_id: &'a str) -> SourceFuture<'a> {
        Box::pin(async move {
            let system = self
                .catalog
                .get(system_id)
                .ok_or_else(|| SimError::UnknownSystem(system_id.to_string()))?;
            let store = WorkflowStore::initialize_at(
                system,
                chrono::Utc::now(),
                self.task_duration_secs,
            )?;
            Ok(store.workflow().clone())
        })
    }
}

/// Reads workflows from a JSON array on disk. The file is re-read on every
/// fetch so edits show up without a restart.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorkflowSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn fetch<'a>(&'a self, system_id: &'a str) -> SourceFuture<'a> {
        Box::pin(async move {
            let raw = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SimError::FixtureIo {
                    path: self.path.display().to_string(),
                    source,
                })?;
            Workflow::parse_many(&raw)?
                .into_iter()
                .find(|w| w.system_id == system_id)
                .ok_or_else(|| SimError::UnknownSystem(system_id.to_string()))
        })
    }
}

/// Tries `primary`, and on failure logs the error and asks `fallback`.
pub struct FallbackSource {
    primary: Box<dyn WorkflowSource>,
    fallback: Box<dyn WorkflowSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn WorkflowSource>, fallback: Box<dyn WorkflowSource>) -> Self {
        Self { primary, fallback }
    }
}

impl WorkflowSource for FallbackSource {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn fetch<'a>(&'a self, system_id: &'a str) -> SourceFuture<'a> {
        Box::pin(async move {
            match self.primary.fetch(system_id).await {
                Ok(workflow) => Ok(workflow),
                Err(e) => {
                    tracing::warn!(
                        system_id,
                        primary = self.primary.name(),
                        fallback = self.fallback.name(),
                        error = %e,
                        "Workflow source failed, using fallback"
                    );
                    self.fallback.fetch(system_id).await
                }
            }
        })
    }
}
