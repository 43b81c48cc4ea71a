//! Shared dashboard state: one simulation session per agent system.
//!
//! Sessions are keyed by system id. A tick advances every simulation and
//! re-projects its graph under the same borrow, so a session's graph always
//! matches its tasks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crewflow_graph::project;
use crewflow_protocol::{AgentSystem, SystemKind, TaskStatus, Workflow, WorkflowGraph};
use crewflow_sim::{RandomDecider, SimError, Simulation, TickReport, WorkflowSource};
use crewflow_state::{Catalog, WorkflowStore};

use crate::config::SimulationConfig;

/// A running simulation with its current projection.
pub struct Session {
    simulation: Simulation,
    graph: WorkflowGraph,
    last_report: Option<TickReport>,
}

impl Session {
    pub fn new(simulation: Simulation) -> Self {
        let graph = project_store(simulation.store());
        Self {
            simulation,
            graph,
            last_report: None,
        }
    }

    pub fn system(&self) -> &AgentSystem {
        self.simulation.store().system()
    }

    pub fn workflow(&self) -> &Workflow {
        self.simulation.workflow()
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.simulation.ticks()
    }

    /// Advance one tick and re-project.
    pub fn tick(&mut self) -> &TickReport {
        let report = self.simulation.tick();
        self.graph = project_store(self.simulation.store());
        self.last_report.insert(report)
    }

    pub fn summary(&self) -> SystemSummary {
        let system = self.system();
        let workflow = self.workflow();
        SystemSummary {
            id: system.id.clone(),
            name: system.name.clone(),
            kind: system.kind,
            agents: system.agents.len(),
            progress: workflow.execution.progress,
            active_task: workflow.active_task().map(|t| t.name.clone()),
            finished: workflow.is_finished(),
            ticks: self.ticks(),
        }
    }
}

fn project_store(store: &WorkflowStore) -> WorkflowGraph {
    let system = store.system();
    project(store.tasks(), &system.agents, &system.id)
}

/// Catalog row with live progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub id: String,
    pub name: String,
    pub kind: SystemKind,
    pub agents: usize,
    pub progress: u8,
    pub active_task: Option<String>,
    pub finished: bool,
    pub ticks: u64,
}

pub struct DashboardState {
    sessions: BTreeMap<String, Session>,
    started_at: DateTime<Utc>,
    ticks: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            started_at: Utc::now(),
            ticks: 0,
        }
    }

    /// Fetch each system's workflow from `source` and start a session for it.
    ///
    /// Session `i` gets a decider seeded with `seed + i` when a seed is set.
    pub async fn load(
        catalog: &Catalog,
        source: &dyn WorkflowSource,
        system_ids: &[String],
        sim: &SimulationConfig,
    ) -> Result<Self, SimError> {
        let mut state = Self::new();
        for (index, system_id) in system_ids.iter().enumerate() {
            let system = catalog
                .get(system_id)
                .ok_or_else(|| SimError::UnknownSystem(system_id.clone()))?;
            let workflow = source.fetch(system_id).await?;
            let store = WorkflowStore::from_workflow(system, workflow)?
                .with_task_duration(sim.task_duration_secs);
            let seed = sim.seed.map(|s| s.wrapping_add(index as u64));
            let decider = RandomDecider::new(sim.odds(), seed);
            let simulation =
                Simulation::new(store, Box::new(decider)).with_max_outputs(sim.max_outputs);
            tracing::info!(
                system_id = %system_id,
                source = source.name(),
                seeded = seed.is_some(),
                "Session started"
            );
            state.insert(Session::new(simulation));
        }
        Ok(state)
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.system().id.clone(), session);
    }

    pub fn session(&self, system_id: &str) -> Option<&Session> {
        self.sessions.get(system_id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of runner ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance every session by one tick.
    pub fn tick_all(&mut self) {
        self.ticks += 1;
        for (system_id, session) in self.sessions.iter_mut() {
            let report = session.tick();
            if !report.events.is_empty() {
                tracing::debug!(
                    system_id = %system_id,
                    tick = report.tick,
                    events = report.events.len(),
                    progress = report.progress,
                    "Tick applied"
                );
            }
        }
    }

    pub fn summaries(&self) -> Vec<SystemSummary> {
        self.sessions.values().map(Session::summary).collect()
    }

    /// Total tasks that are in progress across all sessions.
    pub fn active_task_count(&self) -> usize {
        self.sessions
            .values()
            .flat_map(|s| s.workflow().tasks.iter())
            .filter(|t| t.status == TaskStatus::InProgress)
            .count()
    }
}
