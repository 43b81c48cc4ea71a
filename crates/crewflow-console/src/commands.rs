//! One-shot CLI commands.

use anyhow::{Context, Result};
use serde::Serialize;

use crewflow_protocol::{Workflow, WorkflowGraph};

use crate::config::Config;
use crate::dashboard::{DashboardState, SystemSummary};

/// Final state of a headless run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub summary: SystemSummary,
    pub workflow: Workflow,
    pub graph: WorkflowGraph,
}

/// Advance `system_id` by `ticks` ticks without a timer and return the result.
///
/// `seed` overrides `[simulation].seed`.
pub async fn run_headless(
    config: &Config,
    system_id: &str,
    ticks: u64,
    seed: Option<u64>,
) -> Result<RunOutput> {
    let mut sim = config.simulation.clone();
    if seed.is_some() {
        sim.seed = seed;
    }

    let catalog = config.catalog();
    let source = config.workflow_source();
    let mut state = DashboardState::load(&catalog, source.as_ref(), &[system_id.to_string()], &sim)
        .await
        .with_context(|| format!("starting session for {system_id}"))?;

    for _ in 0..ticks {
        state.tick_all();
    }

    let session = state
        .session(system_id)
        .with_context(|| format!("no session for {system_id}"))?;
    tracing::info!(
        system_id,
        ticks,
        progress = session.workflow().execution.progress,
        "Headless run finished"
    );
    Ok(RunOutput {
        summary: session.summary(),
        workflow: session.workflow().clone(),
        graph: session.graph().clone(),
    })
}

/// One line per catalog system.
pub fn system_lines(config: &Config) -> Vec<String> {
    config
        .catalog()
        .systems()
        .iter()
        .map(|s| {
            let agents: Vec<&str> = s.agents.iter().map(|a| a.id.as_str()).collect();
            format!(
                "{:<12} {:<28} {:<11} {}",
                s.id,
                s.name,
                s.kind.to_string(),
                agents.join(", ")
            )
        })
        .collect()
}
