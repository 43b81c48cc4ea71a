//! In-memory workflow state for a single agent system.
//!
//! The store owns the task chain and the execution envelope. It exposes the
//! mutation primitives a simulation composes into a tick: completing the
//! active task (with promotion and handoff), recording outputs, and recording
//! SIM interventions. Every primitive preserves the single-active-task
//! invariant; progress is recomputed explicitly by the caller.

use chrono::{DateTime, Duration, Utc};

use crewflow_protocol::{
    AgentHandoff, AgentId, AgentSystem, ExecutionEnvelope, SimIntervention, Task, TaskStatus,
    Workflow, DEFAULT_TASK_DURATION_SECS, INITIAL_COMPLETED_TASKS, OUTPUT_POOL,
};

use crate::templates::task_names;
use crate::StateError;

pub struct WorkflowStore {
    system: AgentSystem,
    workflow: Workflow,
    task_duration: Duration,
}

impl WorkflowStore {
    /// Build the five-task workflow for `system`, as of now.
    pub fn initialize(system: &AgentSystem) -> Result<Self, StateError> {
        Self::initialize_at(system, Utc::now(), DEFAULT_TASK_DURATION_SECS)
    }

    /// Build the five-task workflow for `system`.
    ///
    /// Task `i` goes to roster agent `i`. The first two tasks are already
    /// completed, the third is in progress and the rest are pending. Handoffs
    /// for the transitions already performed are recorded up front.
    pub fn initialize_at(
        system: &AgentSystem,
        now: DateTime<Utc>,
        task_duration_secs: i64,
    ) -> Result<Self, StateError> {
        if system.agents.is_empty() {
            return Err(StateError::EmptyRoster(system.id.clone()));
        }

        let names = task_names(system.kind);
        if system.agents.len() < names.len() {
            tracing::warn!(
                system_id = %system.id,
                agents = system.agents.len(),
                tasks = names.len(),
                "Roster is smaller than the task template; trailing tasks stay unassigned"
            );
        }

        let duration = Duration::seconds(task_duration_secs);
        let start_time = now - duration * INITIAL_COMPLETED_TASKS as i32;

        let mut tasks: Vec<Task> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let assignee = system
                    .agents
                    .get(i)
                    .map(|a| a.id.clone())
                    .unwrap_or_else(|| AgentId::new(format!("{}-unassigned-{}", system.id, i + 1)));
                let mut task = Task::new(*name, assignee);
                task.id = format!("{}-task-{}", system.id, i + 1);
                task
            })
            .collect();

        let mut agent_handoffs = Vec::new();
        for i in 0..tasks.len() {
            let task_start = start_time + duration * i as i32;
            if i < INITIAL_COMPLETED_TASKS {
                tasks[i].status = TaskStatus::Completed;
                tasks[i].start_time = Some(task_start);
                tasks[i].end_time = Some(task_start + duration);
                tasks[i].outputs.push(OUTPUT_POOL[i % OUTPUT_POOL.len()].to_string());
            } else if i == INITIAL_COMPLETED_TASKS {
                tasks[i].status = TaskStatus::InProgress;
                tasks[i].start_time = Some(task_start);
            }
            if i + 1 < names.len() {
                tasks[i].next_task = Some(format!("{}-task-{}", system.id, i + 2));
            }
            if i > 0 && i <= INITIAL_COMPLETED_TASKS {
                agent_handoffs.push(AgentHandoff {
                    from: tasks[i - 1].assigned_to.clone(),
                    to: tasks[i].assigned_to.clone(),
                    time: task_start,
                    data: handoff_data(&tasks[i - 1]),
                });
            }
        }

        let remaining = (tasks.len() - INITIAL_COMPLETED_TASKS) as i32;
        let mut workflow = Workflow {
            system_id: system.id.clone(),
            tasks,
            execution: ExecutionEnvelope {
                start_time,
                estimated_end_time: now + duration * remaining,
                progress: 0,
                agent_handoffs,
                sim_interventions: Vec::new(),
            },
        };
        workflow.recompute_progress();

        tracing::debug!(system_id = %system.id, "Initialized workflow");

        Ok(Self {
            system: system.clone(),
            workflow,
            task_duration: duration,
        })
    }

    /// Wrap a workflow obtained elsewhere (e.g. a fixture file).
    ///
    /// Progress is recomputed from the task list; the recorded value is not trusted.
    pub fn from_workflow(system: &AgentSystem, mut workflow: Workflow) -> Result<Self, StateError> {
        if workflow.system_id != system.id {
            return Err(StateError::SystemMismatch {
                system: system.id.clone(),
                workflow: workflow.system_id,
            });
        }
        let recorded = workflow.execution.progress;
        if workflow.recompute_progress() != recorded {
            tracing::debug!(
                system_id = %system.id,
                recorded,
                progress = workflow.execution.progress,
                "Corrected stale workflow progress"
            );
        }
        Ok(Self {
            system: system.clone(),
            workflow,
            task_duration: Duration::seconds(DEFAULT_TASK_DURATION_SECS),
        })
    }

    /// Duration used to push `estimatedEndTime` forward on completion.
    pub fn with_task_duration(mut self, secs: i64) -> Self {
        self.task_duration = Duration::seconds(secs);
        self
    }

    pub fn task_duration(&self) -> Duration {
        self.task_duration
    }

    pub fn system(&self) -> &AgentSystem {
        &self.system
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn tasks(&self) -> &[Task] {
        &self.workflow.tasks
    }

    pub fn execution(&self) -> &ExecutionEnvelope {
        &self.workflow.execution
    }

    pub fn active_index(&self) -> Option<usize> {
        self.workflow.active_index()
    }

    /// Complete the active task and promote its successor.
    ///
    /// Returns the handoff recorded, or `None` when there was no successor
    /// (the task is still completed) or no active task at all.
    pub fn complete_active(&mut self, now: DateTime<Utc>) -> Option<AgentHandoff> {
        let idx = self.active_index()?;
        let tasks = &mut self.workflow.tasks;

        tasks[idx].status = TaskStatus::Completed;
        tasks[idx].end_time = Some(now);

        let next_idx = tasks[idx]
            .next_task
            .as_ref()
            .and_then(|next| tasks.iter().position(|t| &t.id == next));

        let remaining = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .count() as i32;
        self.workflow.execution.estimated_end_time = now + self.task_duration * remaining;

        let next_idx = match next_idx {
            Some(n) if tasks[n].status == TaskStatus::Pending => n,
            _ => {
                tracing::info!(
                    system_id = %self.workflow.system_id,
                    task_id = %tasks[idx].id,
                    "Final task completed"
                );
                return None;
            }
        };

        tasks[next_idx].status = TaskStatus::InProgress;
        tasks[next_idx].start_time = Some(now);

        let handoff = AgentHandoff {
            from: tasks[idx].assigned_to.clone(),
            to: tasks[next_idx].assigned_to.clone(),
            time: now,
            data: handoff_data(&tasks[idx]),
        };
        tracing::info!(
            system_id = %self.workflow.system_id,
            from = %handoff.from,
            to = %handoff.to,
            task_id = %tasks[next_idx].id,
            "Agent handoff"
        );
        self.workflow.execution.agent_handoffs.push(handoff.clone());
        Some(handoff)
    }

    /// Append an output line to the active task unless it already holds `max_outputs`.
    pub fn append_output(&mut self, output: &str, max_outputs: usize) -> bool {
        let Some(idx) = self.active_index() else {
            return false;
        };
        let task = &mut self.workflow.tasks[idx];
        if task.outputs.len() >= max_outputs {
            return false;
        }
        task.outputs.push(output.to_string());
        true
    }

    /// Record a SIM intervention against `agent_id`.
    pub fn record_intervention(
        &mut self,
        agent_id: AgentId,
        action: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> SimIntervention {
        let intervention = SimIntervention {
            time: now,
            agent_id,
            action: action.to_string(),
            reason: reason.to_string(),
        };
        tracing::debug!(
            system_id = %self.workflow.system_id,
            agent = %intervention.agent_id,
            action,
            "SIM intervention"
        );
        self.workflow.execution.sim_interventions.push(intervention.clone());
        intervention
    }

    pub fn recompute_progress(&mut self) -> u8 {
        self.workflow.recompute_progress()
    }
}

fn handoff_data(task: &Task) -> String {
    match task.outputs.last() {
        Some(last) => format!("{}: {}", task.name, last),
        None => format!("{} results", task.name),
    }
}
