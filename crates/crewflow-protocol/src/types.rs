use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;

/// Identifier of an agent inside an agent system roster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An agent in a system roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Agent {
    pub fn new(id: &str, name: &str, role: &str) -> Self {
        Self {
            id: AgentId::new(id),
            name: name.to_string(),
            role: role.to_string(),
        }
    }
}

/// Kind of agent system. Selects the task-name table used to build its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Content,
    #[serde(alias = "lead-generation")]
    Leadgen,
    Sales,
    Onboarding,
    #[default]
    Custom,
}

impl SystemKind {
    /// Infer the kind from a system id such as `content-crew` or `leadgen`.
    pub fn from_system_id(system_id: &str) -> Self {
        let id = system_id.to_ascii_lowercase();
        if id.contains("content") {
            SystemKind::Content
        } else if id.contains("leadgen") || id.contains("lead-gen") {
            SystemKind::Leadgen
        } else if id.contains("sales") {
            SystemKind::Sales
        } else if id.contains("onboarding") {
            SystemKind::Onboarding
        } else {
            SystemKind::Custom
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Content => "content",
            Self::Leadgen => "leadgen",
            Self::Sales => "sales",
            Self::Onboarding => "onboarding",
            Self::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

/// An agent system: a named crew of agents working one workflow.
///
/// When `kind` is missing from the input it is inferred from the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "AgentSystemInput")]
pub struct AgentSystem {
    pub id: String,
    pub name: String,
    pub kind: SystemKind,
    pub agents: Vec<Agent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentSystemInput {
    id: String,
    name: String,
    #[serde(default)]
    kind: Option<SystemKind>,
    agents: Vec<Agent>,
}

impl From<AgentSystemInput> for AgentSystem {
    fn from(input: AgentSystemInput) -> Self {
        let kind = input
            .kind
            .unwrap_or_else(|| SystemKind::from_system_id(&input.id));
        Self {
            id: input.id,
            name: input.name,
            kind,
            agents: input.agents,
        }
    }
}

impl AgentSystem {
    /// Look up a roster member by id.
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }
}

/// Status of a workflow task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A step in an agent system's workflow. Tasks form a chain through `next_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub assigned_to: AgentId,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_task: Option<String>,
}

impl Task {
    pub fn new(name: impl Into<String>, assigned_to: AgentId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            status: TaskStatus::Pending,
            start_time: None,
            end_time: None,
            assigned_to,
            outputs: Vec::new(),
            next_task: None,
        }
    }
}

/// Record of work passing from one agent to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHandoff {
    pub from: AgentId,
    pub to: AgentId,
    pub time: DateTime<Utc>,
    pub data: String,
}

/// Record of the supervising simulation stepping in on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimIntervention {
    pub time: DateTime<Utc>,
    pub agent_id: AgentId,
    pub action: String,
    pub reason: String,
}

/// Execution-wide progress and the append-only handoff/intervention logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEnvelope {
    pub start_time: DateTime<Utc>,
    pub estimated_end_time: DateTime<Utc>,
    /// 0..=100
    pub progress: u8,
    #[serde(default)]
    pub agent_handoffs: Vec<AgentHandoff>,
    #[serde(default)]
    pub sim_interventions: Vec<SimIntervention>,
}

/// Percentage of completed tasks, rounded to the nearest integer.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

/// The full workflow of one agent system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub system_id: String,
    pub tasks: Vec<Task>,
    pub execution: ExecutionEnvelope,
}

impl Workflow {
    /// Index of the task currently in progress, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.status == TaskStatus::InProgress)
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active_index().map(|i| &self.tasks[i])
    }

    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        !self.tasks.is_empty() && self.completed_count() == self.tasks.len()
    }

    /// Recompute `execution.progress` from the task list.
    pub fn recompute_progress(&mut self) -> u8 {
        self.execution.progress = progress_percent(self.completed_count(), self.tasks.len());
        self.execution.progress
    }

    /// Check the structural invariants of a workflow received from outside.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let active: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| t.id.clone())
            .collect();
        if active.len() > 1 {
            return Err(ProtocolError::MultipleActiveTasks(active));
        }

        for task in &self.tasks {
            if let Some(next) = &task.next_task {
                if self.task_index(next).is_none() {
                    return Err(ProtocolError::DanglingNextTask {
                        task_id: task.id.clone(),
                        next_task: next.clone(),
                    });
                }
            }
        }

        // Graph node ids are agent ids, so an agent may own at most one task.
        let mut seen = std::collections::HashSet::new();
        for task in &self.tasks {
            if !seen.insert(&task.assigned_to) {
                return Err(ProtocolError::DuplicateAssignee {
                    agent_id: task.assigned_to.to_string(),
                });
            }
        }

        if self.execution.progress > 100 {
            return Err(ProtocolError::ProgressOutOfRange(self.execution.progress));
        }
        Ok(())
    }

    /// Parse a JSON array of workflows, validating each one.
    pub fn parse_many(json: &str) -> Result<Vec<Workflow>, ProtocolError> {
        let workflows: Vec<Workflow> = serde_json::from_str(json)?;
        for workflow in &workflows {
            workflow.validate()?;
        }
        Ok(workflows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(statuses: &[TaskStatus]) -> Workflow {
        let mut tasks: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut t = Task::new(format!("Step {}", i + 1), AgentId::new(format!("a{i}")));
                t.id = format!("t{i}");
                t.status = *s;
                t
            })
            .collect();
        for i in 0..tasks.len().saturating_sub(1) {
            tasks[i].next_task = Some(format!("t{}", i + 1));
        }
        let now = Utc::now();
        Workflow {
            system_id: "sys".into(),
            tasks,
            execution: ExecutionEnvelope {
                start_time: now,
                estimated_end_time: now,
                progress: 0,
                agent_handoffs: Vec::new(),
                sim_interventions: Vec::new(),
            },
        }
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(progress_percent(0, 5), 0);
        assert_eq!(progress_percent(2, 5), 40);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(5, 5), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn test_task_status_wire_form() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
    }

    #[test]
    fn test_task_uses_camel_case_fields() {
        let mut task = Task::new("Draft Content", AgentId::new("writer"));
        task.next_task = Some("next".into());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["assignedTo"], "writer");
        assert_eq!(value["nextTask"], "next");
        assert!(value.get("startTime").is_none());
    }

    #[test]
    fn test_validate_rejects_two_active_tasks() {
        let wf = chain(&[TaskStatus::InProgress, TaskStatus::InProgress]);
        assert!(matches!(
            wf.validate(),
            Err(ProtocolError::MultipleActiveTasks(ids)) if ids.len() == 2
        ));
    }

    #[test]
    fn test_validate_rejects_dangling_next() {
        let mut wf = chain(&[TaskStatus::Completed, TaskStatus::InProgress]);
        wf.tasks[1].next_task = Some("missing".into());
        assert!(matches!(wf.validate(), Err(ProtocolError::DanglingNextTask { .. })));
    }

    #[test]
    fn test_validate_rejects_agent_with_two_tasks() {
        let mut wf = chain(&[TaskStatus::Completed, TaskStatus::InProgress, TaskStatus::Pending]);
        wf.tasks[2].assigned_to = AgentId::new("a0");
        assert!(matches!(
            wf.validate(),
            Err(ProtocolError::DuplicateAssignee { agent_id }) if agent_id == "a0"
        ));
    }

    #[test]
    fn test_recompute_progress() {
        let mut wf = chain(&[
            TaskStatus::Completed,
            TaskStatus::Completed,
            TaskStatus::InProgress,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]);
        assert_eq!(wf.recompute_progress(), 40);
        assert_eq!(wf.active_index(), Some(2));
        assert!(!wf.is_finished());
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_kind_from_system_id() {
        assert_eq!(SystemKind::from_system_id("content-crew"), SystemKind::Content);
        assert_eq!(SystemKind::from_system_id("LeadGen"), SystemKind::Leadgen);
        assert_eq!(SystemKind::from_system_id("sales"), SystemKind::Sales);
        assert_eq!(SystemKind::from_system_id("client-onboarding"), SystemKind::Onboarding);
        assert_eq!(SystemKind::from_system_id("research"), SystemKind::Custom);
    }

    #[test]
    fn test_missing_kind_is_inferred_from_id() {
        let system: AgentSystem = serde_json::from_str(
            r#"{"id": "content-eu", "name": "EU Content", "agents": []}"#,
        )
        .unwrap();
        assert_eq!(system.kind, SystemKind::Content);

        let explicit: AgentSystem = serde_json::from_str(
            r#"{"id": "content-eu", "name": "EU Content", "kind": "custom", "agents": []}"#,
        )
        .unwrap();
        assert_eq!(explicit.kind, SystemKind::Custom);
    }
}
