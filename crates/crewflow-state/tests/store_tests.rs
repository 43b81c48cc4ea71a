use chrono::{TimeZone, Utc};
use crewflow_protocol::{Agent, AgentId, AgentSystem, SystemKind, TaskStatus};
use crewflow_state::{Catalog, StateError, WorkflowStore};

fn system_with(agents: usize) -> AgentSystem {
    AgentSystem {
        id: "content".into(),
        name: "Content".into(),
        kind: SystemKind::Content,
        agents: (0..agents)
            .map(|i| Agent::new(&format!("agent-{}", i + 1), &format!("Agent {}", i + 1), ""))
            .collect(),
    }
}

#[test]
fn test_initialize_builds_template_chain() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let store = WorkflowStore::initialize_at(&system_with(5), now, 600).unwrap();
    let tasks = store.tasks();

    assert_eq!(tasks.len(), 5);
    assert_eq!(tasks[0].name, "Research Topic");
    let statuses: Vec<TaskStatus> = tasks.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![
            TaskStatus::Completed,
            TaskStatus::Completed,
            TaskStatus::InProgress,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]
    );
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.assigned_to, AgentId::new(format!("agent-{}", i + 1)));
    }
    for pair in tasks.windows(2) {
        assert_eq!(pair[0].next_task.as_deref(), Some(pair[1].id.as_str()));
    }
    assert!(tasks[4].next_task.is_none());
    assert_eq!(tasks[2].start_time, Some(now));
    assert!(tasks[3].start_time.is_none());
}

#[test]
fn test_initialize_seeds_envelope() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let store = WorkflowStore::initialize_at(&system_with(5), now, 600).unwrap();
    let exec = store.execution();

    assert_eq!(exec.progress, 40);
    assert_eq!(exec.start_time, now - chrono::Duration::seconds(1200));
    assert_eq!(exec.estimated_end_time, now + chrono::Duration::seconds(1800));
    let pairs: Vec<(&str, &str)> = exec
        .agent_handoffs
        .iter()
        .map(|h| (h.from.as_str(), h.to.as_str()))
        .collect();
    assert_eq!(pairs, vec![("agent-1", "agent-2"), ("agent-2", "agent-3")]);
    assert!(exec.sim_interventions.is_empty());
}

#[test]
fn test_initialize_short_roster_leaves_unresolved_assignees() {
    let system = system_with(3);
    let store = WorkflowStore::initialize(&system).unwrap();
    let unresolved: Vec<_> = store
        .tasks()
        .iter()
        .filter(|t| system.agent(&t.assigned_to).is_none())
        .collect();
    assert_eq!(unresolved.len(), 2);
}

#[test]
fn test_initialize_empty_roster_fails() {
    assert!(matches!(
        WorkflowStore::initialize(&system_with(0)),
        Err(StateError::EmptyRoster(_))
    ));
}

#[test]
fn test_complete_active_promotes_and_hands_off() {
    let mut store = WorkflowStore::initialize(&system_with(5)).unwrap();
    let now = Utc::now();
    let handoff = store.complete_active(now).expect("handoff");

    assert_eq!(handoff.from.as_str(), "agent-3");
    assert_eq!(handoff.to.as_str(), "agent-4");
    assert_eq!(store.tasks()[2].status, TaskStatus::Completed);
    assert_eq!(store.tasks()[2].end_time, Some(now));
    assert_eq!(store.tasks()[3].status, TaskStatus::InProgress);
    assert_eq!(store.tasks()[3].start_time, Some(now));
    assert_eq!(store.active_index(), Some(3));
    assert_eq!(store.recompute_progress(), 60);
}

#[test]
fn test_complete_last_task_has_no_handoff() {
    let mut store = WorkflowStore::initialize(&system_with(5)).unwrap();
    let now = Utc::now();
    assert!(store.complete_active(now).is_some());
    assert!(store.complete_active(now).is_some());
    assert!(store.complete_active(now).is_none());
    assert_eq!(store.active_index(), None);
    assert_eq!(store.recompute_progress(), 100);
    assert_eq!(store.execution().agent_handoffs.len(), 4);
    assert!(store.complete_active(now).is_none());
}

#[test]
fn test_append_output_respects_cap() {
    let mut store = WorkflowStore::initialize(&system_with(5)).unwrap();
    assert!(store.append_output("one", 3));
    assert!(store.append_output("two", 3));
    assert!(store.append_output("three", 3));
    assert!(!store.append_output("four", 3));
    assert_eq!(store.tasks()[2].outputs, vec!["one", "two", "three"]);
}

#[test]
fn test_intervention_is_appended() {
    let mut store = WorkflowStore::initialize(&system_with(5)).unwrap();
    let agent = store.tasks()[2].assigned_to.clone();
    let record =
        store.record_intervention(agent, "Adjusted task priority", "Slow progress", Utc::now());
    assert_eq!(record.agent_id.as_str(), "agent-3");
    assert_eq!(store.execution().sim_interventions, vec![record]);
}

#[test]
fn test_from_workflow_checks_system() {
    let catalog = Catalog::builtin();
    let content = catalog.get("content").unwrap();
    let sales = catalog.get("sales").unwrap();
    let workflow = WorkflowStore::initialize(content).unwrap().workflow().clone();

    assert!(WorkflowStore::from_workflow(content, workflow.clone()).is_ok());
    assert!(matches!(
        WorkflowStore::from_workflow(sales, workflow),
        Err(StateError::SystemMismatch { .. })
    ));
}

#[test]
fn test_from_workflow_recomputes_stale_progress() {
    let catalog = Catalog::builtin();
    let content = catalog.get("content").unwrap();
    let mut workflow = WorkflowStore::initialize(content).unwrap().workflow().clone();
    workflow.execution.progress = 90;

    let store = WorkflowStore::from_workflow(content, workflow).unwrap();
    assert_eq!(store.execution().progress, 40);
}

#[test]
fn test_from_workflow_uses_configured_task_duration() {
    let catalog = Catalog::builtin();
    let content = catalog.get("content").unwrap();
    let workflow = WorkflowStore::initialize(content).unwrap().workflow().clone();
    let mut store = WorkflowStore::from_workflow(content, workflow)
        .unwrap()
        .with_task_duration(60);
    assert_eq!(store.task_duration(), chrono::Duration::seconds(60));

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    store.complete_active(now);
    // two tasks remain after completing the third
    assert_eq!(
        store.execution().estimated_end_time,
        now + chrono::Duration::seconds(120)
    );
}
