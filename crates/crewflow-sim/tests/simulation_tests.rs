use crewflow_protocol::{progress_percent, AgentId, TaskStatus, Workflow};
use crewflow_sim::*;
use crewflow_state::{Catalog, WorkflowStore};

fn store_for(system_id: &str) -> WorkflowStore {
    let catalog = Catalog::builtin();
    WorkflowStore::initialize(catalog.get(system_id).unwrap()).unwrap()
}

fn in_progress(workflow: &Workflow) -> usize {
    workflow
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count()
}

// ─── Invariants under random decisions ───────────────────────────────────────

#[test]
fn test_single_active_task_and_progress_hold_for_every_tick() {
    for seed in 0..20u64 {
        let decider = RandomDecider::new(
            TickOdds {
                complete: 0.35,
                output: 0.5,
                intervention: 0.2,
            },
            Some(seed),
        );
        let mut sim = Simulation::new(store_for("sales"), Box::new(decider));
        for _ in 0..60 {
            let report = sim.tick();
            let wf = sim.workflow();
            assert!(in_progress(wf) <= 1, "seed {seed}: more than one active task");
            let expected = progress_percent(wf.completed_count(), wf.tasks.len());
            assert_eq!(report.progress, expected);
            assert_eq!(wf.execution.progress, expected);
            assert!(wf.tasks.iter().all(|t| t.outputs.len() <= 3));
        }
    }
}

#[test]
fn test_same_seed_replays_identically() {
    let run = |seed| {
        let mut sim = Simulation::new(
            store_for("content"),
            Box::new(RandomDecider::new(TickOdds::default(), Some(seed))),
        );
        (0..100)
            .map(|_| {
                let report = sim.tick();
                (report.progress, report.events.len())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(42), run(42));
}

// ─── Forced completion scenario ──────────────────────────────────────────────

#[test]
fn test_always_complete_finishes_in_assignee_order() {
    let catalog = Catalog::builtin();
    let system = catalog.get("onboarding").unwrap().clone();
    let store = WorkflowStore::initialize(&system).unwrap();
    let mut sim = Simulation::new(store, Box::new(ScriptedDecider::always_complete()));

    for _ in 0..5 {
        sim.tick();
    }

    let wf = sim.workflow();
    assert!(wf.tasks.iter().all(|t| t.status == TaskStatus::Completed));
    assert_eq!(wf.execution.progress, 100);

    let handoffs = &wf.execution.agent_handoffs;
    assert_eq!(handoffs.len(), 4);
    let roster: Vec<AgentId> = system.agents.iter().map(|a| a.id.clone()).collect();
    for (i, handoff) in handoffs.iter().enumerate() {
        assert_eq!(handoff.from, roster[i]);
        assert_eq!(handoff.to, roster[i + 1]);
    }
    assert!(wf.tasks.iter().all(|t| t.end_time.is_some()));
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_simulated_source_builds_template() {
    let source = SimulatedSource::new(Catalog::builtin());
    let wf = source.fetch("leadgen").await.unwrap();
    assert_eq!(wf.system_id, "leadgen");
    assert_eq!(wf.tasks.len(), 5);
    assert_eq!(wf.execution.progress, 40);
}

#[tokio::test]
async fn test_simulated_source_unknown_system() {
    let source = SimulatedSource::new(Catalog::builtin());
    assert!(matches!(
        source.fetch("nope").await,
        Err(SimError::UnknownSystem(id)) if id == "nope"
    ));
}

#[tokio::test]
async fn test_fixture_source_reads_matching_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflows.json");
    let sales = SimulatedSource::new(Catalog::builtin())
        .fetch("sales")
        .await
        .unwrap();
    std::fs::write(&path, serde_json::to_string(&vec![sales.clone()]).unwrap()).unwrap();

    let source = FixtureSource::new(&path);
    assert_eq!(source.fetch("sales").await.unwrap(), sales);
    assert!(matches!(
        source.fetch("content").await,
        Err(SimError::UnknownSystem(_))
    ));
}

#[tokio::test]
async fn test_fixture_source_missing_file() {
    let source = FixtureSource::new("/nonexistent/crewflow/workflows.json");
    assert!(matches!(
        source.fetch("sales").await,
        Err(SimError::FixtureIo { .. })
    ));
}

#[tokio::test]
async fn test_fallback_source_uses_simulated_on_failure() {
    let source = FallbackSource::new(
        Box::new(FixtureSource::new("/nonexistent/crewflow/workflows.json")),
        Box::new(SimulatedSource::new(Catalog::builtin())),
    );
    let wf = source.fetch("content").await.unwrap();
    assert_eq!(wf.system_id, "content");
}
