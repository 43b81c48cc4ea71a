//! The simulation ticker.
//!
//! Each tick:
//! 1. Find the task in progress. Without one, only progress is recomputed.
//! 2. Either complete it and hand off to the next task, or (failing that)
//!    record an output while it holds fewer than `max_outputs`.
//! 3. Independently, record a SIM intervention against its assignee.
//! 4. Recompute progress from the completed-task count.

use chrono::{DateTime, Utc};

use crewflow_protocol::{
    AgentHandoff, SimIntervention, Workflow, INTERVENTION_POOL, MAX_TASK_OUTPUTS, OUTPUT_POOL,
};
use crewflow_state::WorkflowStore;

use crate::decider::Decider;

/// Something that changed during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    TaskCompleted {
        task_id: String,
        handoff: Option<AgentHandoff>,
    },
    OutputRecorded {
        task_id: String,
        output: String,
    },
    Intervention(SimIntervention),
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<TickEvent>,
    pub progress: u8,
}

pub struct Simulation {
    store: WorkflowStore,
    decider: Box<dyn Decider>,
    max_outputs: usize,
    ticks: u64,
}

impl Simulation {
    pub fn new(store: WorkflowStore, decider: Box<dyn Decider>) -> Self {
        Self {
            store,
            decider,
            max_outputs: MAX_TASK_OUTPUTS,
            ticks: 0,
        }
    }

    pub fn with_max_outputs(mut self, max_outputs: usize) -> Self {
        self.max_outputs = max_outputs;
        self
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    pub fn workflow(&self) -> &Workflow {
        self.store.workflow()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self) -> TickReport {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        let mut events = Vec::new();

        if let Some(idx) = self.store.active_index() {
            let active = &self.store.tasks()[idx];
            let task_id = active.id.clone();
            let assignee = active.assigned_to.clone();
            let output_count = active.outputs.len();

            if self.decider.complete_active() {
                let handoff = self.store.complete_active(now);
                events.push(TickEvent::TaskCompleted { task_id, handoff });
            } else if self.decider.emit_output() && output_count < self.max_outputs {
                let output = OUTPUT_POOL[self.decider.pick(OUTPUT_POOL.len())];
                if self.store.append_output(output, self.max_outputs) {
                    events.push(TickEvent::OutputRecorded {
                        task_id,
                        output: output.to_string(),
                    });
                }
            }

            if self.decider.intervene() {
                let (action, reason) = INTERVENTION_POOL[self.decider.pick(INTERVENTION_POOL.len())];
                let record = self.store.record_intervention(assignee, action, reason, now);
                events.push(TickEvent::Intervention(record));
            }
        }

        let progress = self.store.recompute_progress();
        tracing::trace!(
            system_id = %self.store.workflow().system_id,
            tick = self.ticks,
            progress,
            events = events.len(),
            "Simulation tick"
        );

        TickReport {
            tick: self.ticks,
            events,
            progress,
        }
    }
}
