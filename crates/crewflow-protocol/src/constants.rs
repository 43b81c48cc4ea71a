/// Number of tasks in every workflow template.
pub const WORKFLOW_TASK_COUNT: usize = 5;

/// Tasks already completed when a workflow is initialized.
pub const INITIAL_COMPLETED_TASKS: usize = 2;

/// Default simulation tick interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;

/// Chance per tick that the active task completes and hands off.
pub const COMPLETE_PROBABILITY: f64 = 0.1;

/// Chance per tick that the active task records an output.
pub const OUTPUT_PROBABILITY: f64 = 0.3;

/// Chance per tick of a SIM intervention on the active agent.
pub const INTERVENTION_PROBABILITY: f64 = 0.05;

/// Outputs stop accumulating once a task holds this many.
pub const MAX_TASK_OUTPUTS: usize = 3;

/// Estimated wall-clock duration of one task, used for `estimated_end_time`.
pub const DEFAULT_TASK_DURATION_SECS: i64 = 900;

/// Display name of the supervising simulation node.
pub const SIM_NODE_NAME: &str = "SIM Supervisor";

/// Synthetic output lines appended to active tasks.
pub const OUTPUT_POOL: &[&str] = &[
    "Processed input batch and extracted key entities",
    "Generated intermediate draft for review",
    "Validated results against quality checklist",
    "Enriched records with third-party data",
    "Summarized findings for the next agent",
    "Flagged two items for manual follow-up",
    "Updated shared context with new insights",
    "Optimized output for target audience",
];

/// (action, reason) pairs recorded as SIM interventions.
pub const INTERVENTION_POOL: &[(&str, &str)] = &[
    ("Adjusted task priority", "Detected slower than expected progress"),
    ("Provided additional context", "Agent requested clarification"),
    ("Reallocated compute budget", "Workload spike on active task"),
    ("Requested output revision", "Quality score below threshold"),
    ("Extended task deadline", "Upstream data arrived late"),
];
