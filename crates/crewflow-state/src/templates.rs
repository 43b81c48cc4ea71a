//! Fixed five-step task templates, one per system kind.

use crewflow_protocol::{SystemKind, WORKFLOW_TASK_COUNT};

const CONTENT_TASKS: [&str; WORKFLOW_TASK_COUNT] = [
    "Research Topic",
    "Create Outline",
    "Draft Content",
    "Edit & Optimize",
    "Publish Content",
];

const LEADGEN_TASKS: [&str; WORKFLOW_TASK_COUNT] = [
    "Identify Prospects",
    "Enrich Lead Data",
    "Score Leads",
    "Draft Outreach",
    "Schedule Follow-up",
];

const SALES_TASKS: [&str; WORKFLOW_TASK_COUNT] = [
    "Qualify Opportunity",
    "Analyze Requirements",
    "Prepare Proposal",
    "Negotiate Terms",
    "Close Deal",
];

const ONBOARDING_TASKS: [&str; WORKFLOW_TASK_COUNT] = [
    "Collect Client Info",
    "Configure Account",
    "Provision Agents",
    "Run Training Session",
    "Verify Setup",
];

const GENERIC_TASKS: [&str; WORKFLOW_TASK_COUNT] = [
    "Gather Inputs",
    "Analyze Data",
    "Generate Output",
    "Review Results",
    "Deliver Report",
];

pub fn task_names(kind: SystemKind) -> [&'static str; WORKFLOW_TASK_COUNT] {
    match kind {
        SystemKind::Content => CONTENT_TASKS,
        SystemKind::Leadgen => LEADGEN_TASKS,
        SystemKind::Sales => SALES_TASKS,
        SystemKind::Onboarding => ONBOARDING_TASKS,
        SystemKind::Custom => GENERIC_TASKS,
    }
}
