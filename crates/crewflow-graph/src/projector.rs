//! Tasks → nodes and connections.
//!
//! One `sim` node at position 0 triggers every agent. Each task whose
//! assignee is on the roster contributes an `agent` node at position
//! `index + 1`, a `sim → agent` trigger, and (after the first task) a data
//! connection from the previous task's agent. Tasks with unknown assignees
//! contribute nothing.
//!
//! Node ids are agent ids, so each agent owns at most one task;
//! `Workflow::validate` rejects workflows that break this.

use crewflow_protocol::{
    Agent, ConnectionStatus, DataType, NodeStatus, NodeType, Task, TaskStatus, WorkflowConnection,
    WorkflowGraph, WorkflowNode, SIM_NODE_NAME,
};

/// Id of the supervising node for a system.
pub fn sim_node_id(system_id: &str) -> String {
    format!("sim-{system_id}")
}

fn node_status(status: TaskStatus) -> NodeStatus {
    match status {
        TaskStatus::Completed => NodeStatus::Completed,
        TaskStatus::InProgress => NodeStatus::Processing,
        TaskStatus::Pending | TaskStatus::Error => NodeStatus::Idle,
    }
}

fn sim_status(tasks: &[Task]) -> NodeStatus {
    if tasks.iter().any(|t| t.status == TaskStatus::InProgress) {
        NodeStatus::Processing
    } else if !tasks.is_empty() && tasks.iter().all(|t| t.status == TaskStatus::Completed) {
        NodeStatus::Completed
    } else {
        NodeStatus::Idle
    }
}

fn sequence_status(target: &Task) -> ConnectionStatus {
    match target.status {
        TaskStatus::Pending => ConnectionStatus::Inactive,
        TaskStatus::Error => ConnectionStatus::Error,
        TaskStatus::InProgress | TaskStatus::Completed => ConnectionStatus::Active,
    }
}

/// Project a task chain onto the workflow graph. Pure; equal inputs give equal graphs.
pub fn project(tasks: &[Task], roster: &[Agent], system_id: &str) -> WorkflowGraph {
    let sim_id = sim_node_id(system_id);
    let resolve = |task: &Task| roster.iter().find(|a| a.id == task.assigned_to);

    let mut graph = WorkflowGraph::default();
    graph.nodes.push(WorkflowNode {
        id: sim_id.clone(),
        name: SIM_NODE_NAME.to_string(),
        node_type: NodeType::Sim,
        status: sim_status(tasks),
        position: 0,
    });

    for (index, task) in tasks.iter().enumerate() {
        let Some(agent) = resolve(task) else {
            tracing::trace!(
                task_id = %task.id,
                assigned_to = %task.assigned_to,
                "Skipping task with unknown assignee"
            );
            continue;
        };

        graph.nodes.push(WorkflowNode {
            id: agent.id.to_string(),
            name: agent.name.clone(),
            node_type: NodeType::Agent,
            status: node_status(task.status),
            position: index as u32 + 1,
        });

        graph.connections.push(WorkflowConnection {
            source: sim_id.clone(),
            target: agent.id.to_string(),
            status: ConnectionStatus::Active,
            data_type: DataType::Trigger,
        });

        if index == 0 {
            continue;
        }
        if let Some(previous) = resolve(&tasks[index - 1]) {
            graph.connections.push(WorkflowConnection {
                source: previous.id.to_string(),
                target: agent.id.to_string(),
                status: sequence_status(task),
                data_type: DataType::Data,
            });
        }
    }

    graph
}
