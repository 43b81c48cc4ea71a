use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("more than one task in progress: {0:?}")]
    MultipleActiveTasks(Vec<String>),

    #[error("task {task_id} links to unknown next task {next_task}")]
    DanglingNextTask { task_id: String, next_task: String },

    #[error("agent {agent_id} is assigned more than one task")]
    DuplicateAssignee { agent_id: String },

    #[error("progress {0} outside 0..=100")]
    ProgressOutOfRange(u8),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
