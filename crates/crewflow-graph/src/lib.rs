//! Graph projection for agent crew workflows.
//!
//! `project` derives the supervisor/agent node list and the trigger/data
//! connections from a task chain; `layout` maps node positions onto a
//! container width.

pub mod layout;
pub mod projector;

pub use layout::{agent_band, sim_band, Band, AGENT_BAND_PERCENT};
pub use projector::{project, sim_node_id};
