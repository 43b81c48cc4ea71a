//! Crewflow Protocol - Core types for agent crew workflows
//!
//! Defines the agent systems, the task chain and execution envelope that a
//! simulation advances, and the node/connection graph projected from them.
//! All wire forms are camelCase JSON.

pub mod constants;
pub mod error;
pub mod graph;
pub mod types;

pub use constants::*;
pub use error::*;
pub use graph::*;
pub use types::*;
