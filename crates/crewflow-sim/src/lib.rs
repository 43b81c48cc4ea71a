//! Workflow simulation for agent crews.
//!
//! A [`Simulation`] advances one [`crewflow_state::WorkflowStore`] per tick.
//! Every random choice goes through a [`Decider`], so a seeded or scripted
//! decider makes runs reproducible. Workflows enter the system through a
//! [`WorkflowSource`].

pub mod decider;
pub mod simulation;
pub mod source;

pub use decider::{Decider, RandomDecider, ScriptedDecider, TickOdds};
pub use simulation::{Simulation, TickEvent, TickReport};
pub use source::{FallbackSource, FixtureSource, SimulatedSource, WorkflowSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown agent system: {0}")]
    UnknownSystem(String),

    #[error("fixture {path} could not be read: {source}")]
    FixtureIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture is invalid: {0}")]
    Fixture(#[from] crewflow_protocol::ProtocolError),

    #[error("state error: {0}")]
    State(#[from] crewflow_state::StateError),
}
