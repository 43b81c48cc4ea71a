//! Crewflow console: configuration, the tick runner, the terminal dashboard,
//! and the HTTP API behind the `crewflow` binary.

pub mod commands;
pub mod config;
pub mod dashboard;
pub mod file_server;
pub mod operator_console;
pub mod runner;

pub use config::Config;
pub use dashboard::{DashboardState, Session, SystemSummary};
pub use runner::{spawn_runner, RunnerHandle};
