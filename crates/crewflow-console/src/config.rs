//! Configuration for the Crewflow console.
//!
//! Loaded from `~/.crewflow/config.toml` unless `--config` points elsewhere.
//! A missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crewflow_protocol::{
    AgentSystem, COMPLETE_PROBABILITY, DEFAULT_TASK_DURATION_SECS, DEFAULT_TICK_INTERVAL_MS,
    INTERVENTION_PROBABILITY, MAX_TASK_OUTPUTS, OUTPUT_PROBABILITY,
};
use crewflow_sim::{
    FallbackSource, FixtureSource, SimulatedSource, TickOdds, WorkflowSource,
};
use crewflow_state::Catalog;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Extra agent systems; an entry with a built-in id replaces it.
    #[serde(default)]
    pub systems: Vec<AgentSystem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_complete_probability")]
    pub complete_probability: f64,

    #[serde(default = "default_output_probability")]
    pub output_probability: f64,

    #[serde(default = "default_intervention_probability")]
    pub intervention_probability: f64,

    #[serde(default = "default_max_outputs")]
    pub max_outputs: usize,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_task_duration_secs")]
    pub task_duration_secs: i64,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_complete_probability() -> f64 {
    COMPLETE_PROBABILITY
}

fn default_output_probability() -> f64 {
    OUTPUT_PROBABILITY
}

fn default_intervention_probability() -> f64 {
    INTERVENTION_PROBABILITY
}

fn default_max_outputs() -> usize {
    MAX_TASK_OUTPUTS
}

fn default_task_duration_secs() -> i64 {
    DEFAULT_TASK_DURATION_SECS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            complete_probability: default_complete_probability(),
            output_probability: default_output_probability(),
            intervention_probability: default_intervention_probability(),
            max_outputs: default_max_outputs(),
            seed: None,
            task_duration_secs: default_task_duration_secs(),
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn odds(&self) -> TickOdds {
        TickOdds {
            complete: self.complete_probability,
            output: self.output_probability,
            intervention: self.intervention_probability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Simulated,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    #[serde(default)]
    pub fixture_path: Option<PathBuf>,

    #[serde(default)]
    pub fallback_to_simulated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_stream_interval_ms")]
    pub stream_interval_ms: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:9371".to_string()
}

fn default_stream_interval_ms() -> u64 {
    2_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            stream_interval_ms: default_stream_interval_ms(),
        }
    }
}

impl Config {
    /// Get the path to the default config file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crewflow")
            .join("config.toml")
    }

    /// Load configuration from `path` (or the default path), falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Config::default()
        };
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if sim.tick_interval_ms == 0 {
            bail!("simulation.tick_interval_ms must be positive");
        }
        for (name, p) in [
            ("complete_probability", sim.complete_probability),
            ("output_probability", sim.output_probability),
            ("intervention_probability", sim.intervention_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("simulation.{name} must be within 0..=1, got {p}");
            }
        }
        if sim.task_duration_secs <= 0 {
            bail!("simulation.task_duration_secs must be positive");
        }
        if self.source.kind == SourceKind::Fixture && self.source.fixture_path.is_none() {
            bail!("source.fixture_path is required when source.kind = \"fixture\"");
        }
        if self.server.stream_interval_ms == 0 {
            bail!("server.stream_interval_ms must be positive");
        }
        Ok(())
    }

    /// Built-in systems merged with the configured ones.
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::builtin();
        for system in &self.systems {
            catalog.insert(system.clone());
        }
        catalog
    }

    /// The workflow source selected by `[source]`.
    pub fn workflow_source(&self) -> Box<dyn WorkflowSource> {
        let simulated = || {
            Box::new(
                SimulatedSource::new(self.catalog())
                    .with_task_duration(self.simulation.task_duration_secs),
            ) as Box<dyn WorkflowSource>
        };

        match (self.source.kind, &self.source.fixture_path) {
            (SourceKind::Fixture, Some(path)) => {
                let fixture = Box::new(FixtureSource::new(path)) as Box<dyn WorkflowSource>;
                if self.source.fallback_to_simulated {
                    Box::new(FallbackSource::new(fixture, simulated()))
                } else {
                    fixture
                }
            }
            _ => simulated(),
        }
    }
}
