//! Catalog of agent systems known to the dashboard.

use crewflow_protocol::{Agent, AgentSystem, SystemKind};

/// Ordered collection of agent systems, keyed by system id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    systems: Vec<AgentSystem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four built-in crews.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(AgentSystem {
            id: "content".into(),
            name: "Content Generation Crew".into(),
            kind: SystemKind::Content,
            agents: vec![
                Agent::new("content-researcher", "Research Agent", "Topic research"),
                Agent::new("content-strategist", "Strategy Agent", "Outline planning"),
                Agent::new("content-writer", "Writer Agent", "Long-form drafting"),
                Agent::new("content-editor", "Editor Agent", "Editing and SEO"),
                Agent::new("content-publisher", "Publisher Agent", "Distribution"),
            ],
        });
        catalog.insert(AgentSystem {
            id: "leadgen".into(),
            name: "Lead Generation Crew".into(),
            kind: SystemKind::Leadgen,
            agents: vec![
                Agent::new("leadgen-prospector", "Prospector Agent", "Prospect discovery"),
                Agent::new("leadgen-enricher", "Enrichment Agent", "Data enrichment"),
                Agent::new("leadgen-scorer", "Scoring Agent", "Lead qualification"),
                Agent::new("leadgen-copywriter", "Outreach Agent", "Personalized outreach"),
                Agent::new("leadgen-scheduler", "Scheduler Agent", "Meeting booking"),
            ],
        });
        catalog.insert(AgentSystem {
            id: "sales".into(),
            name: "Sales Crew".into(),
            kind: SystemKind::Sales,
            agents: vec![
                Agent::new("sales-qualifier", "Qualifier Agent", "Opportunity qualification"),
                Agent::new("sales-analyst", "Analyst Agent", "Requirement analysis"),
                Agent::new("sales-proposer", "Proposal Agent", "Proposal writing"),
                Agent::new("sales-negotiator", "Negotiator Agent", "Deal negotiation"),
                Agent::new("sales-closer", "Closer Agent", "Contract closing"),
            ],
        });
        catalog.insert(AgentSystem {
            id: "onboarding".into(),
            name: "Client Onboarding Crew".into(),
            kind: SystemKind::Onboarding,
            agents: vec![
                Agent::new("onboarding-intake", "Intake Agent", "Client intake"),
                Agent::new("onboarding-configurator", "Configuration Agent", "Account setup"),
                Agent::new("onboarding-provisioner", "Provisioning Agent", "Agent provisioning"),
                Agent::new("onboarding-trainer", "Training Agent", "Client training"),
                Agent::new("onboarding-verifier", "QA Agent", "Setup verification"),
            ],
        });
        catalog
    }

    /// Insert a system, replacing any existing system with the same id.
    pub fn insert(&mut self, system: AgentSystem) {
        match self.systems.iter_mut().find(|s| s.id == system.id) {
            Some(existing) => *existing = system,
            None => self.systems.push(system),
        }
    }

    pub fn get(&self, id: &str) -> Option<&AgentSystem> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn systems(&self) -> &[AgentSystem] {
        &self.systems
    }

    pub fn ids(&self) -> Vec<String> {
        self.systems.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
