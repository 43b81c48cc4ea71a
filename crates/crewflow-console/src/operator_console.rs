//! Terminal dashboard for agent crew workflows.
//!
//! Shows one system at a time: a status bar, a progress gauge, the workflow
//! diagram, the task table, and the handoff and intervention logs. Tab cycles
//! between the loaded systems.
//!
//! Launch with `crewflow console --system <id>`.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame, Terminal,
};
use tokio::sync::RwLock;

use crewflow_graph::{agent_band, sim_band, Band};
use crewflow_protocol::{
    AgentHandoff, ConnectionStatus, DataType, NodeStatus, NodeType, SimIntervention, TaskStatus,
    Workflow, WorkflowGraph,
};

use crate::dashboard::{DashboardState, SystemSummary};

/// Rows used by the diagram: sim box, trigger bus and drops, agent boxes, data row.
pub const DIAGRAM_HEIGHT: u16 = 10;

const SIM_BOX_TOP: usize = 0;
const BUS_ROW: usize = 3;
const DROP_ROWS: [usize; 2] = [4, 5];
const AGENT_BOX_TOP: usize = 6;
const DATA_ROW: usize = 9;

/// Snapshot of one session for rendering.
struct ConsoleSnapshot {
    summary: SystemSummary,
    workflow: Workflow,
    graph: WorkflowGraph,
    runner_ticks: u64,
    system_count: usize,
}

struct OperatorConsole {
    state: Arc<RwLock<DashboardState>>,
    system_ids: Vec<String>,
    selected: usize,
    /// Redraw counter; drives the trigger animation.
    frame_count: u64,
}

impl OperatorConsole {
    fn new(state: Arc<RwLock<DashboardState>>, system_ids: Vec<String>) -> Self {
        Self {
            state,
            system_ids,
            selected: 0,
            frame_count: 0,
        }
    }

    async fn snapshot(&self) -> Option<ConsoleSnapshot> {
        let state = self.state.read().await;
        let system_id = self.system_ids.get(self.selected)?;
        let session = state.session(system_id)?;
        Some(ConsoleSnapshot {
            summary: session.summary(),
            workflow: session.workflow().clone(),
            graph: session.graph().clone(),
            runner_ticks: state.ticks(),
            system_count: state.len(),
        })
    }

    /// Returns true when the console should exit.
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Tab | KeyCode::Right => {
                if !self.system_ids.is_empty() {
                    self.selected = (self.selected + 1) % self.system_ids.len();
                }
                false
            }
            KeyCode::BackTab | KeyCode::Left => {
                if !self.system_ids.is_empty() {
                    self.selected =
                        (self.selected + self.system_ids.len() - 1) % self.system_ids.len();
                }
                false
            }
            _ => false,
        }
    }

    fn render(&self, frame: &mut Frame, snapshot: &ConsoleSnapshot) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                    // Status bar
                Constraint::Length(3),                    // Progress
                Constraint::Length(DIAGRAM_HEIGHT + 2),   // Diagram
                Constraint::Min(6),                       // Tasks + logs
                Constraint::Length(1),                    // Key help
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0], snapshot);
        self.render_progress(frame, outer[1], snapshot);
        self.render_diagram(frame, outer[2], snapshot);
        self.render_lower_area(frame, outer[3], snapshot);
        self.render_help(frame, outer[4]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(" Crewflow Console ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let s = &snap.summary;
        let active = s.active_task.clone().unwrap_or_else(|| "-".to_string());
        let status_line = Line::from(vec![
            Span::styled("  System: ", Style::default().fg(Color::Gray)),
            Span::styled(&s.name, Style::default().fg(Color::White)),
            Span::styled(
                format!(" ({}/{})", self.selected + 1, snap.system_count),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled("  |  Kind: ", Style::default().fg(Color::Gray)),
            Span::styled(s.kind.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled("  |  Agents: ", Style::default().fg(Color::Gray)),
            Span::styled(s.agents.to_string(), Style::default().fg(Color::Green)),
            Span::styled("  |  Active: ", Style::default().fg(Color::Gray)),
            Span::styled(active, Style::default().fg(Color::Yellow)),
            Span::styled("  |  Ticks: ", Style::default().fg(Color::Gray)),
            Span::styled(
                snap.runner_ticks.to_string(),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        frame.render_widget(Paragraph::new(status_line).block(block), area);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let execution = &snap.workflow.execution;
        let label = format!(
            "{}%  (started {}, est. end {})",
            execution.progress,
            execution.start_time.format("%Y-%m-%d %H:%M"),
            execution.estimated_end_time.format("%Y-%m-%d %H:%M"),
        );
        let color = if snap.summary.finished {
            Color::Green
        } else {
            Color::Blue
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(" Progress ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightBlue)),
            )
            .gauge_style(Style::default().fg(color))
            .percent(u16::from(execution.progress.min(100)))
            .label(label);
        frame.render_widget(gauge, area);
    }

    fn render_diagram(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(" Workflow ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner_width = area.width.saturating_sub(2);
        let lines = diagram_lines(&snap.graph, inner_width, self.frame_count);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_lower_area(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(50), // Tasks
                Constraint::Percentage(25), // Handoffs
                Constraint::Percentage(25), // Interventions
            ])
            .split(area);

        self.render_tasks(frame, columns[0], snap);
        render_log(
            frame,
            columns[1],
            " Handoffs ",
            Color::Green,
            handoff_lines(&snap.workflow.execution.agent_handoffs),
        );
        render_log(
            frame,
            columns[2],
            " SIM Interventions ",
            Color::Magenta,
            intervention_lines(&snap.workflow.execution.sim_interventions),
        );
    }

    fn render_tasks(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(format!(" Tasks ({}) ", snap.workflow.tasks.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let rows: Vec<Row> = snap
            .workflow
            .tasks
            .iter()
            .map(|task| {
                Row::new(vec![
                    Cell::from(Span::styled(
                        format!("  {}", truncate(&task.name, 24)),
                        Style::default().fg(Color::White),
                    )),
                    Cell::from(Span::styled(
                        task.status.to_string(),
                        Style::default().fg(task_status_color(task.status)),
                    )),
                    Cell::from(Span::styled(
                        task.assigned_to.to_string(),
                        Style::default().fg(Color::Gray),
                    )),
                    Cell::from(Span::styled(
                        task.outputs.len().to_string(),
                        Style::default().fg(Color::Cyan),
                    )),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(36),
                Constraint::Percentage(18),
                Constraint::Percentage(34),
                Constraint::Percentage(12),
            ],
        )
        .block(block)
        .header(
            Row::new(vec!["  Task", "Status", "Assigned", "Out"])
                .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        );

        frame.render_widget(table, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = Line::from(Span::styled(
            "  q/Esc quit  |  Tab/←/→ switch system",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(help), area);
    }
}

/// Render a scrolling log, newest entries at the bottom.
fn render_log(frame: &mut Frame, area: Rect, title: &str, color: Color, lines: Vec<Line<'static>>) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    if lines.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  Nothing yet.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let visible = area.height.saturating_sub(2) as usize;
    let start = lines.len().saturating_sub(visible);
    let paragraph = Paragraph::new(lines[start..].to_vec()).block(block);
    frame.render_widget(paragraph, area);
}

fn handoff_lines(handoffs: &[AgentHandoff]) -> Vec<Line<'static>> {
    handoffs
        .iter()
        .map(|h| {
            Line::from(vec![
                Span::styled(
                    format!("  [{}] ", h.time.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} → {}", h.from, h.to),
                    Style::default().fg(Color::White),
                ),
            ])
        })
        .collect()
}

fn intervention_lines(interventions: &[SimIntervention]) -> Vec<Line<'static>> {
    interventions
        .iter()
        .map(|i| {
            Line::from(vec![
                Span::styled(
                    format!("  [{}] ", i.time.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{}: {}", i.agent_id, i.action),
                    Style::default().fg(Color::Magenta),
                ),
            ])
        })
        .collect()
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max < 4 {
        return text.chars().take(max).collect();
    }
    let head: String = text.chars().take(max - 3).collect();
    format!("{head}...")
}

fn task_status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::DarkGray,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Error => Color::Red,
    }
}

fn node_color(status: NodeStatus) -> Color {
    match status {
        NodeStatus::Idle => Color::DarkGray,
        NodeStatus::Processing => Color::Yellow,
        NodeStatus::Completed => Color::Green,
        NodeStatus::Error => Color::Red,
    }
}

/// Glyph and colour for an agent → agent connection.
fn data_glyph(status: ConnectionStatus) -> (char, Color) {
    match status {
        ConnectionStatus::Active => ('─', Color::Green),
        ConnectionStatus::Inactive => ('┄', Color::DarkGray),
        ConnectionStatus::Error => ('─', Color::Red),
    }
}

/// Which drop row carries the trigger dot on this frame.
fn dot_row(frame_count: u64) -> usize {
    DROP_ROWS[(frame_count / 4 % DROP_ROWS.len() as u64) as usize]
}

/// Character canvas for the diagram.
struct Canvas {
    width: usize,
    cells: Vec<Vec<(char, Style)>>,
}

impl Canvas {
    fn new(width: u16, height: u16) -> Self {
        let width = width as usize;
        Self {
            width,
            cells: vec![vec![(' ', Style::default()); width]; height as usize],
        }
    }

    fn put(&mut self, row: usize, col: usize, ch: char, style: Style) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = (ch, style);
        }
    }

    fn text(&mut self, row: usize, col: usize, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(row, col + i, ch, style);
        }
    }

    /// A three-row box with `label` centred in it.
    fn boxed(&mut self, top: usize, band: Band, label: &str, style: Style) {
        let x = band.x as usize + 1;
        let w = (band.width as usize).saturating_sub(2);
        if w < 3 {
            self.put(top + 1, band.center() as usize, '■', style);
            return;
        }
        let inner = w - 2;
        self.put(top, x, '┌', style);
        self.put(top, x + w - 1, '┐', style);
        self.put(top + 2, x, '└', style);
        self.put(top + 2, x + w - 1, '┘', style);
        for c in x + 1..x + w - 1 {
            self.put(top, c, '─', style);
            self.put(top + 2, c, '─', style);
        }
        self.put(top + 1, x, '│', style);
        self.put(top + 1, x + w - 1, '│', style);

        let label = truncate(label, inner);
        let pad = inner.saturating_sub(label.chars().count()) / 2;
        self.text(top + 1, x + 1 + pad, &label, style.add_modifier(Modifier::BOLD));
    }

    fn into_lines(self) -> Vec<Line<'static>> {
        self.cells
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(ch, style)| Span::styled(ch.to_string(), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    #[cfg(test)]
    fn row_text(&self, row: usize) -> String {
        self.cells[row].iter().map(|(ch, _)| *ch).collect()
    }
}

/// Draw the graph onto a canvas `width` cells wide.
fn draw_diagram(graph: &WorkflowGraph, width: u16, frame_count: u64) -> Canvas {
    let mut canvas = Canvas::new(width, DIAGRAM_HEIGHT);
    if width == 0 {
        return canvas;
    }

    let sim = graph.nodes_of_type(NodeType::Sim).next();
    let sim_box = sim_band(width);
    if let Some(sim) = sim {
        canvas.boxed(
            SIM_BOX_TOP,
            sim_box,
            &sim.name,
            Style::default().fg(node_color(sim.status)),
        );
    }

    let agent_centers: Vec<(String, u16)> = graph
        .nodes_of_type(NodeType::Agent)
        .filter_map(|n| agent_band(n.position, width).map(|b| (n.id.clone(), b.center())))
        .collect();

    // Trigger bus from the sim box down to each agent.
    let bus_style = Style::default().fg(Color::Cyan);
    if let (Some(min), Some(max)) = (
        agent_centers.iter().map(|(_, c)| *c).min(),
        agent_centers.iter().map(|(_, c)| *c).max(),
    ) {
        let sim_center = sim_box.center();
        let from = min.min(sim_center) as usize;
        let to = max.max(sim_center) as usize;
        for c in from..=to {
            canvas.put(BUS_ROW, c, '─', bus_style);
        }
        canvas.put(BUS_ROW, sim_center as usize, '┴', bus_style);
    }

    let dot = dot_row(frame_count);
    for conn in graph.connections_of_type(DataType::Trigger) {
        let Some(center) = agent_centers
            .iter()
            .find(|(id, _)| *id == conn.target)
            .map(|(_, c)| *c as usize)
        else {
            continue;
        };
        let style = match conn.status {
            ConnectionStatus::Error => Style::default().fg(Color::Red),
            ConnectionStatus::Inactive => Style::default().fg(Color::DarkGray),
            ConnectionStatus::Active => bus_style,
        };
        canvas.put(BUS_ROW, center, '┬', bus_style);
        for row in DROP_ROWS {
            let ch = if conn.status == ConnectionStatus::Active && row == dot {
                '●'
            } else {
                '│'
            };
            canvas.put(row, center, ch, style);
        }
    }

    for node in graph.nodes_of_type(NodeType::Agent) {
        if let Some(band) = agent_band(node.position, width) {
            canvas.boxed(
                AGENT_BOX_TOP,
                band,
                &node.name,
                Style::default().fg(node_color(node.status)),
            );
        }
    }

    // Sequential data connections run along the bottom row.
    for conn in graph.connections_of_type(DataType::Data) {
        let center_of = |id: &str| {
            agent_centers
                .iter()
                .find(|(node, _)| node == id)
                .map(|(_, c)| *c as usize)
        };
        let (Some(from), Some(to)) = (center_of(&conn.source), center_of(&conn.target)) else {
            continue;
        };
        let (glyph, color) = data_glyph(conn.status);
        let style = Style::default().fg(color);
        let (lo, hi) = (from.min(to), from.max(to));
        if hi - lo < 2 {
            continue;
        }
        // Leave the centres themselves blank so adjacent edges stay distinct.
        for c in lo + 1..hi {
            canvas.put(DATA_ROW, c, glyph, style);
        }
        if to > from {
            canvas.put(DATA_ROW, hi - 1, '▶', style);
        } else {
            canvas.put(DATA_ROW, lo + 1, '◀', style);
        }
    }

    canvas
}

/// Diagram rows ready for a `Paragraph`.
pub fn diagram_lines(graph: &WorkflowGraph, width: u16, frame_count: u64) -> Vec<Line<'static>> {
    draw_diagram(graph, width, frame_count).into_lines()
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the console until the operator quits.
pub async fn run_operator_console(
    state: Arc<RwLock<DashboardState>>,
    system_ids: Vec<String>,
) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!("Crewflow console requires a terminal (TTY)."));
    }

    // Restore the terminal on panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut console = OperatorConsole::new(state, system_ids);

    let tick_rate = Duration::from_millis(100);

    loop {
        if let Some(snapshot) = console.snapshot().await {
            terminal.draw(|frame| console.render(frame, &snapshot))?;
        }
        console.frame_count = console.frame_count.wrapping_add(1);

        if event::poll(tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press
                    && console.handle_key(key_event.code, key_event.modifiers)
                {
                    break;
                }
            }
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewflow_graph::project;
    use crewflow_state::{Catalog, WorkflowStore};

    fn content_graph() -> WorkflowGraph {
        let catalog = Catalog::builtin();
        let system = catalog.get("content").unwrap();
        let store = WorkflowStore::initialize(system).unwrap();
        project(store.tasks(), &system.agents, &system.id)
    }

    #[test]
    fn test_diagram_places_sim_and_agents() {
        let canvas = draw_diagram(&content_graph(), 100, 0);
        assert!(canvas.row_text(SIM_BOX_TOP + 1).contains("SIM Supervisor"));

        let agents = canvas.row_text(AGENT_BOX_TOP + 1);
        assert!(agents.contains("Research Agent"));
        assert!(agents.contains("Publisher Agent"));
        assert_eq!(agents.matches('│').count(), 10);
    }

    #[test]
    fn test_trigger_drops_land_on_band_centres() {
        let canvas = draw_diagram(&content_graph(), 100, 0);
        let drop = canvas.row_text(DROP_ROWS[1]);
        for position in 1..=5 {
            let center = agent_band(position, 100).unwrap().center() as usize;
            assert_eq!(drop.chars().nth(center), Some('│'));
        }
        let dotted = canvas.row_text(dot_row(0));
        assert_eq!(dotted.matches('●').count(), 5);
    }

    #[test]
    fn test_inactive_data_edges_are_dashed() {
        let canvas = draw_diagram(&content_graph(), 100, 0);
        let data = canvas.row_text(DATA_ROW);
        // two active edges into completed/processing tasks, two inactive into pending
        assert!(data.contains('─'));
        assert!(data.contains('┄'));
        assert_eq!(data.matches('▶').count(), 4);
    }

    #[test]
    fn test_dot_alternates_between_rows() {
        assert_ne!(dot_row(0), dot_row(4));
        assert_eq!(dot_row(0), dot_row(8));
    }

    #[test]
    fn test_zero_width_is_blank() {
        let lines = diagram_lines(&content_graph(), 0, 0);
        assert_eq!(lines.len(), DIAGRAM_HEIGHT as usize);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Research Topic", 40), "Research Topic");
        assert_eq!(truncate("Research Topic", 8), "Resea...");
        assert_eq!(truncate("Research Topic", 3), "Res");
        assert_eq!(truncate("Research Topic", 0), "");
        for max in 0..20 {
            assert!(truncate("Research Topic Extended", max).chars().count() <= max);
        }
    }

    #[test]
    fn test_diagram_draws_at_every_narrow_width() {
        let graph = content_graph();
        for width in 0..=40u16 {
            for frame in 0..8 {
                let lines = diagram_lines(&graph, width, frame);
                assert_eq!(lines.len(), DIAGRAM_HEIGHT as usize);
                for line in &lines {
                    assert_eq!(line.spans.len(), width as usize);
                }
            }
        }
    }

    #[test]
    fn test_key_handling() {
        let state = Arc::new(RwLock::new(DashboardState::new()));
        let mut console =
            OperatorConsole::new(state, vec!["content".to_string(), "sales".to_string()]);
        assert!(!console.handle_key(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(console.selected, 1);
        assert!(!console.handle_key(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(console.selected, 0);
        assert!(!console.handle_key(KeyCode::Left, KeyModifiers::NONE));
        assert_eq!(console.selected, 1);
        assert!(console.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(console.handle_key(KeyCode::Char('q'), KeyModifiers::NONE));
    }
}
