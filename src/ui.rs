use aquachain::graph::{build_supply_chain_graph, EdgeKind, EdgeView, SupplyChainGraph};
use aquachain::metrics::{fmt_days, Bottleneck};
use aquachain::{AnalyticsReport, Dataset, EngineConfig};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Network,
    Bottlenecks,
    Batches,
    Metrics,
}

impl Page {
    pub fn all() -> [Page; 4] {
        [Page::Network, Page::Bottlenecks, Page::Batches, Page::Metrics]
    }

    pub fn next(&self) -> Self {
        match self {
            Page::Network => Page::Bottlenecks,
            Page::Bottlenecks => Page::Batches,
            Page::Batches => Page::Metrics,
            Page::Metrics => Page::Network,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Network => Page::Metrics,
            Page::Bottlenecks => Page::Network,
            Page::Batches => Page::Bottlenecks,
            Page::Metrics => Page::Batches,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Network => "Network",
            Page::Bottlenecks => "Bottlenecks",
            Page::Batches => "Batches",
            Page::Metrics => "Metrics",
        }
    }
}

/// One row of the Batches page
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub batch_id: String,
    pub origin: String,
    pub production_date: String,
    pub status: String,
    pub steps: usize,
}

/// Declared batches plus every batch id a transaction or move refers to
///
/// Rows come from the records, not from graph node kinds, so an id that
/// shares its name with an entity or location still gets a row.
fn batch_rows(dataset: &Dataset, graph: &SupplyChainGraph) -> Vec<BatchRow> {
    let mut rows: BTreeMap<&str, BatchRow> = BTreeMap::new();

    for batch in &dataset.batches {
        rows.insert(
            batch.batch_id.as_str(),
            BatchRow {
                batch_id: batch.batch_id.clone(),
                origin: batch.origin.clone().unwrap_or_default(),
                production_date: batch.production_date.clone().unwrap_or_default(),
                status: batch.status.clone().unwrap_or_default(),
                steps: 0,
            },
        );
    }

    let referenced = dataset
        .transactions
        .iter()
        .map(|tx| tx.batch_id.as_str())
        .chain(dataset.logistics.iter().map(|mv| mv.batch_id.as_str()));
    for batch_id in referenced {
        rows.entry(batch_id).or_insert_with(|| BatchRow {
            batch_id: batch_id.to_string(),
            origin: String::new(),
            production_date: String::new(),
            status: String::new(),
            steps: 0,
        });
    }

    rows.into_values()
        .filter(|row| !row.batch_id.is_empty())
        .map(|mut row| {
            row.steps = graph.batch_trace(&row.batch_id).map(|t| t.len()).unwrap_or(0);
            row
        })
        .collect()
}

pub struct App {
    graph: SupplyChainGraph,
    pub edges: Vec<EdgeView>,
    pub bottlenecks: Vec<Bottleneck>,
    pub batches: Vec<BatchRow>,
    pub report: AnalyticsReport,
    pub current_page: Page,
    pub network_state: TableState,
    pub bottleneck_state: TableState,
    pub batch_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(dataset: &Dataset, config: &EngineConfig, today: NaiveDate) -> Self {
        let graph = build_supply_chain_graph(
            &dataset.transactions,
            &dataset.batches,
            &dataset.logistics,
        );
        let report = AnalyticsReport::from_graph(dataset, &graph, config, today);
        let batches = batch_rows(dataset, &graph);

        let edges = graph.edges();
        let bottlenecks = report.bottlenecks.clone();

        let mut app = Self {
            graph,
            edges,
            bottlenecks,
            batches,
            report,
            current_page: Page::Network,
            network_state: TableState::default(),
            bottleneck_state: TableState::default(),
            batch_state: TableState::default(),
            show_detail: false,
        };

        for page in Page::all() {
            if app.page_len(page) > 0 {
                if let Some(state) = app.state_for(page) {
                    state.select(Some(0));
                }
            }
        }
        app
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.show_detail = false;
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.show_detail = false;
    }

    fn page_len(&self, page: Page) -> usize {
        match page {
            Page::Network => self.edges.len(),
            Page::Bottlenecks => self.bottlenecks.len(),
            Page::Batches => self.batches.len(),
            Page::Metrics => 0,
        }
    }

    fn state_for(&mut self, page: Page) -> Option<&mut TableState> {
        match page {
            Page::Network => Some(&mut self.network_state),
            Page::Bottlenecks => Some(&mut self.bottleneck_state),
            Page::Batches => Some(&mut self.batch_state),
            Page::Metrics => None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self.current_page {
            Page::Network => self.network_state.selected(),
            Page::Bottlenecks => self.bottleneck_state.selected(),
            Page::Batches => self.batch_state.selected(),
            Page::Metrics => None,
        }
    }

    /// Move the selection on the current page by `delta` rows
    fn move_selection(&mut self, delta: isize, wrap: bool) {
        let page = self.current_page;
        let len = self.page_len(page) as isize;
        if len == 0 {
            return;
        }
        let Some(state) = self.state_for(page) else {
            return;
        };

        let current = state.selected().map(|i| i as isize).unwrap_or(0);
        let target = current + delta;
        let i = if wrap {
            target.rem_euclid(len)
        } else {
            target.clamp(0, len - 1)
        };
        state.select(Some(i as usize));
    }

    pub fn next(&mut self) {
        self.move_selection(1, true);
    }

    pub fn previous(&mut self) {
        self.move_selection(-1, true);
    }

    pub fn page_down(&mut self) {
        self.move_selection(20, false);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-20, false);
    }

    pub fn home(&mut self) {
        self.move_selection(isize::MIN / 2, false);
    }

    pub fn end(&mut self) {
        self.move_selection(isize::MAX / 2, false);
    }

    pub fn selected_edge(&self) -> Option<&EdgeView> {
        self.network_state.selected().and_then(|i| self.edges.get(i))
    }

    pub fn selected_batch(&self) -> Option<&BatchRow> {
        self.batch_state.selected().and_then(|i| self.batches.get(i))
    }

    /// Chronological path of the selected batch
    pub fn selected_trace(&self) -> Vec<EdgeView> {
        self.selected_batch()
            .and_then(|b| self.graph.batch_trace(&b.batch_id).ok())
            .unwrap_or_default()
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.home(),
                KeyCode::End => app.end(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let detail_page = matches!(app.current_page, Page::Network | Page::Batches);
    if app.show_detail && detail_page {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Network => render_network(f, area, app),
        Page::Bottlenecks => render_bottlenecks(f, area, app),
        Page::Batches => render_batches(f, area, app),
        Page::Metrics => render_metrics(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = &app.report.graph;

    let mut tab_spans = vec![];
    for (i, page) in Page::all().iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Nodes: {}  Edges: {}", stats.node_count, stats.edge_count),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("⚠ {}", app.bottlenecks.len()),
        Style::default().fg(if app.bottlenecks.is_empty() { Color::Green } else { Color::Red }),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn table_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn highlight() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn render_network(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.edges.iter().map(|edge| {
        let color = match edge.edge.kind {
            EdgeKind::Transaction => Color::Green,
            EdgeKind::Logistics => Color::Cyan,
        };
        Row::new(vec![
            Cell::from(truncate(&edge.from, 26)),
            Cell::from(truncate(&edge.to, 26)),
            Cell::from(edge.edge.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(edge.edge.batch_id.clone()),
            Cell::from(edge.edge.date.clone().unwrap_or_default()),
            Cell::from(edge.edge.payment_term.clone().unwrap_or_default()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(28),
            Constraint::Length(13),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["From", "To", "Kind", "Batch", "Date", "Term"]))
    .block(table_block(" Network - Edges "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.network_state);
}

fn render_bottlenecks(f: &mut Frame, area: Rect, app: &mut App) {
    if app.bottlenecks.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  ✓ No logistics bottlenecks detected",
                Style::default().fg(Color::Green),
            )),
        ])
        .block(table_block(" Bottlenecks "));
        f.render_widget(empty, area);
        return;
    }

    let rows = app.bottlenecks.iter().map(|b| {
        let mv = &b.logistics_move;
        Row::new(vec![
            Cell::from(mv.batch_id.clone()),
            Cell::from(truncate(&mv.from_location, 24)),
            Cell::from(truncate(&mv.to_location, 24)),
            Cell::from(format!("{} days", b.duration_days)).style(Style::default().fg(Color::Red)),
            Cell::from(format!("{:.1} days", b.threshold_days)),
            Cell::from(mv.shipment_id.clone().unwrap_or_default()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(26),
            Constraint::Length(26),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Batch", "From", "To", "Duration", "Threshold", "Shipment"]))
    .block(table_block(" Bottlenecks - Slow Logistics Legs "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.bottleneck_state);
}

fn render_batches(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.batches.iter().map(|b| {
        let color = match b.status.to_lowercase().as_str() {
            "delivered" => Color::Green,
            "in transit" => Color::Yellow,
            "recalled" => Color::Red,
            _ => Color::White,
        };

        Row::new(vec![
            Cell::from(b.batch_id.clone()),
            Cell::from(truncate(&b.origin, 26)),
            Cell::from(b.production_date.clone()),
            Cell::from(b.status.clone()).style(Style::default().fg(color)),
            Cell::from(format!("{}", b.steps)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(28),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Batch", "Origin", "Produced", "Status", "Steps"]))
    .block(table_block(" Batches "))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.batch_state);
}

fn metric_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<28}", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn render_metrics(f: &mut Frame, area: Rect, app: &App) {
    let m = &app.report.metrics;
    let q = &app.report.quality;

    let mut content = vec![
        Line::from(""),
        metric_line("Transactions", format!("{}", m.transaction_count), Color::White),
        metric_line("Total value", format!("{:.2}", m.total_transaction_value), Color::White),
        metric_line("Avg payment lead time", fmt_days(m.average_payment_lead_time), Color::Yellow),
        metric_line("Working capital cycle", fmt_days(m.working_capital_cycle), Color::Yellow),
        Line::from(""),
        metric_line("Logistics moves", format!("{}", m.logistics_move_count), Color::White),
        metric_line("Avg transit time", fmt_days(m.average_transit_days), Color::Yellow),
        metric_line("Logistics cost", format!("{:.2}", m.logistics_cost.total_cost), Color::White),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
    ];

    if app.report.alerts.is_empty() {
        content.push(Line::from(Span::styled("  ✓ No alerts", Style::default().fg(Color::Green))));
    }
    for alert in &app.report.alerts {
        content.push(Line::from(Span::styled(
            format!("  ⚠ {}", alert.message),
            Style::default().fg(Color::Red),
        )));
    }

    content.push(Line::from(""));
    content.push(metric_line(
        "Data quality",
        format!("{} critical, {} warnings, {} info", q.critical, q.warnings, q.info),
        if q.critical > 0 { Color::Red } else { Color::Green },
    ));

    let paragraph = Paragraph::new(content).block(table_block(" Metrics "));
    f.render_widget(paragraph, area);
}

fn detail_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let (title, content) = match app.current_page {
        Page::Batches => (" Batch Trace ", batch_detail(app)),
        _ => (" Edge Details ", edge_detail(app)),
    };

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(panel, area);
}

fn edge_detail(app: &App) -> Vec<Line<'static>> {
    let Some(edge) = app.selected_edge() else {
        return vec![Line::from("No edge selected")];
    };
    let e = &edge.edge;

    let mut lines = vec![
        Line::from(""),
        detail_line("From", edge.from.clone()),
        detail_line("To", edge.to.clone()),
        detail_line("Batch", e.batch_id.clone()),
        detail_line("Date", e.date.clone().unwrap_or_else(|| "-".to_string())),
    ];
    if let Some(end) = &e.end_date {
        lines.push(detail_line("Arrived", end.clone()));
    }
    if let Some(term) = &e.payment_term {
        lines.push(detail_line("Payment term", term.clone()));
    }
    if let Some(cost) = e.cost {
        lines.push(detail_line("Cost", format!("{:.2}", cost)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));
    lines
}

fn batch_detail(app: &App) -> Vec<Line<'static>> {
    let Some(batch) = app.selected_batch() else {
        return vec![Line::from("No batch selected")];
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", batch.batch_id),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
    ];

    let trace = app.selected_trace();
    if trace.is_empty() {
        lines.push(Line::from("  No movements recorded"));
    }
    for (i, step) in trace.iter().enumerate() {
        let color = match step.edge.kind {
            EdgeKind::Transaction => Color::Green,
            EdgeKind::Logistics => Color::Cyan,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} → {}", step.from, step.to),
                Style::default().fg(color),
            ),
            Span::raw(format!("  {}", step.edge.date.clone().unwrap_or_default())),
        ]));
    }
    lines
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.page_len(app.current_page);

    let status_spans = vec![
        Span::styled(format!(" Row: {}/{} ", selected, total), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquachain::{LogisticsMove, Transaction};

    fn demo_app() -> App {
        let today = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        App::new(&Dataset::demo(), &EngineConfig::default(), today)
    }

    #[test]
    fn test_batch_named_like_a_location_keeps_its_row() {
        let data = Dataset::new(
            vec![Transaction::new("Farm", "Hub", "B001")],
            vec![],
            vec![LogisticsMove::new("Farm", "Port", "Market")],
        );
        let today = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let app = App::new(&data, &EngineConfig::default(), today);

        let ids: Vec<&str> = app.batches.iter().map(|b| b.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B001", "Farm"]);
        assert_eq!(app.batches[1].steps, 1);
        assert_eq!(app.report.graph.edge_count, 2);
    }

    #[test]
    fn test_pages_cycle() {
        let mut app = demo_app();
        assert_eq!(app.current_page, Page::Network);

        for _ in 0..4 {
            app.next_page();
        }
        assert_eq!(app.current_page, Page::Network);

        app.previous_page();
        assert_eq!(app.current_page, Page::Metrics);
        assert_eq!(app.selected(), None, "Metrics page has no table");
    }

    #[test]
    fn test_navigation_wraps_and_clamps() {
        let mut app = demo_app();
        assert_eq!(app.edges.len(), 6);
        assert_eq!(app.selected(), Some(0));

        app.previous();
        assert_eq!(app.selected(), Some(5), "previous wraps to the last row");

        app.page_up();
        assert_eq!(app.selected(), Some(0));
        app.page_down();
        assert_eq!(app.selected(), Some(5), "page down clamps");

        app.home();
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn test_batch_rows_and_trace() {
        let mut app = demo_app();
        app.current_page = Page::Batches;

        let ids: Vec<_> = app.batches.iter().map(|b| b.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B001", "B002", "B003"]);
        assert_eq!(app.batches[0].steps, 2);

        app.next();
        let trace = app.selected_trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].from, "Green Oceans");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Lisbon Hub", 20), "Lisbon Hub");
        assert_eq!(truncate("Açores Pescados Lda", 10), "Açores ...");
    }
}
