use crate::history::HistoryEntry;
use crate::nav::{Focus, NavState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use std::time::{SystemTime, UNIX_EPOCH};

const ACCENT: Color = Color::Cyan;
const ACCENT_DIM: Color = Color::DarkGray;

#[derive(Debug)]
pub enum Overlay {
    Help,
    History(HistoryView),
}

#[derive(Debug)]
pub struct HistoryView {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl HistoryView {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if !self.entries.is_empty() {
            self.cursor = (self.cursor + 1).min(self.entries.len() - 1);
        }
    }

    pub fn selected(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }
}

pub fn draw(f: &mut Frame, state: &NavState, overlay: Option<&Overlay>) {
    let area = f.area();
    if state.catalog().environments().is_empty() {
        let block = Block::default().borders(Borders::ALL).title("hopper");
        let paragraph = Paragraph::new("No environments configured.").block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);
    let body = chunks[0];
    let footer = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(body);

    draw_environments(f, state, columns[0]);
    draw_hosts(f, state, columns[1]);
    draw_footer(f, state, footer);

    match overlay {
        Some(Overlay::Help) => draw_help(f, body),
        Some(Overlay::History(view)) => draw_history(f, view, body),
        None => {}
    }
}

fn draw_environments(f: &mut Frame, state: &NavState, area: Rect) {
    let focused = state.focus() == Focus::EnvList;
    let block = panel_block("Environments", focused);

    let items: Vec<ListItem> = state
        .catalog()
        .environments()
        .iter()
        .map(|env| ListItem::new(format!("{} ({})", env.display_name(), env.hosts.len())))
        .collect();

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(state.env_cursor().min(items.len() - 1)));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(focused))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_hosts(f: &mut Frame, state: &NavState, area: Rect) {
    let focus = state.focus();
    let focused = matches!(focus, Focus::Search | Focus::HostLeft | Focus::HostRight);
    let name = state
        .current_env()
        .map(|env| env.display_name())
        .unwrap_or_else(|| "Hosts".to_string());
    let total = state
        .current_env()
        .map(|env| env.hosts.len())
        .unwrap_or_default();
    let title = if state.query().is_empty() {
        format!("{name} ({total})")
    } else {
        format!("{name} ({}/{total})", state.visible().len())
    };

    let block = panel_block(&title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut host_area = inner;
    if focus == Focus::Search || !state.query().is_empty() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let search_area = rows[0];
        host_area = rows[1];

        let searching = focus == Focus::Search;
        let line = input_line("Filter", state.query(), searching);
        f.render_widget(Paragraph::new(line), search_area);
        if searching {
            let offset = "> Filter: ".len() + state.query().chars().count();
            f.set_cursor_position((search_area.x + offset as u16, search_area.y));
        }
    }

    if state.visible().is_empty() {
        let message = if state.query().is_empty() {
            "No hosts in this environment."
        } else {
            "No hosts match."
        };
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(ACCENT_DIM)),
            host_area,
        );
        return;
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(host_area);

    let (left, right) = state.columns();
    draw_host_column(f, left, halves[0], focus == Focus::HostLeft, state.cursor());
    draw_host_column(f, right, halves[1], focus == Focus::HostRight, state.cursor());
}

fn draw_host_column(f: &mut Frame, hosts: &[crate::catalog::Host], area: Rect, focused: bool, cursor: usize) {
    let items: Vec<ListItem> = hosts
        .iter()
        .map(|host| ListItem::new(host.name.clone()))
        .collect();

    let mut list_state = ListState::default();
    if focused && !items.is_empty() {
        list_state.select(Some(cursor.min(items.len() - 1)));
    }

    let list = List::new(items)
        .highlight_style(highlight_style(focused))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_footer(f: &mut Frame, state: &NavState, area: Rect) {
    let mut spans = Vec::new();
    match state.focus() {
        Focus::EnvList => {
            spans.extend(hint("Enter", "select"));
            spans.extend(hint("/", "filter"));
            spans.extend(hint("r", "history"));
            spans.extend(hint("?", "help"));
            spans.extend(hint("q", "quit"));
        }
        Focus::Search => {
            spans.extend(hint("Enter", "confirm"));
            spans.extend(hint("Esc", "cancel"));
        }
        Focus::HostLeft | Focus::HostRight => {
            spans.extend(hint("Enter", "ssh"));
            spans.extend(hint("s", "sftp"));
            spans.extend(hint("/", "filter"));
            spans.extend(hint("Esc", "back"));
        }
    }
    let paragraph = Paragraph::new(Line::from(spans)).block(Block::default());
    f.render_widget(paragraph, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = vec![
        Line::from("Keys:"),
        Line::from("  j/k or arrows   Move cursor"),
        Line::from("  Enter or l      Select environment / connect"),
        Line::from("  h or Esc        Back"),
        Line::from("  /               Filter hosts"),
        Line::from("  s               Connect with sftp"),
        Line::from("  r               Recent connections"),
        Line::from("  ?               Toggle help"),
        Line::from("  q               Quit"),
    ];

    let popup = centered_rect(60, 60, area);
    f.render_widget(Clear, popup);
    let paragraph = Paragraph::new(help)
        .block(panel_block("Help", true))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup);
}

fn draw_history(f: &mut Frame, view: &HistoryView, area: Rect) {
    let popup = centered_rect(60, 60, area);
    f.render_widget(Clear, popup);
    let block = panel_block("Recent Connections", true);

    if view.entries.is_empty() {
        let paragraph = Paragraph::new("No connections yet.").block(block);
        f.render_widget(paragraph, popup);
        return;
    }

    let now = unix_now();
    let items: Vec<ListItem> = view
        .entries
        .iter()
        .map(|entry| {
            let age = format_age(now.saturating_sub(entry.timestamp));
            ListItem::new(Line::from(vec![
                Span::raw(entry.target.clone()),
                Span::raw("  "),
                Span::styled(entry.protocol.to_string(), Style::default().fg(ACCENT_DIM)),
                Span::raw("  "),
                Span::styled(age, Style::default().fg(ACCENT_DIM)),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(view.cursor.min(view.entries.len() - 1)));

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(true))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(list, popup, &mut list_state);
}

fn input_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let prefix = if active { ">" } else { " " };
    let label_style = if active {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT_DIM)
    };
    Line::from(vec![
        Span::styled(format!("{prefix} {label}: "), label_style),
        Span::raw(value.to_string()),
    ])
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { ACCENT } else { ACCENT_DIM };
    let title = Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(color)
            .add_modifier(if focused { Modifier::BOLD } else { Modifier::empty() }),
    ));
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn hint(key: &str, label: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            key.to_string(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {label}  ")),
    ]
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn format_age(secs: u64) -> String {
    if secs >= 86400 {
        format!("{}d ago", secs / 86400)
    } else if secs >= 3600 {
        format!("{}h ago", secs / 3600)
    } else if secs >= 60 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{secs}s ago")
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
