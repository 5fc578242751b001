use crate::catalog::{Catalog, Environment, Host};
use crate::view::{filter_hosts, split_columns};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    EnvList,
    Search,
    HostLeft,
    HostRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Sftp,
}

impl Protocol {
    pub fn command(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::Sftp => "sftp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub target: String,
    pub protocol: Protocol,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavEvent {
    CursorUp,
    CursorDown,
    MoveLeft,
    MoveRight,
    Commit,
    CommitSftp,
    Cancel,
    OpenSearch,
    Input(char),
    Backspace,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    Connect(ConnectionTarget),
}

// Every transition is total: events that make no sense for the current
// focus are no-ops, never errors.
#[derive(Debug)]
pub struct NavState {
    catalog: Catalog,
    focus: Focus,
    env_cursor: usize,
    selected_env: Option<usize>,
    query: String,
    visible: Vec<Host>,
    cursor: usize,
}

impl NavState {
    pub fn new(catalog: Catalog) -> Self {
        let mut state = Self {
            catalog,
            focus: Focus::EnvList,
            env_cursor: 0,
            selected_env: None,
            query: String::new(),
            visible: Vec::new(),
            cursor: 0,
        };
        state.recompute();
        state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn env_cursor(&self) -> usize {
        self.env_cursor
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> &[Host] {
        &self.visible
    }

    pub fn columns(&self) -> (&[Host], &[Host]) {
        split_columns(&self.visible)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // The environment hosts are drawn from: the committed one, or the
    // highlighted one while previewing.
    pub fn current_env(&self) -> Option<&Environment> {
        let index = self.selected_env.unwrap_or(self.env_cursor);
        self.catalog.environments().get(index)
    }

    pub fn env_committed(&self) -> bool {
        self.selected_env.is_some()
    }

    pub fn apply(&mut self, event: NavEvent) -> Outcome {
        match event {
            NavEvent::CursorUp => self.move_cursor(-1),
            NavEvent::CursorDown => self.move_cursor(1),
            NavEvent::MoveLeft => self.move_left(),
            NavEvent::MoveRight => self.move_right(),
            NavEvent::Commit => self.commit(),
            NavEvent::CommitSftp => match self.focus {
                Focus::HostLeft | Focus::HostRight => self.commit_host(Protocol::Sftp),
                _ => Outcome::Continue,
            },
            NavEvent::Cancel => self.cancel(),
            NavEvent::OpenSearch => {
                if self.focus != Focus::Search {
                    self.focus = Focus::Search;
                }
                Outcome::Continue
            }
            NavEvent::Input(ch) => {
                if self.focus == Focus::Search {
                    self.query.push(ch);
                    self.cursor = 0;
                    self.recompute();
                }
                Outcome::Continue
            }
            NavEvent::Backspace => {
                if self.focus == Focus::Search && self.query.pop().is_some() {
                    self.cursor = 0;
                    self.recompute();
                }
                Outcome::Continue
            }
        }
    }

    fn move_cursor(&mut self, delta: isize) -> Outcome {
        match self.focus {
            Focus::EnvList => {
                let count = self.catalog.environments().len();
                let next = step(self.env_cursor, delta, count);
                if next != self.env_cursor {
                    self.env_cursor = next;
                    self.recompute();
                }
            }
            Focus::HostLeft | Focus::HostRight => {
                let len = self.focused_column_len();
                self.cursor = step(self.cursor, delta, len);
            }
            Focus::Search => {}
        }
        Outcome::Continue
    }

    fn move_left(&mut self) -> Outcome {
        match self.focus {
            Focus::HostRight => {
                let (left, _) = self.columns();
                let row = clamp_row(self.cursor, left.len());
                self.focus = Focus::HostLeft;
                self.cursor = row;
            }
            Focus::HostLeft => self.return_to_env_list(),
            Focus::EnvList | Focus::Search => {}
        }
        Outcome::Continue
    }

    fn move_right(&mut self) -> Outcome {
        match self.focus {
            Focus::EnvList => self.select_env(),
            Focus::HostLeft => {
                let (_, right) = self.columns();
                if !right.is_empty() {
                    let row = clamp_row(self.cursor, right.len());
                    self.focus = Focus::HostRight;
                    self.cursor = row;
                }
            }
            Focus::HostRight | Focus::Search => {}
        }
        Outcome::Continue
    }

    fn commit(&mut self) -> Outcome {
        match self.focus {
            Focus::EnvList => {
                self.select_env();
                Outcome::Continue
            }
            Focus::Search => {
                if !self.visible.is_empty() {
                    self.focus = Focus::HostLeft;
                    self.cursor = 0;
                }
                Outcome::Continue
            }
            Focus::HostLeft | Focus::HostRight => self.commit_host(Protocol::Ssh),
        }
    }

    fn cancel(&mut self) -> Outcome {
        match self.focus {
            Focus::EnvList => Outcome::Quit,
            Focus::Search | Focus::HostLeft | Focus::HostRight => {
                self.return_to_env_list();
                Outcome::Continue
            }
        }
    }

    fn select_env(&mut self) {
        if self.catalog.environments().is_empty() {
            return;
        }
        self.selected_env = Some(self.env_cursor);
        self.query.clear();
        self.recompute();
        self.focus = Focus::HostLeft;
        self.cursor = 0;
    }

    fn return_to_env_list(&mut self) {
        self.query.clear();
        self.selected_env = None;
        self.cursor = 0;
        self.focus = Focus::EnvList;
        self.recompute();
    }

    fn commit_host(&self, protocol: Protocol) -> Outcome {
        let (left, right) = self.columns();
        let column = match self.focus {
            Focus::HostLeft => left,
            Focus::HostRight => right,
            _ => return Outcome::Continue,
        };
        let Some(host) = column.get(self.cursor) else {
            return Outcome::Continue;
        };
        let Some(env) = self.current_env() else {
            return Outcome::Continue;
        };
        let target = self.catalog.resolve_target(&env.id, &host.target);
        Outcome::Connect(ConnectionTarget { target, protocol })
    }

    fn focused_column_len(&self) -> usize {
        let (left, right) = self.columns();
        match self.focus {
            Focus::HostLeft => left.len(),
            Focus::HostRight => right.len(),
            _ => 0,
        }
    }

    fn recompute(&mut self) {
        let index = self.selected_env.unwrap_or(self.env_cursor);
        let hosts = match self.catalog.environments().get(index) {
            Some(env) => self.catalog.hosts_of(&env.id),
            None => &[],
        };
        let visible: Vec<Host> = filter_hosts(hosts, &self.query)
            .into_iter()
            .cloned()
            .collect();
        self.visible = visible;
    }
}

fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if delta.is_negative() {
        index.saturating_sub(delta.unsigned_abs())
    } else {
        (index + delta as usize).min(len - 1)
    }
}

fn clamp_row(row: usize, len: usize) -> usize {
    if len == 0 { 0 } else { row.min(len - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(id: &str, suffix: &str, hosts: &[&str]) -> Environment {
        Environment {
            id: id.to_string(),
            suffix: suffix.to_string(),
            hosts: hosts.iter().map(|name| Host::new(*name, *name)).collect(),
        }
    }

    fn state() -> NavState {
        NavState::new(Catalog::new(vec![
            env("staging", "-stg.internal", &["web1", "web2", "db1"]),
            env("prod", ".prod.example.com", &["app1", "app2", "app3", "app4", "app5", "app6", "app7"]),
            env("lab", "", &[]),
        ]))
    }

    fn visible_names(state: &NavState) -> Vec<&str> {
        state
            .visible()
            .iter()
            .map(|host| host.name.as_str())
            .collect()
    }

    #[test]
    fn starts_on_environment_list_with_a_preview() {
        let state = state();
        assert_eq!(state.focus(), Focus::EnvList);
        assert_eq!(state.env_cursor(), 0);
        assert!(!state.env_committed());
        assert_eq!(visible_names(&state), ["web1", "web2", "db1"]);
    }

    #[test]
    fn highlight_move_previews_without_committing() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        assert_eq!(state.env_cursor(), 1);
        assert!(!state.env_committed());
        assert_eq!(state.visible().len(), 7);
    }

    #[test]
    fn env_cursor_clamps_at_both_ends() {
        let mut state = state();
        state.apply(NavEvent::CursorUp);
        assert_eq!(state.env_cursor(), 0);
        for _ in 0..10 {
            state.apply(NavEvent::CursorDown);
        }
        assert_eq!(state.env_cursor(), 2);
    }

    #[test]
    fn committing_an_environment_enters_the_left_column() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        assert!(state.env_committed());
        assert_eq!(state.focus(), Focus::HostLeft);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.visible().len(), 3);
    }

    #[test]
    fn move_right_on_environment_list_also_commits() {
        let mut state = state();
        state.apply(NavEvent::MoveRight);
        assert!(state.env_committed());
        assert_eq!(state.focus(), Focus::HostLeft);
    }

    #[test]
    fn filtered_selection_resolves_with_suffix() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('d'));
        state.apply(NavEvent::Input('b'));
        assert_eq!(visible_names(&state), ["db1"]);
        let (left, right) = state.columns();
        assert_eq!(left.len(), 1);
        assert!(right.is_empty());

        state.apply(NavEvent::Commit);
        assert_eq!(state.focus(), Focus::HostLeft);
        let outcome = state.apply(NavEvent::Commit);
        assert_eq!(
            outcome,
            Outcome::Connect(ConnectionTarget {
                target: "db1-stg.internal".to_string(),
                protocol: Protocol::Ssh,
            })
        );
    }

    #[test]
    fn sftp_commit_tags_the_protocol() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        let outcome = state.apply(NavEvent::CommitSftp);
        assert_eq!(
            outcome,
            Outcome::Connect(ConnectionTarget {
                target: "web1-stg.internal".to_string(),
                protocol: Protocol::Sftp,
            })
        );
    }

    #[test]
    fn search_cancel_restores_the_highlighted_row() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::OpenSearch);
        assert_eq!(state.focus(), Focus::Search);
        state.apply(NavEvent::Input('a'));
        state.apply(NavEvent::Input('p'));
        let outcome = state.apply(NavEvent::Cancel);
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(state.focus(), Focus::EnvList);
        assert_eq!(state.env_cursor(), 1);
        assert_eq!(state.query(), "");
        assert!(!state.env_committed());
        assert_eq!(state.visible().len(), 7);
    }

    #[test]
    fn empty_search_cancel_returns_to_the_same_row() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Cancel);
        assert_eq!(state.focus(), Focus::EnvList);
        assert_eq!(state.env_cursor(), 1);
    }

    #[test]
    fn commit_from_search_needs_a_visible_host() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('z'));
        assert!(state.visible().is_empty());
        state.apply(NavEvent::Commit);
        assert_eq!(state.focus(), Focus::Search);

        state.apply(NavEvent::Backspace);
        state.apply(NavEvent::Commit);
        assert_eq!(state.focus(), Focus::HostLeft);
    }

    #[test]
    fn committing_in_an_empty_column_is_a_no_op() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::Commit);
        assert_eq!(state.focus(), Focus::HostLeft);
        assert!(state.visible().is_empty());
        assert_eq!(state.apply(NavEvent::Commit), Outcome::Continue);
        assert_eq!(state.apply(NavEvent::CommitSftp), Outcome::Continue);
    }

    #[test]
    fn column_switches_clamp_the_row() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::Commit);
        let (left, right) = state.columns();
        assert_eq!((left.len(), right.len()), (4, 3));

        for _ in 0..3 {
            state.apply(NavEvent::CursorDown);
        }
        assert_eq!(state.cursor(), 3);
        state.apply(NavEvent::MoveRight);
        assert_eq!(state.focus(), Focus::HostRight);
        assert_eq!(state.cursor(), 2);
        state.apply(NavEvent::MoveLeft);
        assert_eq!(state.focus(), Focus::HostLeft);
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn move_right_with_an_empty_right_column_stays_put() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('d'));
        state.apply(NavEvent::Commit);
        assert_eq!(state.focus(), Focus::HostLeft);
        state.apply(NavEvent::MoveRight);
        assert_eq!(state.focus(), Focus::HostLeft);
    }

    #[test]
    fn move_left_from_the_left_column_restores_the_environment_list() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('a'));
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::MoveLeft);
        assert_eq!(state.focus(), Focus::EnvList);
        assert_eq!(state.env_cursor(), 1);
        assert_eq!(state.query(), "");
        assert!(!state.env_committed());
    }

    #[test]
    fn filters_never_carry_across_environments() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('d'));
        state.apply(NavEvent::Input('b'));
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::MoveLeft);
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::Commit);
        assert_eq!(state.query(), "");
        assert_eq!(state.visible().len(), 7);
    }

    #[test]
    fn cancel_on_the_environment_list_quits() {
        let mut state = state();
        assert_eq!(state.apply(NavEvent::Cancel), Outcome::Quit);
    }

    #[test]
    fn cancel_in_a_host_column_returns_to_the_environment_list() {
        let mut state = state();
        state.apply(NavEvent::Commit);
        state.apply(NavEvent::Cancel);
        assert_eq!(state.focus(), Focus::EnvList);
        assert!(!state.env_committed());
    }

    #[test]
    fn an_empty_catalog_accepts_every_event() {
        let mut state = NavState::new(Catalog::new(Vec::new()));
        for event in [
            NavEvent::CursorUp,
            NavEvent::CursorDown,
            NavEvent::MoveRight,
            NavEvent::Commit,
            NavEvent::CommitSftp,
            NavEvent::OpenSearch,
            NavEvent::Input('x'),
            NavEvent::Backspace,
        ] {
            let outcome = state.apply(event);
            assert_ne!(outcome, Outcome::Quit);
        }
        assert!(state.visible().is_empty());
    }

    #[test]
    fn typing_in_search_narrows_live() {
        let mut state = state();
        state.apply(NavEvent::CursorDown);
        state.apply(NavEvent::OpenSearch);
        state.apply(NavEvent::Input('a'));
        state.apply(NavEvent::Input('p'));
        state.apply(NavEvent::Input('p'));
        state.apply(NavEvent::Input('1'));
        assert_eq!(visible_names(&state), ["app1"]);
        state.apply(NavEvent::Backspace);
        assert_eq!(state.visible().len(), 7);
    }
}
