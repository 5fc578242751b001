mod catalog;
mod history;
mod nav;
mod ui;
mod view;

use anyhow::{Context, Result};
use catalog::{Catalog, CatalogError};
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures_util::StreamExt;
use history::History;
use nav::{ConnectionTarget, Focus, NavEvent, NavState, Outcome};
use std::path::PathBuf;
use std::process::Stdio;
use tracing_subscriber::EnvFilter;
use ui::picker::{HistoryView, Overlay};

/// Interactive picker for ssh and sftp targets.
#[derive(Parser, Debug)]
#[command(name = "hopper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the hosts file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
    Done(i32),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_path = match cli.config {
        Some(path) => path,
        None => catalog::default_config_path()?,
    };
    let catalog = match Catalog::load(&config_path) {
        Ok(catalog) => catalog,
        Err(err) => {
            report_config_error(&err);
            std::process::exit(1);
        }
    };
    tracing::debug!(
        "loaded {} environments from {}",
        catalog.environments().len(),
        config_path.display()
    );

    let mut history = History::new(history::history_path(&config_path));
    let mut state = NavState::new(catalog);
    let mut overlay: Option<Overlay> = None;

    let mut terminal = ui::enter_terminal()?;
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| ui::picker::draw(f, &state, overlay.as_ref()))?;

        let Some(event) = events.next().await else {
            break;
        };
        let Ok(event) = event else {
            continue;
        };

        match handle_event(event, &mut state, &mut overlay, &mut history, &mut terminal).await? {
            Flow::Continue => {}
            Flow::Quit => break,
            Flow::Done(code) => std::process::exit(code),
        }
    }

    ui::exit_terminal(&mut terminal)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .init();
}

fn report_config_error(err: &CatalogError) {
    eprintln!("{err}");
    if let CatalogError::MissingFile(path) = err {
        let example = catalog::example_path(path);
        if example.exists() {
            eprintln!(
                "Copy {} to {} to get started.",
                example.display(),
                path.display()
            );
        } else {
            eprintln!(
                "Create {} with an [[environments]] table per environment.",
                path.display()
            );
        }
    }
}

async fn handle_event(
    event: Event,
    state: &mut NavState,
    overlay: &mut Option<Overlay>,
    history: &mut History,
    terminal: &mut ui::AppTerminal,
) -> Result<Flow> {
    let Event::Key(key) = event else {
        return Ok(Flow::Continue);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(Flow::Continue);
    }

    if overlay.is_some() {
        return handle_overlay_key(key.code, overlay, history, terminal).await;
    }

    if state.focus() == Focus::Search {
        let outcome = match key.code {
            KeyCode::Enter => state.apply(NavEvent::Commit),
            KeyCode::Esc => state.apply(NavEvent::Cancel),
            KeyCode::Backspace => state.apply(NavEvent::Backspace),
            KeyCode::Char(ch) => state.apply(NavEvent::Input(ch)),
            _ => Outcome::Continue,
        };
        return apply_outcome(outcome, history, terminal).await;
    }

    let nav_event = match key.code {
        KeyCode::Char('q') => return Ok(Flow::Quit),
        KeyCode::Char('?') => {
            *overlay = Some(Overlay::Help);
            return Ok(Flow::Continue);
        }
        KeyCode::Char('r') => {
            *overlay = Some(Overlay::History(HistoryView::new(
                history.entries().to_vec(),
            )));
            return Ok(Flow::Continue);
        }
        KeyCode::Char('/') => NavEvent::OpenSearch,
        KeyCode::Char('s') => NavEvent::CommitSftp,
        KeyCode::Enter => NavEvent::Commit,
        KeyCode::Esc => NavEvent::Cancel,
        KeyCode::Left | KeyCode::Char('h') => NavEvent::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => NavEvent::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => NavEvent::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => NavEvent::CursorDown,
        _ => return Ok(Flow::Continue),
    };

    let outcome = state.apply(nav_event);
    apply_outcome(outcome, history, terminal).await
}

async fn handle_overlay_key(
    code: KeyCode,
    overlay: &mut Option<Overlay>,
    history: &mut History,
    terminal: &mut ui::AppTerminal,
) -> Result<Flow> {
    match overlay.as_mut() {
        Some(Overlay::Help) => match code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => *overlay = None,
            _ => {}
        },
        Some(Overlay::History(view)) => match code {
            KeyCode::Up | KeyCode::Char('k') => view.up(),
            KeyCode::Down | KeyCode::Char('j') => view.down(),
            KeyCode::Enter => {
                if let Some(entry) = view.selected() {
                    let conn = ConnectionTarget {
                        target: entry.target.clone(),
                        protocol: entry.protocol,
                    };
                    history.record(&conn.target, conn.protocol);
                    let code = connect(terminal, &conn).await?;
                    return Ok(Flow::Done(code));
                }
            }
            KeyCode::Char('r') | KeyCode::Char('q') | KeyCode::Esc => *overlay = None,
            _ => {}
        },
        None => {}
    }
    Ok(Flow::Continue)
}

async fn apply_outcome(
    outcome: Outcome,
    history: &mut History,
    terminal: &mut ui::AppTerminal,
) -> Result<Flow> {
    match outcome {
        Outcome::Continue => Ok(Flow::Continue),
        Outcome::Quit => Ok(Flow::Quit),
        Outcome::Connect(conn) => {
            history.record(&conn.target, conn.protocol);
            let code = connect(terminal, &conn).await?;
            Ok(Flow::Done(code))
        }
    }
}

async fn connect(terminal: &mut ui::AppTerminal, conn: &ConnectionTarget) -> Result<i32> {
    ui::exit_terminal(terminal)?;
    println!("Connecting to {} with {}...", conn.target, conn.protocol);

    let mut cmd = tokio::process::Command::new(conn.protocol.command());
    cmd.arg(&conn.target);
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());

    let status = cmd
        .status()
        .await
        .with_context(|| format!("Failed to launch {}", conn.protocol))?;
    Ok(status.code().unwrap_or(0))
}
