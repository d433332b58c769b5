use crate::common::{with_terminal, UiTerminal};
use crate::editor::{interactive_add, AddResult};
use arboard::Clipboard;
use cmdbar_core::{
    CmdbarError, CommandRunner, Result, RunEvent, RunHandle, Snippet, SnippetStore,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::time::{Duration, Instant};

const RENDER_INTERVAL: Duration = Duration::from_millis(33); // ~30fps
const DRAIN_BUDGET: usize = 200; // output lines pulled per frame

enum BrowserOutcome {
    Exit,
    OpenAdd,
}

struct RunState {
    title: String,
    handle: RunHandle,
    lines: Vec<String>,
    exit_code: Option<i32>,
    cancelled: bool,
    scroll: usize,
}

enum View {
    Browse,
    Run(RunState),
}

/// Display the snippet browser: searchable list, detail pane, run view and
/// the template-based add flow.
pub fn display_snippet_browser(store: &mut SnippetStore) -> Result<()> {
    loop {
        let outcome = with_terminal(|terminal| run_browser(terminal, store))?;
        match outcome {
            BrowserOutcome::Exit => return Ok(()),
            BrowserOutcome::OpenAdd => {
                // The add flow owns its own terminal session
                match interactive_add(store)? {
                    AddResult::Added | AddResult::Cancelled => {}
                }
            }
        }
    }
}

fn run_browser(terminal: &mut UiTerminal, store: &mut SnippetStore) -> Result<BrowserOutcome> {
    let runner = CommandRunner::new();
    let mut query = String::new();
    let mut selected = 0usize;
    let mut view = View::Browse;
    let mut status: Option<String> = None;

    let mut last_render = Instant::now();
    let mut force_render = true;

    loop {
        // Pull pending output from an active run before drawing
        if let View::Run(state) = &mut view {
            if drain_run_events(state) {
                force_render = true;
            }
        }

        let filtered: Vec<Snippet> = store.filter(&query).into_iter().cloned().collect();
        if selected >= filtered.len() {
            selected = filtered.len().saturating_sub(1);
        }

        let now = Instant::now();
        if force_render || now.duration_since(last_render) >= RENDER_INTERVAL {
            match &view {
                View::Browse => {
                    draw_browse(terminal, &query, &filtered, selected, status.as_deref())?
                }
                View::Run(state) => draw_run(terminal, state)?,
            }
            last_render = now;
            force_render = false;
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            force_render = true;
            continue;
        };
        status = None;
        force_render = true;

        let mut next_view = None;
        match &mut view {
            View::Browse => {
                match browse_key(key, store, &filtered, &mut query, &mut selected, &runner)? {
                    BrowseAction::None => {}
                    BrowseAction::Exit => return Ok(BrowserOutcome::Exit),
                    BrowseAction::OpenAdd => return Ok(BrowserOutcome::OpenAdd),
                    BrowseAction::Status(message) => status = Some(message),
                    BrowseAction::StartRun(state) => next_view = Some(View::Run(state)),
                }
            }
            View::Run(state) => {
                if run_key(key, state) {
                    next_view = Some(View::Browse);
                }
            }
        }
        if let Some(next) = next_view {
            view = next;
        }
    }
}

enum BrowseAction {
    None,
    Exit,
    OpenAdd,
    Status(String),
    StartRun(RunState),
}

fn browse_key(
    key: KeyEvent,
    store: &mut SnippetStore,
    filtered: &[Snippet],
    query: &mut String,
    selected: &mut usize,
    runner: &CommandRunner,
) -> Result<BrowseAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let current = filtered.get(*selected);

    let action = match key.code {
        KeyCode::Esc => {
            if query.is_empty() {
                BrowseAction::Exit
            } else {
                query.clear();
                BrowseAction::None
            }
        }
        KeyCode::Up => {
            *selected = selected.saturating_sub(1);
            BrowseAction::None
        }
        KeyCode::Down => {
            if *selected + 1 < filtered.len() {
                *selected += 1;
            }
            BrowseAction::None
        }
        KeyCode::Enter => match current {
            Some(snippet) => match runner.start(&snippet.command_block()) {
                Ok(handle) => BrowseAction::StartRun(RunState {
                    title: snippet.name.clone(),
                    handle,
                    lines: Vec::new(),
                    exit_code: None,
                    cancelled: false,
                    scroll: 0,
                }),
                Err(CmdbarError::RunInProgress) => {
                    BrowseAction::Status("A command is already running".to_string())
                }
                Err(e) => return Err(e),
            },
            None => BrowseAction::None,
        },
        KeyCode::Char('t') if ctrl => match current {
            Some(snippet) => match cmdbar_core::run_in_terminal(&snippet.command_block()) {
                Ok(()) => BrowseAction::Status(format!("Sent to terminal: {}", snippet.name)),
                Err(e) => BrowseAction::Status(e.to_string()),
            },
            None => BrowseAction::None,
        },
        KeyCode::Char('y') if ctrl => match current {
            Some(snippet) => {
                copy_to_clipboard(&snippet.command_block())?;
                BrowseAction::Status("Commands copied to clipboard".to_string())
            }
            None => BrowseAction::None,
        },
        KeyCode::Char('d') if ctrl => match current {
            Some(snippet) => {
                let name = snippet.name.clone();
                store.delete(snippet.id)?;
                BrowseAction::Status(format!("Deleted: {}", name))
            }
            None => BrowseAction::None,
        },
        KeyCode::Char('n') if ctrl => BrowseAction::OpenAdd,
        KeyCode::Char('q') if ctrl => BrowseAction::Exit,
        KeyCode::Backspace => {
            query.pop();
            BrowseAction::None
        }
        KeyCode::Char(c) if !ctrl => {
            query.push(c);
            BrowseAction::None
        }
        _ => BrowseAction::None,
    };

    Ok(action)
}

/// Returns true when the run view should close
fn run_key(key: KeyEvent, state: &mut RunState) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => {
            cancel_run(state);
            false
        }
        KeyCode::Char('x') => {
            cancel_run(state);
            false
        }
        KeyCode::Esc | KeyCode::Char('q') => {
            if state.exit_code.is_none() {
                cancel_run(state);
            }
            true
        }
        KeyCode::Up => {
            // Scroll counts lines back from the tail; 0 follows new output
            state.scroll = state.scroll.saturating_add(1).min(state.lines.len());
            false
        }
        KeyCode::Down => {
            state.scroll = state.scroll.saturating_sub(1);
            false
        }
        _ => false,
    }
}

fn cancel_run(state: &mut RunState) {
    if state.exit_code.is_none() && !state.cancelled {
        state.handle.cancel();
        state.cancelled = true;
    }
}

/// Returns true when new events arrived
fn drain_run_events(state: &mut RunState) -> bool {
    let mut changed = false;
    for _ in 0..DRAIN_BUDGET {
        match state.handle.events().try_recv() {
            Ok(RunEvent::Output(line)) => {
                // Chunks after a cancel are undefined; drop them
                if !state.cancelled {
                    state.lines.push(line);
                }
                changed = true;
            }
            Ok(RunEvent::Finished(code)) => {
                state.exit_code = Some(code);
                changed = true;
            }
            Ok(RunEvent::Failed(message)) => {
                state.lines.push(message);
                state.exit_code = Some(-1);
                changed = true;
            }
            Err(_) => break,
        }
    }
    changed
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        Clipboard::new().map_err(|e| CmdbarError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| CmdbarError::Clipboard(e.to_string()))
}

fn draw_browse(
    terminal: &mut UiTerminal,
    query: &str,
    filtered: &[Snippet],
    selected: usize,
    status: Option<&str>,
) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar
                Constraint::Min(5),    // Snippet list
                Constraint::Length(8), // Detail pane
                Constraint::Length(1), // Help / status line
            ])
            .split(size);

        let search = Paragraph::new(query.to_string())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        f.render_widget(search, chunks[0]);

        let items: Vec<ListItem> = filtered
            .iter()
            .enumerate()
            .map(|(i, snippet)| {
                let highlight_symbol = if i == selected {
                    Span::styled(
                        "> ",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };

                let line = Line::from(vec![
                    highlight_symbol,
                    Span::styled(
                        format!("{:<28}", snippet.name),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{:<14}", snippet.category),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        format!("{:>3} cmds  ", snippet.commands.len()),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(snippet.formatted_age(), Style::default().fg(Color::Green)),
                ]);

                if i == selected {
                    ListItem::new(line).style(Style::default().bg(Color::DarkGray))
                } else {
                    ListItem::new(line)
                }
            })
            .collect();

        let title = format!(" Snippets ({}) ", filtered.len());
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(list, chunks[1]);

        let detail = match filtered.get(selected) {
            Some(snippet) => {
                let mut lines = Vec::new();
                if !snippet.description.is_empty() {
                    lines.push(Line::from(Span::styled(
                        snippet.description.clone(),
                        Style::default().fg(Color::Gray),
                    )));
                }
                if !snippet.tags.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("tags: {}", snippet.tags.join(", ")),
                        Style::default().fg(Color::Cyan),
                    )));
                }
                for command in &snippet.commands {
                    lines.push(Line::from(Span::styled(
                        format!("$ {}", command),
                        Style::default().fg(Color::White),
                    )));
                }
                lines
            }
            None => vec![Line::from("No snippets. Press Ctrl+N to add one.")],
        };
        let detail = Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Detail "));
        f.render_widget(detail, chunks[2]);

        let help = status.map(str::to_string).unwrap_or_else(|| {
            "Enter run | Ctrl+T terminal | Ctrl+Y copy | Ctrl+N new | Ctrl+D delete | Esc quit"
                .to_string()
        });
        let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[3]);
    })?;
    Ok(())
}

fn draw_run(terminal: &mut UiTerminal, state: &RunState) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(size);

        let visible_height = chunks[0].height.saturating_sub(2) as usize;
        let start = state
            .lines
            .len()
            .saturating_sub(visible_height + state.scroll);

        let lines: Vec<Line> = state.lines[start..]
            .iter()
            .take(visible_height)
            .map(|l| Line::from(l.clone()))
            .collect();

        let title = match (state.exit_code, state.cancelled) {
            (None, false) => format!(" Running: {} ", state.title),
            (None, true) => format!(" Cancelling: {} ", state.title),
            (Some(0), _) => format!(" Finished: {} ", state.title),
            (Some(code), _) => format!(" Failed ({}): {} ", code, state.title),
        };
        let color = match state.exit_code {
            None => Color::Yellow,
            Some(0) => Color::Green,
            Some(_) => Color::Red,
        };

        let output = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(color)),
        );
        f.render_widget(output, chunks[0]);

        let help = Paragraph::new("x/Ctrl+C cancel | Up/Down scroll | Esc back")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[1]);
    })?;
    Ok(())
}
