//! Terminal User Interface for rvw.
//!
//! Provides an interactive TUI for paging through, sorting and searching
//! reviews. Queries run on a background thread so the screen stays
//! responsive on large databases.

mod app;
mod loader;
mod theme;
mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use ratatui::{backend::CrosstermBackend, Terminal};
use rvw_core::core::ReviewService;

use app::{update, App, InputMode, Message};
use loader::Loader;

/// Run the TUI application
pub fn run(service: ReviewService) -> Result<()> {
    let loader = Loader::spawn(service).context("Failed to start loader thread")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new();
    let result = run_loop(&mut terminal, &mut app, &loader);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    loader: &Loader,
) -> Result<()> {
    while !app.should_quit {
        while let Some(reply) = loader.poll()? {
            dispatch(app, Message::Loaded(reply));
        }
        if let Some(request) = app.take_request() {
            loader.send(request)?;
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('z') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    suspend(terminal)?;
                    continue;
                }
                if let Some(message) = key_to_message(app, key.code, key.modifiers) {
                    dispatch(app, message);
                }
            }
        }
    }

    Ok(())
}

/// Process a message and any follow-up messages
fn dispatch(app: &mut App, message: Message) {
    let mut next = Some(message);
    while let Some(msg) = next {
        next = update(app, msg);
    }
}

/// Map a key press to a message for the current mode
fn key_to_message(app: &App, code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
    // Help overlay takes priority - any key dismisses it
    if app.show_help {
        return Some(Message::ToggleHelp);
    }

    if app.input_mode == InputMode::Search {
        return match code {
            KeyCode::Enter => Some(Message::SubmitSearch),
            KeyCode::Esc => Some(Message::CancelSearch),
            KeyCode::Backspace => Some(Message::SearchBackspace),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::SearchInput(c))
            }
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Message::Quit),
        KeyCode::Char('?') => Some(Message::ToggleHelp),
        KeyCode::Char('R') => Some(Message::Refresh),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => Some(Message::MoveSelection(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(Message::MoveSelection(-1)),
        KeyCode::Char('g') | KeyCode::Home => Some(Message::JumpToTop),
        KeyCode::Char('G') | KeyCode::End => Some(Message::JumpToBottom),
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => Some(Message::NextPage),
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => Some(Message::PrevPage),

        // Filters and sorting
        KeyCode::Char('d') => Some(Message::ToggleSortDate),
        KeyCode::Char('r') => Some(Message::ToggleSortRating),
        KeyCode::Char('m') => Some(Message::CycleMinRating),
        KeyCode::Char('/') => Some(Message::StartSearch),
        KeyCode::Esc => Some(Message::ClearSearch),

        KeyCode::Enter => Some(Message::ToggleDetail),
        _ => None,
    }
}

/// Suspend the TUI (Ctrl+Z support)
fn suspend(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    // Restore terminal before suspending
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Send SIGTSTP to suspend
    signal::kill(Pid::this(), Signal::SIGTSTP)?;

    // Re-setup terminal when resumed
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;

    Ok(())
}
