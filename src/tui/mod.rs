mod theme;
mod widgets;

pub use theme::Tone;
use widgets::Notice;

use crate::change::ChangeSummary;
use crate::controller::{Action, Screen};
use crate::editor;
use crate::error::{Result, SmartCommitError};
use crate::message::CommitMessage;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use tracing::debug;

/// Full-screen preview used when stdout is a terminal.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    summary: ChangeSummary,
    message: Option<CommitMessage>,
    notice: Option<Notice>,
}

impl Tui {
    pub fn new(summary: &ChangeSummary) -> Result<Self> {
        enable_raw_mode()?;
        let terminal = restore_on_error(enter_alternate_screen(), || {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })?;
        Ok(Self {
            terminal,
            summary: summary.clone(),
            message: None,
            notice: None,
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let Self {
            terminal,
            summary,
            message,
            notice,
        } = self;
        terminal.draw(|f| widgets::draw_preview(f, summary, message.as_ref(), notice.as_ref()))?;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.terminal.clear()?;
        Ok(())
    }
}

impl Screen for Tui {
    fn status(&mut self, text: &str) -> Result<()> {
        let Self {
            terminal,
            summary,
            message,
            notice,
        } = self;
        let detail = format!(
            "{} on {} ({} files)",
            text,
            summary.branch,
            summary.files.len()
        );
        terminal.draw(|f| {
            widgets::draw_preview(f, summary, message.as_ref(), notice.as_ref());
            widgets::draw_status_panel(f, text, &detail);
        })?;
        Ok(())
    }

    fn notify(&mut self, text: &str) -> Result<()> {
        self.notice = Some(Notice::info(text));
        self.redraw()
    }

    fn present(&mut self, message: Option<&CommitMessage>) -> Result<()> {
        self.message = message.cloned();
        self.redraw()
    }

    fn report(&mut self, error: &SmartCommitError) -> Result<()> {
        self.notice = Some(Notice::error(error));
        self.redraw()
    }

    fn read_action(&mut self) -> Result<Action> {
        self.redraw()?;
        loop {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            Some(Action::Quit)
                        }
                        KeyCode::Char(ch) => Action::from_key(ch),
                        KeyCode::Enter => Some(Action::Commit),
                        KeyCode::Esc => Some(Action::Quit),
                        _ => None,
                    }
                }
                Event::Resize(..) => {
                    self.redraw()?;
                    None
                }
                _ => None,
            };
            if let Some(action) = action {
                debug!(?action, "key pressed");
                self.notice = None;
                return Ok(action);
            }
        }
    }

    fn edit(&mut self, message: &CommitMessage) -> Result<Option<CommitMessage>> {
        self.suspend()?;
        let edited = editor::edit_message(message);
        self.resume()?;
        edited.map_err(|e| SmartCommitError::Editor(format!("{e:#}")))
    }
}

fn enter_alternate_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Runs `restore` when a half-finished terminal setup fails, since no `Tui`
/// exists yet whose `Drop` could undo it.
fn restore_on_error<T>(result: Result<T>, restore: impl FnOnce()) -> Result<T> {
    result.inspect_err(|_| restore())
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
