use crate::change::ChangeSummary;
use crate::controller::{Action, Outcome, Screen};
use crate::editor;
use crate::error::{Result, SmartCommitError};
use crate::message::CommitMessage;
use crate::tui::Tone;
use std::io::{self, BufRead, IsTerminal, Write};

const MAX_LISTED_FILES: usize = 10;

/// Line-based console used for pipes, `--auto-commit` and `--no-preview`.
pub struct Plain<R, W> {
    input: R,
    out: W,
    color: bool,
}

impl Plain<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            out: io::stdout(),
            color: io::stdout().is_terminal(),
        }
    }
}

impl<R: BufRead, W: Write> Plain<R, W> {
    pub fn new(input: R, out: W, color: bool) -> Self {
        Self { input, out, color }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.color {
            format!("\x1b[38;5;{}m{text}\x1b[0m", tone.index())
        } else {
            text.to_string()
        }
    }

    pub fn print_summary(&mut self, summary: &ChangeSummary) -> Result<()> {
        let header = format!(
            "{}  {}  {} {}",
            self.paint(Tone::Warning, &summary.branch),
            self.paint(Tone::Muted, &format!("{} files", summary.files.len())),
            self.paint(Tone::Added, &format!("+{}", summary.total_additions())),
            self.paint(Tone::Removed, &format!("-{}", summary.total_deletions())),
        );
        writeln!(self.out)?;
        writeln!(self.out, "{header}")?;

        for file in summary.files.iter().take(MAX_LISTED_FILES) {
            let path = match &file.old_path {
                Some(old) => format!("{old} -> {}", file.path),
                None => file.path.clone(),
            };
            let line = format!(
                "  {} {} {} {}",
                self.paint(Tone::for_change(file.change_type), file.change_type.letter()),
                path,
                self.paint(Tone::Added, &format!("+{}", file.additions)),
                self.paint(Tone::Removed, &format!("-{}", file.deletions)),
            );
            writeln!(self.out, "{line}")?;
        }
        if summary.files.len() > MAX_LISTED_FILES {
            let more = format!("... {} more", summary.files.len() - MAX_LISTED_FILES);
            writeln!(self.out, "  {}", self.paint(Tone::Muted, &more))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn print_outcome(&mut self, outcome: &Outcome, commit_id: Option<&str>) -> Result<()> {
        match outcome {
            Outcome::Committed(message) => {
                let label = match commit_id {
                    Some(id) => format!("committed {id}"),
                    None => "committed".to_string(),
                };
                writeln!(self.out)?;
                writeln!(self.out, "{}", self.paint(Tone::Added, &label))?;
                writeln!(self.out)?;
                for line in message.to_wire().lines() {
                    writeln!(self.out, "  {line}")?;
                }
                writeln!(self.out)?;
            }
            Outcome::Quit => {
                writeln!(self.out, "{}", self.paint(Tone::Accent, "cancelled, nothing committed"))?;
            }
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Screen for Plain<R, W> {
    fn status(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{} {text}", self.paint(Tone::Muted, "[smart-commit]"))?;
        Ok(())
    }

    fn notify(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", self.paint(Tone::Warning, text))?;
        Ok(())
    }

    fn present(&mut self, message: Option<&CommitMessage>) -> Result<()> {
        let Some(message) = message else {
            writeln!(self.out, "{}", self.paint(Tone::Muted, "No commit message yet."))?;
            return Ok(());
        };

        writeln!(self.out)?;
        writeln!(self.out, "Proposed commit message:")?;
        writeln!(self.out)?;
        writeln!(self.out, "  {}", self.paint(Tone::Accent, &message.title))?;
        if !message.body.is_empty() {
            writeln!(self.out)?;
            for line in &message.body {
                writeln!(self.out, "  {line}")?;
            }
        }
        for warning in message.warnings() {
            writeln!(self.out, "  {}", self.paint(Tone::Warning, &format!("warning: {warning}")))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn report(&mut self, error: &SmartCommitError) -> Result<()> {
        writeln!(self.out, "{}", self.paint(Tone::Removed, &format!("error: {error}")))?;
        if let Some(hint) = error.hint() {
            writeln!(self.out, "{}", self.paint(Tone::Muted, &format!("hint: {hint}")))?;
        }
        Ok(())
    }

    fn read_action(&mut self) -> Result<Action> {
        loop {
            write!(
                self.out,
                "{} commit  {} edit  {} regenerate  {} quit  (default c): ",
                self.paint(Tone::Added, "[c]"),
                self.paint(Tone::Warning, "[e]"),
                self.paint(Tone::Accent, "[r]"),
                self.paint(Tone::Removed, "[q]"),
            )?;
            self.out.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(Action::Quit);
            }
            let choice = line.trim();
            if choice.is_empty() {
                return Ok(Action::Commit);
            }
            let mut chars = choice.chars();
            if let (Some(key), None) = (chars.next(), chars.next())
                && let Some(action) = Action::from_key(key)
            {
                return Ok(action);
            }
            writeln!(self.out, "Unknown choice '{choice}'.")?;
        }
    }

    fn edit(&mut self, message: &CommitMessage) -> Result<Option<CommitMessage>> {
        editor::edit_message(message).map_err(|e| SmartCommitError::Editor(format!("{e:#}")))
    }
}
