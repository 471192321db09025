//! The confirm / edit / regenerate / quit loop.
//!
//! The controller only talks to its collaborators through [`Generator`],
//! [`Committer`] and [`Screen`], so the same state machine drives the
//! full-screen preview, the plain console and the tests.

use crate::error::{Result, SmartCommitError};
use crate::message::{self, CommitMessage};
use tracing::debug;

pub trait Generator {
    /// Sends `prompt` to the model and returns its raw text.
    fn generate(&self, prompt: &str) -> Result<String>;
}

pub trait Committer {
    fn commit(&self, message: &CommitMessage) -> Result<()>;
}

pub trait Screen {
    /// Progress shown while the loop is blocked on the network or git.
    fn status(&mut self, text: &str) -> Result<()>;
    /// A hint that stays visible until the next keypress.
    fn notify(&mut self, text: &str) -> Result<()>;
    /// Shows the current proposal, or the empty state when there is none.
    fn present(&mut self, message: Option<&CommitMessage>) -> Result<()>;
    fn report(&mut self, error: &SmartCommitError) -> Result<()>;
    fn read_action(&mut self) -> Result<Action>;
    /// `Ok(None)` means the user left the message empty.
    fn edit(&mut self, message: &CommitMessage) -> Result<Option<CommitMessage>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Commit,
    Edit,
    Regenerate,
    Quit,
}

impl Action {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'c' => Some(Action::Commit),
            'e' => Some(Action::Edit),
            'r' => Some(Action::Regenerate),
            'q' => Some(Action::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Presenting,
    Editing,
    Regenerating,
    Committing,
    Quitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed(CommitMessage),
    Quit,
}

/// How much of the loop the user asked to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Interactive,
    /// Show the proposal, then commit without asking.
    AutoCommit,
    /// Commit straight away; every failure is fatal.
    NoPreview,
}

pub struct Controller<'a, G, C, S> {
    generator: &'a G,
    committer: &'a C,
    screen: &'a mut S,
    prompt: &'a str,
    mode: Mode,
    message: Option<CommitMessage>,
}

impl<'a, G, C, S> Controller<'a, G, C, S>
where
    G: Generator,
    C: Committer,
    S: Screen,
{
    pub fn new(
        generator: &'a G,
        committer: &'a C,
        screen: &'a mut S,
        prompt: &'a str,
        mode: Mode,
    ) -> Self {
        Self {
            generator,
            committer,
            screen,
            prompt,
            mode,
            message: None,
        }
    }

    pub fn run(mut self) -> Result<Outcome> {
        let mut state = match self.regenerate() {
            Ok(()) => self.initial_state()?,
            Err(e) if self.mode == Mode::NoPreview || e.is_fatal() => return Err(e),
            Err(e) => {
                self.screen.report(&e)?;
                State::Presenting
            }
        };

        loop {
            debug!(?state, "controller state");
            state = match state {
                State::Presenting => self.present()?,
                State::Editing => {
                    self.edit()?;
                    State::Presenting
                }
                State::Regenerating => match self.regenerate() {
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        self.screen.report(&e)?;
                        State::Presenting
                    }
                    Ok(()) => State::Presenting,
                },
                State::Committing => match self.commit() {
                    Ok(message) => return Ok(Outcome::Committed(message)),
                    Err(e) if self.mode == Mode::NoPreview || e.is_fatal() => return Err(e),
                    Err(e) => {
                        self.screen.report(&e)?;
                        State::Presenting
                    }
                },
                State::Quitting => return Ok(Outcome::Quit),
            };
        }
    }

    fn initial_state(&mut self) -> Result<State> {
        match self.mode {
            Mode::Interactive => Ok(State::Presenting),
            Mode::AutoCommit => {
                self.screen.present(self.message.as_ref())?;
                Ok(State::Committing)
            }
            Mode::NoPreview => Ok(State::Committing),
        }
    }

    fn present(&mut self) -> Result<State> {
        self.screen.present(self.message.as_ref())?;
        let action = self.screen.read_action()?;
        let next = match action {
            Action::Commit | Action::Edit if self.message.is_none() => {
                self.screen
                    .notify("No message yet. Press r to regenerate or q to quit.")?;
                State::Presenting
            }
            Action::Commit => State::Committing,
            Action::Edit => State::Editing,
            Action::Regenerate => State::Regenerating,
            Action::Quit => State::Quitting,
        };
        Ok(next)
    }

    /// Generates and parses a fresh proposal. On failure the previous
    /// message is left in place.
    fn regenerate(&mut self) -> Result<()> {
        self.screen.status("Generating commit message...")?;
        let raw = self.generator.generate(self.prompt)?;
        let parsed = message::parse(&raw)?;
        debug!(title = %parsed.title, "new proposal");
        self.message = Some(parsed);
        Ok(())
    }

    fn edit(&mut self) -> Result<()> {
        let Some(current) = self.message.as_ref() else {
            return Ok(());
        };
        match self.screen.edit(current) {
            Ok(Some(edited)) => self.message = Some(edited),
            Ok(None) => self.screen.report(&SmartCommitError::Editor(
                "empty message, keeping the previous one".to_string(),
            ))?,
            Err(e) => self.screen.report(&e)?,
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<CommitMessage> {
        let Some(message) = self.message.as_ref() else {
            return Err(SmartCommitError::MalformedResponse(
                "no commit message to commit".to_string(),
            ));
        };
        self.screen.status("Creating commit...")?;
        self.committer.commit(message)?;
        Ok(message.clone())
    }
}
