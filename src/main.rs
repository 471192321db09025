mod args;
mod change;
mod client;
mod config;
mod controller;
mod editor;
mod error;
mod git;
mod message;
mod plain;
mod prompt;
mod provider;
mod tui;

use args::Args;
use change::ChangeSummary;
use clap::Parser;
use client::GenerationClient;
use config::Config;
use controller::{Action, Committer, Controller, Generator, Mode, Outcome, Screen};
use error::{Result, SmartCommitError};
use git::GitRepo;
use message::CommitMessage;
use plain::Plain;
use std::io::{self, IsTerminal, StdinLock, Stdout};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tui::Tui;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = run(&args);
    if let Err(err) = &result {
        eprintln!("smart-commit: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
    }
    ExitCode::from(exit_status(&result))
}

fn exit_status<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "smart_commit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// The full-screen preview owns the terminal, so it is only used when
/// nothing else writes to it: interactive mode, a tty on stdout, and no
/// log output requested on stderr.
fn wants_full_screen(mode: Mode, stdout_is_tty: bool, verbose: bool, rust_log: bool) -> bool {
    mode == Mode::Interactive && stdout_is_tty && !verbose && !rust_log
}

fn mode_for(config: &Config) -> Mode {
    if config.no_preview {
        Mode::NoPreview
    } else if config.auto_commit {
        Mode::AutoCommit
    } else {
        Mode::Interactive
    }
}

fn run(args: &Args) -> Result<Outcome> {
    let cwd = std::env::current_dir()?;
    let repo = GitRepo::discover(&cwd)?;
    let config = config::load(args, &cwd);
    debug!(provider = %config.provider, model = %config.model, "resolved configuration");

    let mode = mode_for(&config);
    let full_screen = wants_full_screen(
        mode,
        io::stdout().is_terminal(),
        args.verbose,
        std::env::var_os("RUST_LOG").is_some(),
    );
    let client = GenerationClient::new(
        config.provider,
        config.model.as_str(),
        config.api_key.clone().unwrap_or_default(),
    );

    let session = commit_staged(repo.staged_summary(), &config, &client, &repo, |summary| {
        Ui::open(summary, full_screen)
    })?;

    if full_screen {
        Plain::stdio().print_summary(&session.summary)?;
    }
    let commit_id = match session.outcome {
        Outcome::Committed(_) => repo.head_short_id(),
        Outcome::Quit => None,
    };
    Plain::stdio().print_outcome(&session.outcome, commit_id.as_deref())?;
    Ok(session.outcome)
}

struct Session {
    summary: ChangeSummary,
    outcome: Outcome,
}

/// Everything after repository discovery. Nothing is generated until the
/// staged changes and the credential are both known to be usable.
fn commit_staged<G, C, S>(
    staged: Result<ChangeSummary>,
    config: &Config,
    generator: &G,
    committer: &C,
    open_screen: impl FnOnce(&ChangeSummary) -> Result<S>,
) -> Result<Session>
where
    G: Generator,
    C: Committer,
    S: Screen,
{
    let summary = staged?;
    info!(
        branch = %summary.branch,
        files = summary.files.len(),
        additions = summary.total_additions(),
        deletions = summary.total_deletions(),
        "collected staged changes"
    );
    if config.api_key.is_none() {
        return Err(SmartCommitError::MissingCredential {
            provider: config.provider,
        });
    }

    let prompt = prompt::build_user_prompt(&summary);
    let mut screen = open_screen(&summary)?;
    let outcome = Controller::new(generator, committer, &mut screen, &prompt, mode_for(config)).run();
    drop(screen);
    Ok(Session {
        summary,
        outcome: outcome?,
    })
}

/// The terminal surface picked at startup.
enum Ui {
    Full(Tui),
    Plain(Plain<StdinLock<'static>, Stdout>),
}

impl Ui {
    fn open(summary: &ChangeSummary, full_screen: bool) -> Result<Self> {
        if full_screen {
            return Ok(Ui::Full(Tui::new(summary)?));
        }
        let mut plain = Plain::stdio();
        plain.print_summary(summary)?;
        Ok(Ui::Plain(plain))
    }
}

impl Screen for Ui {
    fn status(&mut self, text: &str) -> Result<()> {
        match self {
            Ui::Full(tui) => tui.status(text),
            Ui::Plain(plain) => plain.status(text),
        }
    }

    fn notify(&mut self, text: &str) -> Result<()> {
        match self {
            Ui::Full(tui) => tui.notify(text),
            Ui::Plain(plain) => plain.notify(text),
        }
    }

    fn present(&mut self, message: Option<&CommitMessage>) -> Result<()> {
        match self {
            Ui::Full(tui) => tui.present(message),
            Ui::Plain(plain) => plain.present(message),
        }
    }

    fn report(&mut self, error: &SmartCommitError) -> Result<()> {
        match self {
            Ui::Full(tui) => tui.report(error),
            Ui::Plain(plain) => plain.report(error),
        }
    }

    fn read_action(&mut self) -> Result<Action> {
        match self {
            Ui::Full(tui) => tui.read_action(),
            Ui::Plain(plain) => plain.read_action(),
        }
    }

    fn edit(&mut self, message: &CommitMessage) -> Result<Option<CommitMessage>> {
        match self {
            Ui::Full(tui) => tui.edit(message),
            Ui::Plain(plain) => plain.edit(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mode, commit_staged, exit_status, wants_full_screen};
    use crate::change::{ChangeSummary, ChangeType, FileChange, FileKind};
    use crate::config::Config;
    use crate::controller::{Committer, Generator, Outcome};
    use crate::error::{Result, SmartCommitError};
    use crate::message::CommitMessage;
    use crate::plain::Plain;
    use crate::provider::Provider;
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;

    type TestScreen = Plain<Cursor<Vec<u8>>, Vec<u8>>;

    struct CountingGenerator {
        reply: &'static str,
        calls: Cell<usize>,
    }

    impl Generator for CountingGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.reply.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingCommitter {
        committed: RefCell<Vec<String>>,
    }

    impl Committer for RecordingCommitter {
        fn commit(&self, message: &CommitMessage) -> Result<()> {
            self.committed.borrow_mut().push(message.to_wire());
            Ok(())
        }
    }

    fn config(api_key: Option<&str>) -> Config {
        Config {
            provider: Provider::Groq,
            model: Provider::Groq.default_model().to_string(),
            api_key: api_key.map(str::to_string),
            auto_commit: false,
            no_preview: false,
        }
    }

    fn staged() -> ChangeSummary {
        ChangeSummary {
            branch: "main".into(),
            files: vec![FileChange {
                path: "app.py".into(),
                old_path: None,
                additions: 12,
                deletions: 3,
                change_type: ChangeType::Modified,
                kind: FileKind::Source,
                diff_excerpt: "@@ -1 +1 @@\n-a\n+b\n".into(),
            }],
        }
    }

    fn screen(input: &str) -> TestScreen {
        Plain::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    #[test]
    fn nothing_staged_fails_before_generation() {
        let generator = CountingGenerator {
            reply: "feat: never",
            calls: Cell::new(0),
        };
        let committer = RecordingCommitter::default();
        let opened = Cell::new(false);

        let result = commit_staged(
            Err(SmartCommitError::NoStagedChanges),
            &config(Some("gsk-test")),
            &generator,
            &committer,
            |_| {
                opened.set(true);
                Ok(screen("c\n"))
            },
        );

        assert!(matches!(result, Err(SmartCommitError::NoStagedChanges)));
        assert_eq!(generator.calls.get(), 0);
        assert!(!opened.get());
        assert!(committer.committed.borrow().is_empty());
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn missing_key_fails_before_generation() {
        let generator = CountingGenerator {
            reply: "feat: never",
            calls: Cell::new(0),
        };
        let committer = RecordingCommitter::default();

        let result = commit_staged(Ok(staged()), &config(None), &generator, &committer, |_| {
            Ok(screen("c\n"))
        });

        assert!(matches!(
            result,
            Err(SmartCommitError::MissingCredential {
                provider: Provider::Groq
            })
        ));
        assert_eq!(generator.calls.get(), 0);
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn staged_changes_flow_through_to_a_commit() {
        let generator = CountingGenerator {
            reply: "feat: add login endpoint\n\nAdds POST /login.",
            calls: Cell::new(0),
        };
        let committer = RecordingCommitter::default();

        let result = commit_staged(
            Ok(staged()),
            &config(Some("gsk-test")),
            &generator,
            &committer,
            |_| Ok(screen("c\n")),
        );

        assert_eq!(exit_status(&result), 0);
        let session = result.expect("session");
        assert_eq!(session.summary.files.len(), 1);
        assert!(matches!(session.outcome, Outcome::Committed(_)));
        assert_eq!(generator.calls.get(), 1);
        assert_eq!(
            committer.committed.borrow().as_slice(),
            ["feat: add login endpoint\n\nAdds POST /login."]
        );
    }

    #[test]
    fn full_screen_only_without_log_output() {
        assert!(wants_full_screen(Mode::Interactive, true, false, false));
        assert!(!wants_full_screen(Mode::Interactive, true, true, false));
        assert!(!wants_full_screen(Mode::Interactive, true, false, true));
        assert!(!wants_full_screen(Mode::Interactive, false, false, false));
        assert!(!wants_full_screen(Mode::AutoCommit, true, false, false));
    }
}
