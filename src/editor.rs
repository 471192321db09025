use crate::message::{self, CommitMessage};
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::Write;
use std::process::Command;
use tracing::debug;

const FALLBACK_EDITOR: &str = "vi";

/// Editor command from `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn preferred_editor(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|name| lookup(name))
        .map(|cmd| {
            cmd.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .find(|parts| !parts.is_empty())
        .unwrap_or_else(|| vec![FALLBACK_EDITOR.to_string()])
}

/// Opens `message` in the user's editor and parses what was saved.
///
/// Returns `Ok(None)` when the saved file is blank.
pub fn edit_message(message: &CommitMessage) -> Result<Option<CommitMessage>> {
    let editor = preferred_editor(|name| std::env::var(name).ok());
    edit_with(&editor, message)
}

pub fn edit_with(editor: &[String], message: &CommitMessage) -> Result<Option<CommitMessage>> {
    let (program, args) = editor.split_first().context("no editor configured")?;

    let mut file = tempfile::Builder::new()
        .prefix("smart-commit-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temporary message file")?;
    file.write_all(message.to_wire().as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .context("failed to write temporary message file")?;
    file.flush()?;

    debug!(editor = %program, path = %file.path().display(), "opening editor");
    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("editor '{program}' not found; set VISUAL or EDITOR"))?;
    if !status.success() {
        bail!("editor '{program}' exited with {status}");
    }

    let edited = fs::read_to_string(file.path()).context("failed to read edited message")?;
    if edited.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(message::parse(&edited)?))
}

#[cfg(test)]
mod tests {
    use super::{edit_with, preferred_editor};
    use crate::message::CommitMessage;

    fn sample() -> CommitMessage {
        CommitMessage {
            title: "feat: add thing".into(),
            body: vec!["Because reasons.".into()],
        }
    }

    #[test]
    fn visual_wins_over_editor_and_fallback_is_vi() {
        let both = |name: &str| match name {
            "VISUAL" => Some("code --wait".to_string()),
            "EDITOR" => Some("nano".to_string()),
            _ => None,
        };
        assert_eq!(preferred_editor(both), vec!["code", "--wait"]);

        let only_editor = |name: &str| (name == "EDITOR").then(|| "nano".to_string());
        assert_eq!(preferred_editor(only_editor), vec!["nano"]);

        let blank = |_: &str| Some("   ".to_string());
        assert_eq!(preferred_editor(blank), vec!["vi"]);
    }

    #[cfg(unix)]
    #[test]
    fn unchanged_file_round_trips() {
        // `true` leaves the file as written
        let edited = edit_with(&["true".to_string()], &sample()).expect("edit");
        assert_eq!(edited, Some(sample()));
    }

    #[cfg(unix)]
    #[test]
    fn editor_can_rewrite_the_message() {
        let script = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf 'fix: corrected title\\n\\nNew body.\\n' > \"$0\"".to_string(),
        ];
        let edited = edit_with(&script, &sample()).expect("edit").expect("message");
        assert_eq!(edited.title, "fix: corrected title");
        assert_eq!(edited.body, vec!["New body."]);
    }

    #[cfg(unix)]
    #[test]
    fn emptied_file_yields_none_and_failing_editor_errors() {
        let truncate = vec!["sh".to_string(), "-c".to_string(), ": > \"$0\"".to_string()];
        assert_eq!(edit_with(&truncate, &sample()).expect("edit"), None);

        let err = edit_with(&["false".to_string()], &sample()).unwrap_err();
        assert!(err.to_string().contains("exited with"));

        let err = edit_with(&["smart-commit-no-such-editor".to_string()], &sample()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
