use crate::error::{Result, SmartCommitError};

pub const CONVENTIONAL_TYPES: &[&str] = &[
    "feat", "fix", "docs", "style", "refactor", "test", "chore", "perf",
];

pub const TITLE_SOFT_LIMIT: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub title: String,
    pub body: Vec<String>,
}

impl CommitMessage {
    /// Renders the message the way it is handed to `git commit`:
    /// the title, then one blank line and the body when there is one.
    pub fn to_wire(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, self.body.join("\n"))
        }
    }

    pub fn is_conventional(&self) -> bool {
        is_conventional_title(&self.title)
    }

    pub fn title_too_long(&self) -> bool {
        self.title.chars().count() > TITLE_SOFT_LIMIT
    }

    /// Soft problems shown next to the proposal. None of them blocks a commit.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.is_conventional() {
            warnings.push("title does not follow 'type: description'".to_string());
        }
        if self.title_too_long() {
            warnings.push(format!("title is longer than {TITLE_SOFT_LIMIT} characters"));
        }
        warnings
    }
}

/// `type: description`, with an optional `(scope)` and `!` after the type.
pub fn is_conventional_title(title: &str) -> bool {
    let Some((head, description)) = title.split_once(": ") else {
        return false;
    };
    if description.trim().is_empty() {
        return false;
    }

    let head = head.strip_suffix('!').unwrap_or(head);
    let kind = match head.split_once('(') {
        Some((kind, scope)) => {
            let Some(scope) = scope.strip_suffix(')') else {
                return false;
            };
            if scope.is_empty() || scope.contains(['(', ')']) {
                return false;
            }
            kind
        }
        None => head,
    };
    CONVENTIONAL_TYPES.contains(&kind)
}

/// Splits raw model output into a title and body lines.
///
/// The first non-blank line becomes the title as-is (trimmed, never
/// rewritten). One blank separator after it is skipped; every remaining
/// non-blank line is kept, trimmed, as a body line.
pub fn parse(raw: &str) -> Result<CommitMessage> {
    let mut lines = raw.lines().map(str::trim);

    let title = lines
        .by_ref()
        .find(|l| !l.is_empty())
        .ok_or_else(|| {
            SmartCommitError::MalformedResponse("response contained no text".to_string())
        })?
        .to_string();

    let mut rest = lines.peekable();
    if rest.peek().is_some_and(|l| l.is_empty()) {
        rest.next();
    }

    let body = rest
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    Ok(CommitMessage { title, body })
}
