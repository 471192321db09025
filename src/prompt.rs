use crate::change::{ChangeSummary, FileChange, FileKind};
use crate::message::CONVENTIONAL_TYPES;
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str = "You are an expert at analyzing code changes and writing clear, professional git commit messages. You follow the conventional commit format strictly. Your messages are concise, specific, and help developers understand what changed and why. Always answer with a title line (50-72 characters), then a blank line, then an optional short body.";

const TYPE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("feat", "a new feature"),
    ("fix", "a bug fix"),
    ("docs", "documentation changes"),
    ("style", "formatting or style changes with no logic change"),
    ("refactor", "code restructuring without behavior change"),
    ("test", "adding or updating tests"),
    ("chore", "maintenance, dependencies, configuration"),
    ("perf", "performance improvements"),
];

/// Renders the staged changes into the user prompt.
///
/// Output depends only on `summary`: files are grouped by kind in a fixed
/// order and keep their collector order inside a group.
pub fn build_user_prompt(summary: &ChangeSummary) -> String {
    let mut out = String::new();

    out.push_str(
        "Analyze the following staged git changes and write a commit message in conventional commit format.\n",
    );

    out.push_str("\n=== CHANGE SUMMARY ===\n");
    out.push_str(&format!("Branch: {}\n", summary.branch));
    out.push_str(&format!("Files changed: {}\n", summary.files.len()));
    out.push_str(&format!("Lines added: {}\n", summary.total_additions()));
    out.push_str(&format!("Lines deleted: {}\n", summary.total_deletions()));
    out.push_str(&format!("Net change: {:+}\n", summary.net_change()));

    out.push_str("\n=== CHANGED FILES ===\n");
    for (kind, files) in group_by_kind(&summary.files) {
        out.push_str(&format!(
            "\n{} ({} file(s)):\n",
            kind.label().to_uppercase(),
            files.len()
        ));
        for file in files {
            out.push_str(&format!("  {}\n", describe_file(file)));
        }
    }

    out.push_str("\n=== CODE CHANGES ===\n");
    for file in &summary.files {
        out.push_str(&format!(
            "\n--- BEGIN DIFF: {} ({}) ---\n",
            file.path,
            file.change_type.as_str()
        ));
        if file.diff_excerpt.is_empty() {
            out.push_str("(no textual changes)\n");
        } else {
            out.push_str(&file.diff_excerpt);
            if !file.diff_excerpt.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(&format!("--- END DIFF: {} ---\n", file.path));
    }

    out.push_str("\n=== INSTRUCTIONS ===\n");
    out.push_str("Write the commit message as:\n");
    out.push_str("1. A title line in the form 'type: short description' (50-72 characters, imperative mood, no trailing period).\n");
    out.push_str("2. Optionally, a blank line followed by a short body explaining what changed and why.\n");
    out.push_str("\nAllowed types (use exactly one of ");
    out.push_str(&CONVENTIONAL_TYPES.join(", "));
    out.push_str("):\n");
    for (kind, description) in TYPE_DESCRIPTIONS {
        out.push_str(&format!("- {kind}: {description}\n"));
    }
    out.push_str(
        "\nReturn only the title and body as plain text. Do not add commentary, explanations, headings, markdown, quotes, or code fences.\n",
    );

    out
}

fn group_by_kind(files: &[FileChange]) -> BTreeMap<FileKind, Vec<&FileChange>> {
    let mut groups: BTreeMap<FileKind, Vec<&FileChange>> = BTreeMap::new();
    for file in files {
        groups.entry(file.kind).or_default().push(file);
    }
    groups
}

fn describe_file(file: &FileChange) -> String {
    let path = match &file.old_path {
        Some(old) => format!("{} -> {}", old, file.path),
        None => file.path.clone(),
    };
    format!(
        "{} {} (+{}/-{})",
        file.change_type.tag(),
        path,
        file.additions,
        file.deletions
    )
}
