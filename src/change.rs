//! Staged-change data model shared by the collector, the prompt and the screens.

pub const DIFF_EXCERPT_BUDGET: usize = 2_000;
pub const TRUNCATION_MARKER: &str = "... (diff truncated)";

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSummary {
    pub branch: String,
    pub files: Vec<FileChange>,
}

impl ChangeSummary {
    pub fn total_additions(&self) -> usize {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }

    pub fn net_change(&self) -> i64 {
        self.total_additions() as i64 - self.total_deletions() as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
    pub path: String,
    pub old_path: Option<String>,
    pub additions: usize,
    pub deletions: usize,
    pub change_type: ChangeType,
    pub kind: FileKind,
    pub diff_excerpt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
            ChangeType::Renamed => "renamed",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ChangeType::Added => "[NEW]",
            ChangeType::Modified => "[MOD]",
            ChangeType::Deleted => "[DEL]",
            ChangeType::Renamed => "[REN]",
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            ChangeType::Added => "A",
            ChangeType::Modified => "M",
            ChangeType::Deleted => "D",
            ChangeType::Renamed => "R",
        }
    }
}

/// Coarse file category, used to group files for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileKind {
    Source,
    Test,
    Migration,
    Config,
    Dependencies,
    Docker,
    Documentation,
    Other,
}

const DEPENDENCY_MANIFESTS: &[&str] = &[
    "cargo.toml",
    "cargo.lock",
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "setup.py",
    "pyproject.toml",
    "poetry.lock",
    "pipfile",
    "pipfile.lock",
    "go.mod",
    "go.sum",
    "gemfile",
    "gemfile.lock",
    "pom.xml",
    "build.gradle",
];

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "c", "h", "cc", "cpp", "hpp", "cs",
    "rb", "php", "swift", "scala", "sh", "sql", "html", "css", "scss", "vue", "svelte",
];

impl FileKind {
    pub fn detect(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        let file_name = lower.rsplit('/').next().unwrap_or(&lower);
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");
        let segments: Vec<&str> = lower.split('/').collect();
        let dirs = &segments[..segments.len().saturating_sub(1)];

        if DEPENDENCY_MANIFESTS.contains(&file_name) || file_name.starts_with("requirements") {
            return FileKind::Dependencies;
        }
        if file_name.starts_with("dockerfile")
            || file_name.starts_with("docker-compose")
            || file_name == ".dockerignore"
        {
            return FileKind::Docker;
        }
        if dirs
            .iter()
            .any(|d| matches!(*d, "migrations" | "migration" | "migrate"))
        {
            return FileKind::Migration;
        }
        if dirs
            .iter()
            .any(|d| matches!(*d, "test" | "tests" | "__tests__" | "spec"))
            || file_name.starts_with("test_")
            || file_name.contains("_test.")
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
        {
            return FileKind::Test;
        }
        if matches!(extension, "md" | "rst" | "txt" | "adoc")
            || dirs.first().is_some_and(|d| *d == "docs")
        {
            return FileKind::Documentation;
        }
        if matches!(
            extension,
            "json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "conf" | "env"
        ) || file_name.starts_with(".env")
        {
            return FileKind::Config;
        }
        if SOURCE_EXTENSIONS.contains(&extension) {
            return FileKind::Source;
        }
        FileKind::Other
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Source => "source",
            FileKind::Test => "test",
            FileKind::Migration => "migration",
            FileKind::Config => "config",
            FileKind::Dependencies => "dependencies",
            FileKind::Docker => "docker",
            FileKind::Documentation => "documentation",
            FileKind::Other => "other",
        }
    }
}

/// Caps `text` at `budget` characters without splitting a line.
///
/// When anything is dropped the result ends with [`TRUNCATION_MARKER`] on its
/// own line, so the last character is either the real end of `text` or the
/// end of the marker.
pub fn truncate_excerpt(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let mut kept = String::new();
    let mut used = 0;
    for line in text.split_inclusive('\n') {
        let len = line.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        kept.push_str(line);
    }

    if !kept.is_empty() && !kept.ends_with('\n') {
        kept.push('\n');
    }
    kept.push_str(TRUNCATION_MARKER);
    kept
}
