use crate::change::{
    ChangeSummary, ChangeType, DIFF_EXCERPT_BUDGET, FileChange, FileKind, truncate_excerpt,
};
use crate::controller::Committer;
use crate::error::{Result, SmartCommitError};
use crate::message::CommitMessage;
use git2::{DiffFindOptions, DiffOptions, Repository};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| SmartCommitError::NotARepository)?;
        if repo.is_bare() {
            return Err(SmartCommitError::NotARepository);
        }
        Ok(Self { repo })
    }

    pub fn branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(|s| s.to_string()))
            .unwrap_or_else(|| "HEAD".to_string())
    }

    pub fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(SmartCommitError::NotARepository)
    }

    pub fn staged_summary(&self) -> Result<ChangeSummary> {
        let branch = self.branch();
        let files = self.staged_files()?;

        if files.is_empty() {
            return Err(SmartCommitError::NoStagedChanges);
        }

        debug!(
            branch = %branch,
            files = files.len(),
            "collected staged changes"
        );
        Ok(ChangeSummary { branch, files })
    }

    fn staged_files(&self) -> Result<Vec<FileChange>> {
        let head_tree = self
            .repo
            .revparse_single("HEAD")
            .ok()
            .and_then(|o| o.peel_to_tree().ok());

        let mut opts = DiffOptions::new();
        let mut diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let files: RefCell<Vec<FileChange>> = RefCell::new(Vec::new());
        let file_index: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

        diff.foreach(
            &mut |delta, _| {
                let Some(path) = delta_path(&delta) else {
                    return true;
                };
                let change_type = match delta.status() {
                    git2::Delta::Added => ChangeType::Added,
                    git2::Delta::Deleted => ChangeType::Deleted,
                    git2::Delta::Renamed => ChangeType::Renamed,
                    _ => ChangeType::Modified,
                };
                let old_path = match change_type {
                    ChangeType::Renamed => delta
                        .old_file()
                        .path()
                        .map(|p| p.to_string_lossy().to_string()),
                    _ => None,
                };
                let binary = delta.flags().is_binary();

                let mut files_mut = files.borrow_mut();
                file_index.borrow_mut().insert(path.clone(), files_mut.len());
                files_mut.push(FileChange {
                    kind: FileKind::detect(&path),
                    path,
                    old_path,
                    additions: 0,
                    deletions: 0,
                    change_type,
                    diff_excerpt: if binary {
                        "(binary file)\n".to_string()
                    } else {
                        String::new()
                    },
                });
                true
            },
            Some(&mut |delta, _| {
                if let Some(path) = delta_path(&delta)
                    && let Some(&index) = file_index.borrow().get(&path)
                {
                    files.borrow_mut()[index].diff_excerpt = "(binary file)\n".to_string();
                }
                true
            }),
            Some(&mut |delta, hunk| {
                let Some(path) = delta_path(&delta) else {
                    return true;
                };
                if let Some(&index) = file_index.borrow().get(&path) {
                    let header = String::from_utf8_lossy(hunk.header());
                    let mut files_mut = files.borrow_mut();
                    files_mut[index].diff_excerpt.push_str(&header);
                    if !header.ends_with('\n') {
                        files_mut[index].diff_excerpt.push('\n');
                    }
                }
                true
            }),
            Some(&mut |delta, _hunk, line| {
                let Some(path) = delta_path(&delta) else {
                    return true;
                };
                let Some(index) = file_index.borrow().get(&path).copied() else {
                    return true;
                };

                let mut files_mut = files.borrow_mut();
                let file = &mut files_mut[index];
                let origin = line.origin();
                match origin {
                    '+' => file.additions += 1,
                    '-' => file.deletions += 1,
                    _ => {}
                }

                if matches!(origin, '+' | '-' | ' ') {
                    let text = String::from_utf8_lossy(line.content());
                    file.diff_excerpt.push(origin);
                    file.diff_excerpt.push_str(&text);
                    if !text.ends_with('\n') {
                        file.diff_excerpt.push('\n');
                    }
                }
                true
            }),
        )?;

        let mut files = files.into_inner();
        for file in &mut files {
            file.diff_excerpt = truncate_excerpt(&file.diff_excerpt, DIFF_EXCERPT_BUDGET);
        }
        Ok(files)
    }

    /// Creates the commit through the git CLI so hooks and signing apply.
    pub fn commit_with_git_cli(&self, message: &CommitMessage) -> Result<()> {
        let workdir = self.workdir()?;
        let mut child = Command::new("git")
            .arg("-C")
            .arg(&workdir)
            .arg("commit")
            .arg("--quiet")
            .arg("--cleanup=whitespace")
            .arg("-F")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SmartCommitError::CommitFailed(format!("Failed to run git commit: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.to_wire().as_bytes())
                .map_err(|e| SmartCommitError::CommitFailed(format!("Failed to send message: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SmartCommitError::CommitFailed(format!("Failed to run git commit: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let msg = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                "Git commit failed".to_string()
            };
            return Err(SmartCommitError::CommitFailed(msg));
        }

        debug!(title = %message.title, "commit created");
        Ok(())
    }

    pub fn head_short_id(&self) -> Option<String> {
        let commit = self.repo.head().ok()?.peel_to_commit().ok()?;
        let short = commit.as_object().short_id().ok()?;
        short.as_str().map(str::to_string)
    }
}

impl Committer for GitRepo {
    fn commit(&self, message: &CommitMessage) -> Result<()> {
        self.commit_with_git_cli(message)
    }
}

fn delta_path(delta: &git2::DiffDelta<'_>) -> Option<String> {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.to_string_lossy().to_string())
}
