//! Version control backed by the `git` command line.

use crate::error::{GitError, GitResult};
use pgit_core::{CoreResult, VersionControl};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Regex for a full SHA-1 or SHA-256 object id
static COMMIT_RE: OnceLock<Regex> = OnceLock::new();

fn commit_regex() -> &'static Regex {
    COMMIT_RE.get_or_init(|| Regex::new(r"^[0-9a-f]{40}([0-9a-f]{24})?$").expect("valid regex"))
}

/// A git working tree, queried by running `git` in its root.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Find the repository containing `path`.
    pub fn discover(path: &Path) -> GitResult<Self> {
        let output = run(path, &["rev-parse", "--show-toplevel"])?;
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(GitError::UnexpectedOutput {
                command: "rev-parse --show-toplevel".to_string(),
                message: "empty repository root".to_string(),
            });
        }
        log::debug!("Using git repository at {root}");
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> GitResult<Vec<u8>> {
        Ok(run(&self.root, args)?.stdout)
    }

    /// Whether the repository has at least one commit.
    fn has_head(&self) -> GitResult<bool> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", "HEAD"])
            .current_dir(&self.root)
            .output()
            .map_err(GitError::Spawn)?;
        Ok(output.status.success())
    }

    /// Whether `path` has uncommitted changes, including being untracked.
    pub fn status_dirty(&self, path: &str) -> GitResult<bool> {
        let stdout = self.git(&["status", "--porcelain", "--", path])?;
        Ok(!stdout.iter().all(u8::is_ascii_whitespace))
    }

    /// Commits touching `path`, newest first, following renames.
    pub fn log_commits(&self, path: &str) -> GitResult<Vec<String>> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }

        let stdout = self.git(&["log", "--format=%H", "--follow", "--", path])?;
        String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                if commit_regex().is_match(line) {
                    Ok(line.to_string())
                } else {
                    Err(GitError::UnexpectedOutput {
                        command: format!("log --format=%H --follow -- {path}"),
                        message: format!("'{line}' is not a commit id"),
                    })
                }
            })
            .collect()
    }

    /// Raw content of `path` as of `commit`.
    ///
    /// When `path` did not exist under that name at `commit`, the name it had
    /// there is looked up through the rename-following history.
    pub fn show(&self, commit: &str, path: &str) -> GitResult<Vec<u8>> {
        if !commit_regex().is_match(commit) {
            return Err(GitError::InvalidCommit(commit.to_string()));
        }
        match self.git(&["show", &format!("{commit}:{path}")]) {
            Ok(content) => Ok(content),
            Err(err @ GitError::CommandFailed { .. }) => match self.path_at(commit, path)? {
                Some(old_path) if old_path != path => {
                    log::debug!("{path} was {old_path} at {commit}");
                    self.git(&["show", &format!("{commit}:{old_path}")])
                }
                _ => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Name `path` had at `commit`, following renames.
    fn path_at(&self, commit: &str, path: &str) -> GitResult<Option<String>> {
        if !self.has_head()? {
            return Ok(None);
        }

        let stdout = self.git(&["log", "--format=%H", "--name-only", "--follow", "--", path])?;
        let mut current: Option<&str> = None;
        for line in String::from_utf8_lossy(&stdout).lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if commit_regex().is_match(line) {
                current = Some(line);
            } else if current == Some(commit) {
                return Ok(Some(line.to_string()));
            }
        }
        Ok(None)
    }
}

fn run(dir: &Path, args: &[&str]) -> GitResult<Output> {
    log::debug!("git {} (in {})", args.join(" "), dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(GitError::Spawn)?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: args.join(" "),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

impl VersionControl for GitCli {
    fn repository_root(&self) -> CoreResult<PathBuf> {
        Ok(self.root.clone())
    }

    fn is_dirty(&self, path: &str) -> CoreResult<bool> {
        Ok(self.status_dirty(path)?)
    }

    fn history(&self, path: &str) -> CoreResult<Vec<String>> {
        Ok(self.log_commits(path)?)
    }

    fn content_at(&self, commit: &str, path: &str) -> CoreResult<Vec<u8>> {
        Ok(self.show(commit, path)?)
    }
}

#[cfg(test)]
#[path = "git_test.rs"]
mod tests;
