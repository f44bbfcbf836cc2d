//! Schema files: the two on-disk dialects and their shared plumbing.
//!
//! - [`changeset`]: append-only blocks versioned by a counter
//! - [`definition`]: current desired state versioned by commit id

pub mod changeset;
pub mod definition;

pub use changeset::{Changeset, ChangesetFile};
pub use definition::{Definition, DefinitionFile, UNCOMMITTED_VERSION};

use crate::error::{CoreError, CoreResult};
use crate::traits::VersionControl;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Shared rollback marker for both dialects.
pub const ROLLBACK_MARKER: &str = "-- rollback";

/// SQL to run and the version the file reaches once it has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlChange {
    pub sql: String,
    pub version: String,
}

impl SqlChange {
    /// A no-op change that leaves the file at `version`.
    pub fn unchanged(version: impl Into<String>) -> Self {
        Self {
            sql: String::new(),
            version: version.into(),
        }
    }

    /// Whether applying this change would move the file off `current`.
    pub fn changes_version(&self, current: &str) -> bool {
        self.version != current
    }
}

/// File type declared by the leading `-- pgit type=<kind>` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Changeset,
    Definition,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Changeset => write!(f, "changeset"),
            FileKind::Definition => write!(f, "definition"),
        }
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "changeset" => Ok(FileKind::Changeset),
            "definition" => Ok(FileKind::Definition),
            other => Err(format!("unknown file type '{other}'")),
        }
    }
}

/// Regex for the `-- pgit type=<kind>` first-line annotation
static ANNOTATION_RE: OnceLock<Regex> = OnceLock::new();

fn annotation_regex() -> &'static Regex {
    ANNOTATION_RE.get_or_init(|| Regex::new(r"^-- pgit type=(\S+)").expect("valid regex"))
}

/// Extract the raw type token from a first line, if it carries an annotation.
pub(crate) fn annotation_token(line: &str) -> Option<&str> {
    annotation_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Read the type annotation from the first line of `content`.
pub fn detect_kind(path: &str, content: &str) -> CoreResult<FileKind> {
    if content.trim().is_empty() {
        return Err(CoreError::parse(path, "empty schema file"));
    }

    let first_line = content
        .find(['\r', '\n'])
        .map_or(content, |end| &content[..end]);

    let token = annotation_token(first_line).ok_or_else(|| {
        CoreError::parse(
            path,
            "first line must be a '-- pgit type=<changeset|definition>' annotation",
        )
    })?;

    token
        .parse::<FileKind>()
        .map_err(|message| CoreError::parse(path, message))
}

/// Split file content into lines.
///
/// Splits on `\r\n` first; if that yields a single piece, re-splits on `\n`.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    let lines: Vec<&str> = content.split("\r\n").collect();
    if lines.len() == 1 {
        return content.split('\n').collect();
    }
    lines
}

/// Join a teardown statement and a rebuild statement into one script.
pub(crate) fn join_statements(teardown: &str, rebuild: &str) -> String {
    let teardown = teardown.trim();
    let rebuild = rebuild.trim();
    let mut sql = String::with_capacity(teardown.len() + rebuild.len() + 2);
    sql.push_str(teardown);
    if !teardown.ends_with(';') {
        sql.push(';');
    }
    sql.push('\n');
    sql.push_str(rebuild);
    sql
}

/// A loaded schema file of either dialect.
#[derive(Debug, Clone)]
pub enum SchemaFile {
    Changeset(ChangesetFile),
    Definition(DefinitionFile),
}

impl SchemaFile {
    /// Build a schema file from its full content, dispatching on the annotation.
    pub fn from_content(path: impl Into<String>, content: String) -> CoreResult<Self> {
        let path = path.into();
        match detect_kind(&path, &content)? {
            FileKind::Changeset => Ok(SchemaFile::Changeset(ChangesetFile::parse(
                path, &content,
            )?)),
            FileKind::Definition => Ok(SchemaFile::Definition(DefinitionFile::new(
                path, content,
            ))),
        }
    }

    /// Path relative to the repository root.
    pub fn path(&self) -> &str {
        match self {
            SchemaFile::Changeset(f) => f.path(),
            SchemaFile::Definition(f) => f.path(),
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            SchemaFile::Changeset(_) => FileKind::Changeset,
            SchemaFile::Definition(_) => FileKind::Definition,
        }
    }

    /// SQL that moves the file from `current_version` to its latest version.
    pub fn apply_sql(
        &self,
        current_version: &str,
        vcs: &dyn VersionControl,
    ) -> CoreResult<SqlChange> {
        match self {
            SchemaFile::Changeset(f) => f.apply_sql(current_version),
            SchemaFile::Definition(f) => f.apply_sql(current_version, vcs),
        }
    }

    /// SQL that moves the file one step back from `current_version`.
    pub fn rollback_sql(
        &self,
        current_version: &str,
        vcs: &dyn VersionControl,
    ) -> CoreResult<SqlChange> {
        match self {
            SchemaFile::Changeset(f) => f.rollback_sql(current_version),
            SchemaFile::Definition(f) => f.rollback_sql(current_version, vcs),
        }
    }
}

#[cfg(test)]
#[path = "schema_file_test.rs"]
mod tests;
