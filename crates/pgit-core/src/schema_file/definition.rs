//! Definition files: the current desired state of one object.
//!
//! ```sql
//! -- pgit type=definition
//! -- definition
//! CREATE VIEW active_users AS SELECT * FROM users WHERE active;
//! -- rollback
//! DROP VIEW active_users;
//! ```
//!
//! The version is the id of the last commit that touched the file, or
//! [`UNCOMMITTED_VERSION`] when the working copy has local edits. Moving
//! between versions tears down the old shape with its rollback SQL and
//! rebuilds the new one.

use super::{join_statements, split_lines, SqlChange, ROLLBACK_MARKER};
use crate::error::{CoreError, CoreResult};
use crate::traits::VersionControl;

/// Marker opening the definition section.
pub const DEFINITION_MARKER: &str = "-- definition";

/// Version recorded for a file applied with uncommitted local edits.
pub const UNCOMMITTED_VERSION: &str = "uncommitted";

/// Parsed definition/rollback pair, both trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub apply_sql: String,
    pub rollback_sql: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Definition,
    Rollback,
}

impl Definition {
    /// Parse definition-file content. Lines before the first marker are ignored.
    pub fn parse(path: &str, content: &str) -> CoreResult<Self> {
        let mut apply_sql = String::new();
        let mut rollback_sql = String::new();
        let mut section = Section::Preamble;
        let (mut seen_definition, mut seen_rollback) = (false, false);

        for (idx, line) in split_lines(content).into_iter().enumerate() {
            if line == DEFINITION_MARKER {
                if seen_definition {
                    return Err(CoreError::parse(
                        path,
                        format!("unexpected '{DEFINITION_MARKER}' marker at line {}", idx + 1),
                    ));
                }
                seen_definition = true;
                section = Section::Definition;
            } else if line == ROLLBACK_MARKER {
                if seen_rollback {
                    return Err(CoreError::parse(
                        path,
                        format!("unexpected '{ROLLBACK_MARKER}' marker at line {}", idx + 1),
                    ));
                }
                seen_rollback = true;
                section = Section::Rollback;
            } else {
                let target = match section {
                    Section::Preamble => continue,
                    Section::Definition => &mut apply_sql,
                    Section::Rollback => &mut rollback_sql,
                };
                target.push_str(line);
                target.push('\n');
            }
        }

        let apply_sql = apply_sql.trim().to_string();
        let rollback_sql = rollback_sql.trim().to_string();

        if apply_sql.is_empty() {
            return Err(CoreError::parse(path, "must specify a definition"));
        }
        if rollback_sql.is_empty() {
            return Err(CoreError::parse(path, "must specify a rollback"));
        }

        Ok(Self {
            apply_sql,
            rollback_sql,
        })
    }
}

/// A definition file as loaded from the working tree.
///
/// Content is parsed lazily so that a malformed file only fails its own
/// apply, not the whole directory load.
#[derive(Debug, Clone)]
pub struct DefinitionFile {
    path: String,
    content: String,
}

impl DefinitionFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parse the working-tree content.
    pub fn definition(&self) -> CoreResult<Definition> {
        Definition::parse(&self.path, &self.content)
    }

    /// Commit id of the file, or [`UNCOMMITTED_VERSION`] with local edits.
    pub fn current_version(&self, vcs: &dyn VersionControl) -> CoreResult<String> {
        if vcs.is_dirty(&self.path)? {
            return Ok(UNCOMMITTED_VERSION.to_string());
        }

        vcs.history(&self.path)?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Vcs(format!("no commits found for {}", self.path)))
    }

    /// SQL that moves the database from `current_version` to the working copy.
    pub fn apply_sql(
        &self,
        current_version: &str,
        vcs: &dyn VersionControl,
    ) -> CoreResult<SqlChange> {
        if current_version == UNCOMMITTED_VERSION {
            return Err(CoreError::version(
                &self.path,
                "cannot apply on top of an uncommitted version, roll back the last migration first",
            ));
        }

        let file_version = self.current_version(vcs)?;
        if file_version == current_version {
            return Ok(SqlChange::unchanged(current_version));
        }

        if file_version == UNCOMMITTED_VERSION {
            log::warn!(
                "Applying uncommitted file {}, be sure to roll back before committing",
                self.path
            );
        }

        let current = self.definition()?;

        if current_version.is_empty() {
            return Ok(SqlChange {
                sql: current.apply_sql,
                version: file_version,
            });
        }

        let previous = self.definition_at(current_version, vcs)?;

        Ok(SqlChange {
            sql: join_statements(&previous.rollback_sql, &current.apply_sql),
            version: file_version,
        })
    }

    /// SQL that moves the database from `current_version` back to the
    /// previous committed version of the file.
    pub fn rollback_sql(
        &self,
        current_version: &str,
        vcs: &dyn VersionControl,
    ) -> CoreResult<SqlChange> {
        if current_version.is_empty() {
            return Ok(SqlChange::unchanged(""));
        }

        let history = vcs.history(&self.path)?;

        let (current, previous_version) = if current_version == UNCOMMITTED_VERSION {
            (self.definition()?, history.first())
        } else {
            let previous = history
                .iter()
                .position(|commit| commit == current_version)
                .and_then(|idx| history.get(idx + 1));
            (self.definition_at(current_version, vcs)?, previous)
        };

        match previous_version {
            Some(previous_version) => {
                let previous = self.definition_at(previous_version, vcs)?;
                Ok(SqlChange {
                    sql: join_statements(&current.rollback_sql, &previous.apply_sql),
                    version: previous_version.clone(),
                })
            }
            None => Ok(SqlChange {
                sql: current.rollback_sql,
                version: String::new(),
            }),
        }
    }

    /// Parse the file as it existed at `commit`.
    fn definition_at(&self, commit: &str, vcs: &dyn VersionControl) -> CoreResult<Definition> {
        let bytes = vcs.content_at(commit, &self.path)?;
        let content = String::from_utf8(bytes).map_err(|e| {
            CoreError::parse(
                &self.path,
                format!("content at {commit} is not valid UTF-8: {e}"),
            )
        })?;
        Definition::parse(&self.path, &content)
    }
}

#[cfg(test)]
#[path = "definition_test.rs"]
mod tests;
