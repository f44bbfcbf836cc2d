//! Counter-versioned changeset files.
//!
//! A changeset file is a sequence of blocks:
//!
//! ```sql
//! -- pgit type=changeset
//! -- change
//! CREATE TABLE users (id integer);
//! -- rollback
//! DROP TABLE users;
//! -- change
//! ALTER TABLE users ADD COLUMN email text;
//! -- rollback
//! ALTER TABLE users DROP COLUMN email;
//! ```
//!
//! The version is the decimal count of changesets applied, so `"2"` means the
//! first two blocks have run. The empty string means nothing has run.

use super::{annotation_token, split_lines, SqlChange, ROLLBACK_MARKER};
use crate::error::{CoreError, CoreResult};

/// Marker opening the apply section of a changeset.
pub const CHANGE_MARKER: &str = "-- change";

/// One apply/rollback SQL pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub apply_sql: String,
    pub rollback_sql: String,
}

/// A parsed changeset file.
#[derive(Debug, Clone)]
pub struct ChangesetFile {
    path: String,
    changesets: Vec<Changeset>,
}

enum ParseState {
    /// Before the first `-- change` marker
    Preamble,
    /// Collecting apply SQL; carries the line the block started on
    InApply(Changeset, usize),
    InRollback(Changeset),
}

impl ChangesetFile {
    /// Parse the full content of a changeset file.
    ///
    /// A leading type annotation and blank lines are allowed before the
    /// first block; anything else there is an error.
    pub fn parse(path: impl Into<String>, content: &str) -> CoreResult<Self> {
        let path = path.into();
        let mut changesets = Vec::new();
        let mut state = ParseState::Preamble;

        for (idx, line) in split_lines(content).into_iter().enumerate() {
            let line_no = idx + 1;
            state = match state {
                ParseState::Preamble => {
                    if line == CHANGE_MARKER {
                        ParseState::InApply(Changeset::default(), line_no)
                    } else if line == ROLLBACK_MARKER {
                        return Err(unexpected_marker(&path, ROLLBACK_MARKER, line_no));
                    } else if line.trim().is_empty()
                        || (idx == 0 && annotation_token(line).is_some())
                    {
                        ParseState::Preamble
                    } else {
                        return Err(CoreError::parse(
                            &path,
                            format!("unexpected content before first '{CHANGE_MARKER}' marker at line {line_no}"),
                        ));
                    }
                }
                ParseState::InApply(mut changeset, start) => {
                    if line == CHANGE_MARKER {
                        return Err(unexpected_marker(&path, CHANGE_MARKER, line_no));
                    } else if line == ROLLBACK_MARKER {
                        ParseState::InRollback(changeset)
                    } else {
                        changeset.apply_sql.push_str(line);
                        changeset.apply_sql.push('\n');
                        ParseState::InApply(changeset, start)
                    }
                }
                ParseState::InRollback(mut changeset) => {
                    if line == ROLLBACK_MARKER {
                        return Err(unexpected_marker(&path, ROLLBACK_MARKER, line_no));
                    } else if line == CHANGE_MARKER {
                        changesets.push(changeset);
                        ParseState::InApply(Changeset::default(), line_no)
                    } else {
                        changeset.rollback_sql.push_str(line);
                        changeset.rollback_sql.push('\n');
                        ParseState::InRollback(changeset)
                    }
                }
            };
        }

        match state {
            ParseState::Preamble => {}
            ParseState::InApply(_, start) => {
                return Err(CoreError::parse(
                    &path,
                    format!("missing '{ROLLBACK_MARKER}' section for changeset starting at line {start}"),
                ));
            }
            ParseState::InRollback(changeset) => changesets.push(changeset),
        }

        Ok(Self { path, changesets })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parsed changesets in file order.
    pub fn changesets(&self) -> &[Changeset] {
        &self.changesets
    }

    /// SQL for every changeset after `current_version`, and the final version.
    pub fn apply_sql(&self, current_version: &str) -> CoreResult<SqlChange> {
        let current = self.parse_version(current_version)?;
        let total = self.changesets.len();

        if current > total {
            return Err(CoreError::version(
                &self.path,
                format!("version {current} exceeds the {total} changesets defined"),
            ));
        }

        if current == total {
            return Ok(SqlChange::unchanged(current_version));
        }

        let sql = self.changesets[current..]
            .iter()
            .fold(String::new(), |mut sql, changeset| {
                sql.push_str(&changeset.apply_sql);
                sql.push('\n');
                sql
            });

        Ok(SqlChange {
            sql,
            version: total.to_string(),
        })
    }

    /// Rollback SQL for the single most recent changeset at `current_version`.
    pub fn rollback_sql(&self, current_version: &str) -> CoreResult<SqlChange> {
        if current_version.is_empty() {
            return Ok(SqlChange::unchanged("0"));
        }

        let current = self.parse_version(current_version)?;
        if current == 0 {
            return Ok(SqlChange::unchanged("0"));
        }

        let changeset = self.changesets.get(current - 1).ok_or_else(|| {
            CoreError::version(
                &self.path,
                format!(
                    "cannot roll back version {current}: only {} changesets defined",
                    self.changesets.len()
                ),
            )
        })?;

        Ok(SqlChange {
            sql: changeset.rollback_sql.clone(),
            version: (current - 1).to_string(),
        })
    }

    fn parse_version(&self, version: &str) -> CoreResult<usize> {
        if version.is_empty() {
            return Ok(0);
        }
        version.parse::<usize>().map_err(|e| {
            CoreError::version(
                &self.path,
                format!("expected integer version, found '{version}': {e}"),
            )
        })
    }
}

fn unexpected_marker(path: &str, marker: &str, line_no: usize) -> CoreError {
    CoreError::parse(path, format!("unexpected '{marker}' marker at line {line_no}"))
}

#[cfg(test)]
#[path = "changeset_test.rs"]
mod tests;
