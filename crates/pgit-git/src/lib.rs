//! pgit-git - Git integration for pgit
//!
//! [`GitCli`] answers the version-control questions definition files need
//! (dirty check, per-file history, content at a commit) by running the
//! `git` binary.

pub mod error;
pub mod git;

pub use error::{GitError, GitResult};
pub use git::GitCli;
