//! The module contains the errors the engine can return.
//!
//! Three families exist:
//!
//! - [`LoadError`] when the backing file cannot be turned into a store. It is
//!   fatal: the session cannot start.
//! - [`SaveError`] when a persistence attempt fails. The in-memory mutation
//!   that triggered it stands, so memory and disk may now disagree.
//! - validation variants of [`EngineError`] (duplicate or missing key, bad
//!   input). Nothing was changed.
//!
//! [`EngineError::kind`] lets callers branch on the family without parsing
//! messages.
use std::path::PathBuf;

use thiserror::Error;

/// Broad classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Load,
    Save,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Nothing to reset: no expense records")]
    NothingToReset,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load(_) => ErrorKind::Load,
            Self::Save(_) => ErrorKind::Save,
            _ => ErrorKind::Validation,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::NothingToReset, Self::NothingToReset) => true,
            (Self::Load(a), Self::Load(b)) => a.to_string() == b.to_string(),
            (Self::Save(a), Self::Save(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Failure to read the backing file into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("backing file {} not found", .0.display())]
    Missing(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error("expense \"{0}\" appears more than once")]
    DuplicateKey(String),
}

/// Failure of one step of the save sequence.
///
/// Every message names the step that failed and the path involved.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save failed resolving path {}: {source}", path.display())]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save failed creating directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save aborted, backup to {} failed: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save failed writing temporary file for {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save failed replacing {}: {source}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    /// Path of the file the failing step was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ResolvePath { path, .. }
            | Self::CreateDir { path, .. }
            | Self::Backup { path, .. }
            | Self::Write { path, .. }
            | Self::Rename { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_families() {
        assert_eq!(
            EngineError::KeyNotFound("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(EngineError::NothingToReset.kind(), ErrorKind::Validation);
        assert_eq!(
            EngineError::from(LoadError::Missing(PathBuf::from("a.csv"))).kind(),
            ErrorKind::Load
        );
        let save = SaveError::Rename {
            path: PathBuf::from("a.csv"),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(EngineError::from(save).kind(), ErrorKind::Save);
    }

    #[test]
    fn save_messages_name_the_step() {
        let backup = SaveError::Backup {
            path: PathBuf::from("/tmp/a.csv.bak.20250101_000000"),
            source: std::io::Error::other("disk full"),
        };
        let message = backup.to_string();
        assert!(message.contains("backup"));
        assert!(message.contains("a.csv.bak.20250101_000000"));

        let write = SaveError::Write {
            path: PathBuf::from("/tmp/a.csv"),
            source: std::io::Error::other("disk full"),
        };
        assert!(write.to_string().contains("writing"));

        let resolve = SaveError::ResolvePath {
            path: PathBuf::from(""),
            source: std::io::Error::other("empty path"),
        };
        assert!(resolve.to_string().contains("resolving path"));
    }
}
