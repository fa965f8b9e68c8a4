//! Error types for lictrack

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::InstanceId;

/// Error taxonomy for license synchronization operations
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("Instance {instance} unreachable: {message}")]
    Unreachable {
        instance: InstanceId,
        message: String,
    },

    #[error("Malformed license data from {instance}: {message}")]
    Malformed {
        instance: InstanceId,
        message: String,
    },

    #[error("Instance not found: {0}")]
    NotFound(InstanceId),

    #[error("License rejected by {instance}: {message}")]
    Rejected {
        instance: InstanceId,
        message: String,
    },

    #[error("Failed to read license file {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Instance directory is empty")]
    EmptyDirectory,

    /// A local fault (task panic or cancellation) while handling an instance
    #[error("Internal error while handling {instance}: {message}")]
    Internal {
        instance: InstanceId,
        message: String,
    },
}

impl LicenseError {
    pub fn unreachable(instance: &InstanceId, msg: impl Into<String>) -> Self {
        Self::Unreachable {
            instance: instance.clone(),
            message: msg.into(),
        }
    }

    pub fn malformed(instance: &InstanceId, msg: impl Into<String>) -> Self {
        Self::Malformed {
            instance: instance.clone(),
            message: msg.into(),
        }
    }

    pub fn not_found(instance: &InstanceId) -> Self {
        Self::NotFound(instance.clone())
    }

    pub fn rejected(instance: &InstanceId, msg: impl Into<String>) -> Self {
        Self::Rejected {
            instance: instance.clone(),
            message: msg.into(),
        }
    }

    pub fn internal(instance: &InstanceId, msg: impl Into<String>) -> Self {
        Self::Internal {
            instance: instance.clone(),
            message: msg.into(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Stable classification of this error for callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable { .. } => ErrorKind::Unreachable,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::LocalIo { .. } => ErrorKind::LocalIo,
            Self::EmptyDirectory => ErrorKind::EmptyDirectory,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

/// Error kind, as surfaced to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unreachable,
    Malformed,
    NotFound,
    Rejected,
    LocalIo,
    EmptyDirectory,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unreachable => "unreachable",
            Self::Malformed => "malformed",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::LocalIo => "local_io",
            Self::EmptyDirectory => "empty_directory",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, LicenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let id = InstanceId::new("pf1");
        assert_eq!(LicenseError::unreachable(&id, "timeout").kind(), ErrorKind::Unreachable);
        assert_eq!(LicenseError::not_found(&id).kind(), ErrorKind::NotFound);
        assert_eq!(LicenseError::rejected(&id, "bad blob").kind(), ErrorKind::Rejected);
        assert_eq!(LicenseError::EmptyDirectory.kind(), ErrorKind::EmptyDirectory);
        assert_eq!(LicenseError::internal(&id, "task panicked").kind(), ErrorKind::Internal);
    }

    #[test]
    fn messages_name_the_instance() {
        let err = LicenseError::malformed(&InstanceId::new("pf4"), "bad expiryDate");
        assert_eq!(err.to_string(), "Malformed license data from pf4: bad expiryDate");
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::LocalIo.to_string(), "local_io");
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }
}
