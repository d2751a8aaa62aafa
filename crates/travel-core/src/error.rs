//! Core error types

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use travel_auth::AuthError;
use travel_db::DbError;

/// Boxed cause carried by infrastructure failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Kind of a pipeline failure; interception points match on this, never on text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Timeout,
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("{context}")]
    Infrastructure {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::Conflict(_) => ErrorKind::Conflict,
            PipelineError::Invalid(_) => ErrorKind::Invalid,
            PipelineError::Timeout(_) => ErrorKind::Timeout,
            PipelineError::Infrastructure { .. } => ErrorKind::Infrastructure,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Wrap an underlying I/O or storage failure, keeping it as the source
    pub fn infrastructure(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PipelineError::Infrastructure {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl From<DbError> for PipelineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => PipelineError::NotFound(msg),
            DbError::Duplicate(msg) => PipelineError::Conflict(msg),
            other => PipelineError::infrastructure("storage failure", other),
        }
    }
}

impl From<AuthError> for PipelineError {
    /// Every auth failure reaching a pipeline is about the presented
    /// credentials or token; signing failures are wrapped at the issuing stage.
    fn from(err: AuthError) -> Self {
        PipelineError::Invalid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_db_errors_keep_their_kind() {
        let not_found: PipelineError = DbError::NotFound("City: 1".to_string()).into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let duplicate: PipelineError = DbError::Duplicate("alice".to_string()).into();
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);

        let migration: PipelineError = DbError::Migration("users".to_string()).into();
        assert_eq!(migration.kind(), ErrorKind::Infrastructure);
        assert!(migration.source().is_some());
    }

    #[test]
    fn test_auth_errors_are_invalid() {
        let err: PipelineError = AuthError::InvalidCredentials.into();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(err.to_string().contains("wrong password"));
    }
}
