//! Request-scoped structured log context
//!
//! A [`LogContext`] accumulates key/value pairs as a request moves through
//! services. It is passed explicitly; deriving a child never changes the
//! parent. Emitting never fails.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, warn};

/// Accumulated key/value context attached to log events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    fields: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context with one more field; a later value for the same key wins
    pub fn with(&self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut child = self.clone();
        child.fields.insert(key.into(), value.to_string());
        child
    }

    /// Derive a context carrying an error and its chain of causes
    pub fn with_error(&self, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.with("error", message)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn info(&self, message: impl fmt::Display) {
        info!(context = %self, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        warn!(context = %self, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        error!(context = %self, "{}", message);
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use travel_db::DbError;

    #[test]
    fn test_child_overrides_without_touching_parent() {
        let parent = LogContext::new()
            .with("function", "AuthService::login")
            .with("username", "alice");
        let child = parent.with("function", "AuthService::save_user");

        assert_eq!(parent.get("function"), Some("AuthService::login"));
        assert_eq!(child.get("function"), Some("AuthService::save_user"));
        assert_eq!(child.get("username"), Some("alice"));
    }

    #[test]
    fn test_error_chain_is_recorded() {
        let err: PipelineError = DbError::Migration("users".to_string()).into();
        let ctx = LogContext::new().with_error(&err);

        let recorded = ctx.get("error").unwrap();
        assert!(recorded.starts_with("storage failure"));
        assert!(recorded.contains("Migration error: users"));
    }

    #[test]
    fn test_display_is_json() {
        let ctx = LogContext::new().with("b", 2).with("a", "x");
        assert_eq!(ctx.to_string(), r#"{"a":"x","b":"2"}"#);
    }
}
