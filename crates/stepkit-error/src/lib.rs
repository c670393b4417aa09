//! Error handling for the stepkit workspace.
//!
//! Step resolution has one contract-bearing failure mode that callers must
//! be able to pick out programmatically: a missing credential during
//! `mail`/`username` derivation. Everything else (bad session addresses,
//! malformed mail bodies, unparseable credential records) is categorized the
//! same way so error text stays greppable across the workspace.

use std::fmt;

/// Error category for stepkit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential lookup failed or the record was absent.
    Credential,
    /// The browser session could not supply what was asked of it.
    Session,
    /// A credential record or other input failed to parse.
    Parse,
    /// A fetched mail message was malformed.
    Mail,
    /// Configuration was rejected.
    Config,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Credential => write!(f, "credential"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Mail => write!(f, "mail"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// Stepkit error with category and context
#[derive(Debug)]
pub struct StepError {
    message: String,
    category: ErrorCategory,
    context: Vec<(String, String)>,
}

impl StepError {
    pub fn new(message: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            message: message.into(),
            category,
            context: Vec::new(),
        }
    }

    /// Attach a key/value pair to the error report.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    pub fn is_credential_error(&self) -> bool {
        self.category == ErrorCategory::Credential
    }

    pub fn is_session_error(&self) -> bool {
        self.category == ErrorCategory::Session
    }

    pub fn is_parse_error(&self) -> bool {
        self.category == ErrorCategory::Parse
    }

    pub fn is_mail_error(&self) -> bool {
        self.category == ErrorCategory::Mail
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;

        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl std::error::Error for StepError {}

/// Result type alias for stepkit errors
pub type Result<T> = std::result::Result<T, StepError>;

/// A credential record was absent for the given role.
pub fn credential_missing(role: impl Into<String>) -> StepError {
    StepError::new("credential not found", ErrorCategory::Credential)
        .with_context("role", role)
}

/// Convenience function to create parse errors
pub fn parse_error(message: impl Into<String>) -> StepError {
    StepError::new(message, ErrorCategory::Parse)
}

/// Convenience function to create session errors
pub fn session_error(message: impl Into<String>) -> StepError {
    StepError::new(message, ErrorCategory::Session)
}

/// Convenience function to create mail errors
pub fn mail_error(message: impl Into<String>) -> StepError {
    StepError::new(message, ErrorCategory::Mail)
}

/// Convenience function to create config errors
pub fn config_error(message: impl Into<String>) -> StepError {
    StepError::new(message, ErrorCategory::Config)
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        StepError::new(err.to_string(), ErrorCategory::Unknown)
    }
}
