//! Error types shared by the ledger operations and the command surfaces.
//!
//! Internally everything is an `anyhow::Error` with context attached at each remote call. The
//! handful of failures that a user can act on are raised as a typed `LedgerError` so that the
//! presentation layer can recover them with `ErrorType::of` and choose a reply.

use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures with a meaning beyond "the remote call did not work".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid price format '{0}'")]
    InvalidPrice(String),

    #[error("The {0} must not be empty")]
    EmptyField(&'static str),

    #[error("Specify a positive number, got {0}")]
    InvalidCount(i64),

    #[error("'{0}' is not a month")]
    InvalidMonth(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Link '{0}' not found in the most recent logs output")]
    LinkNotFound(String),

    #[error("No recent logs output found, run logs first")]
    NoRecentLogs,

    #[error("Timed out waiting for confirmation")]
    Timeout,
}

/// The broad class of an error, used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Rejected before any remote call was made.
    InvalidInput,
    /// A sheet or link that was asked for does not exist.
    NotFound,
    /// A confirmation was not given in time. This is a cancellation, not a fault.
    Timeout,
    /// Network, auth or any other failure of the spreadsheet or image host.
    Remote,
}

serde_plain::derive_display_from_serialize!(ErrorType);

impl LedgerError {
    pub fn error_type(&self) -> ErrorType {
        match self {
            LedgerError::InvalidPrice(_)
            | LedgerError::EmptyField(_)
            | LedgerError::InvalidCount(_)
            | LedgerError::InvalidMonth(_) => ErrorType::InvalidInput,
            LedgerError::SheetNotFound(_)
            | LedgerError::LinkNotFound(_)
            | LedgerError::NoRecentLogs => ErrorType::NotFound,
            LedgerError::Timeout => ErrorType::Timeout,
        }
    }
}

impl ErrorType {
    /// Classifies `e` by looking for a `LedgerError` anywhere in its chain. Anything untyped is a
    /// remote failure.
    pub fn of(e: &Error) -> Self {
        e.chain()
            .find_map(|cause| cause.downcast_ref::<LedgerError>())
            .map(LedgerError::error_type)
            .unwrap_or(ErrorType::Remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_typed_error_survives_context() {
        let result: Result<()> = Err(LedgerError::InvalidPrice("abc".into()).into());
        let e = result.context("Unable to add record").unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::InvalidInput);
    }

    #[test]
    fn test_untyped_error_is_remote() {
        let e = anyhow::anyhow!("connection reset by peer");
        assert_eq!(ErrorType::of(&e), ErrorType::Remote);
    }

    #[test]
    fn test_not_found_and_timeout() {
        let e: Error = LedgerError::SheetNotFound("JAN".into()).into();
        assert_eq!(ErrorType::of(&e), ErrorType::NotFound);
        let e: Error = LedgerError::Timeout.into();
        assert_eq!(ErrorType::of(&e), ErrorType::Timeout);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::InvalidInput.to_string(), "invalid_input");
    }
}
