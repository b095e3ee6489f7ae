//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The API layer maps each variant onto an HTTP status.

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input. Never retried.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },
    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),
    /// Authenticated, but lacking the role or ownership required
    #[error("{0}")]
    Forbidden(String),
    /// Illegal transition from the current state, or a uniqueness violation
    #[error("{0}")]
    Conflict(String),
    /// Storage transaction could not complete (timeout, contention, connectivity).
    /// No partial write survives; the caller may retry.
    #[error("Transaction failed: {0}")]
    Transaction(String),
    /// Stored data violates an invariant the engine relies on
    #[error("Data integrity error: {0}")]
    Integrity(String),
    /// Any other persistence failure
    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Conflict naming both the state found and the state the operation needs.
    pub fn state_conflict(
        entity: &str,
        id: i32,
        current: impl AsRef<str>,
        required: impl AsRef<str>,
    ) -> Self {
        DomainError::Conflict(format!(
            "{} {} is in state '{}', operation requires '{}'",
            entity,
            id,
            current.as_ref(),
            required.as_ref()
        ))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Transaction(_))
    }
}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
            return DomainError::Conflict(format!("Duplicate entry: {}", detail));
        }

        match e {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => DomainError::Transaction(e.to_string()),
            other => {
                let msg = other.to_string();
                // SQLITE_BUSY surfaces as a plain execution error
                if msg.contains("database is locked") {
                    DomainError::Transaction(msg)
                } else {
                    DomainError::Database(msg)
                }
            }
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_field_errors(None, &errors, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));

        DomainError::Validation {
            message: "Invalid input".to_string(),
            details,
        }
    }
}

/// Request bodies are camelCase on the wire; validator reports Rust field names.
fn json_key(field: &str) -> String {
    let mut key = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !key.is_empty();
        } else if upper {
            key.extend(c.to_uppercase());
            upper = false;
        } else {
            key.push(c);
        }
    }
    key
}

fn collect_field_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, json_key(field)),
            None => json_key(field),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_field_errors(Some(&path), nested, out);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    let indexed = format!("{}[{}]", path, index);
                    collect_field_errors(Some(&indexed), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflict_names_both_states() {
        let err = DomainError::state_conflict(
            "Commande",
            7,
            "ValideeFournisseur",
            "EnAttenteAssignation",
        );
        let msg = err.to_string();
        assert!(msg.contains("ValideeFournisseur"));
        assert!(msg.contains("EnAttenteAssignation"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn only_transaction_errors_are_retryable() {
        assert!(DomainError::Transaction("busy".into()).is_retryable());
        assert!(!DomainError::Conflict("dup".into()).is_retryable());
        assert!(!DomainError::validation("bad").is_retryable());
    }

    #[test]
    fn field_paths_use_json_keys() {
        assert_eq!(json_key("montant_total"), "montantTotal");
        assert_eq!(json_key("quantite_commandee"), "quantiteCommandee");
        assert_eq!(json_key("name"), "name");
    }

    #[test]
    fn connection_errors_become_retryable() {
        let err: DomainError = DbErr::Conn(sea_orm::RuntimeErr::Internal("gone".into())).into();
        assert!(err.is_retryable());

        let err: DomainError = DbErr::Custom("database is locked".into()).into();
        assert!(err.is_retryable());

        let err: DomainError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, DomainError::Database(_)));
    }
}
