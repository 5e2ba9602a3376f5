use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Required field missing: {0}")]
    MissingField(&'static str),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// View-layer check for required text inputs; blank counts as missing.
pub fn require_text(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(())
}
