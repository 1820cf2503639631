use thiserror::Error;

/// A form field that failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No response from server")]
    NoResponse(#[source] reqwest::Error),
    /// 401/403 from the server; the session has already been cleared.
    #[error("Authentication required. Please log in again.")]
    Unauthorized,
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{}", describe(.0))]
    Validation(Vec<FieldError>),
    #[error("Deleting an issue must be confirmed")]
    ConfirmationRequired,
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Invalid response from server: {0}")]
    Decode(String),
    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Session encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Field errors of a `Validation` failure, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Validation(errors) => errors,
            _ => &[],
        }
    }
}
