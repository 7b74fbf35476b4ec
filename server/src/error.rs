use thiserror::Error;

use crate::events::MAX_FIELD_CHARS;

/// Errors surfaced to the originating connection. None of these mutate hub
/// state; each is rendered into an error or acknowledgement payload at the
/// point of detection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("{field} must be a non-empty string of at most {MAX_FIELD_CHARS} characters")]
    InvalidField { field: &'static str },

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("User {0} is not available")]
    TargetNotFound(String),
}
