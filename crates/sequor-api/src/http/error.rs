//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use sequor_core::sequence::DefinitionError;
use sequor_types::error::{RegistryError, ValidationError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Control-surface misuse: unknown job, wrong state for the action.
    Registry(RegistryError),
    /// Sequence definition failed validation.
    Validation(ValidationError),
    /// Sequence file could not be loaded.
    Definition(DefinitionError),
    /// No sequence with the requested name in the sequences directory.
    SequenceNotFound(String),
    /// Malformed request body.
    BadRequest(String),
    /// Generic internal error.
    Internal(String),
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        AppError::Registry(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<DefinitionError> for AppError {
    fn from(e: DefinitionError) -> Self {
        AppError::Definition(e)
    }
}

impl AppError {
    /// (status, machine-readable code, human-readable message) for the
    /// response envelope.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Registry(e @ RegistryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "JOB_NOT_FOUND", e.to_string())
            }
            AppError::Registry(e @ RegistryError::InvalidState { .. }) => {
                (StatusCode::CONFLICT, "INVALID_STATE", e.to_string())
            }
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Definition(DefinitionError::ValidationError(e)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Definition(e @ DefinitionError::ParseError(_)) => {
                (StatusCode::BAD_REQUEST, "PARSE_ERROR", e.to_string())
            }
            AppError::Definition(e @ DefinitionError::IoError(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SEQUENCE_STORE_ERROR",
                e.to_string(),
            ),
            AppError::SequenceNotFound(name) => (
                StatusCode::NOT_FOUND,
                "SEQUENCE_NOT_FOUND",
                format!("no sequence named '{name}'"),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(ApiResponse::error(code, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequor_types::job::JobState;
    use uuid::Uuid;

    #[test]
    fn test_unknown_job_maps_to_404() {
        let err = AppError::Registry(RegistryError::NotFound(Uuid::now_v7()));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "JOB_NOT_FOUND");
    }

    #[test]
    fn test_invalid_state_maps_to_409() {
        let err = AppError::Registry(RegistryError::InvalidState {
            id: Uuid::now_v7(),
            state: JobState::Running,
            action: "retry",
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "INVALID_STATE");
        assert!(message.contains("cannot retry"));
    }

    #[test]
    fn test_validation_maps_to_400_with_all_violations() {
        let err = AppError::Validation(ValidationError::new(vec![
            "sequence must have at least one step".to_string(),
            "sequence name must not be empty".to_string(),
        ]));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("at least one step"));
        assert!(message.contains("must not be empty"));
    }

    #[test]
    fn test_sequence_not_found_maps_to_404() {
        let err = AppError::SequenceNotFound("discovery".to_string());
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "SEQUENCE_NOT_FOUND");
        assert_eq!(message, "no sequence named 'discovery'");
    }
}
