// src/web/error.rs
//! Mapping of domain failures onto status codes and error envelopes

use rocket::http::Status;

use crate::app_log;
use crate::graph::{RootKind, StoreError};
use crate::validation::FieldError;
use crate::web::types::{ApiError, StandardErrorResponse};

impl ApiError {
    pub fn new(
        status: Status,
        error: impl Into<String>,
        error_code: &str,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            status,
            body: StandardErrorResponse::new(
                error.into(),
                error_code.to_string(),
                suggestions,
                conversation_id,
            ),
        }
    }

    /// 400 with one suggestion per field error
    pub fn validation(errors: Vec<FieldError>, conversation_id: Option<String>) -> Self {
        let mut error = Self::new(
            Status::BadRequest,
            format!("Validation failed with {} error(s)", errors.len()),
            "VALIDATION_ERROR",
            errors.iter().map(|e| e.to_string()).collect(),
            conversation_id,
        );
        error.body.field_errors = Some(errors);
        error
    }

    pub fn bad_request(
        error: impl Into<String>,
        error_code: &str,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self::new(Status::BadRequest, error, error_code, suggestions, conversation_id)
    }

    pub fn not_found(root: RootKind, conversation_id: Option<String>) -> Self {
        let (message, code, hint) = match root {
            RootKind::Cv => ("CV not found", "CV_NOT_FOUND", "List saved CVs with GET /api/cvs"),
            RootKind::Profile => (
                "Profile not found",
                "PROFILE_NOT_FOUND",
                "Create a profile with POST /api/profile",
            ),
        };
        Self::new(
            Status::NotFound,
            message,
            code,
            vec![hint.to_string()],
            conversation_id,
        )
    }

    pub fn internal(
        error: impl Into<String>,
        error_code: &str,
        conversation_id: Option<String>,
    ) -> Self {
        Self::new(
            Status::InternalServerError,
            error,
            error_code,
            vec!["Try again in a few moments".to_string()],
            conversation_id,
        )
    }

    /// `failure_code` names the operation for backend failures (`UPDATE_FAILED`, ...)
    pub fn from_store(
        err: StoreError,
        root: RootKind,
        failure_code: &str,
        conversation_id: Option<String>,
    ) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found(root, conversation_id),
            StoreError::VersionConflict { expected, actual } => Self::new(
                Status::Conflict,
                format!(
                    "{} was modified: expected version {}, current is {}",
                    root.label(),
                    expected,
                    actual
                ),
                "VERSION_CONFLICT",
                vec!["Reload the record and apply your changes again".to_string()],
                conversation_id,
            ),
            other => {
                app_log!(error, "{} store operation failed: {}", root.label(), other);
                let message = match failure_code {
                    "UPDATE_FAILED" => "Update failed",
                    "DELETE_FAILED" => "Delete failed",
                    "SAVE_FAILED" => "Save failed",
                    _ => "Storage operation failed",
                };
                Self::internal(message, failure_code, conversation_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let not_found = ApiError::from_store(
            StoreError::not_found(RootKind::Profile, "x"),
            RootKind::Profile,
            "UPDATE_FAILED",
            None,
        );
        assert_eq!(not_found.status, Status::NotFound);
        assert_eq!(not_found.body.error_code, "PROFILE_NOT_FOUND");

        let conflict = ApiError::from_store(
            StoreError::VersionConflict {
                expected: "a".to_string(),
                actual: "b".to_string(),
            },
            RootKind::Cv,
            "UPDATE_FAILED",
            None,
        );
        assert_eq!(conflict.status, Status::Conflict);

        let backend = ApiError::from_store(
            StoreError::Backend("boom".to_string()),
            RootKind::Cv,
            "DELETE_FAILED",
            None,
        );
        assert_eq!(backend.status, Status::InternalServerError);
        assert_eq!(backend.body.error_code, "DELETE_FAILED");
        assert!(!backend.body.error.contains("boom"));
    }

    #[test]
    fn validation_lists_each_field() {
        let err = ApiError::validation(
            vec![
                FieldError {
                    field: "personal_info.name".to_string(),
                    message: "is required".to_string(),
                },
                FieldError {
                    field: "personal_info.email".to_string(),
                    message: "is not a valid email address".to_string(),
                },
            ],
            None,
        );
        assert_eq!(err.status, Status::BadRequest);
        assert_eq!(err.body.suggestions.len(), 2);
        assert_eq!(err.body.suggestions[0], "personal_info.name: is required");
    }
}
