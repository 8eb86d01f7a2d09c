//! HTTP error mapping to RFC-9457 Problem Details

use super::dto::{ConflictDto, FieldErrorDto};
use crate::contract::BookingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Field errors of a rejected form
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorDto>,

    /// Over-subscribed resources
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictDto>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            errors: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach field errors
    pub fn with_errors(mut self, errors: Vec<FieldErrorDto>) -> Self {
        self.errors = errors;
        self
    }

    /// Attach capacity conflicts
    pub fn with_conflicts(mut self, conflicts: Vec<ConflictDto>) -> Self {
        self.conflicts = conflicts;
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: BookingError) -> Problem {
    let detail = error.to_string();
    match error {
        BookingError::Validation { errors } => {
            Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Error")
                .with_detail(detail)
                .with_errors(errors.into_iter().map(Into::into).collect())
        }

        BookingError::Unavailable { conflicts } => {
            Problem::new(StatusCode::CONFLICT, "Insufficient Capacity")
                .with_detail(detail)
                .with_conflicts(conflicts.into_iter().map(Into::into).collect())
        }

        BookingError::InvalidTransition { reason } => {
            Problem::new(StatusCode::BAD_REQUEST, "Invalid Transition").with_detail(reason)
        }

        BookingError::Backend { message } => {
            Problem::new(StatusCode::BAD_GATEWAY, "Backend Unavailable").with_detail(message)
        }

        BookingError::Internal => {
            Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                .with_detail("An unexpected error occurred")
        }
    }
}
