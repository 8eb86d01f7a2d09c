//! Contract error types for booking service
//!
//! These errors are transport-agnostic and used for inter-module communication.
//! Record-creation failures are not errors here: they end a submission with
//! `SubmissionOutcome::Failed`.

use super::model::{Conflict, FieldError};

/// Booking service domain errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Form state does not pass the validation gate
    Validation {
        /// Field-keyed errors
        errors: Vec<FieldError>,
    },
    /// One or more groups exceed the live capacity of their resource
    Unavailable {
        /// Over-subscribed resources
        conflicts: Vec<Conflict>,
    },
    /// Form mutation not allowed in the current state
    InvalidTransition {
        /// Reason for rejection
        reason: String,
    },
    /// Lookup against the record store failed
    Backend {
        /// Backend message
        message: String,
    },
    /// Internal error
    Internal,
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { errors } => {
                write!(f, "Validation failed for {} field(s)", errors.len())
            }
            Self::Unavailable { conflicts } => {
                let details: Vec<String> = conflicts
                    .iter()
                    .map(|c| {
                        format!(
                            "resource {} has {} place(s) left, {} requested",
                            c.resource, c.available, c.requested
                        )
                    })
                    .collect();
                write!(f, "Not enough capacity: {}", details.join("; "))
            }
            Self::InvalidTransition { reason } => {
                write!(f, "Invalid transition: {}", reason)
            }
            Self::Backend { message } => {
                write!(f, "Backend error: {}", message)
            }
            Self::Internal => {
                write!(f, "Internal error")
            }
        }
    }
}

impl std::error::Error for BookingError {}
