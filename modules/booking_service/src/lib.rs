//! Booking Service Module
//!
//! Multi-step booking form for school groups. Validates the form, re-checks
//! live capacity and writes the booking as a chain of dependent records to an
//! external record store.

// Public exports
pub mod contract;
pub use contract::{
    client::BookingApi, error::BookingError, BookingForm, FieldError, FieldKey, FormStep,
    RecordId, SubmissionOutcome, SubmissionStep,
};

pub mod module;
pub use module::BookingServiceModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
