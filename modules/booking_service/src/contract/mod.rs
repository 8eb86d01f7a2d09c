//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::BookingApi;
pub use error::BookingError;
pub use model::{
    AvailabilityReport, BillingAddressSource, BookingForm, Category, Conflict, ConsentField,
    Consents, ExistingSchool, FieldError, FieldKey, FormStep, Group, GroupField, NewSchool,
    Payment, RecordId, ResourceRequest, ScheduledResource, SchoolField, SchoolSelection,
    SchoolSummary, SubmissionOutcome, SubmissionStep, Teacher, TeacherField,
};
