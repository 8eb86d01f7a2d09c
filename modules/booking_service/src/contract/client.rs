//! Native client trait for inter-module communication
//!
//! This trait defines the API that front ends and other modules use to drive a booking.
//! NO HTTP - direct function calls for performance.

use super::{
    error::BookingError,
    model::{
        AvailabilityReport, BookingForm, Category, FieldError, FieldKey, FormStep, RecordId,
        ScheduledResource, SchoolSummary, SubmissionOutcome,
    },
};
use async_trait::async_trait;

/// Booking service API for inter-module communication
#[async_trait]
pub trait BookingApi: Send + Sync {
    // ===== Validation =====

    /// Validate every field of one step, or of all steps when `step` is `None`
    async fn validate(
        &self,
        form: &BookingForm,
        step: Option<FormStep>,
    ) -> Result<Vec<FieldError>, BookingError>;

    /// Validate a single field (on-blur mode)
    async fn validate_field(
        &self,
        form: &BookingForm,
        field: FieldKey,
    ) -> Result<Option<FieldError>, BookingError>;

    /// Advance the wizard if the current step is valid
    async fn next_step(&self, form: BookingForm) -> Result<BookingForm, BookingError>;

    // ===== Submission =====

    /// Re-check live capacity for every selected resource
    async fn check_availability(
        &self,
        form: &BookingForm,
    ) -> Result<AvailabilityReport, BookingError>;

    /// Validate, re-check capacity and create all records
    async fn submit(&self, form: &BookingForm) -> Result<SubmissionOutcome, BookingError>;

    // ===== Lookups =====

    /// Search organisations by (partial) name
    async fn search_schools(&self, name: &str) -> Result<Vec<SchoolSummary>, BookingError>;

    /// Known billing address of an organisation
    async fn known_billing_address(
        &self,
        school_id: RecordId,
    ) -> Result<Option<String>, BookingError>;

    /// Select an existing school and apply its billing address default
    async fn select_school(
        &self,
        form: BookingForm,
        school: SchoolSummary,
    ) -> Result<BookingForm, BookingError>;

    /// List selectable group categories
    async fn list_categories(&self) -> Result<Vec<Category>, BookingError>;

    /// List upcoming scheduled resources for a region and category
    async fn list_resources(
        &self,
        region: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<ScheduledResource>, BookingError>;
}
