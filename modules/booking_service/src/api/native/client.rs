//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    AvailabilityReport, BookingApi, BookingError, BookingForm, Category, FieldError, FieldKey,
    FormStep, RecordId, ScheduledResource, SchoolSummary, SubmissionOutcome,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BookingApi for NativeClient {
    async fn validate(
        &self,
        form: &BookingForm,
        step: Option<FormStep>,
    ) -> Result<Vec<FieldError>, BookingError> {
        Ok(self.service.validate(form, step))
    }

    async fn validate_field(
        &self,
        form: &BookingForm,
        field: FieldKey,
    ) -> Result<Option<FieldError>, BookingError> {
        Ok(self.service.validate_field(form, field))
    }

    async fn next_step(&self, form: BookingForm) -> Result<BookingForm, BookingError> {
        self.service.next_step(form)
    }

    async fn check_availability(
        &self,
        form: &BookingForm,
    ) -> Result<AvailabilityReport, BookingError> {
        self.service.check_availability(form).await
    }

    async fn submit(&self, form: &BookingForm) -> Result<SubmissionOutcome, BookingError> {
        self.service.submit(form).await
    }

    async fn search_schools(&self, name: &str) -> Result<Vec<SchoolSummary>, BookingError> {
        self.service.search_schools(name).await
    }

    async fn known_billing_address(
        &self,
        school_id: RecordId,
    ) -> Result<Option<String>, BookingError> {
        self.service.known_billing_address(school_id).await
    }

    async fn select_school(
        &self,
        form: BookingForm,
        school: SchoolSummary,
    ) -> Result<BookingForm, BookingError> {
        self.service.select_school(form, school).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BookingError> {
        self.service.list_categories().await
    }

    async fn list_resources(
        &self,
        region: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<ScheduledResource>, BookingError> {
        self.service.list_resources(region, category).await
    }
}
