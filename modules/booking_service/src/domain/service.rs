//! Domain service - business logic orchestration

use super::availability::{requests_for, AvailabilityChecker};
use super::backend::{BackendError, RecordStore};
use super::lookup;
use super::orchestrator::{with_timeout, Orchestrator, UNEXPECTED_FAILURE_MESSAGE};
use super::payload::{build_plan, BookingDefaults};
use super::validation::{validate_all, validate_field, validate_step, ValidationRules};
use crate::config::Config;
use crate::contract::{
    AvailabilityReport, BookingError, BookingForm, Category, FieldError, FieldKey, FormStep,
    RecordId, ScheduledResource, SchoolSummary, SubmissionOutcome,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Shortest name fragment sent to the organisation search
pub const MIN_SEARCH_LENGTH: usize = 3;

fn backend_error(error: BackendError) -> BookingError {
    tracing::warn!(error = %error, "Record store lookup failed");
    BookingError::Backend {
        message: error.to_string(),
    }
}

/// Domain service for booking submissions
pub struct Service {
    store: Arc<dyn RecordStore>,
    rules: ValidationRules,
    defaults: BookingDefaults,
    timeout: Duration,
}

impl Service {
    /// Create a new service instance
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            rules: config.validation_rules(),
            defaults: config.booking_defaults.clone(),
            timeout: config.request_timeout,
        }
    }

    // ===== Validation =====

    /// Field errors of one step, or of the whole form when `step` is `None`
    pub fn validate(&self, form: &BookingForm, step: Option<FormStep>) -> Vec<FieldError> {
        match step {
            Some(step) => validate_step(form, step, &self.rules),
            None => validate_all(form, &self.rules),
        }
    }

    /// Error of a single field, if any
    pub fn validate_field(&self, form: &BookingForm, field: FieldKey) -> Option<FieldError> {
        validate_field(form, field, &self.rules)
    }

    /// Advance the wizard, or report every error of the current step
    pub fn next_step(&self, mut form: BookingForm) -> Result<BookingForm, BookingError> {
        form.go_to_next_step(&self.rules)
            .map_err(|errors| BookingError::Validation { errors })?;
        Ok(form)
    }

    // ===== Submission =====

    /// Re-check live capacity for every group's resource
    pub async fn check_availability(
        &self,
        form: &BookingForm,
    ) -> Result<AvailabilityReport, BookingError> {
        let requests = requests_for(form);
        let checker = AvailabilityChecker::new(self.store.as_ref());
        with_timeout(self.timeout, checker.check(&requests))
            .await
            .map_err(backend_error)
    }

    /// Validate, re-check capacity, then create every record.
    ///
    /// Validation errors and capacity conflicts are returned as errors and
    /// never reach record creation. Once creation starts the result is always
    /// a `SubmissionOutcome`.
    pub async fn submit(&self, form: &BookingForm) -> Result<SubmissionOutcome, BookingError> {
        let span = tracing::info_span!("submission", submission_id = %Uuid::new_v4());

        async move {
            let errors = validate_all(form, &self.rules);
            if !errors.is_empty() {
                tracing::info!(errors = errors.len(), "Submission blocked by validation");
                return Err(BookingError::Validation { errors });
            }

            let report = self.check_availability(form).await?;
            if !report.available {
                return Err(BookingError::Unavailable {
                    conflicts: report.conflicts,
                });
            }

            let plan = build_plan(form, &self.defaults);
            let orchestrator = Orchestrator::new(self.store.as_ref(), self.timeout);
            tracing::info!(groups = plan.links.len(), "Starting record creation");

            let outcome = match AssertUnwindSafe(orchestrator.run(plan)).catch_unwind().await {
                Ok(report) => report.outcome,
                Err(_) => {
                    tracing::error!("Record creation panicked");
                    SubmissionOutcome::Failed {
                        step: None,
                        message: UNEXPECTED_FAILURE_MESSAGE.to_string(),
                    }
                }
            };
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    // ===== Lookups =====

    /// Organisations whose name contains `name`
    pub async fn search_schools(&self, name: &str) -> Result<Vec<SchoolSummary>, BookingError> {
        if name.trim().chars().count() < MIN_SEARCH_LENGTH {
            return Ok(Vec::new());
        }
        with_timeout(self.timeout, lookup::search_schools(self.store.as_ref(), name))
            .await
            .map_err(backend_error)
    }

    /// Billing address on file for an organisation
    pub async fn known_billing_address(
        &self,
        school_id: RecordId,
    ) -> Result<Option<String>, BookingError> {
        with_timeout(
            self.timeout,
            lookup::billing_address(self.store.as_ref(), school_id),
        )
        .await
        .map_err(backend_error)
    }

    /// Select an existing school; its billing address decides the billing default
    pub async fn select_school(
        &self,
        mut form: BookingForm,
        school: SchoolSummary,
    ) -> Result<BookingForm, BookingError> {
        let address = self.known_billing_address(school.id).await?;
        form.select_existing_school(&school, address);
        Ok(form)
    }

    /// Selectable categories
    pub async fn list_categories(&self) -> Result<Vec<Category>, BookingError> {
        with_timeout(
            self.timeout,
            lookup::categories(self.store.as_ref(), &self.rules.restricted_categories),
        )
        .await
        .map_err(backend_error)
    }

    /// Upcoming resources for a region and category
    pub async fn list_resources(
        &self,
        region: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<ScheduledResource>, BookingError> {
        with_timeout(
            self.timeout,
            lookup::resources(self.store.as_ref(), region, category, chrono::Utc::now()),
        )
        .await
        .map_err(backend_error)
    }
}
