//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{map_domain_error, Problem},
};
use crate::contract::{self, FieldKey, RecordId};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

// ===== Form Handlers =====

/// Query parameters for validation
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    /// Validate a single step instead of the whole form
    pub step: Option<FormStepDto>,
    /// Validate a single field, e.g. `teacher.email`
    pub field: Option<String>,
}

/// Validate a form, one of its steps, or one of its fields
pub async fn validate(
    service: Arc<Service>,
    Query(query): Query<ValidateQuery>,
    Json(req): Json<BookingFormDto>,
) -> Result<Json<ValidationResponse>, Problem> {
    let form: contract::BookingForm = req.try_into().map_err(map_domain_error)?;

    let errors = match query.field {
        Some(field) => {
            let key: FieldKey = field.parse().map_err(|e: String| {
                Problem::new(StatusCode::BAD_REQUEST, "Unknown Field").with_detail(e)
            })?;
            service.validate_field(&form, key).into_iter().collect()
        }
        None => service.validate(&form, query.step.map(Into::into)),
    };

    Ok(Json(errors.into()))
}

/// Advance the wizard to the next step
pub async fn next_step(
    service: Arc<Service>,
    Json(req): Json<BookingFormDto>,
) -> Result<Json<BookingFormDto>, Problem> {
    let form: contract::BookingForm = req.try_into().map_err(map_domain_error)?;
    let form = service.next_step(form).map_err(map_domain_error)?;
    Ok(Json(form.into()))
}

/// Re-check live capacity for the form's groups
pub async fn check_availability(
    service: Arc<Service>,
    Json(req): Json<BookingFormDto>,
) -> Result<Json<AvailabilityReportDto>, Problem> {
    let form: contract::BookingForm = req.try_into().map_err(map_domain_error)?;
    let report = service
        .check_availability(&form)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(report.into()))
}

/// Submit a booking
///
/// A failed record-creation run is not a Problem: the outcome names the failed
/// step and is returned with 502.
pub async fn submit(
    service: Arc<Service>,
    Json(req): Json<BookingFormDto>,
) -> Result<(StatusCode, Json<SubmissionOutcomeDto>), Problem> {
    let form: contract::BookingForm = req.try_into().map_err(map_domain_error)?;
    let outcome = service
        .submit(&form)
        .await
        .map_err(map_domain_error)?;

    let status = if outcome.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(outcome.into())))
}

// ===== Lookup Handlers =====

/// Query parameters for the school search
#[derive(Debug, Deserialize)]
pub struct SchoolSearchQuery {
    #[serde(default)]
    pub name: String,
}

/// Search organisations by name
pub async fn search_schools(
    service: Arc<Service>,
    Query(query): Query<SchoolSearchQuery>,
) -> Result<Json<SchoolsListResponse>, Problem> {
    let schools = service
        .search_schools(&query.name)
        .await
        .map_err(map_domain_error)?;

    let items: Vec<SchoolSummaryDto> = schools.into_iter().map(|s| s.into()).collect();
    let total = items.len();

    Ok(Json(SchoolsListResponse { items, total }))
}

/// Billing address on file for a school
pub async fn billing_address(
    service: Arc<Service>,
    Path(school_id): Path<i64>,
) -> Result<Json<BillingAddressDto>, Problem> {
    let address = service
        .known_billing_address(RecordId(school_id))
        .await
        .map_err(map_domain_error)?;

    Ok(Json(BillingAddressDto { school_id, address }))
}

/// Put an existing school on the form
pub async fn select_school(
    service: Arc<Service>,
    Json(req): Json<SelectSchoolRequest>,
) -> Result<Json<BookingFormDto>, Problem> {
    let form: contract::BookingForm = req.form.try_into().map_err(map_domain_error)?;
    let form = service
        .select_school(form, req.school.into())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(form.into()))
}

/// List selectable categories
pub async fn list_categories(
    service: Arc<Service>,
) -> Result<Json<CategoriesListResponse>, Problem> {
    let categories = service.list_categories().await.map_err(map_domain_error)?;

    let items: Vec<CategoryDto> = categories.into_iter().map(|c| c.into()).collect();
    let total = items.len();

    Ok(Json(CategoriesListResponse { items, total }))
}

/// Query parameters for listing resources
#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub region: Option<String>,
    pub category: Option<String>,
}

/// List upcoming resources
pub async fn list_resources(
    service: Arc<Service>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<ResourcesListResponse>, Problem> {
    let resources = service
        .list_resources(query.region.as_deref(), query.category.as_deref())
        .await
        .map_err(map_domain_error)?;

    let items: Vec<ScheduledResourceDto> = resources.into_iter().map(|r| r.into()).collect();
    let total = items.len();

    Ok(Json(ResourcesListResponse { items, total }))
}
