//! Route registration

use super::{dto::*, handlers};
use crate::domain::Service;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let router = router
        // Booking endpoints
        .route("/bookings", post(submit_handler))
        .route("/bookings/validate", post(validate_handler))
        .route("/bookings/next-step", post(next_step_handler))
        .route("/bookings/availability", post(check_availability_handler))
        .route("/bookings/select-school", post(select_school_handler))
        // Lookup endpoints
        .route("/schools", get(search_schools_handler))
        .route("/schools/{id}/billing-address", get(billing_address_handler))
        .route("/categories", get(list_categories_handler))
        .route("/resources", get(list_resources_handler))
        // Add service as extension for handlers
        .layer(Extension(service));

    Ok(router)
}

// ===== Handler wrappers that extract service from Extension =====

async fn validate_handler(
    Extension(service): Extension<Arc<Service>>,
    query: axum::extract::Query<handlers::ValidateQuery>,
    json: axum::Json<BookingFormDto>,
) -> Result<axum::Json<ValidationResponse>, super::error::Problem> {
    handlers::validate(service, query, json).await
}

async fn next_step_handler(
    Extension(service): Extension<Arc<Service>>,
    json: axum::Json<BookingFormDto>,
) -> Result<axum::Json<BookingFormDto>, super::error::Problem> {
    handlers::next_step(service, json).await
}

async fn check_availability_handler(
    Extension(service): Extension<Arc<Service>>,
    json: axum::Json<BookingFormDto>,
) -> Result<axum::Json<AvailabilityReportDto>, super::error::Problem> {
    handlers::check_availability(service, json).await
}

async fn submit_handler(
    Extension(service): Extension<Arc<Service>>,
    json: axum::Json<BookingFormDto>,
) -> Result<(axum::http::StatusCode, axum::Json<SubmissionOutcomeDto>), super::error::Problem> {
    handlers::submit(service, json).await
}

async fn select_school_handler(
    Extension(service): Extension<Arc<Service>>,
    json: axum::Json<SelectSchoolRequest>,
) -> Result<axum::Json<BookingFormDto>, super::error::Problem> {
    handlers::select_school(service, json).await
}

async fn search_schools_handler(
    Extension(service): Extension<Arc<Service>>,
    query: axum::extract::Query<handlers::SchoolSearchQuery>,
) -> Result<axum::Json<SchoolsListResponse>, super::error::Problem> {
    handlers::search_schools(service, query).await
}

async fn billing_address_handler(
    Extension(service): Extension<Arc<Service>>,
    path: axum::extract::Path<i64>,
) -> Result<axum::Json<BillingAddressDto>, super::error::Problem> {
    handlers::billing_address(service, path).await
}

async fn list_categories_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<axum::Json<CategoriesListResponse>, super::error::Problem> {
    handlers::list_categories(service).await
}

async fn list_resources_handler(
    Extension(service): Extension<Arc<Service>>,
    query: axum::extract::Query<handlers::ListResourcesQuery>,
) -> Result<axum::Json<ResourcesListResponse>, super::error::Problem> {
    handlers::list_resources(service, query).await
}
