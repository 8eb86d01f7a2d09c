//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ===== Form DTOs =====

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormStepDto {
    #[default]
    Groups,
    Contact,
    Confirm,
}

/// One group of students and supervisors
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GroupDto {
    /// Number of students; signed so a negative entry is reported per field
    #[schema(example = 30)]
    pub students: Option<i64>,

    /// Number of supervisors
    #[schema(example = 5)]
    pub supervisors: Option<i64>,

    /// Selected category values
    pub categories: Vec<String>,

    /// Justification for restricted categories
    pub justification: String,

    /// Selected region
    pub region: Option<String>,

    /// Selected scheduled resource
    pub resource_id: Option<i64>,
}

/// Submitting teacher
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TeacherDto {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    #[schema(example = "a.devries@lyceum.nl")]
    pub email: String,
    pub phone: String,
    pub newsletter: bool,
}

/// School picked from the lookup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExistingSchoolDto {
    pub id: i64,
    pub display_name: String,
    #[serde(default)]
    pub known_billing_address: Option<String>,
}

/// Manually entered school
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewSchoolDto {
    pub name: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub school_type: Option<String>,
}

/// Billing address source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingAddressSourceDto {
    #[default]
    SameAsSchool,
    Different,
}

/// School resolution and billing details
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SchoolSelectionDto {
    pub existing: Option<ExistingSchoolDto>,
    pub not_listed: bool,
    pub new_school: NewSchoolDto,
    pub billing_source: BillingAddressSourceDto,
    pub billing_address: String,
    pub billing_reference: String,
    pub billing_email: String,
}

/// Payment choice
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PaymentDto {
    pub alternate: bool,
    pub reference: String,
}

/// Consent flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ConsentsDto {
    pub terms: bool,
    pub privacy: bool,
}

/// Complete booking form state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookingFormDto {
    pub step: FormStepDto,
    pub groups: Vec<GroupDto>,
    pub teacher: TeacherDto,
    pub school: SchoolSelectionDto,
    pub payment: PaymentDto,
    pub consents: ConsentsDto,
    pub comments: String,
}

impl Default for BookingFormDto {
    fn default() -> Self {
        Self {
            step: FormStepDto::default(),
            groups: vec![GroupDto::default()],
            teacher: TeacherDto::default(),
            school: SchoolSelectionDto::default(),
            payment: PaymentDto::default(),
            consents: ConsentsDto::default(),
            comments: String::new(),
        }
    }
}

// ===== Validation DTOs =====

/// Error attached to one input
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorDto {
    /// Field path
    #[schema(example = "groups[0].justification")]
    pub field: String,
    pub message: String,
}

/// Validation result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<FieldErrorDto>,
}

// ===== Availability DTOs =====

/// Over-subscribed resource
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConflictDto {
    pub resource_id: i64,
    pub available: u32,
    pub requested: u32,
}

/// Capacity re-check result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityReportDto {
    pub available: bool,
    pub conflicts: Vec<ConflictDto>,
}

// ===== Submission DTOs =====

/// Terminal state of a submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcomeDto {
    Success {
        booking_id: i64,
    },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<String>,
        message: String,
    },
}

// ===== Lookup DTOs =====

/// Organisation lookup hit
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchoolSummaryDto {
    pub id: i64,
    pub display_name: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Schools search response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchoolsListResponse {
    pub items: Vec<SchoolSummaryDto>,
    pub total: usize,
}

/// Known billing address of a school
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingAddressDto {
    pub school_id: i64,
    pub address: Option<String>,
}

/// Select-school request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectSchoolRequest {
    pub form: BookingFormDto,
    pub school: SchoolSummaryDto,
}

/// Group category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub value: String,
    pub label: String,
    pub restricted: bool,
}

/// Categories list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoriesListResponse {
    pub items: Vec<CategoryDto>,
    pub total: usize,
}

/// Scheduled resource
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduledResourceDto {
    pub id: i64,
    pub title: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub categories: Vec<String>,
    /// Remaining capacity, absent when unconstrained
    pub available: Option<u32>,
}

/// Resources list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourcesListResponse {
    pub items: Vec<ScheduledResourceDto>,
    pub total: usize,
}
