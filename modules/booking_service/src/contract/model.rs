//! Contract models for booking service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - the REST layer owns the wire representation.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a record held by the remote record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wizard step of an in-progress booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FormStep {
    /// Group composition (counts, categories, resource choice)
    #[default]
    Groups,
    /// Teacher, school and billing details
    Contact,
    /// Final overview, availability re-check and submission
    Confirm,
}

impl FormStep {
    /// Step following this one, if any
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Groups => Some(Self::Contact),
            Self::Contact => Some(Self::Confirm),
            Self::Confirm => None,
        }
    }

    /// Step preceding this one, if any
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Groups => None,
            Self::Contact => Some(Self::Groups),
            Self::Confirm => Some(Self::Contact),
        }
    }
}

/// One requested allocation of people against a scheduled resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// Number of students (required, at least 1)
    pub students: Option<u32>,
    /// Number of supervisors (required, may be 0)
    pub supervisors: Option<u32>,
    /// Selected category values
    pub categories: BTreeSet<String>,
    /// Free-text justification, required for restricted categories
    pub justification: String,
    /// Selected region
    pub region: Option<String>,
    /// Selected scheduled resource
    pub resource: Option<RecordId>,
}

impl Group {
    /// Total number of people in the group
    pub fn headcount(&self) -> u32 {
        self.students
            .unwrap_or(0)
            .saturating_add(self.supervisors.unwrap_or(0))
    }
}

/// The submitting teacher
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Teacher {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Work email address
    pub email: String,
    /// Mobile phone number
    pub phone: String,
    /// Newsletter opt-in
    pub newsletter: bool,
}

impl Teacher {
    /// Display name: non-empty name parts joined by single spaces
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An organisation already known to the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingSchool {
    pub id: RecordId,
    pub display_name: String,
    /// Billing address on file, if the lookup found one
    pub known_billing_address: Option<String>,
}

/// Manually entered school that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewSchool {
    pub name: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    /// Optional school type value
    pub school_type: Option<String>,
}

/// Where the invoice should be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingAddressSource {
    /// Use the school's known billing address
    #[default]
    SameAsSchool,
    /// Use the manually entered billing address
    Different,
}

/// School resolution and billing details
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchoolSelection {
    /// Existing organisation picked from the lookup
    pub existing: Option<ExistingSchool>,
    /// "My school is not listed" flag, activates manual entry
    pub not_listed: bool,
    /// Manual entry fields
    pub new_school: NewSchool,
    pub billing_source: BillingAddressSource,
    /// Manually entered billing address
    pub billing_address: String,
    /// Reference to print on the invoice
    pub billing_reference: String,
    /// Invoice email override
    pub billing_email: String,
}

impl SchoolSelection {
    /// Whether the invoice goes to the address on file for the selected school.
    ///
    /// Manual entry has no address on file, so it always bills the typed address.
    pub fn bills_school_address(&self) -> bool {
        self.billing_source == BillingAddressSource::SameAsSchool && !self.not_listed
    }
}

/// Payment choice
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payment {
    /// Alternate payment method selected (requires a reference)
    pub alternate: bool,
    pub reference: String,
}

/// Consent flags, all of which must be given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Consents {
    pub terms: bool,
    pub privacy: bool,
}

/// Complete in-progress booking state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingForm {
    pub step: FormStep,
    pub groups: Vec<Group>,
    pub teacher: Teacher,
    pub school: SchoolSelection,
    pub payment: Payment,
    pub consents: Consents,
    pub comments: String,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            step: FormStep::Groups,
            groups: vec![Group::default()],
            teacher: Teacher::default(),
            school: SchoolSelection::default(),
            payment: Payment::default(),
            consents: Consents::default(),
            comments: String::new(),
        }
    }
}

// ===== Field keys =====

/// Group sub-form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    Students,
    Supervisors,
    Headcount,
    Categories,
    Justification,
    Region,
    Resource,
}

/// Teacher fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeacherField {
    FirstName,
    LastName,
    Email,
    Phone,
}

/// School and billing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchoolField {
    Lookup,
    Name,
    StreetAddress,
    PostalCode,
    City,
    BillingAddress,
    BillingEmail,
}

/// Consent fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentField {
    Terms,
    Privacy,
}

/// Identifies the input a validation error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// The group list as a whole
    Groups,
    Group { index: usize, field: GroupField },
    Teacher(TeacherField),
    School(SchoolField),
    PaymentReference,
    Consent(ConsentField),
}

impl FieldKey {
    /// Step the field is rendered on
    pub fn step(&self) -> FormStep {
        match self {
            Self::Groups | Self::Group { .. } => FormStep::Groups,
            _ => FormStep::Contact,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groups => write!(f, "groups"),
            Self::Group { index, field } => {
                let name = match field {
                    GroupField::Students => "students",
                    GroupField::Supervisors => "supervisors",
                    GroupField::Headcount => "headcount",
                    GroupField::Categories => "categories",
                    GroupField::Justification => "justification",
                    GroupField::Region => "region",
                    GroupField::Resource => "resource",
                };
                write!(f, "groups[{}].{}", index, name)
            }
            Self::Teacher(field) => {
                let name = match field {
                    TeacherField::FirstName => "first_name",
                    TeacherField::LastName => "last_name",
                    TeacherField::Email => "email",
                    TeacherField::Phone => "phone",
                };
                write!(f, "teacher.{}", name)
            }
            Self::School(field) => {
                let name = match field {
                    SchoolField::Lookup => "lookup",
                    SchoolField::Name => "name",
                    SchoolField::StreetAddress => "street_address",
                    SchoolField::PostalCode => "postal_code",
                    SchoolField::City => "city",
                    SchoolField::BillingAddress => "billing_address",
                    SchoolField::BillingEmail => "billing_email",
                };
                write!(f, "school.{}", name)
            }
            Self::PaymentReference => write!(f, "payment.reference"),
            Self::Consent(field) => {
                let name = match field {
                    ConsentField::Terms => "terms",
                    ConsentField::Privacy => "privacy",
                };
                write!(f, "consents.{}", name)
            }
        }
    }
}

impl std::str::FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || format!("unknown field '{}'", s);

        if s == "groups" {
            return Ok(Self::Groups);
        }
        if s == "payment.reference" {
            return Ok(Self::PaymentReference);
        }

        if let Some(rest) = s.strip_prefix("groups[") {
            let (index, field) = rest.split_once("].").ok_or_else(unknown)?;
            let index: usize = index.parse().map_err(|_| unknown())?;
            let field = match field {
                "students" => GroupField::Students,
                "supervisors" => GroupField::Supervisors,
                "headcount" => GroupField::Headcount,
                "categories" => GroupField::Categories,
                "justification" => GroupField::Justification,
                "region" => GroupField::Region,
                "resource" => GroupField::Resource,
                _ => return Err(unknown()),
            };
            return Ok(Self::Group { index, field });
        }

        let (scope, name) = s.split_once('.').ok_or_else(unknown)?;
        match (scope, name) {
            ("teacher", "first_name") => Ok(Self::Teacher(TeacherField::FirstName)),
            ("teacher", "last_name") => Ok(Self::Teacher(TeacherField::LastName)),
            ("teacher", "email") => Ok(Self::Teacher(TeacherField::Email)),
            ("teacher", "phone") => Ok(Self::Teacher(TeacherField::Phone)),
            ("school", "lookup") => Ok(Self::School(SchoolField::Lookup)),
            ("school", "name") => Ok(Self::School(SchoolField::Name)),
            ("school", "street_address") => Ok(Self::School(SchoolField::StreetAddress)),
            ("school", "postal_code") => Ok(Self::School(SchoolField::PostalCode)),
            ("school", "city") => Ok(Self::School(SchoolField::City)),
            ("school", "billing_address") => Ok(Self::School(SchoolField::BillingAddress)),
            ("school", "billing_email") => Ok(Self::School(SchoolField::BillingEmail)),
            ("consents", "terms") => Ok(Self::Consent(ConsentField::Terms)),
            ("consents", "privacy") => Ok(Self::Consent(ConsentField::Privacy)),
            _ => Err(unknown()),
        }
    }
}

/// Validation error attached to a single input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FieldKey,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FieldKey, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ===== Reference data =====

/// Bookable time-and-place slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledResource {
    pub id: RecordId,
    pub title: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub categories: Vec<String>,
    /// Remaining capacity; `None` means unconstrained
    pub available: Option<u32>,
}

/// Organisation lookup hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolSummary {
    pub id: RecordId,
    pub display_name: String,
    pub city: Option<String>,
}

/// Selectable group category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub value: String,
    pub label: String,
    /// Whether choosing it makes a justification mandatory
    pub restricted: bool,
}

// ===== Availability =====

/// Requested headcount of one group against one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Zero-based group index
    pub group: usize,
    pub resource: RecordId,
    pub requested: u32,
}

/// A request that exceeds the resource's remaining capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub resource: RecordId,
    pub available: u32,
    pub requested: u32,
}

/// Result of the capacity re-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityReport {
    /// True when no request conflicts
    pub available: bool,
    pub conflicts: Vec<Conflict>,
}

// ===== Submission =====

/// Record-creation step of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStep {
    CreateOrganisation,
    CreatePerson,
    CreateBooking,
    CreateLinks,
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateOrganisation => "Creating the school",
            Self::CreatePerson => "Creating the teacher",
            Self::CreateBooking => "Creating the booking",
            Self::CreateLinks => "Linking the groups",
        };
        f.write_str(name)
    }
}

/// Terminal state of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success {
        booking_id: RecordId,
    },
    Failed {
        /// Step that failed; `None` for unclassified failures
        step: Option<SubmissionStep>,
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
