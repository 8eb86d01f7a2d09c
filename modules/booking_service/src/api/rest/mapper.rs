//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;

// ===== Form conversions =====

impl From<FormStepDto> for contract::FormStep {
    fn from(step: FormStepDto) -> Self {
        match step {
            FormStepDto::Groups => Self::Groups,
            FormStepDto::Contact => Self::Contact,
            FormStepDto::Confirm => Self::Confirm,
        }
    }
}

impl From<contract::FormStep> for FormStepDto {
    fn from(step: contract::FormStep) -> Self {
        match step {
            contract::FormStep::Groups => Self::Groups,
            contract::FormStep::Contact => Self::Contact,
            contract::FormStep::Confirm => Self::Confirm,
        }
    }
}

/// Convert an entered count, rejecting negatives and values beyond `u32`
fn count(
    value: Option<i64>,
    index: usize,
    field: contract::GroupField,
    label: &str,
    errors: &mut Vec<contract::FieldError>,
) -> Option<u32> {
    let value = value?;
    match u32::try_from(value) {
        Ok(n) => Some(n),
        Err(_) => {
            let message = if value < 0 {
                format!("Number of {} must be zero or more", label)
            } else {
                format!("Number of {} is too large", label)
            };
            errors.push(contract::FieldError::new(
                contract::FieldKey::Group { index, field },
                message,
            ));
            None
        }
    }
}

fn group_from_dto(
    index: usize,
    dto: GroupDto,
    errors: &mut Vec<contract::FieldError>,
) -> contract::Group {
    contract::Group {
        students: count(dto.students, index, contract::GroupField::Students, "students", errors),
        supervisors: count(
            dto.supervisors,
            index,
            contract::GroupField::Supervisors,
            "supervisors",
            errors,
        ),
        categories: dto.categories.into_iter().collect(),
        justification: dto.justification,
        region: dto.region,
        resource: dto.resource_id.map(contract::RecordId),
    }
}

impl From<contract::Group> for GroupDto {
    fn from(group: contract::Group) -> Self {
        Self {
            students: group.students.map(i64::from),
            supervisors: group.supervisors.map(i64::from),
            categories: group.categories.into_iter().collect(),
            justification: group.justification,
            region: group.region,
            resource_id: group.resource.map(|id| id.0),
        }
    }
}

impl From<TeacherDto> for contract::Teacher {
    fn from(dto: TeacherDto) -> Self {
        Self {
            first_name: dto.first_name,
            middle_name: dto.middle_name,
            last_name: dto.last_name,
            email: dto.email,
            phone: dto.phone,
            newsletter: dto.newsletter,
        }
    }
}

impl From<contract::Teacher> for TeacherDto {
    fn from(teacher: contract::Teacher) -> Self {
        Self {
            first_name: teacher.first_name,
            middle_name: teacher.middle_name,
            last_name: teacher.last_name,
            email: teacher.email,
            phone: teacher.phone,
            newsletter: teacher.newsletter,
        }
    }
}

impl From<SchoolSelectionDto> for contract::SchoolSelection {
    fn from(dto: SchoolSelectionDto) -> Self {
        Self {
            existing: dto.existing.map(|existing| contract::ExistingSchool {
                id: contract::RecordId(existing.id),
                display_name: existing.display_name,
                known_billing_address: existing.known_billing_address,
            }),
            not_listed: dto.not_listed,
            new_school: contract::NewSchool {
                name: dto.new_school.name,
                street_address: dto.new_school.street_address,
                postal_code: dto.new_school.postal_code,
                city: dto.new_school.city,
                school_type: dto.new_school.school_type,
            },
            billing_source: match dto.billing_source {
                BillingAddressSourceDto::SameAsSchool => {
                    contract::BillingAddressSource::SameAsSchool
                }
                BillingAddressSourceDto::Different => contract::BillingAddressSource::Different,
            },
            billing_address: dto.billing_address,
            billing_reference: dto.billing_reference,
            billing_email: dto.billing_email,
        }
    }
}

impl From<contract::SchoolSelection> for SchoolSelectionDto {
    fn from(school: contract::SchoolSelection) -> Self {
        Self {
            existing: school.existing.map(|existing| ExistingSchoolDto {
                id: existing.id.0,
                display_name: existing.display_name,
                known_billing_address: existing.known_billing_address,
            }),
            not_listed: school.not_listed,
            new_school: NewSchoolDto {
                name: school.new_school.name,
                street_address: school.new_school.street_address,
                postal_code: school.new_school.postal_code,
                city: school.new_school.city,
                school_type: school.new_school.school_type,
            },
            billing_source: match school.billing_source {
                contract::BillingAddressSource::SameAsSchool => {
                    BillingAddressSourceDto::SameAsSchool
                }
                contract::BillingAddressSource::Different => BillingAddressSourceDto::Different,
            },
            billing_address: school.billing_address,
            billing_reference: school.billing_reference,
            billing_email: school.billing_email,
        }
    }
}

impl TryFrom<BookingFormDto> for contract::BookingForm {
    type Error = contract::BookingError;

    fn try_from(dto: BookingFormDto) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        let groups = dto
            .groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| group_from_dto(index, group, &mut errors))
            .collect();
        if !errors.is_empty() {
            return Err(contract::BookingError::Validation { errors });
        }

        Ok(Self {
            step: dto.step.into(),
            groups,
            teacher: dto.teacher.into(),
            school: dto.school.into(),
            payment: contract::Payment {
                alternate: dto.payment.alternate,
                reference: dto.payment.reference,
            },
            consents: contract::Consents {
                terms: dto.consents.terms,
                privacy: dto.consents.privacy,
            },
            comments: dto.comments,
        })
    }
}

impl From<contract::BookingForm> for BookingFormDto {
    fn from(form: contract::BookingForm) -> Self {
        Self {
            step: form.step.into(),
            groups: form.groups.into_iter().map(Into::into).collect(),
            teacher: form.teacher.into(),
            school: form.school.into(),
            payment: PaymentDto {
                alternate: form.payment.alternate,
                reference: form.payment.reference,
            },
            consents: ConsentsDto {
                terms: form.consents.terms,
                privacy: form.consents.privacy,
            },
            comments: form.comments,
        }
    }
}

// ===== Validation / availability / submission conversions =====

impl From<contract::FieldError> for FieldErrorDto {
    fn from(error: contract::FieldError) -> Self {
        Self {
            field: error.field.to_string(),
            message: error.message,
        }
    }
}

impl From<Vec<contract::FieldError>> for ValidationResponse {
    fn from(errors: Vec<contract::FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::Conflict> for ConflictDto {
    fn from(conflict: contract::Conflict) -> Self {
        Self {
            resource_id: conflict.resource.0,
            available: conflict.available,
            requested: conflict.requested,
        }
    }
}

impl From<contract::AvailabilityReport> for AvailabilityReportDto {
    fn from(report: contract::AvailabilityReport) -> Self {
        Self {
            available: report.available,
            conflicts: report.conflicts.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::SubmissionOutcome> for SubmissionOutcomeDto {
    fn from(outcome: contract::SubmissionOutcome) -> Self {
        match outcome {
            contract::SubmissionOutcome::Success { booking_id } => Self::Success {
                booking_id: booking_id.0,
            },
            contract::SubmissionOutcome::Failed { step, message } => Self::Failed {
                step: step.map(|s| {
                    match s {
                        contract::SubmissionStep::CreateOrganisation => "create_organisation",
                        contract::SubmissionStep::CreatePerson => "create_person",
                        contract::SubmissionStep::CreateBooking => "create_booking",
                        contract::SubmissionStep::CreateLinks => "create_links",
                    }
                    .to_string()
                }),
                message,
            },
        }
    }
}

// ===== Lookup conversions =====

impl From<contract::SchoolSummary> for SchoolSummaryDto {
    fn from(school: contract::SchoolSummary) -> Self {
        Self {
            id: school.id.0,
            display_name: school.display_name,
            city: school.city,
        }
    }
}

impl From<SchoolSummaryDto> for contract::SchoolSummary {
    fn from(dto: SchoolSummaryDto) -> Self {
        Self {
            id: contract::RecordId(dto.id),
            display_name: dto.display_name,
            city: dto.city,
        }
    }
}

impl From<contract::Category> for CategoryDto {
    fn from(category: contract::Category) -> Self {
        Self {
            value: category.value,
            label: category.label,
            restricted: category.restricted,
        }
    }
}

impl From<contract::ScheduledResource> for ScheduledResourceDto {
    fn from(resource: contract::ScheduledResource) -> Self {
        Self {
            id: resource.id.0,
            title: resource.title,
            starts_at: resource.starts_at,
            region: resource.region,
            categories: resource.categories,
            available: resource.available,
        }
    }
}
