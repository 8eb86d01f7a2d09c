//! Validation gate for step transitions and final submission
//!
//! Every check is a pure function of the current form snapshot. Nothing is
//! cached, so a check never reports stale results.

use crate::contract::{
    BookingForm, ConsentField, FieldError, FieldKey, FormStep, Group,
    GroupField, SchoolField, SchoolSelection, TeacherField,
};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)*\.[A-Za-z]{2,}$").ok());

/// Limits applied by the validation gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Maximum students + supervisors per group
    pub max_group_size: u32,
    /// Maximum number of groups per booking
    pub max_groups: usize,
    /// Categories that require a justification
    pub restricted_categories: BTreeSet<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_group_size: 340,
            max_groups: 3,
            restricted_categories: BTreeSet::from(["other".to_string()]),
        }
    }
}

/// Check an email address against the accepted pattern
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email.trim()))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Whether the group's categories make a justification mandatory
pub fn justification_required(group: &Group, rules: &ValidationRules) -> bool {
    group
        .categories
        .iter()
        .any(|category| rules.restricted_categories.contains(category))
}

/// Whether the manual billing address must be filled in
///
/// Required when a different address was chosen, when the school is entered
/// manually, or when the selected school has no known billing address.
pub fn billing_address_required(school: &SchoolSelection) -> bool {
    if !school.bills_school_address() {
        return true;
    }
    school
        .existing
        .as_ref()
        .and_then(|existing| existing.known_billing_address.as_deref())
        .map_or(true, is_blank)
}

/// Validate a single group sub-form
pub fn validate_group(index: usize, group: &Group, rules: &ValidationRules) -> Vec<FieldError> {
    let key = |field| FieldKey::Group { index, field };
    let mut errors = Vec::new();

    match group.students {
        None => errors.push(FieldError::new(
            key(GroupField::Students),
            "Number of students is required",
        )),
        Some(0) => errors.push(FieldError::new(
            key(GroupField::Students),
            "At least one student is required",
        )),
        Some(_) => {}
    }

    if group.supervisors.is_none() {
        errors.push(FieldError::new(
            key(GroupField::Supervisors),
            "Number of supervisors is required",
        ));
    }

    if group.headcount() > rules.max_group_size {
        errors.push(FieldError::new(
            key(GroupField::Headcount),
            format!(
                "A group can have at most {} students and supervisors together",
                rules.max_group_size
            ),
        ));
    }

    if group.categories.is_empty() {
        errors.push(FieldError::new(
            key(GroupField::Categories),
            "Select at least one category",
        ));
    }

    if justification_required(group, rules) && is_blank(&group.justification) {
        errors.push(FieldError::new(
            key(GroupField::Justification),
            "Explain why the selected category applies to this group",
        ));
    }

    if group.region.as_deref().map_or(true, is_blank) {
        errors.push(FieldError::new(key(GroupField::Region), "Select a region"));
    }

    if group.resource.is_none() {
        errors.push(FieldError::new(key(GroupField::Resource), "Select a date"));
    }

    errors
}

/// Step 1: every group, touched or not
pub fn validate_groups(form: &BookingForm, rules: &ValidationRules) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if form.groups.is_empty() {
        errors.push(FieldError::new(
            FieldKey::Groups,
            "At least one group is required",
        ));
    } else if form.groups.len() > rules.max_groups {
        errors.push(FieldError::new(
            FieldKey::Groups,
            format!("At most {} groups can be booked at once", rules.max_groups),
        ));
    }

    for (index, group) in form.groups.iter().enumerate() {
        errors.extend(validate_group(index, group, rules));
    }

    errors
}

fn validate_school(school: &SchoolSelection, errors: &mut Vec<FieldError>) {
    if school.not_listed {
        if school.existing.is_some() {
            errors.push(FieldError::new(
                FieldKey::School(SchoolField::Lookup),
                "Choose an existing school or enter a new one, not both",
            ));
        }

        let manual = &school.new_school;
        let required = [
            (&manual.name, SchoolField::Name, "School name is required"),
            (&manual.street_address, SchoolField::StreetAddress, "Street address is required"),
            (&manual.postal_code, SchoolField::PostalCode, "Postal code is required"),
            (&manual.city, SchoolField::City, "City is required"),
        ];
        for (value, field, message) in required {
            if is_blank(value) {
                errors.push(FieldError::new(FieldKey::School(field), message));
            }
        }
    } else if school.existing.is_none() {
        errors.push(FieldError::new(
            FieldKey::School(SchoolField::Lookup),
            "Select your school or indicate that it is not listed",
        ));
    }

    if billing_address_required(school) {
        // same-as-school discards the manual address, so it needs an address on file
        if school.bills_school_address() {
            errors.push(FieldError::new(
                FieldKey::School(SchoolField::BillingAddress),
                "No billing address is on file for this school, enter a different billing address",
            ));
        } else if is_blank(&school.billing_address) {
            errors.push(FieldError::new(
                FieldKey::School(SchoolField::BillingAddress),
                "Billing address is required",
            ));
        }
    }

    if !is_blank(&school.billing_email) && !is_valid_email(&school.billing_email) {
        errors.push(FieldError::new(
            FieldKey::School(SchoolField::BillingEmail),
            "Enter a valid billing email address",
        ));
    }
}

/// Step 2: teacher, school, billing, payment and consents
pub fn validate_contact(form: &BookingForm, _rules: &ValidationRules) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let teacher = &form.teacher;

    if is_blank(&teacher.first_name) {
        errors.push(FieldError::new(
            FieldKey::Teacher(TeacherField::FirstName),
            "First name is required",
        ));
    }
    if is_blank(&teacher.last_name) {
        errors.push(FieldError::new(
            FieldKey::Teacher(TeacherField::LastName),
            "Last name is required",
        ));
    }
    if is_blank(&teacher.email) {
        errors.push(FieldError::new(
            FieldKey::Teacher(TeacherField::Email),
            "Email address is required",
        ));
    } else if !is_valid_email(&teacher.email) {
        errors.push(FieldError::new(
            FieldKey::Teacher(TeacherField::Email),
            "Enter a valid email address",
        ));
    }
    if is_blank(&teacher.phone) {
        errors.push(FieldError::new(
            FieldKey::Teacher(TeacherField::Phone),
            "Mobile phone number is required",
        ));
    }

    validate_school(&form.school, &mut errors);

    if form.payment.alternate && is_blank(&form.payment.reference) {
        errors.push(FieldError::new(
            FieldKey::PaymentReference,
            "A payment reference is required for this payment method",
        ));
    }

    if !form.consents.terms {
        errors.push(FieldError::new(
            FieldKey::Consent(ConsentField::Terms),
            "You must accept the terms and conditions",
        ));
    }
    if !form.consents.privacy {
        errors.push(FieldError::new(
            FieldKey::Consent(ConsentField::Privacy),
            "You must accept the privacy statement",
        ));
    }

    errors
}

/// Every check of every step
pub fn validate_all(form: &BookingForm, rules: &ValidationRules) -> Vec<FieldError> {
    let mut errors = validate_groups(form, rules);
    errors.extend(validate_contact(form, rules));
    errors
}

/// Checks gating departure from `step`
pub fn validate_step(form: &BookingForm, step: FormStep, rules: &ValidationRules) -> Vec<FieldError> {
    match step {
        FormStep::Groups => validate_groups(form, rules),
        FormStep::Contact => validate_contact(form, rules),
        FormStep::Confirm => validate_all(form, rules),
    }
}

/// Re-validate a single field (on-blur)
pub fn validate_field(
    form: &BookingForm,
    field: FieldKey,
    rules: &ValidationRules,
) -> Option<FieldError> {
    validate_step(form, field.step(), rules)
        .into_iter()
        .find(|error| error.field == field)
}
