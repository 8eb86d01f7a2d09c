//! Dependent-record builder
//!
//! Pure transformation from a validated form into the field maps sent to the
//! record store. Record references that only exist after creation (teacher,
//! organisation, booking) are left out and injected by the orchestrator.

use super::backend::Fields;
use crate::contract::{BookingForm, Group, RecordId, SchoolSelection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Field names shared with the orchestrator
pub mod field {
    pub const BOOKING_TEACHER: &str = "teacher_contact_id";
    pub const BOOKING_ORGANISATION: &str = "organisation_id";
    pub const LINK_BOOKING: &str = "aanmelding_id";
    pub const BOOKING_SCHOOL: &str = "school_id";
    pub const BOOKING_SCHOOL_NAME: &str = "school_name";
    pub const BOOKING_BILLING_ADDRESS: &str = "billing_address";
    pub const PERSON_OTHER_SCHOOL: &str = "other_school";
}

/// Hidden status fields stamped on every booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingDefaults {
    /// Initial booking status
    #[serde(default = "default_status")]
    pub status: String,
    /// Origin marker
    #[serde(default = "default_source")]
    pub source: String,
    /// Contact sub-type of the submitting teacher
    #[serde(default = "default_person_role")]
    pub person_role: String,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self {
            status: default_status(),
            source: default_source(),
            person_role: default_person_role(),
        }
    }
}

fn default_status() -> String {
    "pending".to_string()
}

fn default_source() -> String {
    "web-form".to_string()
}

fn default_person_role() -> String {
    "Teacher".to_string()
}

/// How the booking's organisation reference is obtained
#[derive(Debug, Clone, PartialEq)]
pub enum OrganisationPlan {
    /// Reuse a school that already exists
    Existing(RecordId),
    /// Create a new organisation from manual entry
    Create(Fields),
}

/// Every payload of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPlan {
    pub organisation: OrganisationPlan,
    pub person: Fields,
    pub booking: Fields,
    /// One per group, in group order
    pub links: Vec<Fields>,
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn optional_text(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// One-line description of a manually entered school
fn manual_school_text(school: &SchoolSelection) -> String {
    let manual = &school.new_school;
    format!(
        "{}, {}, {} {}",
        manual.name.trim(),
        manual.street_address.trim(),
        manual.postal_code.trim(),
        manual.city.trim()
    )
}

/// Organisation payload, or the existing school to reuse
pub fn organisation_plan(school: &SchoolSelection) -> OrganisationPlan {
    match (&school.existing, school.not_listed) {
        (Some(existing), false) => OrganisationPlan::Existing(existing.id),
        _ => {
            let manual = &school.new_school;
            OrganisationPlan::Create(fields(json!({
                "contact_type": "Organization",
                "contact_sub_type": "School",
                "organization_name": manual.name.trim(),
                "school_type": manual.school_type,
                "address_primary.street_address": manual.street_address.trim(),
                "address_primary.postal_code": manual.postal_code.trim(),
                "address_primary.city": manual.city.trim(),
            })))
        }
    }
}

/// Teacher payload
pub fn person_payload(form: &BookingForm, defaults: &BookingDefaults) -> Fields {
    let teacher = &form.teacher;
    let mut payload = fields(json!({
        "contact_type": "Individual",
        "contact_sub_type": defaults.person_role,
        "first_name": teacher.first_name.trim(),
        "middle_name": optional_text(&teacher.middle_name),
        "last_name": teacher.last_name.trim(),
        "email_primary.email": teacher.email.trim(),
        "phone_primary.phone": teacher.phone.trim(),
        "newsletter": teacher.newsletter,
    }));

    // lets the backend accept a teacher whose school has no record yet
    if form.school.not_listed {
        payload.insert(
            field::PERSON_OTHER_SCHOOL.to_string(),
            Value::String(manual_school_text(&form.school)),
        );
    }
    payload
}

/// Booking payload without teacher and organisation references
pub fn booking_payload(form: &BookingForm, defaults: &BookingDefaults) -> Fields {
    let teacher = &form.teacher;
    let school = &form.school;
    let same_as_school = school.bills_school_address();

    let mut payload = fields(json!({
        "teacher_name": teacher.display_name(),
        "teacher_email": teacher.email.trim(),
        "teacher_phone": teacher.phone.trim(),
        "billing_same_as_school": same_as_school,
        "billing_reference": optional_text(&school.billing_reference),
        "billing_email": optional_text(&school.billing_email),
        "payment_method": if form.payment.alternate { "alternate" } else { "invoice" },
        "payment_reference": if form.payment.alternate {
            optional_text(&form.payment.reference)
        } else {
            Value::Null
        },
        "comments": optional_text(&form.comments),
        "terms_accepted": form.consents.terms,
        "privacy_accepted": form.consents.privacy,
        "status": defaults.status,
        "source": defaults.source,
    }));

    match (&school.existing, school.not_listed) {
        (Some(existing), false) => {
            payload.insert(field::BOOKING_SCHOOL.to_string(), json!(existing.id.0));
        }
        _ => {
            payload.insert(
                field::BOOKING_SCHOOL_NAME.to_string(),
                Value::String(manual_school_text(school)),
            );
        }
    }

    // stale manual text must not leak into a same-as-school submission
    let billing_address = if same_as_school {
        Value::Null
    } else {
        optional_text(&school.billing_address)
    };
    payload.insert(field::BOOKING_BILLING_ADDRESS.to_string(), billing_address);

    payload
}

/// Link payload for one group, without the booking reference
pub fn link_payload(group: &Group) -> Fields {
    let categories: Vec<&str> = group.categories.iter().map(String::as_str).collect();
    fields(json!({
        "event_id": group.resource.map(|id| id.0),
        "students": group.students.unwrap_or(0),
        "supervisors": group.supervisors.unwrap_or(0),
        "categories": categories,
        "justification": optional_text(&group.justification),
        "region": group.region,
    }))
}

/// Build every payload of a submission
pub fn build_plan(form: &BookingForm, defaults: &BookingDefaults) -> SubmissionPlan {
    SubmissionPlan {
        organisation: organisation_plan(&form.school),
        person: person_payload(form, defaults),
        booking: booking_payload(form, defaults),
        links: form.groups.iter().map(link_payload).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{BillingAddressSource, ExistingSchool, NewSchool};
    use std::collections::BTreeSet;

    fn form_with_existing_school() -> BookingForm {
        let mut form = BookingForm::default();
        form.teacher.first_name = "Anna".to_string();
        form.teacher.middle_name = "de".to_string();
        form.teacher.last_name = "Vries".to_string();
        form.teacher.email = "a.devries@lyceum.nl".to_string();
        form.teacher.phone = "0612345678".to_string();
        form.school.existing = Some(ExistingSchool {
            id: RecordId(501),
            display_name: "Het Lyceum".to_string(),
            known_billing_address: Some("Schoolstraat 1, 3511 AB Utrecht".to_string()),
        });
        form
    }

    #[test]
    fn test_booking_uses_existing_school_reference() {
        let form = form_with_existing_school();
        let booking = booking_payload(&form, &BookingDefaults::default());

        assert_eq!(booking["teacher_name"], json!("Anna de Vries"));
        assert_eq!(booking[field::BOOKING_SCHOOL], json!(501));
        assert!(!booking.contains_key(field::BOOKING_SCHOOL_NAME));
        assert!(!booking.contains_key(field::BOOKING_TEACHER));
        assert!(!booking.contains_key(field::BOOKING_ORGANISATION));
        assert_eq!(booking["status"], json!("pending"));
        assert_eq!(
            organisation_plan(&form.school),
            OrganisationPlan::Existing(RecordId(501))
        );
    }

    #[test]
    fn test_billing_address_nulled_when_same_as_school() {
        let mut form = form_with_existing_school();
        form.school.billing_source = BillingAddressSource::Different;
        form.school.billing_address = "Postbus 12, Utrecht".to_string();
        let booking = booking_payload(&form, &BookingDefaults::default());
        assert_eq!(booking[field::BOOKING_BILLING_ADDRESS], json!("Postbus 12, Utrecht"));

        form.school.billing_source = BillingAddressSource::SameAsSchool;
        let booking = booking_payload(&form, &BookingDefaults::default());
        assert_eq!(booking[field::BOOKING_BILLING_ADDRESS], Value::Null);
        assert_eq!(booking["billing_same_as_school"], json!(true));
    }

    #[test]
    fn test_manual_school_paths() {
        let mut form = form_with_existing_school();
        form.mark_not_listed();
        form.school.new_school = NewSchool {
            name: "De Nieuwe School".to_string(),
            street_address: "Laan 4".to_string(),
            postal_code: "1234 AB".to_string(),
            city: "Amersfoort".to_string(),
            school_type: Some("primary".to_string()),
        };

        let plan = build_plan(&form, &BookingDefaults::default());
        match &plan.organisation {
            OrganisationPlan::Create(org) => {
                assert_eq!(org["organization_name"], json!("De Nieuwe School"));
                assert_eq!(org["school_type"], json!("primary"));
            }
            other => panic!("expected organisation creation, got {:?}", other),
        }
        assert_eq!(
            plan.person[field::PERSON_OTHER_SCHOOL],
            json!("De Nieuwe School, Laan 4, 1234 AB Amersfoort")
        );
        assert!(!plan.booking.contains_key(field::BOOKING_SCHOOL));
        assert!(plan.booking.contains_key(field::BOOKING_SCHOOL_NAME));
    }

    #[test]
    fn test_manual_school_sends_typed_billing_address() {
        let mut form = form_with_existing_school();
        form.school.existing = None;
        form.school.not_listed = true;
        form.school.billing_source = BillingAddressSource::SameAsSchool;
        form.school.billing_address = "Postbus 1, 3800 AA Amersfoort".to_string();

        let booking = booking_payload(&form, &BookingDefaults::default());
        assert_eq!(
            booking[field::BOOKING_BILLING_ADDRESS],
            json!("Postbus 1, 3800 AA Amersfoort")
        );
        assert_eq!(booking["billing_same_as_school"], json!(false));
    }

    #[test]
    fn test_payment_reference_only_for_alternate_method() {
        let mut form = form_with_existing_school();
        form.payment.reference = "PO-778".to_string();
        let booking = booking_payload(&form, &BookingDefaults::default());
        assert_eq!(booking["payment_method"], json!("invoice"));
        assert_eq!(booking["payment_reference"], Value::Null);

        form.payment.alternate = true;
        let booking = booking_payload(&form, &BookingDefaults::default());
        assert_eq!(booking["payment_method"], json!("alternate"));
        assert_eq!(booking["payment_reference"], json!("PO-778"));
    }

    #[test]
    fn test_link_payload() {
        let group = Group {
            students: Some(28),
            supervisors: Some(3),
            categories: BTreeSet::from(["secondary".to_string(), "other".to_string()]),
            justification: " Exchange students ".to_string(),
            region: Some("north".to_string()),
            resource: Some(RecordId(77)),
        };
        let link = link_payload(&group);
        assert_eq!(link["event_id"], json!(77));
        assert_eq!(link["students"], json!(28));
        assert_eq!(link["categories"], json!(["other", "secondary"]));
        assert_eq!(link["justification"], json!("Exchange students"));
        assert!(!link.contains_key(field::LINK_BOOKING));
    }
}
