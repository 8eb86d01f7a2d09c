//! In-progress booking state transitions
//!
//! The form is an explicit state container: every mutation goes through
//! these methods and validity is always derived from the current snapshot.

use super::validation::{validate_step, ValidationRules};
use crate::contract::{
    BillingAddressSource, BookingError, BookingForm, ExistingSchool, FieldError, FormStep, Group,
    SchoolSummary,
};

impl BookingForm {
    /// Append a group with default values, returning its index
    pub fn add_group(&mut self, rules: &ValidationRules) -> Result<usize, BookingError> {
        if self.groups.len() >= rules.max_groups {
            return Err(BookingError::InvalidTransition {
                reason: format!("At most {} groups can be booked at once", rules.max_groups),
            });
        }
        self.groups.push(Group::default());
        Ok(self.groups.len() - 1)
    }

    /// Remove a group; the last remaining group cannot be removed
    pub fn remove_group(&mut self, index: usize) -> Result<Group, BookingError> {
        if self.groups.len() <= 1 {
            return Err(BookingError::InvalidTransition {
                reason: "At least one group is required".to_string(),
            });
        }
        if index >= self.groups.len() {
            return Err(BookingError::InvalidTransition {
                reason: format!("Group {} does not exist", index + 1),
            });
        }
        Ok(self.groups.remove(index))
    }

    /// Discard everything and start over
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance when the current step is valid.
    ///
    /// On failure the step is left unchanged and every error of the step is
    /// returned at once, for all groups including untouched ones.
    pub fn go_to_next_step(&mut self, rules: &ValidationRules) -> Result<FormStep, Vec<FieldError>> {
        let errors = validate_step(self, self.step, rules);
        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Go back one step; a no-op on the first step
    pub fn go_to_previous_step(&mut self) -> FormStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Jump back to an earlier step (e.g. to fix a capacity conflict)
    pub fn go_to_step(&mut self, step: FormStep) -> Result<FormStep, BookingError> {
        if step > self.step {
            return Err(BookingError::InvalidTransition {
                reason: "Later steps can only be reached through validation".to_string(),
            });
        }
        self.step = step;
        Ok(self.step)
    }

    /// Select an existing school from the lookup and apply its billing default
    pub fn select_existing_school(
        &mut self,
        school: &SchoolSummary,
        known_billing_address: Option<String>,
    ) {
        self.school.not_listed = false;
        self.school.existing = Some(ExistingSchool {
            id: school.id,
            display_name: school.display_name.clone(),
            known_billing_address: None,
        });
        self.apply_known_billing_address(known_billing_address);
    }

    /// Switch to manual school entry
    pub fn mark_not_listed(&mut self) {
        self.school.existing = None;
        self.school.not_listed = true;
        self.school.billing_source = BillingAddressSource::Different;
    }

    /// Apply the result of the billing-address lookup.
    ///
    /// Without a known address the source falls back to `Different`, forcing
    /// manual entry.
    pub fn apply_known_billing_address(&mut self, address: Option<String>) {
        let address = address.filter(|a| !a.trim().is_empty());
        self.school.billing_source = if address.is_some() {
            BillingAddressSource::SameAsSchool
        } else {
            BillingAddressSource::Different
        };
        if let Some(existing) = self.school.existing.as_mut() {
            existing.known_billing_address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FieldKey, Group, GroupField, RecordId};
    use std::collections::BTreeSet;

    #[test]
    fn test_group_limits() {
        let rules = ValidationRules::default();
        let mut form = BookingForm::default();
        assert_eq!(form.groups.len(), 1);

        assert_eq!(form.add_group(&rules).unwrap(), 1);
        assert_eq!(form.add_group(&rules).unwrap(), 2);
        assert!(form.add_group(&rules).is_err());

        form.remove_group(0).unwrap();
        form.remove_group(0).unwrap();
        assert!(form.remove_group(0).is_err());
        assert_eq!(form.groups.len(), 1);
    }

    #[test]
    fn test_next_step_blocked_reports_all_groups() {
        let rules = ValidationRules::default();
        let mut form = BookingForm::default();
        form.add_group(&rules).unwrap();

        let errors = form.go_to_next_step(&rules).unwrap_err();
        assert_eq!(form.step, FormStep::Groups);
        for index in 0..2 {
            assert!(errors.iter().any(|e| e.field
                == FieldKey::Group {
                    index,
                    field: GroupField::Students
                }));
        }
    }

    #[test]
    fn test_restricted_groups_each_need_justification() {
        let rules = ValidationRules::default();
        let restricted = Group {
            students: Some(30),
            supervisors: Some(5),
            categories: BTreeSet::from(["other".to_string()]),
            justification: String::new(),
            region: Some("north".to_string()),
            resource: Some(RecordId(7)),
        };
        let mut form = BookingForm {
            groups: vec![restricted.clone(), restricted],
            ..BookingForm::default()
        };

        let errors = form.go_to_next_step(&rules).unwrap_err();
        assert_eq!(form.step, FormStep::Groups);
        let fields: Vec<String> = errors.iter().map(|e| e.field.to_string()).collect();
        assert_eq!(
            fields,
            vec!["groups[0].justification", "groups[1].justification"]
        );
    }

    #[test]
    fn test_go_to_step_only_backwards() {
        let mut form = BookingForm::default();
        assert!(form.go_to_step(FormStep::Confirm).is_err());
        form.step = FormStep::Confirm;
        assert_eq!(form.go_to_step(FormStep::Groups).unwrap(), FormStep::Groups);
        assert_eq!(form.go_to_previous_step(), FormStep::Groups);
    }

    #[test]
    fn test_billing_source_follows_lookup() {
        let mut form = BookingForm::default();
        let school = SchoolSummary {
            id: RecordId(12),
            display_name: "Het Lyceum".to_string(),
            city: Some("Utrecht".to_string()),
        };

        form.select_existing_school(&school, None);
        assert_eq!(form.school.billing_source, BillingAddressSource::Different);

        form.select_existing_school(&school, Some("Schoolstraat 1".to_string()));
        assert_eq!(form.school.billing_source, BillingAddressSource::SameAsSchool);
        assert_eq!(
            form.school
                .existing
                .as_ref()
                .and_then(|s| s.known_billing_address.clone()),
            Some("Schoolstraat 1".to_string())
        );

        form.mark_not_listed();
        assert!(form.school.existing.is_none());
        assert!(form.school.not_listed);
    }

    #[test]
    fn test_reset() {
        let rules = ValidationRules::default();
        let mut form = BookingForm::default();
        form.add_group(&rules).unwrap();
        form.teacher.last_name = "Jansen".to_string();
        form.step = FormStep::Contact;

        form.reset();
        assert_eq!(form, BookingForm::default());
    }
}
