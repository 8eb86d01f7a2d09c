//! Submission orchestrator
//!
//! Creates the booking's records in dependency order as an explicit state
//! machine:
//!
//! ```text
//! CreateOrganisation -> CreatePerson -> CreateBooking -> CreateLinks -> Success
//!          \________________\________________\_______________\______> Failed
//! ```
//!
//! Every state has a single abort transition. A failure stops the run before
//! any further call is made; records created earlier are left in place.

use super::backend::{entity, BackendError, Fields, RecordStore};
use super::payload::{field, OrganisationPlan, SubmissionPlan};
use crate::contract::{RecordId, SubmissionOutcome, SubmissionStep};
use futures::future::join_all;
use serde_json::json;
use std::future::Future;
use std::time::Duration;

/// Shown when the new school's name collides with an existing organisation
pub const DUPLICATE_SCHOOL_MESSAGE: &str =
    "A school with this name already exists. Select it from the list instead of entering it as a new school.";

/// Shown for failures that could not be classified
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Records created during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedRecords {
    pub organisation: Option<RecordId>,
    pub person: Option<RecordId>,
    pub booking: Option<RecordId>,
    pub links: Vec<RecordId>,
}

impl CreatedRecords {
    fn is_empty(&self) -> bool {
        self.organisation.is_none()
            && self.person.is_none()
            && self.booking.is_none()
            && self.links.is_empty()
    }
}

/// Outcome of a run plus every record it created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationReport {
    pub outcome: SubmissionOutcome,
    pub created: CreatedRecords,
}

/// Failure of one step
#[derive(Debug, Clone, PartialEq, Eq)]
struct StepFailure {
    step: SubmissionStep,
    /// 1-based group ordinal for link failures
    group: Option<usize>,
    error: BackendError,
}

enum State {
    CreateOrganisation(OrganisationPlan),
    CreatePerson { organisation: RecordId },
    CreateBooking { organisation: RecordId, person: RecordId },
    CreateLinks { booking: RecordId },
    Succeeded { booking: RecordId },
    Aborted(StepFailure),
}

/// Runs a submission plan against a record store
pub struct Orchestrator<'a> {
    store: &'a dyn RecordStore,
    timeout: Duration,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn RecordStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn create(
        &self,
        entity: &str,
        fields: Fields,
    ) -> Result<RecordId, BackendError> {
        with_timeout(self.timeout, self.store.create(entity, fields)).await
    }

    /// Execute the plan; never returns early with a partially created booking
    pub async fn run(&self, plan: SubmissionPlan) -> OrchestrationReport {
        let SubmissionPlan {
            organisation,
            mut person,
            mut booking,
            links,
        } = plan;
        let mut links = Some(links);
        let mut created = CreatedRecords::default();
        let mut state = State::CreateOrganisation(organisation);

        loop {
            state = match state {
                State::CreateOrganisation(OrganisationPlan::Existing(id)) => {
                    tracing::debug!(organisation_id = %id, "Reusing existing organisation");
                    State::CreatePerson { organisation: id }
                }
                State::CreateOrganisation(OrganisationPlan::Create(fields)) => {
                    match self.create(entity::ORGANISATION, fields).await {
                        Ok(id) => {
                            tracing::info!(organisation_id = %id, "Organisation created");
                            created.organisation = Some(id);
                            State::CreatePerson { organisation: id }
                        }
                        Err(error) => State::Aborted(StepFailure {
                            step: SubmissionStep::CreateOrganisation,
                            group: None,
                            error,
                        }),
                    }
                }
                State::CreatePerson { organisation } => {
                    match self.create(entity::PERSON, std::mem::take(&mut person)).await {
                        Ok(id) => {
                            tracing::info!(person_id = %id, "Teacher created");
                            created.person = Some(id);
                            State::CreateBooking {
                                organisation,
                                person: id,
                            }
                        }
                        Err(error) => State::Aborted(StepFailure {
                            step: SubmissionStep::CreatePerson,
                            group: None,
                            error,
                        }),
                    }
                }
                State::CreateBooking {
                    organisation,
                    person,
                } => {
                    let mut fields = std::mem::take(&mut booking);
                    fields.insert(field::BOOKING_TEACHER.to_string(), json!(person.0));
                    fields.insert(field::BOOKING_ORGANISATION.to_string(), json!(organisation.0));
                    match self.create(entity::BOOKING, fields).await {
                        Ok(id) => {
                            tracing::info!(booking_id = %id, "Booking created");
                            created.booking = Some(id);
                            State::CreateLinks { booking: id }
                        }
                        Err(error) => State::Aborted(StepFailure {
                            step: SubmissionStep::CreateBooking,
                            group: None,
                            error,
                        }),
                    }
                }
                State::CreateLinks { booking } => {
                    let pending = links.take().unwrap_or_default();
                    match self.create_links(booking, pending, &mut created).await {
                        Ok(()) => State::Succeeded { booking },
                        Err(failure) => State::Aborted(failure),
                    }
                }
                State::Succeeded { booking } => {
                    tracing::info!(booking_id = %booking, "Submission completed");
                    return OrchestrationReport {
                        outcome: SubmissionOutcome::Success {
                            booking_id: booking,
                        },
                        created,
                    };
                }
                State::Aborted(failure) => {
                    return Self::abort(failure, created);
                }
            };
        }
    }

    /// Issue every link creation at once; the step fails if any fails
    async fn create_links(
        &self,
        booking: RecordId,
        links: Vec<Fields>,
        created: &mut CreatedRecords,
    ) -> Result<(), StepFailure> {
        let requests = links.into_iter().map(|mut fields| {
            fields.insert(field::LINK_BOOKING.to_string(), json!(booking.0));
            self.create(entity::LINK, fields)
        });
        let results = join_all(requests).await;

        let mut first_failure = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(id) => created.links.push(id),
                Err(error) => {
                    tracing::warn!(group = index + 1, error = %error, "Group link creation failed");
                    if first_failure.is_none() {
                        first_failure = Some(StepFailure {
                            step: SubmissionStep::CreateLinks,
                            group: Some(index + 1),
                            error,
                        });
                    }
                }
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => {
                tracing::info!(links = created.links.len(), "Group links created");
                Ok(())
            }
        }
    }

    fn abort(failure: StepFailure, created: CreatedRecords) -> OrchestrationReport {
        tracing::error!(
            step = ?failure.step,
            group = ?failure.group,
            error = %failure.error,
            "Submission aborted"
        );
        if !created.is_empty() {
            tracing::warn!(
                organisation = ?created.organisation,
                person = ?created.person,
                booking = ?created.booking,
                links = ?created.links,
                "Records created before the failure remain in the record store"
            );
        }

        OrchestrationReport {
            outcome: SubmissionOutcome::Failed {
                step: Some(failure.step),
                message: failure_message(&failure),
            },
            created,
        }
    }
}

/// Run a record store call with a definite failure after `timeout`
pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(BackendError::Timeout))
}

fn failure_message(failure: &StepFailure) -> String {
    let subject = match failure.group {
        Some(group) => format!("Linking group {}", group),
        None => failure.step.to_string(),
    };

    match &failure.error {
        BackendError::Duplicate { .. } if failure.step == SubmissionStep::CreateOrganisation => {
            DUPLICATE_SCHOOL_MESSAGE.to_string()
        }
        BackendError::Timeout => format!("{} did not complete in time. Please try again.", subject),
        error => match error.backend_message() {
            Some(raw) if !raw.trim().is_empty() => format!("{} failed: {}", subject, raw.trim()),
            _ => format!("{} failed.", subject),
        },
    }
}
