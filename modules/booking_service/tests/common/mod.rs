//! Common test utilities: in-memory record store and form fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use booking_service::config::Config;
use booking_service::contract::*;
use booking_service::domain::backend::{entity, BackendError, Fields, Query, Record, RecordStore};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

pub const SCHOOL_ID: i64 = 501;
pub const RESOURCE_ID: i64 = 7;

#[derive(Default)]
struct StoreState {
    capacities: HashMap<i64, Option<u32>>,
    query_results: HashMap<String, Vec<Record>>,
    create_failures: HashMap<String, BackendError>,
    link_failures: HashMap<i64, BackendError>,
    create_delays: HashMap<String, Duration>,
    panic_on: Option<String>,
    queries: Vec<Query>,
    created: Vec<(String, Fields)>,
    next_id: i64,
}

/// In-memory record store that records every call
#[derive(Default)]
pub struct MockRecordStore {
    state: RwLock<StoreState>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining capacity reported for a resource; `None` means unconstrained
    pub fn with_capacity(self, resource: i64, available: Option<u32>) -> Self {
        self.state.write().capacities.insert(resource, available);
        self
    }

    /// Records returned for queries against `entity`
    pub fn with_records(self, entity: &str, records: Vec<Value>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect();
        self.state
            .write()
            .query_results
            .insert(entity.to_string(), records);
        self
    }

    pub fn fail_create(self, entity: &str, error: BackendError) -> Self {
        self.state
            .write()
            .create_failures
            .insert(entity.to_string(), error);
        self
    }

    /// Fail the link of the group booked on `resource`
    pub fn fail_link(self, resource: i64, error: BackendError) -> Self {
        self.state.write().link_failures.insert(resource, error);
        self
    }

    pub fn delay_create(self, entity: &str, delay: Duration) -> Self {
        self.state
            .write()
            .create_delays
            .insert(entity.to_string(), delay);
        self
    }

    pub fn panic_on_create(self, entity: &str) -> Self {
        self.state.write().panic_on = Some(entity.to_string());
        self
    }

    /// Every create call in order, including failed ones
    pub fn created(&self) -> Vec<(String, Fields)> {
        self.state.read().created.clone()
    }

    pub fn created_of(&self, entity: &str) -> Vec<Fields> {
        self.state
            .read()
            .created
            .iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, fields)| fields.clone())
            .collect()
    }

    pub fn query_count(&self) -> usize {
        self.state.read().queries.len()
    }

    /// Print every recorded call
    pub fn print_state(&self, context: &str) {
        let state = self.state.read();
        println!("\n========== RecordStore State: {} ==========", context);
        println!("Queries: {}", state.queries.len());
        for query in &state.queries {
            println!("  {} {:?}", query.entity, query.select);
        }
        println!("Creates: {}", state.created.len());
        for (entity, fields) in &state.created {
            println!("  {}: {}", entity, Value::Object(fields.clone()));
        }
        println!("============================================\n");
    }

    fn capacity_records(state: &StoreState) -> Vec<Record> {
        state
            .capacities
            .iter()
            .filter_map(|(id, available)| {
                let remaining = available.map_or(Value::Null, |n| json!(n));
                match json!({"id": id, "remaining_participants": remaining}) {
                    Value::Object(record) => Some(record),
                    _ => None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn query(&self, query: &Query) -> Result<Vec<Record>, BackendError> {
        let mut state = self.state.write();
        state.queries.push(query.clone());

        if let Some(records) = state.query_results.get(&query.entity) {
            return Ok(records.clone());
        }
        if query.entity == entity::RESOURCE {
            return Ok(Self::capacity_records(&state));
        }
        Ok(Vec::new())
    }

    async fn create(&self, entity: &str, fields: Fields) -> Result<RecordId, BackendError> {
        let (delay, failure, panics, id) = {
            let mut state = self.state.write();
            state.created.push((entity.to_string(), fields.clone()));

            let link_failure = if entity == entity::LINK {
                fields
                    .get("event_id")
                    .and_then(Value::as_i64)
                    .and_then(|resource| state.link_failures.get(&resource).cloned())
            } else {
                None
            };
            let failure = link_failure.or_else(|| state.create_failures.get(entity).cloned());

            state.next_id += 1;
            (
                state.create_delays.get(entity).copied(),
                failure,
                state.panic_on.as_deref() == Some(entity),
                1000 + state.next_id,
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panics {
            panic!("record store blew up on {}", entity);
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(RecordId(id)),
        }
    }
}

// ===== Fixtures =====

pub fn config() -> Config {
    Config {
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn group(students: u32, supervisors: u32, resource: i64) -> Group {
    Group {
        students: Some(students),
        supervisors: Some(supervisors),
        categories: BTreeSet::from(["secondary".to_string()]),
        justification: String::new(),
        region: Some("north".to_string()),
        resource: Some(RecordId(resource)),
    }
}

/// Complete form for an existing school with a billing address on file
pub fn valid_form() -> BookingForm {
    BookingForm {
        step: FormStep::Confirm,
        groups: vec![group(30, 5, RESOURCE_ID)],
        teacher: Teacher {
            first_name: "Anna".to_string(),
            middle_name: "de".to_string(),
            last_name: "Vries".to_string(),
            email: "a.devries@lyceum.nl".to_string(),
            phone: "0612345678".to_string(),
            newsletter: true,
        },
        school: SchoolSelection {
            existing: Some(ExistingSchool {
                id: RecordId(SCHOOL_ID),
                display_name: "Stedelijk Lyceum".to_string(),
                known_billing_address: Some("Dorpsstraat 1, 1234 AB Utrecht".to_string()),
            }),
            billing_source: BillingAddressSource::SameAsSchool,
            ..SchoolSelection::default()
        },
        payment: Payment::default(),
        consents: Consents {
            terms: true,
            privacy: true,
        },
        comments: String::new(),
    }
}

/// Complete form for a school that is not in the record store yet
pub fn new_school_form() -> BookingForm {
    let mut form = valid_form();
    form.school = SchoolSelection {
        existing: None,
        not_listed: true,
        new_school: NewSchool {
            name: "Montessori College".to_string(),
            street_address: "Schoolweg 12".to_string(),
            postal_code: "5611 AB".to_string(),
            city: "Eindhoven".to_string(),
            school_type: Some("secondary".to_string()),
        },
        billing_source: BillingAddressSource::Different,
        billing_address: "Postbus 99, 5600 AA Eindhoven".to_string(),
        ..SchoolSelection::default()
    };
    form
}
