//! Capacity re-check performed at final confirmation
//!
//! Requests are compared one by one against the resource's single remaining
//! figure. Headcounts of groups sharing a resource are not summed.

use super::backend::{BackendError, RecordStore};
use super::lookup;
use crate::contract::{AvailabilityReport, BookingForm, Conflict, RecordId, ResourceRequest};
use std::collections::{BTreeSet, HashMap};

/// One request per group that has a resource selected
pub fn requests_for(form: &BookingForm) -> Vec<ResourceRequest> {
    form.groups
        .iter()
        .enumerate()
        .filter_map(|(index, group)| {
            group.resource.map(|resource| ResourceRequest {
                group: index,
                resource,
                requested: group.headcount(),
            })
        })
        .collect()
}

/// Compare requests against a capacity snapshot.
///
/// A `None` capacity, or a resource missing from the snapshot, is
/// unconstrained.
pub fn evaluate(
    requests: &[ResourceRequest],
    capacities: &HashMap<RecordId, Option<u32>>,
) -> AvailabilityReport {
    let conflicts: Vec<Conflict> = requests
        .iter()
        .filter_map(|request| {
            let available = capacities.get(&request.resource).copied().flatten()?;
            (available < request.requested).then_some(Conflict {
                resource: request.resource,
                available,
                requested: request.requested,
            })
        })
        .collect();

    AvailabilityReport {
        available: conflicts.is_empty(),
        conflicts,
    }
}

/// Fetches live capacity and evaluates requests against it
pub struct AvailabilityChecker<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> AvailabilityChecker<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Re-fetch capacity for every distinct resource, then compare
    pub async fn check(
        &self,
        requests: &[ResourceRequest],
    ) -> Result<AvailabilityReport, BackendError> {
        let resources: BTreeSet<RecordId> = requests.iter().map(|r| r.resource).collect();
        if resources.is_empty() {
            return Ok(evaluate(requests, &HashMap::new()));
        }

        let ids: Vec<RecordId> = resources.into_iter().collect();
        let capacities = lookup::capacities(self.store, &ids).await?;
        let report = evaluate(requests, &capacities);

        if !report.available {
            tracing::warn!(
                conflicts = report.conflicts.len(),
                "Capacity re-check found over-subscribed resources"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Group;

    fn request(group: usize, resource: i64, requested: u32) -> ResourceRequest {
        ResourceRequest {
            group,
            resource: RecordId(resource),
            requested,
        }
    }

    #[test]
    fn test_conflict_reported() {
        let capacities = HashMap::from([(RecordId(1), Some(80))]);
        let report = evaluate(&[request(0, 1, 110)], &capacities);
        assert!(!report.available);
        assert_eq!(
            report.conflicts,
            vec![Conflict {
                resource: RecordId(1),
                available: 80,
                requested: 110
            }]
        );
    }

    #[test]
    fn test_exact_fit_is_available() {
        let capacities = HashMap::from([(RecordId(1), Some(35))]);
        assert!(evaluate(&[request(0, 1, 35)], &capacities).available);
    }

    #[test]
    fn test_unknown_capacity_is_unconstrained() {
        let capacities = HashMap::from([(RecordId(1), None)]);
        let report = evaluate(&[request(0, 1, 10_000), request(1, 2, 10_000)], &capacities);
        assert!(report.available);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_shared_resource_not_summed() {
        let capacities = HashMap::from([(RecordId(4), Some(50))]);
        let report = evaluate(&[request(0, 4, 40), request(1, 4, 40)], &capacities);
        assert!(report.available);

        let report = evaluate(&[request(0, 4, 40), request(1, 4, 60)], &capacities);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].requested, 60);
    }

    #[test]
    fn test_snapshots_evaluated_independently() {
        let requests = [request(0, 9, 30)];
        let before = HashMap::from([(RecordId(9), Some(50))]);
        let after = HashMap::from([(RecordId(9), Some(20))]);
        assert!(evaluate(&requests, &before).available);
        assert!(!evaluate(&requests, &after).available);
        assert!(evaluate(&requests, &before).available);
    }

    #[test]
    fn test_requests_skip_groups_without_resource() {
        let mut form = BookingForm::default();
        form.groups = vec![
            Group {
                students: Some(20),
                supervisors: Some(2),
                resource: Some(RecordId(3)),
                ..Group::default()
            },
            Group::default(),
        ];
        assert_eq!(requests_for(&form), vec![request(0, 3, 22)]);
    }
}
