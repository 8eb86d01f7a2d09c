//! Reference-data lookups against the record store
//!
//! Builds the queries used by the booking flow and maps returned records
//! into contract models.

use super::backend::{entity, BackendError, Filter, Query, Record, RecordStore, SortDirection};
use crate::contract::{Category, RecordId, ScheduledResource, SchoolSummary};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Maximum organisation search hits
pub const SCHOOL_SEARCH_LIMIT: u32 = 25;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CATEGORY_OPTION_GROUP: &str = "aanmelding_category";
const CAPACITY_FIELD: &str = "remaining_participants";

// ===== Field readers =====

fn decode_error(field: &str, record: &Record) -> BackendError {
    BackendError::Decode(format!("field '{}' missing or invalid in {}", field, Value::Object(record.clone())))
}

/// Read an integer that may be encoded as a JSON number or a numeric string
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn read_id(record: &Record, field: &str) -> Result<RecordId, BackendError> {
    record
        .get(field)
        .and_then(as_i64)
        .map(RecordId)
        .ok_or_else(|| decode_error(field, record))
}

fn read_string(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn read_count(record: &Record, field: &str) -> Option<u32> {
    record
        .get(field)
        .and_then(as_i64)
        .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

fn read_datetime(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    let raw = read_string(record, field)?;
    NaiveDateTime::parse_from_str(&raw, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn read_list(record: &Record, field: &str) -> Vec<String> {
    match record.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ===== Lookups =====

/// Substring LIKE pattern with the fragment's own wildcards escaped
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Search organisations of the school sub-type by partial name
pub async fn search_schools(
    store: &dyn RecordStore,
    name: &str,
) -> Result<Vec<SchoolSummary>, BackendError> {
    let query = Query::new(entity::ORGANISATION)
        .select(&["id", "display_name", "address_primary.city"])
        .filter(Filter::and(vec![
            Filter::like("display_name", like_pattern(name)),
            Filter::equals("contact_sub_type", "School"),
            Filter::equals("is_deleted", false),
        ]))
        .order_by("display_name", SortDirection::Asc)
        .limit(SCHOOL_SEARCH_LIMIT);

    store
        .query(&query)
        .await?
        .iter()
        .map(|record| {
            Ok(SchoolSummary {
                id: read_id(record, "id")?,
                display_name: read_string(record, "display_name").unwrap_or_default(),
                city: read_string(record, "address_primary.city"),
            })
        })
        .collect()
}

/// Known billing address of an organisation, formatted on one line
pub async fn billing_address(
    store: &dyn RecordStore,
    organisation: RecordId,
) -> Result<Option<String>, BackendError> {
    let query = Query::new(entity::ADDRESS)
        .select(&["street_address", "postal_code", "city"])
        .filter(Filter::and(vec![
            Filter::equals("contact_id", organisation.0),
            Filter::equals("location_type_id:name", "Billing"),
            Filter::is_not_null("street_address"),
        ]))
        .limit(1);

    let records = store.query(&query).await?;
    Ok(records.first().and_then(|record| {
        let street = read_string(record, "street_address")?;
        let place = [read_string(record, "postal_code"), read_string(record, "city")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if place.is_empty() {
            Some(street)
        } else {
            Some(format!("{}, {}", street, place))
        }
    }))
}

/// Active group categories, flagged against the restricted set
pub async fn categories(
    store: &dyn RecordStore,
    restricted: &BTreeSet<String>,
) -> Result<Vec<Category>, BackendError> {
    let query = Query::new(entity::CATEGORY)
        .select(&["value", "label"])
        .filter(Filter::and(vec![
            Filter::equals("option_group_id:name", CATEGORY_OPTION_GROUP),
            Filter::equals("is_active", true),
        ]))
        .order_by("weight", SortDirection::Asc);

    store
        .query(&query)
        .await?
        .iter()
        .map(|record| {
            let value = read_string(record, "value").ok_or_else(|| decode_error("value", record))?;
            Ok(Category {
                label: read_string(record, "label").unwrap_or_else(|| value.clone()),
                restricted: restricted.contains(&value),
                value,
            })
        })
        .collect()
}

fn resource_from_record(record: &Record) -> Result<ScheduledResource, BackendError> {
    Ok(ScheduledResource {
        id: read_id(record, "id")?,
        title: read_string(record, "title").unwrap_or_default(),
        starts_at: read_datetime(record, "start_date"),
        region: read_string(record, "region"),
        categories: read_list(record, "categories"),
        available: read_count(record, CAPACITY_FIELD),
    })
}

/// Upcoming active resources, optionally narrowed by region and category
pub async fn resources(
    store: &dyn RecordStore,
    region: Option<&str>,
    category: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<ScheduledResource>, BackendError> {
    let mut conditions = vec![
        Filter::equals("is_active", true),
        Filter::at_least("start_date", now.format(DATE_FORMAT).to_string()),
    ];
    if let Some(region) = region {
        conditions.push(Filter::equals("region", region));
    }
    if let Some(category) = category {
        conditions.push(Filter::contains("categories", category));
    }

    let query = Query::new(entity::RESOURCE)
        .select(&["id", "title", "start_date", "region", "categories", CAPACITY_FIELD])
        .filter(Filter::and(conditions))
        .order_by("start_date", SortDirection::Asc);

    store
        .query(&query)
        .await?
        .iter()
        .map(resource_from_record)
        .collect()
}

/// Current remaining capacity of each resource, fetched at call time
pub async fn capacities(
    store: &dyn RecordStore,
    ids: &[RecordId],
) -> Result<HashMap<RecordId, Option<u32>>, BackendError> {
    let query = Query::new(entity::RESOURCE)
        .select(&["id", CAPACITY_FIELD])
        .filter(Filter::is_in(
            "id",
            ids.iter().map(|id| Value::from(id.0)).collect(),
        ));

    store
        .query(&query)
        .await?
        .iter()
        .map(|record| Ok((read_id(record, "id")?, read_count(record, CAPACITY_FIELD))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" Lyceum "), "%Lyceum%");
        assert_eq!(like_pattern("50%_korting"), r"%50\%\_korting%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_resource_mapping() {
        let record = record(json!({
            "id": "42",
            "title": "Museum visit",
            "start_date": "2026-11-03 09:30:00",
            "region": "north",
            "categories": ["primary", "secondary"],
            "remaining_participants": 80
        }));

        let resource = resource_from_record(&record).unwrap();
        assert_eq!(resource.id, RecordId(42));
        assert_eq!(resource.available, Some(80));
        assert_eq!(resource.categories, vec!["primary", "secondary"]);
        assert_eq!(
            resource.starts_at.map(|d| d.to_rfc3339()),
            Some("2026-11-03T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_null_capacity_is_unknown() {
        let unknown = record(json!({"id": 1, "remaining_participants": null}));
        assert_eq!(read_count(&unknown, CAPACITY_FIELD), None);

        let overbooked = record(json!({"id": 1, "remaining_participants": -3}));
        assert_eq!(read_count(&overbooked, CAPACITY_FIELD), Some(0));
    }

    #[test]
    fn test_missing_id_is_decode_error() {
        let untitled = record(json!({"title": "No id"}));
        assert!(matches!(
            read_id(&untitled, "id"),
            Err(BackendError::Decode(_))
        ));
    }
}
