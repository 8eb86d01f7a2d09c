//! Wire format of the record store HTTP API
//!
//! Requests are JSON bodies posted to `{api_version}/{Entity}/{action}`;
//! responses carry a `values` array or an `error_code`/`error_message` pair.

use crate::contract::RecordId;
use crate::domain::backend::{BackendError, Fields, Filter, Query, Record};
use crate::domain::lookup::read_id;
use serde_json::{json, Map, Value};

const DUPLICATE_CODE: &str = "already_exists";
const DUPLICATE_PHRASE: &str = "already exists";

/// Body of a `get` request
pub fn query_body(query: &Query) -> Value {
    let mut body = Map::new();

    if !query.select.is_empty() {
        body.insert("select".to_string(), json!(query.select));
    }

    // top-level AND is implicit in the `where` list
    let conditions: Vec<Value> = match &query.filter {
        None => Vec::new(),
        Some(Filter::And(children)) => children.iter().map(Filter::to_json).collect(),
        Some(filter) => vec![filter.to_json()],
    };
    if !conditions.is_empty() {
        body.insert("where".to_string(), Value::Array(conditions));
    }

    if !query.order_by.is_empty() {
        let order: Map<String, Value> = query
            .order_by
            .iter()
            .map(|(field, direction)| (field.clone(), json!(direction.as_str())))
            .collect();
        body.insert("orderBy".to_string(), Value::Object(order));
    }

    if let Some(limit) = query.limit {
        body.insert("limit".to_string(), json!(limit));
    }

    Value::Object(body)
}

/// Body of a `create` request
pub fn create_body(fields: Fields) -> Value {
    json!({ "values": fields })
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error_message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn is_duplicate(status: u16, body: &Value, message: &str) -> bool {
    status == 409
        || body.get("error_code").and_then(Value::as_str) == Some(DUPLICATE_CODE)
        || message.to_lowercase().contains(DUPLICATE_PHRASE)
}

/// Map a response to an error, if it is one
pub fn classify(status: u16, body: &Value, raw: &str) -> Option<BackendError> {
    let reported = error_message(body);
    let success = (200..300).contains(&status);
    if success && reported.is_none() && body.get("error_code").is_none() {
        return None;
    }

    let message = reported.unwrap_or_else(|| {
        if raw.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            raw.trim().to_string()
        }
    });

    if is_duplicate(status, body, &message) {
        Some(BackendError::Duplicate { message })
    } else {
        Some(BackendError::Rejected { status, message })
    }
}

/// Records of a successful `get` response
pub fn records(body: Value) -> Result<Vec<Record>, BackendError> {
    let Some(Value::Array(values)) = body.get("values").cloned() else {
        return Err(BackendError::Decode("response has no 'values' array".to_string()));
    };

    values
        .into_iter()
        .map(|value| match value {
            Value::Object(record) => Ok(record),
            other => Err(BackendError::Decode(format!("expected a record, got {}", other))),
        })
        .collect()
}

/// Id of the record returned by a successful `create` response
pub fn created_id(body: Value) -> Result<RecordId, BackendError> {
    let created = records(body)?;
    let first = created
        .first()
        .ok_or_else(|| BackendError::Decode("create response contains no record".to_string()))?;
    read_id(first, "id")
}
