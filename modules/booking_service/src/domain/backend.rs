//! Record store seam
//!
//! The remote record-management backend is consumed through two operation
//! shapes: filtered queries and record creation. Implementations are in
//! infra/crm.

use crate::contract::RecordId;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Entity names used by the booking flow
pub mod entity {
    pub const ORGANISATION: &str = "Organization";
    pub const PERSON: &str = "Contact";
    pub const ADDRESS: &str = "Address";
    pub const BOOKING: &str = "Aanmelding";
    pub const LINK: &str = "AanmeldingGroup";
    pub const RESOURCE: &str = "Event";
    pub const CATEGORY: &str = "OptionValue";
}

/// A record as returned by a query: field name to value
pub type Record = Map<String, Value>;

/// Field map sent on record creation
pub type Fields = Map<String, Value>;

/// Record store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Uniqueness violation
    #[error("duplicate value: {message}")]
    Duplicate { message: String },
    /// Backend refused the request
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// Network failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Response could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
    /// No answer within the configured timeout
    #[error("request timed out")]
    Timeout,
}

impl BackendError {
    /// Raw message as reported by the backend, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Duplicate { message } | Self::Rejected { message, .. } => Some(message),
            Self::Transport(message) | Self::Decode(message) => Some(message),
            Self::Timeout => None,
        }
    }
}

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Like,
    In,
    /// Multi-value field contains the value
    Contains,
    IsNotNull,
    GreaterThanOrEqual,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Contains => "CONTAINS",
            Self::IsNotNull => "IS NOT NULL",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// Boolean tree of field comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Condition {
        field: String,
        op: Operator,
        /// Absent for unary operators
        value: Option<Value>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    fn condition(field: &str, op: Operator, value: Option<Value>) -> Self {
        Self::Condition {
            field: field.to_string(),
            op,
            value,
        }
    }

    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, Operator::Equals, Some(value.into()))
    }

    pub fn like(field: &str, pattern: impl Into<String>) -> Self {
        Self::condition(field, Operator::Like, Some(Value::String(pattern.into())))
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, Operator::In, Some(Value::Array(values)))
    }

    pub fn contains(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, Operator::Contains, Some(value.into()))
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, Operator::IsNotNull, None)
    }

    pub fn at_least(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, Operator::GreaterThanOrEqual, Some(value.into()))
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    /// Wire form: `["field", "OP", value]` leaves, `["AND"|"OR", [...]]` groups
    pub fn to_json(&self) -> Value {
        match self {
            Self::Condition { field, op, value } => match value {
                Some(value) => json!([field, op.as_str(), value]),
                None => json!([field, op.as_str()]),
            },
            Self::And(filters) => {
                let children: Vec<Value> = filters.iter().map(Filter::to_json).collect();
                json!(["AND", children])
            }
            Self::Or(filters) => {
                let children: Vec<Value> = filters.iter().map(Filter::to_json).collect();
                json!(["OR", children])
            }
        }
    }
}

/// Sort direction of an order-by clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query against one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub entity: String,
    pub select: Vec<String>,
    pub filter: Option<Filter>,
    pub order_by: Vec<(String, SortDirection)>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            select: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by.push((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Remote record store used by the booking flow
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a query and return matching records
    async fn query(&self, query: &Query) -> Result<Vec<Record>, BackendError>;

    /// Create a record and return its id
    async fn create(&self, entity: &str, fields: Fields) -> Result<RecordId, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_wire_form() {
        let filter = Filter::and(vec![
            Filter::like("display_name", "%lyceum%"),
            Filter::or(vec![
                Filter::equals("contact_sub_type", "School"),
                Filter::is_not_null("street_address"),
            ]),
        ]);

        assert_eq!(
            filter.to_json(),
            json!([
                "AND",
                [
                    ["display_name", "LIKE", "%lyceum%"],
                    ["OR", [["contact_sub_type", "=", "School"], ["street_address", "IS NOT NULL"]]]
                ]
            ])
        );
    }

    #[test]
    fn test_comparison_operators() {
        let filter = Filter::and(vec![
            Filter::is_in("id", vec![json!(7), json!(8)]),
            Filter::contains("categories", "other"),
            Filter::at_least("start_date", "2026-01-01 00:00:00"),
        ]);

        assert_eq!(
            filter.to_json(),
            json!([
                "AND",
                [
                    ["id", "IN", [7, 8]],
                    ["categories", "CONTAINS", "other"],
                    ["start_date", ">=", "2026-01-01 00:00:00"]
                ]
            ])
        );
    }

    #[test]
    fn test_backend_message() {
        let err = BackendError::Duplicate {
            message: "name already exists".to_string(),
        };
        assert_eq!(err.backend_message(), Some("name already exists"));
        assert_eq!(BackendError::Timeout.backend_message(), None);
    }
}
