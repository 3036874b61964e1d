//! Structured selector expressions for rich queries.
//!
//! A selector is a conjunction of field predicates over the persisted JSON
//! form of a record. Values are carried as typed JSON, so a caller-supplied
//! value can never change the shape of the query.

use serde_json::{Map, Value};

use crate::record::EnergyRecord;

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value
    Eq(Value),
}

impl FilterOp {
    /// Returns the operation name for query rendering
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Persisted field name
    pub field: String,
    pub op: FilterOp,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    /// Checks if a document satisfies this predicate
    pub fn matches(&self, document: &Value) -> bool {
        let Some(actual) = document.get(&self.field) else {
            // Missing field = no match
            return false;
        };

        match &self.op {
            FilterOp::Eq(expected) => actual == expected,
        }
    }
}

/// Conjunction of predicates (AND semantics)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    predicates: Vec<Predicate>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::eq(field, value));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Checks if a document matches all predicates. An empty selector matches everything.
    pub fn matches(&self, document: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }

    /// Evaluate against stored bytes, read the way the codec reads them.
    ///
    /// A value that decodes as a record is matched on its current layout, so a
    /// record written without `DocumentType` counts as a token and the status
    /// `old` counts as `expired`. Other JSON is matched as stored. Values that
    /// are not JSON never match.
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        let document = match serde_json::from_slice::<EnergyRecord>(bytes) {
            Ok(record) => serde_json::to_value(&record),
            Err(_) => serde_json::from_slice::<Value>(bytes),
        };
        match document {
            Ok(document) => self.matches(&document),
            Err(_) => false,
        }
    }

    /// Render as a CouchDB-style query document, e.g.
    /// `{"selector":{"Status":{"$eq":"generated"}}}`.
    pub fn to_query_value(&self) -> Value {
        let mut selector = Map::new();
        for predicate in &self.predicates {
            let FilterOp::Eq(value) = &predicate.op;
            let mut op = Map::new();
            op.insert(predicate.op.op_name().to_string(), value.clone());
            selector.insert(predicate.field.clone(), Value::Object(op));
        }

        let mut query = Map::new();
        query.insert("selector".to_string(), Value::Object(selector));
        Value::Object(query)
    }

    pub fn to_query_string(&self) -> String {
        self.to_query_value().to_string()
    }
}
