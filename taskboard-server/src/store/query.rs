//! Backend-neutral predicate algebra for document queries.
//!
//! A [`Query`] is a conjunction of [`Predicate`]s plus ordering and a limit.
//! Backends may translate it to their own query language; [`Query::matches`]
//! and [`Query::apply`] evaluate it in process for backends that cannot.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;

use super::Document;

/// A single filter over one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(String, Value),
    NotEqual(String, Value),
    LessThan(String, Value),
    LessThanEqual(String, Value),
    GreaterThanEqual(String, Value),
    /// Field value is one of the listed values.
    In(String, Vec<Value>),
    /// Case-insensitive substring match on a string field.
    Search(String, String),
}

impl Predicate {
    /// Returns `true` if the document satisfies this predicate.
    ///
    /// A missing field only satisfies [`Predicate::NotEqual`].
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Equal(field, expected) => document
                .get(field)
                .is_some_and(|actual| values_equal(actual, expected)),
            Self::NotEqual(field, expected) => !document
                .get(field)
                .is_some_and(|actual| values_equal(actual, expected)),
            Self::LessThan(field, bound) => {
                compare_field(document, field, bound) == Some(Ordering::Less)
            }
            Self::LessThanEqual(field, bound) => matches!(
                compare_field(document, field, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::GreaterThanEqual(field, bound) => matches!(
                compare_field(document, field, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::In(field, allowed) => document
                .get(field)
                .is_some_and(|actual| allowed.iter().any(|v| values_equal(actual, v))),
            Self::Search(field, needle) => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|haystack| {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }),
        }
    }
}

/// Sort key for query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

/// Conjunction of predicates with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Query {
    /// An empty query matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Equal(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn not_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::NotEqual(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn less_than(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::LessThan(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn less_than_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::LessThanEqual(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn greater_than_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::GreaterThanEqual(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicates.push(Predicate::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    #[must_use]
    pub fn search(mut self, field: &str, needle: &str) -> Self {
        self.predicates
            .push(Predicate::Search(field.to_string(), needle.to_string()));
        self
    }

    #[must_use]
    pub fn order_asc(mut self, field: &str) -> Self {
        self.order.push(Order::Asc(field.to_string()));
        self
    }

    #[must_use]
    pub fn order_desc(mut self, field: &str) -> Self {
        self.order.push(Order::Desc(field.to_string()));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the document satisfies every predicate.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }

    /// Filters, orders and truncates `documents` according to this query.
    ///
    /// Sorting is stable, so documents with equal keys keep their input order.
    #[must_use]
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut selected: Vec<Document> =
            documents.into_iter().filter(|d| self.matches(d)).collect();
        if !self.order.is_empty() {
            selected.sort_by(|a, b| self.compare(a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for order in &self.order {
            let (field, descending) = match order {
                Order::Asc(field) => (field, false),
                Order::Desc(field) => (field, true),
            };
            let ordering = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ordering = if descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Encodes a timestamp the way documents store it.
#[must_use]
pub fn timestamp(instant: DateTime<Utc>) -> Value {
    Value::String(instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn compare_field(document: &Document, field: &str, bound: &Value) -> Option<Ordering> {
    document
        .get(field)
        .and_then(|actual| compare_values(actual, bound))
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Orders two JSON values of the same kind.
///
/// Strings that both parse as RFC 3339 timestamps compare chronologically,
/// since fractional seconds make their lexical order unreliable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                Some(x.cmp(&y))
            } else {
                x.as_f64()?.partial_cmp(&y.as_f64()?)
            }
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare_values(a, b) == Some(Ordering::Equal)
}
