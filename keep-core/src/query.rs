//! Field constraints for [`Repository::get_by_query`](crate::Repository::get_by_query).
//!
//! Constraints always combine with AND. There is no OR or NOT.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{KeepError, KeepResult};

/// Longest value list accepted by the list operators.
pub const MAX_LIST_OPERANDS: usize = 30;

/// Comparison applied between a stored field and a constraint value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOperator {
    #[serde(rename = "==", alias = "equal")]
    Equal,
    #[serde(rename = "!=", alias = "notEqual")]
    NotEqual,
    #[serde(rename = "<", alias = "lessThan")]
    LessThan,
    #[serde(rename = "<=", alias = "lessOrEqual")]
    LessOrEqual,
    #[serde(rename = ">", alias = "greaterThan")]
    GreaterThan,
    #[serde(rename = ">=", alias = "greaterOrEqual")]
    GreaterOrEqual,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in", alias = "notIn")]
    NotIn,
    #[serde(rename = "array-contains", alias = "arrayContains")]
    ArrayContains,
    #[serde(rename = "array-contains-any", alias = "arrayContainsAny")]
    ArrayContainsAny,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::Equal => "==",
            QueryOperator::NotEqual => "!=",
            QueryOperator::LessThan => "<",
            QueryOperator::LessOrEqual => "<=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterOrEqual => ">=",
            QueryOperator::In => "in",
            QueryOperator::NotIn => "not-in",
            QueryOperator::ArrayContains => "array-contains",
            QueryOperator::ArrayContainsAny => "array-contains-any",
        }
    }

    /// Operators whose value must be a list.
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            QueryOperator::In | QueryOperator::NotIn | QueryOperator::ArrayContainsAny
        )
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryOperator {
    type Err = KeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "==" | "equal" => QueryOperator::Equal,
            "!=" | "notEqual" => QueryOperator::NotEqual,
            "<" | "lessThan" => QueryOperator::LessThan,
            "<=" | "lessOrEqual" => QueryOperator::LessOrEqual,
            ">" | "greaterThan" => QueryOperator::GreaterThan,
            ">=" | "greaterOrEqual" => QueryOperator::GreaterOrEqual,
            "in" => QueryOperator::In,
            "not-in" | "notIn" => QueryOperator::NotIn,
            "array-contains" | "arrayContains" => QueryOperator::ArrayContains,
            "array-contains-any" | "arrayContainsAny" => QueryOperator::ArrayContainsAny,
            other => {
                return Err(KeepError::invalid_argument(format!(
                    "unknown query operator: {other}"
                )))
            }
        };
        Ok(op)
    }
}

/// `{path, operator, value}` filter on one persisted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConstraint {
    /// Dotted field path, e.g. `address.city`.
    pub path: String,
    pub operator: QueryOperator,
    pub value: Value,
}

impl QueryConstraint {
    pub fn new<P, V>(path: P, operator: QueryOperator, value: V) -> Self
    where
        P: Into<String>,
        V: Into<Value>,
    {
        Self {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equal<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        Self::new(path, QueryOperator::Equal, value)
    }

    pub fn less_than<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        Self::new(path, QueryOperator::LessThan, value)
    }

    pub fn greater_or_equal<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        Self::new(path, QueryOperator::GreaterOrEqual, value)
    }

    pub fn is_in<P: Into<String>, V: Into<Value>>(path: P, values: Vec<V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::new(path, QueryOperator::In, Value::Array(values))
    }

    pub fn array_contains<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        Self::new(path, QueryOperator::ArrayContains, value)
    }

    /// Path segments of a dotted field path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }

    /// Rejects constraints no backend can evaluate.
    pub fn validate(&self) -> KeepResult<()> {
        if self.path.trim().is_empty() || self.segments().any(str::is_empty) {
            return Err(KeepError::invalid_argument(format!(
                "malformed constraint path: {:?}",
                self.path
            )));
        }
        if self.operator.takes_list() {
            let list = self.value.as_array().ok_or_else(|| {
                KeepError::invalid_argument(format!(
                    "operator {} on {} requires a list value",
                    self.operator, self.path
                ))
            })?;
            if list.is_empty() || list.len() > MAX_LIST_OPERANDS {
                return Err(KeepError::invalid_argument(format!(
                    "operator {} on {} takes 1 to {} values, got {}",
                    self.operator,
                    self.path,
                    MAX_LIST_OPERANDS,
                    list.len()
                )));
            }
        }
        Ok(())
    }

    /// Evaluate against a stored JSON record.
    ///
    /// A missing field never matches, not even `!=` or `not-in`.
    /// Ordering comparisons only match values of the same type.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(field) = lookup(record, &self.path) else {
            return false;
        };
        let value = &self.value;
        match self.operator {
            QueryOperator::Equal => same(field, value),
            QueryOperator::NotEqual => !field.is_null() && !same(field, value),
            QueryOperator::LessThan => compare(field, value) == Some(Ordering::Less),
            QueryOperator::LessOrEqual => {
                matches!(compare(field, value), Some(Ordering::Less | Ordering::Equal))
            }
            QueryOperator::GreaterThan => compare(field, value) == Some(Ordering::Greater),
            QueryOperator::GreaterOrEqual => {
                matches!(compare(field, value), Some(Ordering::Greater | Ordering::Equal))
            }
            QueryOperator::In => value
                .as_array()
                .is_some_and(|list| list.iter().any(|candidate| same(candidate, field))),
            QueryOperator::NotIn => {
                !field.is_null()
                    && value
                        .as_array()
                        .is_some_and(|list| list.iter().all(|candidate| !same(candidate, field)))
            }
            QueryOperator::ArrayContains => field
                .as_array()
                .is_some_and(|items| items.iter().any(|item| same(item, value))),
            QueryOperator::ArrayContainsAny => match (field.as_array(), value.as_array()) {
                (Some(items), Some(wanted)) => items
                    .iter()
                    .any(|item| wanted.iter().any(|w| same(item, w))),
                _ => false,
            },
        }
    }
}

/// AND of all constraints.
pub fn matches_all(constraints: &[QueryConstraint], record: &Value) -> bool {
    constraints.iter().all(|constraint| constraint.matches(record))
}

/// Resolve a dotted path inside a JSON object.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Equality with numbers compared by value, so `2048` equals `2048.0`.
fn same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => compare(left, right) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "d1",
            "user_id": "u1",
            "size": 2048,
            "type": "passport",
            "tags": ["scan", "front"],
            "address": { "city": "Leeds" }
        })
    }

    #[test]
    fn operators_parse_from_symbols_and_names() {
        assert_eq!("==".parse::<QueryOperator>().unwrap(), QueryOperator::Equal);
        assert_eq!("lessThan".parse::<QueryOperator>().unwrap(), QueryOperator::LessThan);
        assert_eq!(
            "array-contains".parse::<QueryOperator>().unwrap(),
            QueryOperator::ArrayContains
        );
        assert!("~=".parse::<QueryOperator>().is_err());
    }

    #[test]
    fn wire_shape_uses_symbols() {
        let constraint = QueryConstraint::greater_or_equal("size", 10);
        let wire = serde_json::to_value(&constraint).unwrap();
        assert_eq!(wire, json!({"path": "size", "operator": ">=", "value": 10}));

        let parsed: QueryConstraint =
            serde_json::from_value(json!({"path": "type", "operator": "equal", "value": "passport"}))
                .unwrap();
        assert_eq!(parsed.operator, QueryOperator::Equal);
    }

    #[test]
    fn evaluates_each_operator() {
        let r = record();
        assert!(QueryConstraint::equal("user_id", "u1").matches(&r));
        assert!(QueryConstraint::equal("address.city", "Leeds").matches(&r));
        assert!(QueryConstraint::less_than("size", 4096).matches(&r));
        assert!(!QueryConstraint::less_than("size", 2048).matches(&r));
        assert!(QueryConstraint::greater_or_equal("size", 2048).matches(&r));
        assert!(QueryConstraint::is_in("type", vec!["passport", "id_card"]).matches(&r));
        assert!(QueryConstraint::array_contains("tags", "front").matches(&r));
        assert!(QueryConstraint::new("type", QueryOperator::NotEqual, "other").matches(&r));
        assert!(QueryConstraint::new("tags", QueryOperator::ArrayContainsAny, json!(["back", "scan"]))
            .matches(&r));
    }

    #[test]
    fn numbers_match_across_integer_and_float_forms() {
        let r = record();
        assert!(QueryConstraint::equal("size", 2048.0).matches(&r));
        assert!(!QueryConstraint::new("size", QueryOperator::NotEqual, 2048.0).matches(&r));
        assert!(QueryConstraint::is_in("size", vec![json!(1.5), json!(2048.0)]).matches(&r));
        assert!(!QueryConstraint::new("size", QueryOperator::NotIn, json!([2048.0])).matches(&r));

        let scores = json!({"scores": [1.0, 2.5]});
        assert!(QueryConstraint::array_contains("scores", 1).matches(&scores));
        assert!(QueryConstraint::new("scores", QueryOperator::ArrayContainsAny, json!([7, 1]))
            .matches(&scores));
        assert!(!QueryConstraint::equal("size", "2048").matches(&r));
    }

    #[test]
    fn mismatched_types_and_missing_fields_never_match() {
        let r = record();
        assert!(!QueryConstraint::less_than("size", "9999").matches(&r));
        assert!(!QueryConstraint::new("phone", QueryOperator::NotEqual, "x").matches(&r));
    }

    #[test]
    fn validation_rejects_malformed_constraints() {
        assert!(QueryConstraint::equal("", "x").validate().is_err());
        assert!(QueryConstraint::equal("address..city", "x").validate().is_err());
        assert!(QueryConstraint::new("type", QueryOperator::In, "passport").validate().is_err());

        let too_many: Vec<i64> = (0..31).collect();
        assert!(QueryConstraint::is_in("size", too_many).validate().is_err());
        assert!(QueryConstraint::is_in("size", vec![1, 2]).validate().is_ok());
    }

    #[test]
    fn constraints_combine_with_and() {
        let r = record();
        let both = [
            QueryConstraint::equal("user_id", "u1"),
            QueryConstraint::equal("type", "passport"),
        ];
        let one_off = [
            QueryConstraint::equal("user_id", "u1"),
            QueryConstraint::equal("type", "id_card"),
        ];
        assert!(matches_all(&both, &r));
        assert!(!matches_all(&one_off, &r));
    }
}
