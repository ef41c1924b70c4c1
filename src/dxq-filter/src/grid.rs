//! Grid filter output
//!
//! Grid filters are nested JSON arrays:
//!
//! ```json
//! [["CompanyID", "=", 7], "and", ["Name", "contains", "acme"]]
//! ```
//!
//! A condition is a `[left, operator, right]` triplet and a group alternates
//! operands with one connective. A bare boolean means the filter was decided
//! statically.

use dxq_parser::LogicalOperator;
use dxq_shared::Value;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Operator labels as written in grid filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridOperator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `in` (unexpanded lists)
    In,
    /// `between`
    Between,
    /// `contains`
    Contains,
    /// `notcontains`
    NotContains,
}

impl GridOperator {
    /// Label emitted in the output array
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GridOperator::Eq => "=",
            GridOperator::Ne => "!=",
            GridOperator::Gt => ">",
            GridOperator::Ge => ">=",
            GridOperator::Lt => "<",
            GridOperator::Le => "<=",
            GridOperator::In => "in",
            GridOperator::Between => "between",
            GridOperator::Contains => "contains",
            GridOperator::NotContains => "notcontains",
        }
    }
}

/// A converted filter (or part of one)
#[derive(Debug, Clone, PartialEq)]
pub enum GridFilter {
    /// Statically decided
    Bool(bool),
    /// A concrete value
    Value(Value),
    /// A field name
    Field(String),
    /// A list operand (`between` bounds, `in` items)
    List(Vec<GridFilter>),
    /// `[left, op, right]`
    Condition {
        /// Left operand
        left: Box<GridFilter>,
        /// Operator
        operator: GridOperator,
        /// Right operand
        right: Box<GridFilter>,
    },
    /// `[a, "and", b, "and", c]`; always at least two operands
    Group {
        /// The connective between every pair of operands
        operator: LogicalOperator,
        /// Operands in order
        operands: Vec<GridFilter>,
    },
}

impl GridFilter {
    /// `[left, op, right]`
    #[must_use]
    pub fn condition(left: GridFilter, operator: GridOperator, right: GridFilter) -> Self {
        GridFilter::Condition {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Field operand
    pub fn field(name: impl Into<String>) -> Self {
        GridFilter::Field(name.into())
    }

    /// Value operand
    pub fn value(value: impl Into<Value>) -> Self {
        GridFilter::Value(value.into())
    }

    /// The statically decided truth value, if any
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GridFilter::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The concrete value, if this is one
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            GridFilter::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret this as the root of a converted filter.
    ///
    /// A boolean or null root means "no filter" and gives `None`.
    #[must_use]
    pub fn into_root(self) -> Option<GridFilter> {
        match self {
            GridFilter::Bool(_) | GridFilter::Value(Value::Null) => None,
            other => Some(other),
        }
    }

    /// Number of conditions in the tree
    #[must_use]
    pub fn condition_count(&self) -> usize {
        match self {
            GridFilter::Condition { .. } => 1,
            GridFilter::Group { operands, .. } => operands.iter().map(Self::condition_count).sum(),
            _ => 0,
        }
    }

    /// JSON rendition
    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for GridFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            GridFilter::Bool(b) => serializer.serialize_bool(*b),
            GridFilter::Value(value) => value.serialize(serializer),
            GridFilter::Field(name) => serializer.serialize_str(name),
            GridFilter::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            GridFilter::Condition {
                left,
                operator,
                right,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(left.as_ref())?;
                seq.serialize_element(operator.label())?;
                seq.serialize_element(right.as_ref())?;
                seq.end()
            }
            GridFilter::Group { operator, operands } => {
                let len = (operands.len() * 2).saturating_sub(1);
                let mut seq = serializer.serialize_seq(Some(len))?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        seq.serialize_element(operator.label())?;
                    }
                    seq.serialize_element(operand)?;
                }
                seq.end()
            }
        }
    }
}

impl std::fmt::Display for GridFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
