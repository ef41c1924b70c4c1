//! Abstract Syntax Tree (AST) definitions for filter expressions
//!
//! The tree is closed: every node is one of the [`Node`] variants and each
//! comparison carries exactly the value shape its operator requires.

use std::fmt;

use dxq_shared::Value;
use serde::Serialize;

/// A node of a parsed filter expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// `left AND right` / `left OR right`
    Logical {
        /// The connective
        operator: LogicalOperator,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },

    /// `field <op> value`
    Comparison {
        /// Left-hand side, normally a field reference
        field: Box<Node>,
        /// Comparison operator
        operator: ComparisonOperator,
        /// Right-hand side
        value: ComparisonValue,
    },

    /// A call to one of the supported functions
    FunctionCall {
        /// The function
        function: Function,
        /// Arguments as written (at least two for `ISNULL`)
        args: Vec<Node>,
    },

    /// A bare column/field name
    FieldRef {
        /// Field name, possibly dotted
        name: String,
    },

    /// A literal value
    Literal {
        /// The value
        value: Value,
    },

    /// A deferred `{Entity.Attribute}` reference
    Placeholder {
        /// Dotted placeholder name without braces
        name: String,
    },
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonValue {
    /// A single operand
    Single(Box<Node>),
    /// Parenthesized list (`IN`, `NOT IN`)
    List(Vec<Node>),
    /// Inclusive bounds (`BETWEEN`)
    Range {
        /// Lower bound
        low: Box<Node>,
        /// Upper bound
        high: Box<Node>,
    },
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    /// Conjunction
    And,
    /// Disjunction
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonOperator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=` (also written `<>`)
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `IN (...)`
    #[serde(rename = "in")]
    In,
    /// `NOT IN (...)`
    #[serde(rename = "not in")]
    NotIn,
    /// `BETWEEN low AND high`
    #[serde(rename = "between")]
    Between,
    /// `LIKE`
    #[serde(rename = "like")]
    Like,
    /// `NOT LIKE`
    #[serde(rename = "not like")]
    NotLike,
}

/// Supported functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Function {
    /// `ISNULL(expr, default)`
    #[serde(rename = "ISNULL")]
    IsNull,
}

impl LogicalOperator {
    /// Binding strength used by the precedence-climbing parser
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            LogicalOperator::Or => 1,
            LogicalOperator::And => 2,
        }
    }

    /// Lowercase label, as emitted in grid filters
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }

    /// Map a canonical operator token to a connective
    #[must_use]
    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl ComparisonOperator {
    /// Comparisons bind tighter than any connective
    pub const PRECEDENCE: u8 = 3;

    /// Map a canonical operator token to a comparison operator
    #[must_use]
    pub fn from_token(text: &str) -> Option<Self> {
        let op = match text {
            "=" => ComparisonOperator::Eq,
            "!=" => ComparisonOperator::Ne,
            ">" => ComparisonOperator::Gt,
            ">=" => ComparisonOperator::Ge,
            "<" => ComparisonOperator::Lt,
            "<=" => ComparisonOperator::Le,
            "IN" => ComparisonOperator::In,
            "NOT IN" => ComparisonOperator::NotIn,
            "BETWEEN" => ComparisonOperator::Between,
            "LIKE" => ComparisonOperator::Like,
            "NOT LIKE" => ComparisonOperator::NotLike,
            _ => return None,
        };
        Some(op)
    }

    /// SQL spelling
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::In => "IN",
            ComparisonOperator::NotIn => "NOT IN",
            ComparisonOperator::Between => "BETWEEN",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::NotLike => "NOT LIKE",
        }
    }

    /// The operator that holds when both sides are swapped
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            ComparisonOperator::Gt => ComparisonOperator::Lt,
            ComparisonOperator::Lt => ComparisonOperator::Gt,
            ComparisonOperator::Ge => ComparisonOperator::Le,
            ComparisonOperator::Le => ComparisonOperator::Ge,
            other => other,
        }
    }

    /// `=`, `!=`, `>`, `>=`, `<`, `<=`
    #[must_use]
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            ComparisonOperator::Eq
                | ComparisonOperator::Ne
                | ComparisonOperator::Gt
                | ComparisonOperator::Ge
                | ComparisonOperator::Lt
                | ComparisonOperator::Le
        )
    }
}

impl Function {
    /// Resolve a function name as written
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("ISNULL") {
            Some(Function::IsNull)
        } else {
            None
        }
    }

    /// Canonical name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Function::IsNull => "ISNULL",
        }
    }

    /// Minimum number of arguments
    #[must_use]
    pub fn min_args(self) -> usize {
        match self {
            Function::IsNull => 2,
        }
    }
}

impl Node {
    /// Field reference node
    pub fn field(name: impl Into<String>) -> Self {
        Node::FieldRef { name: name.into() }
    }

    /// Literal node
    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal {
            value: value.into(),
        }
    }

    /// `NULL` literal node
    #[must_use]
    pub fn null() -> Self {
        Node::Literal { value: Value::Null }
    }

    /// Placeholder node
    pub fn placeholder(name: impl Into<String>) -> Self {
        Node::Placeholder { name: name.into() }
    }

    /// Comparison with a single right-hand operand
    #[must_use]
    pub fn compare(field: Node, operator: ComparisonOperator, value: Node) -> Self {
        Node::Comparison {
            field: Box::new(field),
            operator,
            value: ComparisonValue::Single(Box::new(value)),
        }
    }

    /// Logical connective node
    #[must_use]
    pub fn logical(operator: LogicalOperator, left: Node, right: Node) -> Self {
        Node::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `ISNULL(arg, default)`
    #[must_use]
    pub fn is_null_call(arg: Node, default: Node) -> Self {
        Node::FunctionCall {
            function: Function::IsNull,
            args: vec![arg, default],
        }
    }

    /// Height of the tree (a leaf has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Node::Logical { left, right, .. } => 1 + left.depth().max(right.depth()),
            Node::Comparison { field, value, .. } => {
                let value_depth = match value {
                    ComparisonValue::Single(node) => node.depth(),
                    ComparisonValue::List(nodes) => {
                        nodes.iter().map(Node::depth).max().unwrap_or(0)
                    }
                    ComparisonValue::Range { low, high } => low.depth().max(high.depth()),
                };
                1 + field.depth().max(value_depth)
            }
            Node::FunctionCall { args, .. } => 1 + args.iter().map(Node::depth).max().unwrap_or(0),
            Node::FieldRef { .. } | Node::Literal { .. } | Node::Placeholder { .. } => 1,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Logical {
                operator,
                left,
                right,
            } => write!(f, "({left} {} {right})", operator.label().to_uppercase()),
            Node::Comparison {
                field,
                operator,
                value,
            } => write!(f, "{field} {} {value}", operator.symbol()),
            Node::FunctionCall { function, args } => {
                write!(f, "{}(", function.name())?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Node::FieldRef { name } => write!(f, "{name}"),
            Node::Literal { value } => write!(f, "{value}"),
            Node::Placeholder { name } => write!(f, "{{{name}}}"),
        }
    }
}

impl fmt::Display for ComparisonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonValue::Single(node) => write!(f, "{node}"),
            ComparisonValue::List(nodes) => {
                write!(f, "(")?;
                write_list(f, nodes)?;
                write!(f, ")")
            }
            ComparisonValue::Range { low, high } => write!(f, "{low} AND {high}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}
