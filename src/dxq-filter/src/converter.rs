//! AST to grid filter conversion
//!
//! The converter walks a parsed filter, resolves placeholders against a
//! [`DataSource`] and emits a [`GridFilter`]. With short-circuiting enabled
//! every comparison between concrete values is decided up front and the
//! resulting booleans are folded away through the connectives above them.
//!
//! Conversion never fails. A placeholder that cannot be resolved stays in
//! the output spelled `{Entity.Attribute}`.

use dxq_parser::{ComparisonOperator, ComparisonValue, Function, LogicalOperator, Node};
use dxq_shared::utils::split_csv;
use dxq_shared::Value;
use serde::{Deserialize, Serialize};

use crate::data::DataSource;
use crate::evaluate::{evaluate, evaluate_strict};
use crate::grid::{GridFilter, GridOperator};
use crate::resolver::{MissingAttribute, Resolution, Resolver};

/// Conversion settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Decide comparisons between concrete values and fold the booleans
    pub short_circuit: bool,
    /// Expand `IN` lists into `=` conditions joined by `or`
    pub expand_in: bool,
    /// Policy for attributes missing from the entity's record
    pub missing_attribute: MissingAttribute,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            short_circuit: true,
            expand_in: true,
            missing_attribute: MissingAttribute::default(),
        }
    }
}

impl From<ComparisonOperator> for GridOperator {
    fn from(operator: ComparisonOperator) -> Self {
        match operator {
            ComparisonOperator::Eq => GridOperator::Eq,
            // NOT IN expands to `!=` conditions
            ComparisonOperator::Ne | ComparisonOperator::NotIn => GridOperator::Ne,
            ComparisonOperator::Gt => GridOperator::Gt,
            ComparisonOperator::Ge => GridOperator::Ge,
            ComparisonOperator::Lt => GridOperator::Lt,
            ComparisonOperator::Le => GridOperator::Le,
            ComparisonOperator::In => GridOperator::In,
            ComparisonOperator::Between => GridOperator::Between,
            ComparisonOperator::Like => GridOperator::Contains,
            ComparisonOperator::NotLike => GridOperator::NotContains,
        }
    }
}

/// Converts parsed filters against one data source
pub struct Converter<'a, D: DataSource + ?Sized> {
    resolver: Resolver<'a, D>,
    options: ConvertOptions,
}

impl<'a, D: DataSource + ?Sized> Converter<'a, D> {
    /// Create a converter over `data`
    pub fn new(data: &'a D, options: ConvertOptions) -> Self {
        Self {
            resolver: Resolver::new(data, options.missing_attribute),
            options,
        }
    }

    /// The options in effect
    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Convert a node.
    ///
    /// The result may be a bare boolean when the node was decided
    /// statically; see [`GridFilter::into_root`].
    pub fn convert(&self, node: &Node) -> GridFilter {
        match node {
            Node::Logical { operator, .. } => {
                let operands = chain_operands(node, *operator)
                    .into_iter()
                    .map(|operand| self.convert(operand))
                    .collect();
                self.combine(*operator, operands)
            }
            Node::Comparison {
                field,
                operator,
                value,
            } => self.convert_comparison(field, *operator, value),
            other => self.convert_value(other),
        }
    }

    /// Join operands with a connective, folding booleans and splicing
    /// groups that use the same connective.
    fn combine(&self, operator: LogicalOperator, operands: Vec<GridFilter>) -> GridFilter {
        let (absorbing, identity) = match operator {
            LogicalOperator::Or => (true, false),
            LogicalOperator::And => (false, true),
        };

        let mut kept = Vec::with_capacity(operands.len());
        for operand in operands {
            if self.options.short_circuit {
                match operand.as_bool() {
                    Some(b) if b == absorbing => {
                        log::trace!("{} short-circuits to {absorbing}", operator.label());
                        return GridFilter::Bool(absorbing);
                    }
                    Some(_) => continue,
                    None => {}
                }
            }
            match operand {
                GridFilter::Group {
                    operator: inner,
                    operands,
                } if inner == operator => kept.extend(operands),
                other => kept.push(other),
            }
        }

        if kept.len() > 1 {
            return GridFilter::Group {
                operator,
                operands: kept,
            };
        }
        kept.pop().unwrap_or(GridFilter::Bool(identity))
    }

    fn convert_comparison(
        &self,
        field: &Node,
        operator: ComparisonOperator,
        value: &ComparisonValue,
    ) -> GridFilter {
        match operator {
            ComparisonOperator::In | ComparisonOperator::NotIn => {
                self.convert_in(field, operator, value)
            }
            ComparisonOperator::Between | ComparisonOperator::Like | ComparisonOperator::NotLike => {
                GridFilter::condition(
                    self.convert_value(field),
                    operator.into(),
                    self.convert_operand(value),
                )
            }
            _ => match value {
                ComparisonValue::Single(value) => self.convert_relational(field, operator, value),
                other => GridFilter::condition(
                    self.convert_value(field),
                    operator.into(),
                    self.convert_operand(other),
                ),
            },
        }
    }

    fn convert_relational(&self, field: &Node, operator: ComparisonOperator, value: &Node) -> GridFilter {
        if self.options.short_circuit {
            let decided = self
                .decide_isnull(field, operator, value)
                .or_else(|| self.decide_isnull(value, operator.inverse(), field));
            if let Some(decided) = decided {
                return GridFilter::Bool(decided);
            }
        }

        let (field, operator, value) = if isnull_over_field(field).is_none() && isnull_over_field(value).is_some() {
            (value, operator.inverse(), field)
        } else {
            (field, operator, value)
        };

        if let Some((column, default)) = isnull_over_field(field) {
            return self.expand_isnull_field(column, default, operator, value);
        }

        let left = self.convert_value(field);
        let right = self.convert_value(value);
        self.fold_condition(left, operator, right)
    }

    /// `ISNULL({placeholder}, default) <op> literal` with the placeholder
    /// resolved is decided outright.
    fn decide_isnull(&self, call: &Node, operator: ComparisonOperator, other: &Node) -> Option<bool> {
        let Node::FunctionCall {
            function: Function::IsNull,
            args,
        } = call
        else {
            return None;
        };
        let (Some(Node::Placeholder { name }), Node::Literal { value: literal }) = (args.first(), other)
        else {
            return None;
        };
        let Resolution::Resolved(resolved) = self.resolver.resolve(name) else {
            return None;
        };

        let coalesced = if resolved.is_null() {
            let default = args.get(1).map(|node| self.convert_value(node))?;
            default.as_value()?.clone()
        } else {
            resolved
        };

        let decided = evaluate_strict(&coalesced, operator, literal);
        log::trace!(
            "ISNULL({{{name}}}) = {coalesced} {} {literal} decided as {decided:?}",
            operator.symbol()
        );
        decided
    }

    /// `ISNULL(column, d) <op> v` keeps rows where the column is null too
    /// when `d <op> v` holds.
    fn expand_isnull_field(
        &self,
        column: &str,
        default: &Node,
        operator: ComparisonOperator,
        value: &Node,
    ) -> GridFilter {
        let right = self.convert_value(value);
        let default = self.convert_value(default);
        let default_matches = match (default.as_value(), right.as_value()) {
            (Some(d), Some(v)) => evaluate_strict(d, operator, v) == Some(true),
            _ => false,
        };

        let condition = GridFilter::condition(GridFilter::field(column), operator.into(), right);
        if !default_matches {
            return condition;
        }
        let is_null = GridFilter::condition(
            GridFilter::field(column),
            GridOperator::Eq,
            GridFilter::Value(Value::Null),
        );
        self.combine(LogicalOperator::Or, vec![condition, is_null])
    }

    fn fold_condition(
        &self,
        left: GridFilter,
        operator: ComparisonOperator,
        right: GridFilter,
    ) -> GridFilter {
        if self.options.short_circuit {
            if let (Some(l), Some(r)) = (left.as_value(), right.as_value()) {
                if let Some(decided) = evaluate(l, operator, r) {
                    log::trace!("{l} {} {r} decided as {decided}", operator.symbol());
                    return GridFilter::Bool(decided);
                }
            }
        }
        GridFilter::condition(left, operator.into(), right)
    }

    fn convert_in(
        &self,
        field: &Node,
        operator: ComparisonOperator,
        value: &ComparisonValue,
    ) -> GridFilter {
        let field = self.convert_value(field);
        let items = match self.convert_operand(value) {
            GridFilter::List(items) => expand_items(items),
            single => expand_items(vec![single]),
        };

        if operator == ComparisonOperator::In && !self.options.expand_in {
            return GridFilter::condition(field, GridOperator::In, GridFilter::List(items));
        }

        let (each, connective) = match operator {
            ComparisonOperator::NotIn => (ComparisonOperator::Ne, LogicalOperator::And),
            _ => (ComparisonOperator::Eq, LogicalOperator::Or),
        };

        if items.is_empty() {
            return GridFilter::condition(field, each.into(), GridFilter::List(Vec::new()));
        }

        let conditions = items
            .into_iter()
            .map(|item| self.fold_condition(field.clone(), each, item))
            .collect();
        self.combine(connective, conditions)
    }

    fn convert_operand(&self, value: &ComparisonValue) -> GridFilter {
        match value {
            ComparisonValue::Single(node) => self.convert_value(node),
            ComparisonValue::List(nodes) => {
                GridFilter::List(nodes.iter().map(|node| self.convert_value(node)).collect())
            }
            ComparisonValue::Range { low, high } => {
                GridFilter::List(vec![self.convert_value(low), self.convert_value(high)])
            }
        }
    }

    /// Convert a node in operand position
    pub fn convert_value(&self, node: &Node) -> GridFilter {
        match node {
            Node::Literal { value } => GridFilter::Value(value.clone()),
            Node::FieldRef { name } => GridFilter::Field(name.clone()),
            Node::Placeholder { name } => GridFilter::Value(self.resolver.resolve_value(name)),
            Node::FunctionCall { function, args } => self.convert_function(*function, args),
            Node::Logical { .. } | Node::Comparison { .. } => self.convert(node),
        }
    }

    /// `ISNULL(x, d)` as a value is `x`; the default only matters inside
    /// comparisons.
    fn convert_function(&self, function: Function, args: &[Node]) -> GridFilter {
        match function {
            Function::IsNull => match args.first() {
                Some(Node::Placeholder { name }) => {
                    GridFilter::Value(self.resolver.resolve_value(name))
                }
                Some(first) => self.convert_value(first),
                None => GridFilter::Value(Value::Null),
            },
        }
    }
}

/// Convert an AST in one call
pub fn convert_ast<D: DataSource + ?Sized>(
    ast: &Node,
    data: &D,
    options: ConvertOptions,
) -> GridFilter {
    Converter::new(data, options).convert(ast)
}

/// Operands of a chain of one connective, left to right.
///
/// Walks the left-leaning spine the parser builds without recursing.
fn chain_operands(node: &Node, operator: LogicalOperator) -> Vec<&Node> {
    let mut operands = Vec::new();
    let mut current = node;
    while let Node::Logical {
        operator: connective,
        left,
        right,
    } = current
    {
        if *connective != operator {
            break;
        }
        operands.push(&**right);
        current = &**left;
    }
    operands.push(current);
    operands.reverse();
    operands
}

fn isnull_over_field(node: &Node) -> Option<(&str, &Node)> {
    match node {
        Node::FunctionCall {
            function: Function::IsNull,
            args,
        } => match args.as_slice() {
            [Node::FieldRef { name }, default, ..] => Some((name.as_str(), default)),
            _ => None,
        },
        _ => None,
    }
}

/// Flatten list values and split a lone comma-separated string
fn expand_items(items: Vec<GridFilter>) -> Vec<GridFilter> {
    if let [GridFilter::Value(Value::String(text))] = items.as_slice() {
        if text.contains(',') {
            return split_csv(text)
                .into_iter()
                .map(|item| GridFilter::Value(Value::string(item)))
                .collect();
        }
    }

    items
        .into_iter()
        .flat_map(|item| match item {
            GridFilter::Value(Value::Array(values)) => {
                values.into_iter().map(GridFilter::Value).collect()
            }
            other => vec![other],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataMap;
    use dxq_parser::FilterParser;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn convert_with(input: &str, data: &DataMap, options: ConvertOptions) -> JsonValue {
        let parsed = FilterParser::new()
            .parse(input)
            .unwrap()
            .expect("input is a filter");
        let result = Converter::new(data, options).convert(&parsed.ast);
        result.to_json().unwrap()
    }

    fn convert(input: &str, data: &DataMap) -> JsonValue {
        convert_with(input, data, ConvertOptions::default())
    }

    fn sample() -> DataMap {
        DataMap::new()
            .with("X", "Y", 5i64)
            .with("X", "Null", Value::Null)
            .with("X", "Zero", 0i64)
            .with("X", "List", "a, b ,c")
            .with("X", "Items", Value::array(vec![Value::int(1), Value::int(2)]))
            .with("Doc", "Date", "2022-01-01")
    }

    #[test]
    fn test_long_chain_converts_flat() {
        let input = (0..2000)
            .map(|i| format!("F{i} = {i}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let data = DataMap::new();
        let parsed = FilterParser::new().parse(&input).unwrap().unwrap();
        match Converter::new(&data, ConvertOptions::default()).convert(&parsed.ast) {
            GridFilter::Group { operator, operands } => {
                assert_eq!(operator, LogicalOperator::And);
                assert_eq!(operands.len(), 2000);
                let last = GridFilter::condition(
                    GridFilter::field("F1999"),
                    GridOperator::Eq,
                    GridFilter::value(Value::int(1999)),
                );
                assert_eq!(operands[1999], last);
            }
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_operands_stop_at_other_connective() {
        let parsed = FilterParser::new()
            .parse("A = 1 OR B = 2 AND C = 3 OR D = 4")
            .unwrap()
            .unwrap();
        let operands = chain_operands(&parsed.ast, LogicalOperator::Or);
        assert_eq!(operands.len(), 3);
        assert_eq!(operands[1].to_string(), "(B = 2 AND C = 3)");
        assert_eq!(
            convert("A = 1 OR B = 2 AND C = 3 OR D = 4", &sample()),
            json!([["A", "=", 1], "or", [["B", "=", 2], "and", ["C", "=", 3]], "or", ["D", "=", 4]])
        );
    }

    #[test]
    fn test_simple_resolution() {
        assert_eq!(convert("A = {X.Y}", &sample()), json!(["A", "=", 5]));
        assert_eq!(convert("{X.Y} < A", &sample()), json!(["A", ">", 5]));
    }

    #[test]
    fn test_unresolved_placeholder_is_spelled_back() {
        assert_eq!(
            convert("A = {Missing.Y}", &sample()),
            json!(["A", "=", "{Missing.Y}"])
        );
    }

    #[test]
    fn test_quoted_placeholder_resolves() {
        assert_eq!(
            convert("FromDate <= '{Doc.Date}'", &sample()),
            json!(["FromDate", "<=", "2022-01-01"])
        );
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(
            convert("BranchID is Null OR BranchID is not 12", &sample()),
            json!([["BranchID", "=", null], "or", ["BranchID", "!=", 12]])
        );
    }

    #[test]
    fn test_in_expansion() {
        let data = sample();
        assert_eq!(
            convert("A IN (1,2)", &data),
            json!([["A", "=", 1], "or", ["A", "=", 2]])
        );
        assert_eq!(
            convert("A NOT IN (1,2)", &data),
            json!([["A", "!=", 1], "and", ["A", "!=", 2]])
        );
        assert_eq!(convert("A IN (1)", &data), json!(["A", "=", 1]));
    }

    #[test]
    fn test_in_splits_comma_string_and_flattens_arrays() {
        let data = sample();
        assert_eq!(
            convert("A IN ({X.List})", &data),
            json!([["A", "=", "a"], "or", ["A", "=", "b"], "or", ["A", "=", "c"]])
        );
        assert_eq!(
            convert("A NOT IN ({X.Items})", &data),
            json!([["A", "!=", 1], "and", ["A", "!=", 2]])
        );
    }

    #[test]
    fn test_in_with_empty_list() {
        let data = DataMap::new().with("X", "Items", Value::array(vec![]));
        assert_eq!(convert("A IN ({X.Items})", &data), json!(["A", "=", []]));
    }

    #[test]
    fn test_native_in() {
        let options = ConvertOptions {
            expand_in: false,
            ..ConvertOptions::default()
        };
        assert_eq!(
            convert_with("ID IN ({X.List}) AND T IN (2, 4)", &sample(), options),
            json!([["ID", "in", ["a", "b", "c"]], "and", ["T", "in", [2, 4]]])
        );
        assert_eq!(
            convert_with("A NOT IN (1,2)", &sample(), options),
            json!([["A", "!=", 1], "and", ["A", "!=", 2]])
        );
    }

    #[test]
    fn test_in_with_constant_field_folds() {
        let data = sample();
        assert_eq!(
            convert("A = 1 AND {X.Y} IN (4, 5)", &data),
            json!(["A", "=", 1])
        );
        assert_eq!(convert("A = 1 AND {X.Y} IN (1, 2)", &data), json!(false));
    }

    #[test]
    fn test_between_and_like() {
        let data = sample();
        assert_eq!(
            convert("A Between '1' AND '2'", &data),
            json!(["A", "between", ["1", "2"]])
        );
        assert_eq!(
            convert("{X.Y} BETWEEN 1 AND 9", &data),
            json!([5, "between", [1, 9]])
        );
        assert_eq!(
            convert("Name LIKE 'ac' AND Code NOT LIKE {X.Y}", &data),
            json!([["Name", "contains", "ac"], "and", ["Code", "notcontains", 5]])
        );
    }

    #[test]
    fn test_flattening() {
        let data = sample();
        assert_eq!(
            convert("A=1 AND B=2 AND C=3", &data),
            json!([["A", "=", 1], "and", ["B", "=", 2], "and", ["C", "=", 3]])
        );
        assert_eq!(
            convert("A=1 AND (B=2 AND C=3)", &data),
            json!([["A", "=", 1], "and", ["B", "=", 2], "and", ["C", "=", 3]])
        );
        assert_eq!(
            convert("(A=1 OR B=2) AND C=3", &data),
            json!([[["A", "=", 1], "or", ["B", "=", 2]], "and", ["C", "=", 3]])
        );
    }

    #[test]
    fn test_short_circuit_folding() {
        let data = sample();
        assert_eq!(convert("A = 1 OR {X.Y} = 5", &data), json!(true));
        assert_eq!(convert("A = 1 AND {X.Y} = 5", &data), json!(["A", "=", 1]));
        assert_eq!(convert("A = 1 AND {X.Y} = 6", &data), json!(false));
        assert_eq!(convert("A = 1 OR {X.Y} = 6", &data), json!(["A", "=", 1]));
        assert_eq!(
            convert("(CompanyID = {X.Zero} OR {X.Zero} = 0 OR CompanyID IS NULL) AND B = 1", &data),
            json!(["B", "=", 1])
        );
    }

    #[test]
    fn test_numeric_strings_only_coerce_for_ordering() {
        let data = DataMap::new().with("X", "Code", "3");
        assert_eq!(convert("A = 1 AND {X.Code} = 3", &data), json!(false));
        assert_eq!(convert("A = 1 AND {X.Code} = '3'", &data), json!(["A", "=", 1]));
        assert_eq!(convert("A = 1 AND {X.Code} < 4", &data), json!(["A", "=", 1]));
    }

    #[test]
    fn test_unknown_comparisons_stay() {
        let data = sample();
        assert_eq!(
            convert("{Missing.Y} = 0 AND A = 1", &data),
            json!([["{Missing.Y}", "=", 0], "and", ["A", "=", 1]])
        );
        assert_eq!(
            convert("{X.Null} > 0", &data),
            json!([null, ">", 0])
        );
    }

    #[test]
    fn test_isnull_placeholder_is_decided() {
        let data = sample();
        assert_eq!(convert("A = {X.Null} OR ISNULL({X.Null},0) = 0", &data), json!(true));
        assert_eq!(
            convert("A = {X.Y} OR ISNULL({X.Y},0) = 0", &data),
            json!(["A", "=", 5])
        );
        assert_eq!(
            convert("A = {X.Y} AND 0 = ISNULL({X.Null}, 0)", &data),
            json!(["A", "=", 5])
        );
        assert_eq!(
            convert("ISNULL({X.Zero}, 1) > 0 OR A = 1", &data),
            json!(["A", "=", 1])
        );
    }

    #[test]
    fn test_isnull_unresolved_placeholder_stays() {
        assert_eq!(
            convert("ISNULL({Missing.Y}, 0) = 0", &sample()),
            json!(["{Missing.Y}", "=", 0])
        );
    }

    #[test]
    fn test_isnull_over_field() {
        let data = DataMap::new().with("S", "SourceID", 2i64);
        assert_eq!(
            convert("ISNULL(SourceID,0) = {S.SourceID} OR ISNULL(SourceID,0) = 0", &data),
            json!([
                ["SourceID", "=", 2],
                "or",
                ["SourceID", "=", 0],
                "or",
                ["SourceID", "=", null]
            ])
        );
        assert_eq!(
            convert("5 < ISNULL(Qty, 10)", &data),
            json!([["Qty", ">", 5], "or", ["Qty", "=", null]])
        );
    }

    #[test]
    fn test_without_short_circuit_structure_is_kept() {
        let options = ConvertOptions {
            short_circuit: false,
            ..ConvertOptions::default()
        };
        let data = sample();
        assert_eq!(
            convert_with("A = {X.Null} OR ISNULL({X.Null},0) = 0", &data, options),
            json!([["A", "=", null], "or", [null, "=", 0]])
        );
        assert_eq!(
            convert_with("{X.Y} = 5 AND A = 1", &data, options),
            json!([[5, "=", 5], "and", ["A", "=", 1]])
        );
    }

    #[test]
    fn test_missing_attribute_policy() {
        let data = sample();
        assert_eq!(convert("A = {X.Nope}", &data), json!(["A", "=", 5]));
        let options = ConvertOptions {
            missing_attribute: MissingAttribute::Unresolved,
            ..ConvertOptions::default()
        };
        assert_eq!(
            convert_with("A = {X.Nope}", &data, options),
            json!(["A", "=", "{X.Nope}"])
        );
    }

    #[test]
    fn test_convert_is_repeatable() {
        let parsed = FilterParser::new()
            .parse("A = {X.Y} AND (B IN ({X.List}) OR C = 1)")
            .unwrap()
            .unwrap();
        let data = sample();
        let converter = Converter::new(&data, ConvertOptions::default());
        assert_eq!(converter.convert(&parsed.ast), converter.convert(&parsed.ast));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ConvertOptions = serde_json::from_value(json!({"expand_in": false})).unwrap();
        assert!(options.short_circuit);
        assert!(!options.expand_in);
        assert_eq!(options.missing_attribute, MissingAttribute::FirstProperty);
    }
}
