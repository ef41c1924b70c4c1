//! Constant evaluation of comparisons between concrete values
//!
//! Results are three-valued: `Some(true)`, `Some(false)`, or `None` when the
//! comparison cannot be decided statically and must stay in the output.

use dxq_parser::ComparisonOperator;
use dxq_shared::Value;

/// Decide `left <op> right` for two concrete values.
///
/// - a non-null side without a numeric reading makes the result unknown
/// - `=` and `!=` do not coerce: `'3' = 3` is false, `2 = 2.0` is true
/// - ordering compares numeric readings, so `'3' < 4` holds
/// - `null = null` holds and null against a number is unequal
/// - ordering with a null side is unknown
#[must_use]
pub fn evaluate(left: &Value, operator: ComparisonOperator, right: &Value) -> Option<bool> {
    let lhs = numeric_or_null(left)?;
    let rhs = numeric_or_null(right)?;

    match (operator, lhs, rhs) {
        (ComparisonOperator::Eq, ..) => Some(left == right),
        (ComparisonOperator::Ne, ..) => Some(left != right),
        (_, Some(a), Some(b)) => compare_numbers(a, operator, b),
        _ => None,
    }
}

/// [`evaluate`], falling back to plain equality for `=` and `!=` between
/// non-numeric values (`'abc' = 'abc'`).
#[must_use]
pub fn evaluate_strict(left: &Value, operator: ComparisonOperator, right: &Value) -> Option<bool> {
    evaluate(left, operator, right).or_else(|| match operator {
        ComparisonOperator::Eq => Some(left == right),
        ComparisonOperator::Ne => Some(left != right),
        _ => None,
    })
}

/// `Some(None)` for null, `Some(Some(n))` for a number, `None` otherwise
fn numeric_or_null(value: &Value) -> Option<Option<f64>> {
    if value.is_null() {
        Some(None)
    } else {
        value.as_number().map(Some)
    }
}

fn compare_numbers(a: f64, operator: ComparisonOperator, b: f64) -> Option<bool> {
    let result = match operator {
        ComparisonOperator::Gt => a > b,
        ComparisonOperator::Ge => a >= b,
        ComparisonOperator::Lt => a < b,
        ComparisonOperator::Le => a <= b,
        _ => return None,
    };
    Some(result)
}
