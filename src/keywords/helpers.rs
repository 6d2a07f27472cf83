use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

macro_rules! num_cmp {
    ($left:expr, $right:expr, $op:ident) => {
        if let Some(right) = $right.as_u64() {
            NumCmp::$op($left, right)
        } else if let Some(right) = $right.as_i64() {
            NumCmp::$op($left, right)
        } else {
            NumCmp::$op($left, $right.as_f64().expect("Always valid"))
        }
    };
}

macro_rules! define_comparison {
    ($name:ident, $op:ident) => {
        #[inline]
        pub(crate) fn $name(left: &Number, right: &Number) -> bool {
            if let Some(left) = left.as_u64() {
                num_cmp!(left, right, $op)
            } else if let Some(left) = left.as_i64() {
                num_cmp!(left, right, $op)
            } else {
                let left = left.as_f64().expect("Always valid");
                num_cmp!(left, right, $op)
            }
        }
    };
}

define_comparison!(num_lt, num_lt);
define_comparison!(num_le, num_le);
define_comparison!(num_gt, num_gt);
define_comparison!(num_ge, num_ge);

/// Deep equality with numeric normalization: `1` equals `1.0`.
#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => {
            if let Some(left) = left.as_u64() {
                num_cmp!(left, right, num_eq)
            } else if let Some(left) = left.as_i64() {
                num_cmp!(left, right, num_eq)
            } else {
                num_cmp!(left.as_f64().expect("Always valid"), right, num_eq)
            }
        }
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right.iter()).all(|(a, b)| equal(a, b))
}

#[inline]
pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).map_or(false, |other| equal(value, other)))
}

/// Build a parameter map for an error entry.
pub(crate) fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

pub(crate) fn non_negative_integer(
    ctx: &crate::compiler::Context<'_>,
    keyword: &'static str,
    value: &Value,
) -> Result<u64, crate::error::SchemaError> {
    value.as_u64().ok_or_else(|| {
        crate::error::SchemaError::invalid_form(
            keyword,
            ctx.location(),
            "expected a non-negative integer",
        )
    })
}

/// Compile the non-empty array of sub-schemas of `keyword`.
pub(crate) fn compile_subschemas(
    ctx: &crate::compiler::Context<'_>,
    keyword: &'static str,
    value: &Value,
) -> Result<Vec<std::sync::Arc<crate::compiler::SchemaConstraint>>, crate::error::SchemaError> {
    let Value::Array(subschemas) = value else {
        return Err(crate::error::SchemaError::invalid_form(
            keyword,
            ctx.location(),
            "expected an array of schemas",
        ));
    };
    if subschemas.is_empty() {
        return Err(crate::error::SchemaError::invalid_form(
            keyword,
            ctx.location(),
            "expected a non-empty array",
        ));
    }
    let kctx = ctx.push(keyword);
    subschemas
        .iter()
        .enumerate()
        .map(|(index, subschema)| crate::compiler::compile(&kctx.push_index(index), subschema))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{equal, num_gt, num_lt};
    use serde_json::{json, Number, Value};
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0))]
    #[test_case(&json!([2]), &json!([2.0]))]
    #[test_case(&json!([-3]), &json!([-3.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}))]
    fn are_equal(left: &Value, right: &Value) {
        assert!(equal(left, right))
    }

    #[test_case(&json!(1), &json!(2.0))]
    #[test_case(&json!([]), &json!(["foo"]))]
    #[test_case(&json!([-3]), &json!([-4.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0, "b": 2}))]
    #[test_case(&json!({"a": 1}), &json!({"b": 1}))]
    fn are_not_equal(left: &Value, right: &Value) {
        assert!(!equal(left, right))
    }

    fn number(value: Value) -> Number {
        match value {
            Value::Number(number) => number,
            _ => panic!("Not a number"),
        }
    }

    #[test]
    fn mixed_type_comparisons() {
        let huge = number(json!(u64::MAX));
        let negative = number(json!(-1));
        let fractional = number(json!(0.5));
        assert!(num_lt(&negative, &huge));
        assert!(num_gt(&huge, &fractional));
        assert!(!num_lt(&huge, &negative));
    }
}
