use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{non_negative_integer, params},
        Keyword,
    },
};
use serde_json::{json, Map, Value};

#[derive(Debug)]
pub(crate) struct MaxLength {
    limit: u64,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let limit = non_negative_integer(ctx, "maxLength", value)?;
    Ok(Some(Keyword::MaxLength(MaxLength { limit })))
}

impl MaxLength {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::String(item) = scope.instance {
            // Lengths count Unicode scalar values, not UTF-8 bytes
            if item.chars().count() as u64 > self.limit {
                scope.fail(
                    evaluation,
                    "maxLength",
                    params([("value", scope.instance.clone()), ("limit", json!(self.limit))]),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"maxLength": 2}), &json!("ab"))]
    #[test_case(&json!({"maxLength": 2}), &json!("\u{00e9}\u{00e9}"); "code points not bytes")]
    #[test_case(&json!({"maxLength": 2}), &json!(123))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"maxLength": 2}), &json!("abc"))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test_case(&json!({"maxLength": -1}))]
    #[test_case(&json!({"maxLength": 1.5}))]
    fn malformed(schema: &Value) {
        tests_util::expect_schema_error(schema);
    }
}
