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
pub(crate) struct MinItems {
    limit: u64,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let limit = non_negative_integer(ctx, "minItems", value)?;
    Ok(Some(Keyword::MinItems(MinItems { limit })))
}

impl MinItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Array(items) = scope.instance {
            if (items.len() as u64) < self.limit {
                scope.fail(
                    evaluation,
                    "minItems",
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

    #[test_case(&json!({"minItems": 1}), &json!([1]))]
    #[test_case(&json!({"minItems": 1}), &json!({}))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"minItems": 1}), &json!([]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }
}
