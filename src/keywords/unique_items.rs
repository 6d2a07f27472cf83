use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{equal, params},
        Keyword,
    },
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct UniqueItems;

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    match value {
        // `uniqueItems: false` asserts nothing
        Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some(Keyword::UniqueItems(UniqueItems))),
        _ => Err(SchemaError::invalid_form(
            "uniqueItems",
            ctx.location(),
            "expected a boolean",
        )),
    }
}

pub(crate) fn is_unique(items: &[Value]) -> bool {
    for (position, item) in items.iter().enumerate() {
        if items[position + 1..].iter().any(|other| equal(item, other)) {
            return false;
        }
    }
    true
}

impl UniqueItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Array(items) = scope.instance {
            if !is_unique(items) {
                scope.fail(
                    evaluation,
                    "uniqueItems",
                    params([("value", scope.instance.clone())]),
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

    #[test_case(&json!({"uniqueItems": true}), &json!([1, 2, 3]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([{"a": 1}, {"a": 2}]))]
    #[test_case(&json!({"uniqueItems": false}), &json!([1, 1]))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1.0]); "numeric normalization")]
    #[test_case(&json!({"uniqueItems": true}), &json!([{"a": 1}, {"a": 1.0}]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }
}
