use crate::{
    compiler::{Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{
        helpers::{compile_subschemas, params},
        Keyword,
    },
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct AllOf {
    children: Vec<Arc<SchemaConstraint>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::AllOf(AllOf {
        children: compile_subschemas(ctx, "allOf", value)?,
    })))
}

impl AllOf {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let mut valid = true;
        for (index, child) in self.children.iter().enumerate() {
            let results = scope.apply(child, Some(index.into()), Target::Current)?;
            if !evaluation.push_child(results) {
                valid = false;
                if scope.short_circuit() {
                    break;
                }
            }
        }
        if !valid {
            scope.fail(
                evaluation,
                "allOf",
                params([("value", scope.instance.clone())]),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(3))]
    #[test_case(&json!({"allOf": [true, true]}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(2.5))]
    #[test_case(&json!({"allOf": [false]}), &json!(null))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test_case(&json!({"allOf": []}))]
    #[test_case(&json!({"allOf": {"type": "integer"}}))]
    fn malformed(schema: &Value) {
        tests_util::expect_schema_error(schema);
    }
}
