use crate::{
    compiler::{Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{
        helpers::{compile_subschemas, params},
        Keyword,
    },
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct PrefixItems {
    children: Vec<Arc<SchemaConstraint>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::PrefixItems(PrefixItems {
        children: compile_subschemas(ctx, "prefixItems", value)?,
    })))
}

impl PrefixItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Array(items) = scope.instance else {
            return Ok(());
        };
        let count = self.children.len().min(items.len());
        let mut unmatched = Vec::new();
        for (index, child) in self.children.iter().take(count).enumerate() {
            let results = scope.apply(child, Some(index.into()), Target::Index(index))?;
            if !evaluation.push_child(results) {
                unmatched.push(json!(index));
                if scope.short_circuit() {
                    break;
                }
            }
        }
        if !unmatched.is_empty() {
            scope.fail(
                evaluation,
                "prefixItems",
                params([("unmatched", Value::Array(unmatched))]),
            );
        } else if count == items.len() {
            // The whole array is covered
            evaluation.annotate(Value::Bool(true));
        } else if count > 0 {
            evaluation.annotate(json!(count - 1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"prefixItems": [{"type": "integer"}, {"type": "string"}]}), &json!([1, "a"]))]
    #[test_case(&json!({"prefixItems": [{"type": "integer"}]}), &json!([1, "anything", null]))]
    #[test_case(&json!({"prefixItems": [{"type": "integer"}]}), &json!([]))]
    #[test_case(&json!({"prefixItems": [{"type": "integer"}]}), &json!({"0": 1}))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"prefixItems": [{"type": "integer"}]}), &json!(["a"]))]
    #[test_case(&json!({"prefixItems": [true, {"type": "string"}]}), &json!([1, 2]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn annotates_last_index() {
        let results = tests_util::evaluate(
            &json!({"prefixItems": [true, true]}),
            &json!([1, 2, 3]),
        );
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("prefixItems", &json!(1))));
    }

    #[test]
    fn annotates_true_when_all_covered() {
        let results = tests_util::evaluate(&json!({"prefixItems": [true, true]}), &json!([1, 2]));
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("prefixItems", &json!(true))));
    }
}
