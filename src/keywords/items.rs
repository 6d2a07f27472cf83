use crate::{
    compiler::{self, Context, SchemaConstraint},
    drafts::Draft,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{
        helpers::{compile_subschemas, params},
        Keyword,
    },
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Schema-form `items`: applies one sub-schema to every element after the
/// `prefixItems` boundary (draft 2020-12) or to all elements (older drafts).
#[derive(Debug)]
pub(crate) struct Items {
    child: Arc<SchemaConstraint>,
}

/// Array-form `items` of drafts 6 through 2019-09.
#[derive(Debug)]
pub(crate) struct ItemsArray {
    children: Vec<Arc<SchemaConstraint>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    parent: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    match value {
        Value::Array(_) => {
            if matches!(ctx.draft, Draft::Draft202012 | Draft::DraftNext) {
                return Err(SchemaError::invalid_form(
                    "items",
                    ctx.location(),
                    "the array form was replaced by `prefixItems` in draft 2020-12",
                ));
            }
            if ctx.draft == Draft::Draft201909 && parent.contains_key("prefixItems") {
                return Err(SchemaError::invalid_form(
                    "items",
                    ctx.location(),
                    "the array form cannot be combined with `prefixItems`",
                ));
            }
            Ok(Some(Keyword::ItemsArray(ItemsArray {
                children: compile_subschemas(ctx, "items", value)?,
            })))
        }
        _ => Ok(Some(Keyword::Items(Items {
            child: compiler::compile(&ctx.push("items"), value)?,
        }))),
    }
}

impl Items {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        let Value::Array(items) = scope.instance else {
            return Ok(());
        };
        let start = match siblings.annotation("prefixItems") {
            Some(Value::Bool(true)) => items.len(),
            Some(Value::Number(last)) => last.as_u64().map_or(0, |last| last as usize + 1),
            _ => 0,
        };
        let mut unmatched = Vec::new();
        for index in start..items.len() {
            let results = scope.apply(&self.child, None, Target::Index(index))?;
            if !evaluation.push_child(results) {
                unmatched.push(json!(index));
                if scope.short_circuit() {
                    break;
                }
            }
        }
        if unmatched.is_empty() {
            // Everything from `start` on is covered
            evaluation.annotate(Value::Bool(true));
        } else {
            scope.fail(
                evaluation,
                "items",
                params([("unmatched", Value::Array(unmatched))]),
            );
        }
        Ok(())
    }
}

impl ItemsArray {
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
                "items",
                params([("unmatched", Value::Array(unmatched))]),
            );
        } else if count == items.len() {
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

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, 2, 3]))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!([]))]
    #[test_case(&json!({"items": false}), &json!([]))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!("not an array"))]
    #[test_case(&json!({"prefixItems": [{"type": "integer"}], "items": {"type": "string"}}), &json!([1, "x", "y"]))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, "a"]))]
    #[test_case(&json!({"items": false}), &json!([1]))]
    #[test_case(&json!({"prefixItems": [{"type": "integer"}], "items": {"type": "string"}}), &json!([1, "x", 2]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn array_form_is_rejected_in_2020() {
        tests_util::expect_schema_error(&json!({"items": [{"type": "integer"}]}));
    }

    #[test]
    fn array_form_works_in_draft7() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "items": [{"type": "integer"}, {"type": "string"}]
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        assert!(validator.is_valid(&json!([1, "a", null])));
        assert!(!validator.is_valid(&json!(["a"])));
    }
}
