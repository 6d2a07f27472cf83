use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{helpers::params, Keyword},
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// `additionalItems` applies after the last index covered by the array form
/// of `items`. When `items` covers everything (or is absent), there is
/// nothing left to do and the keyword is skipped.
#[derive(Debug)]
pub(crate) struct AdditionalItems {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::AdditionalItems(AdditionalItems {
        child: compiler::compile(&ctx.push("additionalItems"), value)?,
    })))
}

impl AdditionalItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        let Value::Array(items) = scope.instance else {
            return Ok(());
        };
        let start = match siblings.annotation("items") {
            Some(Value::Number(last)) => last.as_u64().map_or(0, |last| last as usize + 1),
            _ => {
                evaluation.skip();
                return Ok(());
            }
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
            evaluation.annotate(Value::Bool(true));
        } else {
            scope.fail(
                evaluation,
                "additionalItems",
                params([("unmatched", Value::Array(unmatched))]),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use test_case::test_case;

    fn draft7(schema: Value) -> Value {
        let mut with_draft = schema.as_object().expect("Objects only").clone();
        with_draft.insert(
            "$schema".to_string(),
            json!("http://json-schema.org/draft-07/schema#"),
        );
        Value::Object(with_draft)
    }

    #[test_case(json!({"items": [{}], "additionalItems": {"type": "integer"}}), json!([null, 2, 3]), true)]
    #[test_case(json!({"items": [{}], "additionalItems": {"type": "integer"}}), json!([null, 2, "foo"]), false)]
    #[test_case(json!({"items": [{}, {}, {}], "additionalItems": false}), json!([1, 2, 3]), true)]
    #[test_case(json!({"items": [{}, {}, {}], "additionalItems": false}), json!([1, 2, 3, 4]), false)]
    #[test_case(json!({"additionalItems": false}), json!([1, 2]), true; "inert without array form items")]
    #[test_case(json!({"items": {}, "additionalItems": false}), json!([1, 2]), true; "inert with schema form items")]
    fn behavior(schema: Value, instance: Value, expected: bool) {
        let validator = crate::validator_for(&draft7(schema)).expect("Valid schema");
        assert_eq!(validator.is_valid(&instance), expected);
    }
}
