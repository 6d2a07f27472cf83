use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{helpers::params, Keyword},
};
use ahash::AHashSet;
use serde_json::{Map, Value};
use std::sync::Arc;

/// `additionalProperties` applies its sub-schema to every key not covered by
/// `properties` or `patternProperties`. Coverage comes from the siblings'
/// annotations, which is why this keyword depends on them in the registry.
#[derive(Debug)]
pub(crate) struct AdditionalProperties {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::AdditionalProperties(AdditionalProperties {
        child: compiler::compile(&ctx.push("additionalProperties"), value)?,
    })))
}

/// Keys covered by the direct siblings' annotations. Unlike `unevaluated*`,
/// this keyword does not see through in-place applicators.
fn covered_keys<'a>(siblings: &Siblings<'a>, keywords: &[&str]) -> AHashSet<&'a str> {
    let mut covered = AHashSet::new();
    for keyword in keywords {
        if let Some(Value::Array(keys)) = siblings.annotation(keyword) {
            covered.extend(keys.iter().filter_map(Value::as_str));
        }
    }
    covered
}

impl AdditionalProperties {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        let covered = covered_keys(siblings, &["properties", "patternProperties"]);
        let mut evaluated = Vec::new();
        let mut unexpected = Vec::new();
        for key in object.keys() {
            if covered.contains(key.as_str()) {
                continue;
            }
            let results = scope.apply(&self.child, None, Target::Key(key))?;
            if !evaluation.push_child(results) {
                unexpected.push(Value::String(key.clone()));
                if scope.short_circuit() {
                    break;
                }
            }
            evaluated.push(Value::String(key.clone()));
        }
        if unexpected.is_empty() {
            evaluation.annotate(Value::Array(evaluated));
        } else {
            scope.fail(
                evaluation,
                "additionalProperties",
                params([("unexpected", Value::Array(unexpected))]),
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

    #[test_case(&json!({"additionalProperties": false}), &json!({}))]
    #[test_case(&json!({"additionalProperties": false, "properties": {"a": true}}), &json!({"a": 1}))]
    #[test_case(
        &json!({"additionalProperties": false, "patternProperties": {"^f": true}}),
        &json!({"foo": 1})
    )]
    #[test_case(&json!({"additionalProperties": {"type": "string"}}), &json!({"a": "x"}))]
    #[test_case(&json!({"additionalProperties": false}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"additionalProperties": false}), &json!({"a": 1}))]
    #[test_case(
        &json!({"properties": {"a": {"type": "string"}}, "additionalProperties": false}),
        &json!({"a": "x", "b": 1})
    )]
    #[test_case(&json!({"additionalProperties": {"type": "string"}}), &json!({"a": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn error_lists_unexpected_keys() {
        tests_util::expect_error(
            &json!({"properties": {"a": true}, "additionalProperties": false}),
            &json!({"a": 1, "b": 2, "c": 3}),
            "additionalProperties",
            r#"additional properties are not allowed (["b","c"] were unexpected)"#,
        );
    }

    #[test]
    fn annotates_evaluated_keys() {
        let results = tests_util::evaluate(
            &json!({"properties": {"a": true}, "additionalProperties": true}),
            &json!({"a": 1, "b": 2}),
        );
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("additionalProperties", &json!(["b"]))));
    }
}
