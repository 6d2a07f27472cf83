use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Siblings, Target},
    keywords::{helpers::params, Keyword},
};
use ahash::AHashSet;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Property-name annotations relevant to the unevaluated check.
const SOURCES: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
];

/// In contrast to `additionalProperties`, this keyword sees through in-place
/// applicators: every annotation produced at the same instance location
/// within the current schema scope counts, including those from `allOf` /
/// `anyOf` / `oneOf` branches, `if`/`then`/`else`, `dependentSchemas` and
/// references. It runs last (priority 30), after all of them.
#[derive(Debug)]
pub(crate) struct UnevaluatedProperties {
    child: Arc<SchemaConstraint>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::UnevaluatedProperties(UnevaluatedProperties {
        child: compiler::compile(&ctx.push("unevaluatedProperties"), value)?,
    })))
}

impl UnevaluatedProperties {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
        siblings: &Siblings<'_>,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        let mut covered = AHashSet::new();
        for annotation in siblings.gather(SOURCES, scope.instance_location) {
            match annotation {
                // `true` means "all properties are covered"
                Value::Bool(true) => {
                    evaluation.skip();
                    return Ok(());
                }
                Value::Array(keys) => covered.extend(keys.iter().filter_map(Value::as_str)),
                _ => {}
            }
        }
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
        }
        if unexpected.is_empty() {
            evaluation.annotate(Value::Bool(true));
        } else {
            scope.fail(
                evaluation,
                "unevaluatedProperties",
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

    #[test_case(
        &json!({"properties": {"a": true}, "unevaluatedProperties": false}),
        &json!({"a": 1})
    )]
    #[test_case(
        &json!({"allOf": [{"properties": {"a": true}}], "unevaluatedProperties": false}),
        &json!({"a": 1});
        "sees annotations from allOf branches"
    )]
    #[test_case(
        &json!({
            "if": {"properties": {"a": {"const": 1}}, "required": ["a"]},
            "then": {"properties": {"b": true}},
            "unevaluatedProperties": false
        }),
        &json!({"a": 1, "b": 2});
        "sees annotations from taken branches"
    )]
    #[test_case(
        &json!({"additionalProperties": true, "unevaluatedProperties": false}),
        &json!({"a": 1});
        "skipped when everything is covered"
    )]
    #[test_case(&json!({"unevaluatedProperties": {"type": "integer"}}), &json!({"a": 1}))]
    #[test_case(&json!({"unevaluatedProperties": false}), &json!([1, 2]))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(
        &json!({"allOf": [{"properties": {"a": {}}}], "unevaluatedProperties": false}),
        &json!({"a": 1, "b": 2})
    )]
    #[test_case(
        &json!({
            "if": {"properties": {"a": {"const": 1}}, "required": ["a"]},
            "then": {"properties": {"b": true}},
            "unevaluatedProperties": false
        }),
        &json!({"a": 2, "b": 2});
        "untaken branch annotations are invisible"
    )]
    #[test_case(&json!({"unevaluatedProperties": false}), &json!({"a": 1}))]
    #[test_case(
        &json!({"anyOf": [{"properties": {"a": true}}, false], "unevaluatedProperties": false}),
        &json!({"a": 1, "b": 2});
        "failed branch annotations are invisible"
    )]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn error_message() {
        tests_util::expect_error(
            &json!({"allOf": [{"properties": {"a": {}}}], "unevaluatedProperties": false}),
            &json!({"a": 1, "b": 2}),
            "unevaluatedProperties",
            r#"unevaluated properties are not allowed (["b"] were unexpected)"#,
        );
    }

    #[test]
    fn not_available_in_draft7() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "unevaluatedProperties": false
        });
        let validator = crate::validator_for(&schema).expect("Valid schema");
        // Treated as an unknown keyword, hence an annotation
        assert!(validator.is_valid(&json!({"a": 1})));
    }
}
