use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{helpers::params, Keyword},
    paths::PathChunk,
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct Properties {
    children: Vec<(Box<str>, Arc<SchemaConstraint>)>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::invalid_form(
            "properties",
            ctx.location(),
            "expected an object",
        ));
    };
    let kctx = ctx.push("properties");
    let mut children = Vec::with_capacity(map.len());
    for (name, subschema) in map {
        children.push((
            name.clone().into_boxed_str(),
            compiler::compile(&kctx.push(name), subschema)?,
        ));
    }
    Ok(Some(Keyword::Properties(Properties { children })))
}

impl Properties {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for (name, child) in &self.children {
            if !object.contains_key(name.as_ref()) {
                continue;
            }
            let results = scope.apply(
                child,
                Some(PathChunk::Property(name.clone())),
                Target::Key(name),
            )?;
            if !evaluation.push_child(results) {
                unmatched.push(Value::String(name.to_string()));
                if scope.short_circuit() {
                    break;
                }
            }
            matched.push(Value::String(name.to_string()));
        }
        if unmatched.is_empty() {
            // The annotation lists the keys this keyword covered
            evaluation.annotate(Value::Array(matched));
        } else {
            scope.fail(
                evaluation,
                "properties",
                params([("unmatched", Value::Array(unmatched))]),
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

    #[test_case(&json!({"properties": {"a": {"type": "string"}}}), &json!({"a": "x"}))]
    #[test_case(&json!({"properties": {"a": {"type": "string"}}}), &json!({"b": 1}))]
    #[test_case(&json!({"properties": {"a": false}}), &json!({"b": 1}))]
    #[test_case(&json!({"properties": {"a": {"type": "string"}}}), &json!([1]))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"properties": {"a": {"type": "string"}}}), &json!({"a": 1}))]
    #[test_case(&json!({"properties": {"a": false}}), &json!({"a": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn annotates_matched_keys() {
        let results = tests_util::evaluate(
            &json!({"properties": {"a": true, "b": true, "c": true}}),
            &json!({"a": 1, "c": 2, "d": 3}),
        );
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("properties", &json!(["a", "c"]))));
    }

    #[test]
    fn child_error_location() {
        let results = tests_util::evaluate(
            &json!({"properties": {"a": {"type": "string"}}}),
            &json!({"a": 1}),
        );
        let errors = tests_util::all_errors(&results);
        assert!(errors.iter().any(|entry| entry.keyword.as_ref() == "type"));
    }

    #[test]
    fn malformed() {
        tests_util::expect_schema_error(&json!({"properties": [1]}));
    }
}
