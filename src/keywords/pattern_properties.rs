use crate::{
    compiler::{self, Context, SchemaConstraint},
    ecma::EcmaRegex,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{helpers::params, Keyword},
    paths::PathChunk,
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct PatternProperties {
    patterns: Vec<(Box<str>, EcmaRegex, Arc<SchemaConstraint>)>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::invalid_form(
            "patternProperties",
            ctx.location(),
            "expected an object",
        ));
    };
    let kctx = ctx.push("patternProperties");
    let mut patterns = Vec::with_capacity(map.len());
    for (pattern, subschema) in map {
        let regex = EcmaRegex::new(pattern).map_err(|()| SchemaError::InvalidPattern {
            pattern: pattern.clone(),
            location: ctx.location(),
        })?;
        patterns.push((
            pattern.clone().into_boxed_str(),
            regex,
            compiler::compile(&kctx.push(pattern), subschema)?,
        ));
    }
    Ok(Some(Keyword::PatternProperties(PatternProperties {
        patterns,
    })))
}

impl PatternProperties {
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
        for key in object.keys() {
            let mut covered = false;
            for (pattern, regex, child) in &self.patterns {
                if !regex.is_match(key) {
                    continue;
                }
                covered = true;
                let results = scope.apply(
                    child,
                    Some(PathChunk::Property(pattern.clone())),
                    Target::Key(key),
                )?;
                if !evaluation.push_child(results) {
                    unmatched.push(Value::String(key.clone()));
                }
            }
            if covered {
                matched.push(Value::String(key.clone()));
            }
        }
        if unmatched.is_empty() {
            evaluation.annotate(Value::Array(matched));
        } else {
            unmatched.dedup();
            scope.fail(
                evaluation,
                "patternProperties",
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

    #[test_case(&json!({"patternProperties": {"^f": {"type": "integer"}}}), &json!({"foo": 1}))]
    #[test_case(&json!({"patternProperties": {"^f": {"type": "integer"}}}), &json!({"bar": "x"}))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"patternProperties": {"^f": {"type": "integer"}}}), &json!({"foo": "x"}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn annotates_matched_keys() {
        let results = tests_util::evaluate(
            &json!({"patternProperties": {"^f": true, "o$": true}}),
            &json!({"foo": 1, "bar": 2}),
        );
        let annotations = tests_util::all_annotations(&results);
        assert!(annotations.contains(&("patternProperties", &json!(["foo"]))));
    }

    #[test]
    fn invalid_pattern() {
        tests_util::expect_schema_error(&json!({"patternProperties": {"[": true}}));
    }
}
