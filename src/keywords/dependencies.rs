//! `dependencies` (drafts 6/7) and its 2019-09 split `dependentSchemas`.
//! The `dependentRequired` half lives in its own module.
use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope, Target},
    keywords::{dependent_required::parse_required, helpers::params, Keyword},
    paths::PathChunk,
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
enum Dependency {
    Required(Vec<Box<str>>),
    Schema(Arc<SchemaConstraint>),
}

#[derive(Debug)]
pub(crate) struct Dependencies {
    entries: Vec<(Box<str>, Dependency)>,
}

#[derive(Debug)]
pub(crate) struct DependentSchemas {
    entries: Vec<(Box<str>, Arc<SchemaConstraint>)>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::invalid_form(
            "dependencies",
            ctx.location(),
            "expected an object",
        ));
    };
    let kctx = ctx.push("dependencies");
    let mut entries = Vec::with_capacity(map.len());
    for (property, dependency) in map {
        let dependency = match dependency {
            Value::Array(_) => Dependency::Required(parse_required(ctx, "dependencies", dependency)?),
            _ => Dependency::Schema(compiler::compile(&kctx.push(property), dependency)?),
        };
        entries.push((property.clone().into_boxed_str(), dependency));
    }
    Ok(Some(Keyword::Dependencies(Dependencies { entries })))
}

pub(crate) fn compile_dependent_schemas(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::invalid_form(
            "dependentSchemas",
            ctx.location(),
            "expected an object",
        ));
    };
    let kctx = ctx.push("dependentSchemas");
    let mut entries = Vec::with_capacity(map.len());
    for (property, subschema) in map {
        entries.push((
            property.clone().into_boxed_str(),
            compiler::compile(&kctx.push(property), subschema)?,
        ));
    }
    Ok(Some(Keyword::DependentSchemas(DependentSchemas { entries })))
}

fn apply_dependent_schema(
    scope: &mut Scope<'_, '_>,
    evaluation: &mut KeywordEvaluation,
    property: &str,
    child: &Arc<SchemaConstraint>,
) -> Result<bool, EvaluationError> {
    let results = scope.apply(
        child,
        Some(PathChunk::Property(property.into())),
        Target::Current,
    )?;
    Ok(evaluation.push_child(results))
}

impl Dependencies {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        for (property, dependency) in &self.entries {
            if !object.contains_key(property.as_ref()) {
                continue;
            }
            match dependency {
                Dependency::Required(names) => {
                    for name in names {
                        if !object.contains_key(name.as_ref()) {
                            scope.fail(
                                evaluation,
                                "dependentRequired",
                                params([
                                    ("property", Value::String(name.to_string())),
                                    ("dependency", Value::String(property.to_string())),
                                ]),
                            );
                        }
                    }
                }
                Dependency::Schema(child) => {
                    if !apply_dependent_schema(scope, evaluation, property, child)? {
                        scope.fail(
                            evaluation,
                            "dependentSchemas",
                            params([("property", Value::String(property.to_string()))]),
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl DependentSchemas {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        let Value::Object(object) = scope.instance else {
            return Ok(());
        };
        for (property, child) in &self.entries {
            if !object.contains_key(property.as_ref()) {
                continue;
            }
            if !apply_dependent_schema(scope, evaluation, property, child)? {
                scope.fail(
                    evaluation,
                    "dependentSchemas",
                    params([("property", Value::String(property.to_string()))]),
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

    #[test_case(&json!({"dependentSchemas": {"a": {"required": ["b"]}}}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"dependentSchemas": {"a": {"required": ["b"]}}}), &json!({"c": 1}))]
    fn dependent_schemas_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"dependentSchemas": {"a": {"required": ["b"]}}}), &json!({"a": 1}))]
    fn dependent_schemas_invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    fn draft7(schema: &Value) -> Value {
        let mut with_draft = schema.as_object().expect("Objects only").clone();
        with_draft.insert(
            "$schema".to_string(),
            json!("http://json-schema.org/draft-07/schema#"),
        );
        Value::Object(with_draft)
    }

    #[test_case(&json!({"dependencies": {"a": ["b"]}}), &json!({"a": 1, "b": 2}), true)]
    #[test_case(&json!({"dependencies": {"a": ["b"]}}), &json!({"a": 1}), false)]
    #[test_case(&json!({"dependencies": {"a": {"minProperties": 2}}}), &json!({"a": 1, "b": 2}), true)]
    #[test_case(&json!({"dependencies": {"a": {"minProperties": 2}}}), &json!({"a": 1}), false)]
    #[test_case(&json!({"dependencies": {"a": ["b"]}}), &json!(12), true)]
    fn legacy_dependencies(schema: &Value, instance: &Value, expected: bool) {
        let validator = crate::validator_for(&draft7(schema)).expect("Valid schema");
        assert_eq!(validator.is_valid(instance), expected);
    }

    #[test]
    fn dependencies_is_not_a_2020_keyword() {
        // In 2020-12 `dependencies` is unknown and only annotates
        tests_util::is_valid(&json!({"dependencies": {"a": ["b"]}}), &json!({"a": 1}));
    }
}
