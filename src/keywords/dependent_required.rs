use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct DependentRequired {
    entries: Vec<(Box<str>, Vec<Box<str>>)>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::invalid_form(
            "dependentRequired",
            ctx.location(),
            "expected an object",
        ));
    };
    let mut entries = Vec::with_capacity(map.len());
    for (property, dependencies) in map {
        entries.push((
            property.clone().into_boxed_str(),
            parse_required(ctx, "dependentRequired", dependencies)?,
        ));
    }
    Ok(Some(Keyword::DependentRequired(DependentRequired {
        entries,
    })))
}

pub(crate) fn parse_required(
    ctx: &Context<'_>,
    keyword: &'static str,
    value: &Value,
) -> Result<Vec<Box<str>>, SchemaError> {
    let Value::Array(names) = value else {
        return Err(SchemaError::invalid_form(
            keyword,
            ctx.location(),
            "expected an array of strings",
        ));
    };
    let mut required = Vec::with_capacity(names.len());
    for name in names {
        let Value::String(name) = name else {
            return Err(SchemaError::invalid_form(
                keyword,
                ctx.location(),
                "expected an array of strings",
            ));
        };
        required.push(name.clone().into_boxed_str());
    }
    Ok(required)
}

impl DependentRequired {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Object(object) = scope.instance {
            for (property, dependencies) in &self.entries {
                if !object.contains_key(property.as_ref()) {
                    continue;
                }
                for dependency in dependencies {
                    if !object.contains_key(dependency.as_ref()) {
                        scope.fail(
                            evaluation,
                            "dependentRequired",
                            params([
                                ("property", Value::String(dependency.to_string())),
                                ("dependency", Value::String(property.to_string())),
                            ]),
                        );
                    }
                }
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

    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"c": 1}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!(1))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn error_message() {
        tests_util::expect_error(
            &json!({"dependentRequired": {"a": ["b"]}}),
            &json!({"a": 1}),
            "dependentRequired",
            r#""b" is required when "a" is present"#,
        );
    }
}
