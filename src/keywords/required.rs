use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct Required {
    properties: Vec<Box<str>>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Array(names) = value else {
        return Err(SchemaError::invalid_form(
            "required",
            ctx.location(),
            "expected an array of strings",
        ));
    };
    let mut properties = Vec::with_capacity(names.len());
    for name in names {
        let Value::String(name) = name else {
            return Err(SchemaError::invalid_form(
                "required",
                ctx.location(),
                "expected an array of strings",
            ));
        };
        properties.push(name.clone().into_boxed_str());
    }
    Ok(Some(Keyword::Required(Required { properties })))
}

impl Required {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Object(object) = scope.instance {
            for property in &self.properties {
                if !object.contains_key(property.as_ref()) {
                    scope.fail(
                        evaluation,
                        "required",
                        params([("property", Value::String(property.to_string()))]),
                    );
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

    #[test_case(&json!({"required": ["a"]}), &json!({"a": 1}))]
    #[test_case(&json!({"required": []}), &json!({}))]
    #[test_case(&json!({"required": ["a"]}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"required": ["a"]}), &json!({"b": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn one_error_per_missing_property() {
        let results = tests_util::evaluate(&json!({"required": ["foo", "bar"]}), &json!({}));
        let errors = tests_util::all_errors(&results);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, r#""foo" is a required property"#);
        assert_eq!(errors[1].message, r#""bar" is a required property"#);
    }

    #[test]
    fn malformed() {
        tests_util::expect_schema_error(&json!({"required": [1]}));
    }
}
