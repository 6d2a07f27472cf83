use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{equal, params},
        Keyword,
    },
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct Const {
    expected: Value,
}

pub(crate) fn compile(
    _: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    Ok(Some(Keyword::Const(Const {
        expected: value.clone(),
    })))
}

impl Const {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if !equal(&self.expected, scope.instance) {
            scope.fail(
                evaluation,
                "const",
                params([("expected", self.expected.clone())]),
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

    #[test_case(&json!({"const": 0.0}), &json!(0))]
    #[test_case(&json!({"const": {"a": 1.0}}), &json!({"a": 1}))]
    #[test_case(&json!({"const": null}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"const": 2}), &json!(5))]
    #[test_case(&json!({"const": "a"}), &json!("b"))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }

    #[test]
    fn error_message() {
        tests_util::expect_error(&json!({"const": 2}), &json!(5), "const", "2 was expected");
    }
}
