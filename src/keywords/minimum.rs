use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{num_lt, params},
        Keyword,
    },
};
use serde_json::{Map, Number, Value};

#[derive(Debug)]
pub(crate) struct Minimum {
    limit: Number,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(limit) = value else {
        return Err(SchemaError::invalid_form(
            "minimum",
            ctx.location(),
            "expected a number",
        ));
    };
    Ok(Some(Keyword::Minimum(Minimum {
        limit: limit.clone(),
    })))
}

impl Minimum {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Number(item) = scope.instance {
            if num_lt(item, &self.limit) {
                scope.fail(
                    evaluation,
                    "minimum",
                    params([
                        ("value", scope.instance.clone()),
                        ("limit", Value::Number(self.limit.clone())),
                    ]),
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

    #[test_case(&json!({"minimum": 3}), &json!(3))]
    #[test_case(&json!({"minimum": 3}), &json!(4.5))]
    #[test_case(&json!({"minimum": 3}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance)
    }

    #[test_case(&json!({"minimum": 3}), &json!(2))]
    #[test_case(&json!({"minimum": 1.1}), &json!(0.6))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance)
    }
}
