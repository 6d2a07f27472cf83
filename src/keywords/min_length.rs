use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{non_negative_integer, params},
        Keyword,
    },
};
use serde_json::{json, Map, Value};

#[derive(Debug)]
pub(crate) struct MinLength {
    limit: u64,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let limit = non_negative_integer(ctx, "minLength", value)?;
    Ok(Some(Keyword::MinLength(MinLength { limit })))
}

impl MinLength {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::String(item) = scope.instance {
            if (item.chars().count() as u64) < self.limit {
                scope.fail(
                    evaluation,
                    "minLength",
                    params([("value", scope.instance.clone()), ("limit", json!(self.limit))]),
                );
            }
        }
        Ok(())
    }
}
