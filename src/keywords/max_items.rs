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
pub(crate) struct MaxItems {
    limit: u64,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let limit = non_negative_integer(ctx, "maxItems", value)?;
    Ok(Some(Keyword::MaxItems(MaxItems { limit })))
}

impl MaxItems {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Array(items) = scope.instance {
            if items.len() as u64 > self.limit {
                scope.fail(
                    evaluation,
                    "maxItems",
                    params([("value", scope.instance.clone()), ("limit", json!(self.limit))]),
                );
            }
        }
        Ok(())
    }
}
