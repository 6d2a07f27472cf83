use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{num_le, params},
        Keyword,
    },
};
use serde_json::{Map, Number, Value};

#[derive(Debug)]
pub(crate) struct ExclusiveMinimum {
    limit: Number,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(limit) = value else {
        return Err(SchemaError::invalid_form(
            "exclusiveMinimum",
            ctx.location(),
            "expected a number",
        ));
    };
    Ok(Some(Keyword::ExclusiveMinimum(ExclusiveMinimum {
        limit: limit.clone(),
    })))
}

impl ExclusiveMinimum {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Number(item) = scope.instance {
            if num_le(item, &self.limit) {
                scope.fail(
                    evaluation,
                    "exclusiveMinimum",
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
