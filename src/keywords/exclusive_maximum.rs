use crate::{
    compiler::Context,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{
        helpers::{num_ge, params},
        Keyword,
    },
};
use serde_json::{Map, Number, Value};

#[derive(Debug)]
pub(crate) struct ExclusiveMaximum {
    limit: Number,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(limit) = value else {
        return Err(SchemaError::invalid_form(
            "exclusiveMaximum",
            ctx.location(),
            "expected a number",
        ));
    };
    Ok(Some(Keyword::ExclusiveMaximum(ExclusiveMaximum {
        limit: limit.clone(),
    })))
}

impl ExclusiveMaximum {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::Number(item) = scope.instance {
            if num_ge(item, &self.limit) {
                scope.fail(
                    evaluation,
                    "exclusiveMaximum",
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
