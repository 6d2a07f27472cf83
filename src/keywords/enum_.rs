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
pub(crate) struct Enum {
    options: Vec<Value>,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Array(options) = value else {
        return Err(SchemaError::invalid_form(
            "enum",
            ctx.location(),
            "expected an array",
        ));
    };
    Ok(Some(Keyword::Enum(Enum {
        options: options.clone(),
    })))
}

impl Enum {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if !self
            .options
            .iter()
            .any(|option| equal(option, scope.instance))
        {
            scope.fail(
                evaluation,
                "enum",
                params([
                    ("value", scope.instance.clone()),
                    ("options", Value::Array(self.options.clone())),
                ]),
            );
        }
        Ok(())
    }
}
