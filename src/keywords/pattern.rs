use crate::{
    compiler::Context,
    ecma::EcmaRegex,
    error::{EvaluationError, SchemaError},
    evaluation::{KeywordEvaluation, Scope},
    keywords::{helpers::params, Keyword},
};
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct Pattern {
    pattern: Box<str>,
    regex: EcmaRegex,
}

pub(crate) fn compile(
    ctx: &Context<'_>,
    _: &Map<String, Value>,
    value: &Value,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::String(pattern) = value else {
        return Err(SchemaError::invalid_form(
            "pattern",
            ctx.location(),
            "expected a string",
        ));
    };
    let regex = EcmaRegex::new(pattern).map_err(|()| SchemaError::InvalidPattern {
        pattern: pattern.clone(),
        location: ctx.location(),
    })?;
    Ok(Some(Keyword::Pattern(Pattern {
        pattern: pattern.clone().into_boxed_str(),
        regex,
    })))
}

impl Pattern {
    pub(crate) fn evaluate(
        &self,
        scope: &mut Scope<'_, '_>,
        evaluation: &mut KeywordEvaluation,
    ) -> Result<(), EvaluationError> {
        if let Value::String(item) = scope.instance {
            if !self.regex.is_match(item) {
                scope.fail(
                    evaluation,
                    "pattern",
                    params([
                        ("value", scope.instance.clone()),
                        ("pattern", Value::String(self.pattern.to_string())),
                    ]),
                );
            }
        }
        Ok(())
    }
}
